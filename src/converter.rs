//! Key converters: store non-integer coordinates in a [`PhTree`].
//!
//! A converter maps an external key (for example `[f64; D]`) to a
//! [`PhPoint`] before it reaches the tree and back when entries are
//! enumerated. Only order-preserving mappings keep the Z-order traversal
//! meaningful in external coordinates.

use crate::{PhPoint, PhTree};

/// Bidirectional mapping between an external key type and [`PhPoint`].
pub trait Converter<const D: usize> {
    type External;

    fn pre(&self, external: &Self::External) -> PhPoint<D>;

    fn post(&self, internal: &PhPoint<D>) -> Self::External;
}

/// Lossless order-preserving mapping of `f64` coordinates.
///
/// Non-negative doubles keep their bit pattern; negative doubles have every
/// bit except the sign inverted, so the signed integer order of the result
/// matches the floating-point order. `-0.0` and `0.0` stay distinct.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConverterIeee;

impl ConverterIeee {
    #[inline]
    pub fn encode(value: f64) -> i64 {
        let bits = value.to_bits() as i64;
        if bits >= 0 {
            bits
        } else {
            bits ^ i64::MAX
        }
    }

    #[inline]
    pub fn decode(value: i64) -> f64 {
        let bits = if value >= 0 { value } else { value ^ i64::MAX };
        f64::from_bits(bits as u64)
    }
}

impl<const D: usize> Converter<D> for ConverterIeee {
    type External = [f64; D];

    fn pre(&self, external: &[f64; D]) -> PhPoint<D> {
        PhPoint::new(external.map(Self::encode))
    }

    fn post(&self, internal: &PhPoint<D>) -> [f64; D] {
        internal.into_inner().map(Self::decode)
    }
}

/// Fixed-point mapping: coordinates are scaled by `multiplier` and rounded.
///
/// Values closer than `1 / multiplier` collapse onto the same key.
#[derive(Debug, Clone, Copy)]
pub struct ConverterMultiply {
    multiplier: f64,
}

impl ConverterMultiply {
    pub fn new(multiplier: f64) -> Self {
        assert!(
            multiplier.is_finite() && multiplier > 0.0,
            "multiplier must be finite and positive"
        );
        Self { multiplier }
    }

    #[inline]
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }
}

impl Default for ConverterMultiply {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl<const D: usize> Converter<D> for ConverterMultiply {
    type External = [f64; D];

    fn pre(&self, external: &[f64; D]) -> PhPoint<D> {
        PhPoint::new(external.map(|c| (c * self.multiplier).round() as i64))
    }

    fn post(&self, internal: &PhPoint<D>) -> [f64; D] {
        internal.into_inner().map(|c| c as f64 / self.multiplier)
    }
}

/// A [`PhTree`] keyed by a converter's external key type.
#[derive(Clone)]
pub struct ConvertedPhTree<V, C, const D: usize>
where
    C: Converter<D>,
{
    tree: PhTree<V, D>,
    converter: C,
}

/// A [`PhTree`] over `f64` coordinates.
pub type PhTreeD<V, const D: usize> = ConvertedPhTree<V, ConverterIeee, D>;

impl<V, C, const D: usize> ConvertedPhTree<V, C, D>
where
    C: Converter<D>,
{
    pub fn new() -> Self
    where
        C: Default,
    {
        Self::with_converter(C::default())
    }

    pub fn with_converter(converter: C) -> Self {
        Self {
            tree: PhTree::new(),
            converter,
        }
    }

    #[inline]
    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// The underlying integer-keyed tree.
    #[inline]
    pub fn inner(&self) -> &PhTree<V, D> {
        &self.tree
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn insert(&mut self, key: &C::External, value: V) -> Option<V> {
        self.tree.insert(self.converter.pre(key), value)
    }

    pub fn emplace(&mut self, key: &C::External, value: V) -> (&mut V, bool) {
        self.tree.emplace(self.converter.pre(key), value)
    }

    pub fn get(&self, key: &C::External) -> Option<&V> {
        self.tree.get(&self.converter.pre(key))
    }

    pub fn get_mut(&mut self, key: &C::External) -> Option<&mut V> {
        let key = self.converter.pre(key);
        self.tree.get_mut(&key)
    }

    pub fn contains_key(&self, key: &C::External) -> bool {
        self.tree.contains_key(&self.converter.pre(key))
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (C::External, &V)> + '_ {
        self.tree
            .iter()
            .map(move |(k, v)| (self.converter.post(k), v))
    }
}

impl<V, C, const D: usize> Default for ConvertedPhTree<V, C, D>
where
    C: Converter<D> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}
