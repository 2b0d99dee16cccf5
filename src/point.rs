//! Coordinate keys.

use std::fmt;
use std::ops::Index;

use crate::error::PhTreeError;
use crate::MAX_BIT_WIDTH;

// =============================================================================
// Bit utilities
// =============================================================================

const SIGN_BIT: u64 = 1u64 << (MAX_BIT_WIDTH - 1);

/// Maps a signed coordinate to an unsigned word whose bit order matches the
/// signed order (`i64::MIN` -> `0`, `-1` -> `0x7FFF..`, `0` -> `0x8000..`).
#[inline]
pub(crate) fn to_sortable(v: i64) -> u64 {
    (v as u64) ^ SIGN_BIT
}

/// Mask keeping every bit strictly above `bit`.
#[inline]
pub(crate) fn mask_above(bit: u32) -> u64 {
    debug_assert!(bit < MAX_BIT_WIDTH);
    if bit + 1 >= MAX_BIT_WIDTH {
        0
    } else {
        !0u64 << (bit + 1)
    }
}

/// Quadrant address of `bits` at `postfix_len`: one bit per dimension,
/// dimension 0 in the most significant position.
#[inline]
pub(crate) fn hc_pos<const D: usize>(bits: &[u64; D], postfix_len: u32) -> u64 {
    let mut pos = 0u64;
    for &b in bits {
        pos = (pos << 1) | ((b >> postfix_len) & 1);
    }
    pos
}

/// Highest bit above `floor` at which `a` and `b` differ in any dimension.
///
/// `floor == None` compares all bits.
#[inline]
pub(crate) fn first_diff_bit<const D: usize>(
    a: &[u64; D],
    b: &[u64; D],
    floor: Option<u32>,
) -> Option<u32> {
    let mask = floor.map_or(!0u64, mask_above);
    let mut diff = 0u64;
    for d in 0..D {
        diff |= a[d] ^ b[d];
    }
    diff &= mask;
    if diff == 0 {
        None
    } else {
        Some(MAX_BIT_WIDTH - 1 - diff.leading_zeros())
    }
}

// =============================================================================
// PhPoint
// =============================================================================

/// A `D`-dimensional integer coordinate, the key type of [`PhTree`](crate::PhTree).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhPoint<const D: usize>([i64; D]);

impl<const D: usize> PhPoint<D> {
    #[inline]
    pub const fn new(coords: [i64; D]) -> Self {
        Self(coords)
    }

    /// Builds a point from a slice, panicking if `coords.len() != D`.
    ///
    /// Use `PhPoint::try_from(slice)` to get a [`PhTreeError`] instead.
    pub fn from_slice(coords: &[i64]) -> Self {
        match Self::try_from(coords) {
            Ok(p) => p,
            Err(e) => panic!("{e}"),
        }
    }

    #[inline]
    pub const fn coords(&self) -> &[i64; D] {
        &self.0
    }

    #[inline]
    pub const fn into_inner(self) -> [i64; D] {
        self.0
    }

    /// Bit `depth` of dimension `dim` in the order-preserving encoding,
    /// where depth `63` is the most significant bit.
    #[inline]
    pub fn bit(&self, dim: usize, depth: u32) -> bool {
        debug_assert!(depth < MAX_BIT_WIDTH);
        (to_sortable(self.0[dim]) >> depth) & 1 == 1
    }

    #[inline]
    pub(crate) fn to_bits(&self) -> [u64; D] {
        let mut bits = [0u64; D];
        for (b, &c) in bits.iter_mut().zip(self.0.iter()) {
            *b = to_sortable(c);
        }
        bits
    }
}

impl<const D: usize> From<[i64; D]> for PhPoint<D> {
    #[inline]
    fn from(coords: [i64; D]) -> Self {
        Self(coords)
    }
}

impl<const D: usize> From<PhPoint<D>> for [i64; D] {
    #[inline]
    fn from(p: PhPoint<D>) -> Self {
        p.0
    }
}

impl<const D: usize> TryFrom<&[i64]> for PhPoint<D> {
    type Error = PhTreeError;

    fn try_from(coords: &[i64]) -> Result<Self, Self::Error> {
        let arr: [i64; D] = coords
            .try_into()
            .map_err(|_| PhTreeError::DimensionMismatch {
                expected: D,
                actual: coords.len(),
            })?;
        Ok(Self(arr))
    }
}

impl<const D: usize> Index<usize> for PhPoint<D> {
    type Output = i64;

    #[inline]
    fn index(&self, dim: usize) -> &i64 {
        &self.0[dim]
    }
}

impl<const D: usize> fmt::Debug for PhPoint<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sortable_preserves_order() {
        let values = [i64::MIN, -1_000_000, -1, 0, 1, 42, i64::MAX];
        for w in values.windows(2) {
            assert!(to_sortable(w[0]) < to_sortable(w[1]), "{w:?}");
        }
        assert_eq!(to_sortable(i64::MIN), 0);
        assert_eq!(to_sortable(i64::MAX), u64::MAX);
    }

    #[test]
    fn test_bit_extraction() {
        let p = PhPoint::new([0, -1, 5]);
        // 0 encodes as 0x8000...: only the top bit set.
        assert!(p.bit(0, 63));
        assert!(!p.bit(0, 0));
        // -1 encodes as 0x7FFF...: every bit except the top.
        assert!(!p.bit(1, 63));
        assert!(p.bit(1, 0));
        assert!(p.bit(2, 0));
        assert!(!p.bit(2, 1));
        assert!(p.bit(2, 2));
    }

    #[test]
    fn test_hc_pos_dimension_order() {
        let bits = [0b10u64, 0b01, 0b11];
        assert_eq!(hc_pos(&bits, 0), 0b011);
        assert_eq!(hc_pos(&bits, 1), 0b101);
        assert_eq!(hc_pos(&bits, 2), 0);
    }

    #[test]
    fn test_hc_pos_wide() {
        let bits = [1u64; 64];
        assert_eq!(hc_pos(&bits, 0), u64::MAX);
    }

    #[test]
    fn test_first_diff_bit() {
        let a = [0b1000u64, 0];
        let b = [0b1001u64, 0b0100];
        assert_eq!(first_diff_bit(&a, &b, None), Some(2));
        assert_eq!(first_diff_bit(&a, &b, Some(2)), None);
        assert_eq!(first_diff_bit(&a, &b, Some(1)), Some(2));
        assert_eq!(first_diff_bit(&a, &a, None), None);
        assert_eq!(first_diff_bit(&[0u64], &[u64::MAX], Some(62)), Some(63));
        assert_eq!(first_diff_bit(&[0u64], &[u64::MAX], Some(63)), None);
    }

    #[test]
    fn test_mask_above() {
        assert_eq!(mask_above(63), 0);
        assert_eq!(mask_above(62), 1u64 << 63);
        assert_eq!(mask_above(0), !1u64);
    }

    #[test]
    fn test_try_from_slice() {
        let p: PhPoint<3> = PhPoint::try_from(&[1i64, 2, 3][..]).unwrap();
        assert_eq!(p, PhPoint::new([1, 2, 3]));

        let err = PhPoint::<3>::try_from(&[1i64, 2][..]).unwrap_err();
        assert_eq!(
            err,
            PhTreeError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    #[should_panic(expected = "dimension mismatch")]
    fn test_from_slice_wrong_dimension_panics() {
        let _ = PhPoint::<2>::from_slice(&[1, 2, 3]);
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", PhPoint::new([1, -2])), "[1, -2]");
    }
}
