//! # phtree-rs
//!
//! A multi-dimensional point index using a PH-tree: a trie over the bits of
//! `D` integer coordinates that branches on one bit of every dimension at a
//! time (2^D quadrants per node) and collapses single-child chains into a
//! shared prefix.
//!
//! Based on "The PH-Tree: A Space-Efficient Storage Structure and
//! Multi-Dimensional Index" (SIGMOD 2014, Zäschke, Zimmerli, Norrie).
//!
//! ## Example
//!
//! ```rust
//! use phtree_rs::{PhPoint, PhTree};
//!
//! let mut tree: PhTree<&str, 3> = PhTree::new();
//! tree.insert(PhPoint::new([0, 0, 0]), "a");
//! tree.insert(PhPoint::new([1, 0, 0]), "b");
//! tree.insert(PhPoint::new([0, 1, 0]), "c");
//!
//! assert_eq!(tree.len(), 3);
//! assert_eq!(tree.get(&PhPoint::new([1, 0, 0])), Some(&"b"));
//! assert_eq!(tree.iter().count(), 3);
//! ```

#![deny(unsafe_code)]

mod error;
mod iter;
mod node;
mod point;

pub mod converter;

pub use converter::{ConvertedPhTree, Converter, ConverterIeee, ConverterMultiply, PhTreeD};
pub use error::{PhTreeError, Result};
pub use iter::{IntoIter, Iter, IterMut, Keys, Values};
pub use point::PhPoint;

use node::{Node, Slot};
use point::{first_diff_bit, hc_pos, mask_above};

// =============================================================================
// Configuration
// =============================================================================

/// Bits per coordinate.
pub const MAX_BIT_WIDTH: u32 = 64;
/// Largest supported dimension (quadrant addresses are `u64`).
pub const MAX_DIM: usize = 64;
/// Largest dimension for which dense child tables (2^D slots) are allowed.
pub const DENSE_DIM_LIMIT: usize = 10;
/// Dense child tables are used up to this dimension unless configured.
pub const DEFAULT_DENSE_MAX_DIM: usize = 3;

/// Tuning knobs for [`PhTree::with_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhTreeConfig {
    /// Nodes use a directly indexed table of 2^D children when
    /// `D <= dense_max_dim`, and a sorted sparse table otherwise.
    pub dense_max_dim: usize,
}

impl Default for PhTreeConfig {
    fn default() -> Self {
        Self {
            dense_max_dim: DEFAULT_DENSE_MAX_DIM,
        }
    }
}

impl PhTreeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.dense_max_dim > DENSE_DIM_LIMIT {
            return Err(PhTreeError::InvalidConfig(format!(
                "dense_max_dim {} exceeds limit {}",
                self.dense_max_dim, DENSE_DIM_LIMIT
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Shape of a tree, as reported by [`PhTree::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Nodes including the root.
    pub nodes: usize,
    pub dense_nodes: usize,
    pub sparse_nodes: usize,
    /// Stored entries.
    pub leaves: usize,
    /// Longest root-to-leaf path counted in nodes (1 when all entries sit
    /// in the root).
    pub max_depth: usize,
}

// =============================================================================
// PhTree
// =============================================================================

/// Outcome of locating the slot for a key.
enum Placed<'a, V> {
    /// A new leaf was created holding the value.
    New(&'a mut V),
    /// The key was present; the caller's value is handed back unused.
    Existing { current: &'a mut V, value: V },
}

/// What descending one node found for a key.
enum Step {
    Vacant,
    Match,
    /// The quadrant's occupant diverges from the key at this bit.
    Split(u32),
    Descend,
}

/// A map from `D`-dimensional integer points to values.
///
/// Characteristics:
/// - Insertion and exact lookup descend one node per branching bit; depth
///   is bounded by the 64-bit coordinate width, not by the entry count.
/// - Enumeration walks the trie depth-first in ascending quadrant order,
///   which is Z-order over signed coordinates.
/// - Duplicate keys replace the stored value ([`PhTree::insert`]) or keep it
///   ([`PhTree::emplace`]).
#[derive(Clone)]
pub struct PhTree<V, const D: usize> {
    root: Node<V, D>,
    count: usize,
    dense: bool,
    config: PhTreeConfig,
}

impl<V, const D: usize> PhTree<V, D> {
    pub fn new() -> Self {
        Self::build(PhTreeConfig::default())
    }

    pub fn with_config(config: PhTreeConfig) -> Result<Self> {
        config.validate()?;
        let tree = Self::build(config);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            dim = D,
            dense = tree.dense,
            dense_max_dim = config.dense_max_dim,
            "PhTree: created with config"
        );
        Ok(tree)
    }

    fn build(config: PhTreeConfig) -> Self {
        const { assert!(D >= 1 && D <= MAX_DIM, "PhTree dimension must be in 1..=64") };
        let dense = D <= config.dense_max_dim;
        Self {
            root: Node::root(dense),
            count: 0,
            dense,
            config,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn config(&self) -> PhTreeConfig {
        self.config
    }

    pub fn clear(&mut self) {
        self.root = Node::root(self.dense);
        self.count = 0;
    }

    pub fn get(&self, key: &PhPoint<D>) -> Option<&V> {
        let bits = key.to_bits();
        let mut node = &self.root;
        loop {
            match node.children.get(hc_pos(&bits, node.postfix_len))? {
                Slot::Leaf { key: k, value } => return (k == key).then_some(value),
                Slot::Node(child) => {
                    if child.prefix_divergence(&bits).is_some() {
                        return None;
                    }
                    node = &**child;
                }
            }
        }
    }

    pub fn get_mut(&mut self, key: &PhPoint<D>) -> Option<&mut V> {
        let bits = key.to_bits();
        let mut node = &mut self.root;
        loop {
            let pos = hc_pos(&bits, node.postfix_len);
            match node.children.get_mut(pos)? {
                Slot::Leaf { key: k, value } => return (*k == *key).then_some(value),
                Slot::Node(child) => {
                    if child.prefix_divergence(&bits).is_some() {
                        return None;
                    }
                    node = &mut **child;
                }
            }
        }
    }

    #[inline]
    pub fn contains_key(&self, key: &PhPoint<D>) -> bool {
        self.get(key).is_some()
    }

    /// Stores `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: PhPoint<D>, value: V) -> Option<V> {
        match self.place(key, value) {
            Placed::New(_) => None,
            Placed::Existing { current, value } => Some(std::mem::replace(current, value)),
        }
    }

    /// Stores `value` only if `key` is absent.
    ///
    /// Returns the stored value and whether it was inserted by this call. An
    /// existing value is left untouched and `value` is dropped.
    pub fn emplace(&mut self, key: PhPoint<D>, value: V) -> (&mut V, bool) {
        match self.place(key, value) {
            Placed::New(v) => (v, true),
            Placed::Existing { current, .. } => (current, false),
        }
    }

    fn step(node: &Node<V, D>, pos: u64, key: &PhPoint<D>, bits: &[u64; D]) -> Step {
        match node.children.get(pos) {
            None => Step::Vacant,
            Some(Slot::Leaf { key: k, .. }) => {
                if k == key {
                    return Step::Match;
                }
                let bit = first_diff_bit(&k.to_bits(), bits, None)
                    .expect("non-equal keys must have a first differing bit");
                debug_assert!(bit < node.postfix_len);
                Step::Split(bit)
            }
            Some(Slot::Node(child)) => match child.prefix_divergence(bits) {
                Some(bit) => {
                    debug_assert!(bit < node.postfix_len && bit > child.postfix_len);
                    Step::Split(bit)
                }
                None => Step::Descend,
            },
        }
    }

    fn place(&mut self, key: PhPoint<D>, value: V) -> Placed<'_, V> {
        let bits = key.to_bits();
        let dense = self.dense;
        let mut node = &mut self.root;
        loop {
            let pos = hc_pos(&bits, node.postfix_len);
            match Self::step(node, pos, &key, &bits) {
                Step::Vacant => {
                    node.children.insert(pos, Slot::Leaf { key, value });
                    self.count += 1;
                    return match node.children.get_mut(pos) {
                        Some(Slot::Leaf { value, .. }) => Placed::New(value),
                        _ => unreachable!("leaf was just stored"),
                    };
                }
                Step::Match => {
                    return match node.children.get_mut(pos) {
                        Some(Slot::Leaf { value: current, .. }) => {
                            Placed::Existing { current, value }
                        }
                        _ => unreachable!("quadrant holds the matching leaf"),
                    };
                }
                Step::Split(bit) => {
                    self.count += 1;
                    let incoming = Slot::Leaf { key, value };
                    return match Self::split(node, pos, bit, &bits, incoming, dense) {
                        Slot::Leaf { value, .. } => Placed::New(value),
                        Slot::Node(_) => unreachable!("split returns the new leaf"),
                    };
                }
                Step::Descend => {
                    node = match node.children.get_mut(pos) {
                        Some(Slot::Node(child)) => &mut **child,
                        _ => unreachable!("quadrant holds a nested node"),
                    };
                }
            }
        }
    }

    /// Replaces the occupant of `pos` with a node branching at `bit` that
    /// holds both the old occupant and `incoming`. Returns `incoming`'s slot.
    fn split<'a>(
        node: &'a mut Node<V, D>,
        pos: u64,
        bit: u32,
        bits: &[u64; D],
        incoming: Slot<V, D>,
        dense: bool,
    ) -> &'a mut Slot<V, D> {
        let old = node
            .children
            .take(pos)
            .expect("split target quadrant must be occupied");
        let old_pos = match &old {
            Slot::Leaf { key, .. } => hc_pos(&key.to_bits(), bit),
            Slot::Node(child) => hc_pos(child.representative_bits(), bit),
        };
        let new_pos = hc_pos(bits, bit);
        debug_assert_ne!(old_pos, new_pos);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            bit,
            parent_bit = node.postfix_len,
            quadrant = pos,
            existing_is_node = matches!(old, Slot::Node(_)),
            "PhTree: splitting quadrant"
        );

        let mut split = Node::with_prefix_of(bits, bit, dense);
        split.children.insert(old_pos, old);
        split.children.insert(new_pos, incoming);
        node.children.insert(pos, Slot::Node(Box::new(split)));

        match node.children.get_mut(pos) {
            Some(Slot::Node(split)) => split
                .children
                .get_mut(new_pos)
                .expect("new entry was just stored"),
            _ => unreachable!("split node was just stored"),
        }
    }

    pub fn iter(&self) -> Iter<'_, V, D> {
        Iter::new(&self.root, self.count)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, V, D> {
        IterMut::new(&mut self.root, self.count)
    }

    pub fn keys(&self) -> Keys<'_, V, D> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, V, D> {
        Values::new(self.iter())
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats::default();
        let mut stack: Vec<(&Node<V, D>, usize)> = vec![(&self.root, 1)];
        while let Some((node, depth)) = stack.pop() {
            stats.nodes += 1;
            if node.children.is_dense() {
                stats.dense_nodes += 1;
            } else {
                stats.sparse_nodes += 1;
            }
            stats.max_depth = stats.max_depth.max(depth);
            let mut cursor = 0;
            while let Some((next, slot)) = node.children.next_occupied(cursor) {
                cursor = next;
                match slot {
                    Slot::Leaf { .. } => stats.leaves += 1,
                    Slot::Node(child) => stack.push((&**child, depth + 1)),
                }
            }
        }
        stats
    }

    /// Walks the whole tree and panics if any structural invariant is broken.
    pub fn check_consistency(&self) {
        assert_eq!(self.root.postfix_len, MAX_BIT_WIDTH - 1, "root must branch on the top bit");
        assert_eq!(self.root.prefix, [0u64; D], "root must not carry a prefix");

        let mut leaves = 0usize;
        let mut stack: Vec<&Node<V, D>> = vec![&self.root];
        while let Some(node) = stack.pop() {
            assert_eq!(
                node.children.is_dense(),
                self.dense,
                "node table kind must follow the config"
            );
            let below = !mask_above(node.postfix_len);
            for (d, p) in node.prefix.iter().enumerate() {
                assert_eq!(p & below, 0, "prefix bits at/below postfix_len in dim {d}");
            }
            let positions = node.children.positions();
            assert_eq!(positions.len(), node.children.len(), "occupied slot count");
            if !std::ptr::eq(node, &self.root) {
                assert!(
                    positions.len() >= 2,
                    "inner node at bit {} has {} children",
                    node.postfix_len,
                    positions.len()
                );
            }

            for pos in positions {
                let child = node.children.get(pos).expect("listed quadrant is occupied");
                let child_bits = match child {
                    Slot::Leaf { key, .. } => key.to_bits(),
                    Slot::Node(n) => {
                        assert!(
                            n.postfix_len < node.postfix_len,
                            "child bit {} must be below parent bit {}",
                            n.postfix_len,
                            node.postfix_len
                        );
                        *n.representative_bits()
                    }
                };
                assert_eq!(
                    hc_pos(&child_bits, node.postfix_len),
                    pos,
                    "child stored under the wrong quadrant"
                );
                assert_eq!(
                    first_diff_bit(&child_bits, &node.prefix, Some(node.postfix_len)),
                    None,
                    "child leaves the parent prefix"
                );
                match child {
                    Slot::Leaf { .. } => leaves += 1,
                    Slot::Node(n) => stack.push(&**n),
                }
            }
        }
        assert_eq!(leaves, self.count, "reachable leaf count must match len()");
    }
}

impl<V, const D: usize> Default for PhTree<V, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: std::fmt::Debug, const D: usize> std::fmt::Debug for PhTree<V, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V, const D: usize> Extend<(PhPoint<D>, V)> for PhTree<V, D> {
    fn extend<I: IntoIterator<Item = (PhPoint<D>, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<V, const D: usize> FromIterator<(PhPoint<D>, V)> for PhTree<V, D> {
    fn from_iter<I: IntoIterator<Item = (PhPoint<D>, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, V, const D: usize> IntoIterator for &'a PhTree<V, D> {
    type Item = (&'a PhPoint<D>, &'a V);
    type IntoIter = Iter<'a, V, D>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, V, const D: usize> IntoIterator for &'a mut PhTree<V, D> {
    type Item = (&'a PhPoint<D>, &'a mut V);
    type IntoIter = IterMut<'a, V, D>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<V, const D: usize> IntoIterator for PhTree<V, D> {
    type Item = (PhPoint<D>, V);
    type IntoIter = IntoIter<V, D>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.root, self.count)
    }
}


#[cfg(test)]
mod proptests;
