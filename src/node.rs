//! Node layout: quadrant child tables and tree nodes.

use crate::point::{first_diff_bit, mask_above, PhPoint};
use crate::MAX_BIT_WIDTH;

// =============================================================================
// Child table
// =============================================================================

/// Children of one node, addressed by quadrant (`0..2^D`).
///
/// Dense tables index a boxed slice directly and only make sense for small
/// `D`. Sparse tables keep `(quadrant, child)` pairs sorted by quadrant so
/// lookups binary-search and iteration stays in quadrant order.
#[derive(Clone)]
pub(crate) enum ChildTable<T> {
    Dense { slots: Box<[Option<T>]>, len: usize },
    Sparse(Vec<(u64, T)>),
}

impl<T> ChildTable<T> {
    pub(crate) fn new(dim: usize, dense: bool) -> Self {
        if dense {
            let slots = std::iter::repeat_with(|| None).take(1usize << dim).collect();
            Self::Dense { slots, len: 0 }
        } else {
            Self::Sparse(Vec::with_capacity(2))
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Dense { len, .. } => *len,
            Self::Sparse(entries) => entries.len(),
        }
    }

    #[inline]
    pub(crate) fn is_dense(&self) -> bool {
        matches!(self, Self::Dense { .. })
    }

    #[inline]
    pub(crate) fn get(&self, pos: u64) -> Option<&T> {
        match self {
            Self::Dense { slots, .. } => slots[pos as usize].as_ref(),
            Self::Sparse(entries) => entries
                .binary_search_by_key(&pos, |(p, _)| *p)
                .ok()
                .map(|i| &entries[i].1),
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, pos: u64) -> Option<&mut T> {
        match self {
            Self::Dense { slots, .. } => slots[pos as usize].as_mut(),
            Self::Sparse(entries) => match entries.binary_search_by_key(&pos, |(p, _)| *p) {
                Ok(i) => Some(&mut entries[i].1),
                Err(_) => None,
            },
        }
    }

    /// Stores `child` at `pos`, returning the previous occupant.
    pub(crate) fn insert(&mut self, pos: u64, child: T) -> Option<T> {
        match self {
            Self::Dense { slots, len } => {
                let old = slots[pos as usize].replace(child);
                if old.is_none() {
                    *len += 1;
                }
                old
            }
            Self::Sparse(entries) => match entries.binary_search_by_key(&pos, |(p, _)| *p) {
                Ok(i) => Some(std::mem::replace(&mut entries[i].1, child)),
                Err(i) => {
                    entries.insert(i, (pos, child));
                    None
                }
            },
        }
    }

    pub(crate) fn take(&mut self, pos: u64) -> Option<T> {
        match self {
            Self::Dense { slots, len } => {
                let old = slots[pos as usize].take();
                if old.is_some() {
                    *len -= 1;
                }
                old
            }
            Self::Sparse(entries) => entries
                .binary_search_by_key(&pos, |(p, _)| *p)
                .ok()
                .map(|i| entries.remove(i).1),
        }
    }

    /// First occupied child at storage position `>= cursor`, with the cursor
    /// to resume from.
    #[inline]
    pub(crate) fn next_occupied(&self, cursor: usize) -> Option<(usize, &T)> {
        match self {
            Self::Dense { slots, .. } => slots
                .iter()
                .enumerate()
                .skip(cursor)
                .find_map(|(i, s)| s.as_ref().map(|c| (i + 1, c))),
            Self::Sparse(entries) => entries.get(cursor).map(|(_, c)| (cursor + 1, c)),
        }
    }

    /// Quadrant of every occupied child, ascending.
    pub(crate) fn positions(&self) -> Vec<u64> {
        match self {
            Self::Dense { slots, .. } => slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.is_some())
                .map(|(i, _)| i as u64)
                .collect(),
            Self::Sparse(entries) => entries.iter().map(|(p, _)| *p).collect(),
        }
    }

    pub(crate) fn iter_mut(&mut self) -> ChildIterMut<'_, T> {
        match self {
            Self::Dense { slots, .. } => ChildIterMut::Dense(slots.iter_mut()),
            Self::Sparse(entries) => ChildIterMut::Sparse(entries.iter_mut()),
        }
    }

    pub(crate) fn into_children(self) -> IntoChildren<T> {
        match self {
            Self::Dense { slots, .. } => IntoChildren::Dense(slots.into_vec().into_iter()),
            Self::Sparse(entries) => IntoChildren::Sparse(entries.into_iter()),
        }
    }
}

pub(crate) enum ChildIterMut<'a, T> {
    Dense(std::slice::IterMut<'a, Option<T>>),
    Sparse(std::slice::IterMut<'a, (u64, T)>),
}

impl<'a, T> Iterator for ChildIterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Dense(it) => it.find_map(Option::as_mut),
            Self::Sparse(it) => it.next().map(|(_, c)| c),
        }
    }
}

pub(crate) enum IntoChildren<T> {
    Dense(std::vec::IntoIter<Option<T>>),
    Sparse(std::vec::IntoIter<(u64, T)>),
}

impl<T> Iterator for IntoChildren<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        match self {
            Self::Dense(it) => it.find_map(|s| s),
            Self::Sparse(it) => it.next().map(|(_, c)| c),
        }
    }
}

// =============================================================================
// Nodes
// =============================================================================

/// Content of one quadrant: a stored entry or a nested node.
#[derive(Clone)]
pub(crate) enum Slot<V, const D: usize> {
    Leaf { key: PhPoint<D>, value: V },
    Node(Box<Node<V, D>>),
}

/// One level of the trie.
///
/// Every key below this node agrees with `prefix` on all bits above
/// `postfix_len`; bit `postfix_len` of each dimension selects the quadrant.
/// Bits of `prefix` at or below `postfix_len` are zero.
#[derive(Clone)]
pub(crate) struct Node<V, const D: usize> {
    pub(crate) postfix_len: u32,
    pub(crate) prefix: [u64; D],
    pub(crate) children: ChildTable<Slot<V, D>>,
}

impl<V, const D: usize> Node<V, D> {
    /// The root branches on the most significant bit and has no prefix.
    pub(crate) fn root(dense: bool) -> Self {
        Self {
            postfix_len: MAX_BIT_WIDTH - 1,
            prefix: [0; D],
            children: ChildTable::new(D, dense),
        }
    }

    /// A node branching at `postfix_len` whose prefix is taken from `bits`.
    pub(crate) fn with_prefix_of(bits: &[u64; D], postfix_len: u32, dense: bool) -> Self {
        let mask = mask_above(postfix_len);
        let mut prefix = *bits;
        for p in &mut prefix {
            *p &= mask;
        }
        Self {
            postfix_len,
            prefix,
            children: ChildTable::new(D, dense),
        }
    }

    /// Highest bit above `postfix_len` where `bits` leaves this node's prefix.
    #[inline]
    pub(crate) fn prefix_divergence(&self, bits: &[u64; D]) -> Option<u32> {
        first_diff_bit(bits, &self.prefix, Some(self.postfix_len))
    }

    /// Bits identifying this subtree, used to place it into a new parent.
    #[inline]
    pub(crate) fn representative_bits(&self) -> &[u64; D] {
        &self.prefix
    }
}
