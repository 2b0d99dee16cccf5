//! Extent iteration: every stored entry, depth-first in quadrant order.

use std::iter::FusedIterator;

use crate::node::{ChildIterMut, IntoChildren, Node, Slot};
use crate::point::PhPoint;
use crate::MAX_BIT_WIDTH;

/// Root plus one node per branching bit.
const MAX_FRAMES: usize = MAX_BIT_WIDTH as usize + 1;

struct Frame<'a, V, const D: usize> {
    node: &'a Node<V, D>,
    /// Storage position in `node.children` to resume scanning from.
    cursor: usize,
}

/// Borrowing iterator over `(key, value)` pairs.
///
/// Holds one frame per level of the current path, so memory is bounded by
/// the key bit width rather than the entry count.
pub struct Iter<'a, V, const D: usize> {
    stack: Vec<Frame<'a, V, D>>,
    remaining: usize,
}

impl<'a, V, const D: usize> Iter<'a, V, D> {
    pub(crate) fn new(root: &'a Node<V, D>, len: usize) -> Self {
        let mut stack = Vec::with_capacity(MAX_FRAMES);
        if len > 0 {
            stack.push(Frame {
                node: root,
                cursor: 0,
            });
        }
        Self {
            stack,
            remaining: len,
        }
    }
}

impl<'a, V, const D: usize> Iterator for Iter<'a, V, D> {
    type Item = (&'a PhPoint<D>, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.last_mut() {
            let node = frame.node;
            match node.children.next_occupied(frame.cursor) {
                None => {
                    self.stack.pop();
                }
                Some((next, slot)) => {
                    frame.cursor = next;
                    match slot {
                        Slot::Leaf { key, value } => {
                            self.remaining -= 1;
                            return Some((key, value));
                        }
                        Slot::Node(child) => self.stack.push(Frame {
                            node: child,
                            cursor: 0,
                        }),
                    }
                }
            }
        }
        debug_assert_eq!(self.remaining, 0, "iterator ended before visiting every entry");
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V, const D: usize> ExactSizeIterator for Iter<'_, V, D> {}
impl<V, const D: usize> FusedIterator for Iter<'_, V, D> {}

impl<V, const D: usize> Clone for Iter<'_, V, D> {
    fn clone(&self) -> Self {
        Self {
            stack: self
                .stack
                .iter()
                .map(|f| Frame {
                    node: f.node,
                    cursor: f.cursor,
                })
                .collect(),
            remaining: self.remaining,
        }
    }
}

/// Mutable iterator over `(key, value)` pairs, in the same order as [`Iter`].
pub struct IterMut<'a, V, const D: usize> {
    stack: Vec<ChildIterMut<'a, Slot<V, D>>>,
    remaining: usize,
}

impl<'a, V, const D: usize> IterMut<'a, V, D> {
    pub(crate) fn new(root: &'a mut Node<V, D>, len: usize) -> Self {
        let mut stack = Vec::with_capacity(MAX_FRAMES);
        if len > 0 {
            stack.push(root.children.iter_mut());
        }
        Self {
            stack,
            remaining: len,
        }
    }
}

impl<'a, V, const D: usize> Iterator for IterMut<'a, V, D> {
    type Item = (&'a PhPoint<D>, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(children) = self.stack.last_mut() {
            match children.next() {
                None => {
                    self.stack.pop();
                }
                Some(Slot::Leaf { key, value }) => {
                    self.remaining -= 1;
                    return Some((&*key, value));
                }
                Some(Slot::Node(child)) => self.stack.push(child.children.iter_mut()),
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V, const D: usize> ExactSizeIterator for IterMut<'_, V, D> {}
impl<V, const D: usize> FusedIterator for IterMut<'_, V, D> {}

/// Owning iterator over `(key, value)` pairs, in the same order as [`Iter`].
pub struct IntoIter<V, const D: usize> {
    stack: Vec<IntoChildren<Slot<V, D>>>,
    remaining: usize,
}

impl<V, const D: usize> IntoIter<V, D> {
    pub(crate) fn new(root: Node<V, D>, len: usize) -> Self {
        let mut stack = Vec::with_capacity(MAX_FRAMES);
        stack.push(root.children.into_children());
        Self {
            stack,
            remaining: len,
        }
    }
}

impl<V, const D: usize> Iterator for IntoIter<V, D> {
    type Item = (PhPoint<D>, V);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(children) = self.stack.last_mut() {
            match children.next() {
                None => {
                    self.stack.pop();
                }
                Some(Slot::Leaf { key, value }) => {
                    self.remaining -= 1;
                    return Some((key, value));
                }
                Some(Slot::Node(child)) => self.stack.push(child.children.into_children()),
            }
        }
        None
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V, const D: usize> ExactSizeIterator for IntoIter<V, D> {}
impl<V, const D: usize> FusedIterator for IntoIter<V, D> {}

pub struct Keys<'a, V, const D: usize> {
    inner: Iter<'a, V, D>,
}

impl<'a, V, const D: usize> Keys<'a, V, D> {
    pub(crate) fn new(inner: Iter<'a, V, D>) -> Self {
        Self { inner }
    }
}

impl<'a, V, const D: usize> Iterator for Keys<'a, V, D> {
    type Item = &'a PhPoint<D>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V, const D: usize> ExactSizeIterator for Keys<'_, V, D> {}
impl<V, const D: usize> FusedIterator for Keys<'_, V, D> {}

pub struct Values<'a, V, const D: usize> {
    inner: Iter<'a, V, D>,
}

impl<'a, V, const D: usize> Values<'a, V, D> {
    pub(crate) fn new(inner: Iter<'a, V, D>) -> Self {
        Self { inner }
    }
}

impl<'a, V, const D: usize> Iterator for Values<'a, V, D> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V, const D: usize> ExactSizeIterator for Values<'_, V, D> {}
impl<V, const D: usize> FusedIterator for Values<'_, V, D> {}
