use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::node::{self, Link, Node, NodePtr};
use crate::tree::Tree;

/// A handle to one node of a tree, for stepping through it in order.
///
/// Obtained from [`Tree::min`] or [`Tree::max`]. The handle borrows the tree,
/// so the tree cannot change while it is alive.
///
/// ```
/// use avl_threaded::Tree;
/// let tree: Tree<_> = [3, 1, 2].into_iter().collect();
/// let mut down = Vec::new();
/// let mut node = tree.max();
/// while let Some(n) = node {
///     down.push(*n.value());
///     node = n.prev();
/// }
/// assert_eq!(down, [3, 2, 1]);
/// ```
pub struct NodeRef<'a, T> {
    node_ptr: NodePtr<T>,
    marker: PhantomData<&'a Node<T>>,
}

impl<'a, T> NodeRef<'a, T> {
    pub(crate) fn new(node_ptr: NodePtr<T>) -> Self {
        Self {
            node_ptr,
            marker: PhantomData,
        }
    }

    /// Returns the value stored in this node.
    pub fn value(&self) -> &'a T {
        &unsafe { &*self.node_ptr.as_ptr() }.value
    }

    /// Returns the node holding the next smaller value.
    pub fn prev(&self) -> Option<NodeRef<'a, T>> {
        self.walk(0)
    }

    /// Returns the node holding the next larger value.
    pub fn next(&self) -> Option<NodeRef<'a, T>> {
        self.walk(1)
    }

    fn walk(&self, a: usize) -> Option<NodeRef<'a, T>> {
        unsafe { node::step(self.node_ptr, a) }.map(NodeRef::new)
    }
}

// Auto derived clone would require T: Clone
impl<T> Clone for NodeRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeRef<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for NodeRef<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef").field(self.value()).finish()
    }
}

// SAFETY: a handle only reads through a shared borrow of the tree.
unsafe impl<T: Sync> Send for NodeRef<'_, T> {}
unsafe impl<T: Sync> Sync for NodeRef<'_, T> {}

/// An iterator over the values of a tree in ascending order.
pub struct Iter<'a, T> {
    front: Link<T>,
    back: Link<T>,
    remaining: usize,
    marker: PhantomData<&'a Node<T>>,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(front: Link<T>, back: Link<T>, remaining: usize) -> Self {
        Self {
            front,
            back,
            remaining,
            marker: PhantomData,
        }
    }
}

// Auto derived clone would require T: Clone
impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self::new(self.front, self.back, self.remaining)
    }
}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node_ptr = self.front?;
        self.remaining -= 1;
        self.front = unsafe { node::step(node_ptr, 1) };
        Some(&unsafe { &*node_ptr.as_ptr() }.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node_ptr = self.back?;
        self.remaining -= 1;
        self.back = unsafe { node::step(node_ptr, 0) };
        Some(&unsafe { &*node_ptr.as_ptr() }.value)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

// SAFETY: same as for `NodeRef`.
unsafe impl<T: Sync> Send for Iter<'_, T> {}
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

/// An owning iterator over the values of a tree in ascending order.
pub struct IntoIter<T, C> {
    tree: Tree<T, C>,
}

impl<T, C> IntoIter<T, C> {
    pub(crate) fn new(tree: Tree<T, C>) -> Self {
        Self { tree }
    }
}

impl<T: fmt::Debug, C> fmt::Debug for IntoIter<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tree.iter()).finish()
    }
}

impl<T, C> Iterator for IntoIter<T, C> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.tree.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.tree.len(), Some(self.tree.len()))
    }
}

impl<T, C> DoubleEndedIterator for IntoIter<T, C> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.tree.pop_last()
    }
}

impl<T, C> ExactSizeIterator for IntoIter<T, C> {}

impl<T, C> FusedIterator for IntoIter<T, C> {}
