use std::cmp::Ordering;
use std::fmt;
use std::iter::FromIterator;
use std::marker::PhantomData;
use std::mem;

use crate::compare::{Compare, Natural};
use crate::error::InvariantViolation;
use crate::iter::{IntoIter, Iter, NodeRef};
use crate::node::{self, Link, Node, NodePtr};

/// An ordered collection of unique values, kept in an AVL tree.
///
/// Values are ordered by the comparator `C` given at construction, [`Natural`]
/// (that is, `T: Ord`) by default. Two values the comparator calls equal occupy
/// one slot: inserting the second replaces the first.
///
/// ```
/// use avl_threaded::Tree;
/// let mut tree = Tree::new();
/// assert_eq!(tree.insert(5), None);
/// assert_eq!(tree.insert(6), None);
/// assert_eq!(tree.insert(5), Some(5));
/// assert_eq!(tree.len(), 2);
///
/// let mut node = tree.min();
/// while let Some(n) = node {
///     println!("{}", n.value());
///     node = n.next();
/// }
/// ```
pub struct Tree<T, C = Natural> {
    root: Link<T>,
    num_nodes: usize,
    compare: C,
    marker: PhantomData<Box<Node<T>>>,
}

#[allow(clippy::enum_variant_names)]
enum Direction {
    FromParent,
    FromLeft,
    FromRight,
}

// SAFETY: nodes are owned by the tree alone, and node pointers only leave the
// tree inside borrows of it.
unsafe impl<T: Send, C: Send> Send for Tree<T, C> {}
unsafe impl<T: Sync, C: Sync> Sync for Tree<T, C> {}

impl<T: Ord> Tree<T> {
    /// Creates an empty tree ordered by `T: Ord`.
    /// No memory is allocated until the first value is inserted.
    pub fn new() -> Self {
        Self::with_comparator(Natural)
    }
}

impl<T, C> Tree<T, C> {
    /// Returns true if the tree contains no values.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of values in the tree.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    /// Returns the number of edges on the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(node_ptr) = current {
            let node = unsafe { node_ptr.as_ref() };
            let a = if node.balance > 0 { 1 } else { 0 };
            current = node.children[a];
            if current.is_some() {
                height += 1;
            }
        }
        height
    }

    /// Returns the comparator the tree is ordered by.
    pub fn comparator(&self) -> &C {
        &self.compare
    }

    /// Clears the tree, deallocating all memory.
    pub fn clear(&mut self) {
        // Detach first: if a value's drop panics, the rest leaks instead of
        // staying reachable from the tree.
        let freed = mem::replace(&mut self.num_nodes, 0);
        let root = self.root.take();
        Self::postorder(root, |node_ptr| drop(unsafe { Node::destroy(node_ptr) }));
        if freed > 0 {
            tracing::debug!(nodes = freed, "cleared tree");
        }
    }

    /// Returns the node holding the smallest value.
    pub fn min(&self) -> Option<NodeRef<'_, T>> {
        self.bottom(0)
    }

    /// Returns the node holding the largest value.
    pub fn max(&self) -> Option<NodeRef<'_, T>> {
        self.bottom(1)
    }

    /// Returns the smallest value.
    pub fn first(&self) -> Option<&T> {
        self.min().map(|node| node.value())
    }

    /// Returns the largest value.
    pub fn last(&self) -> Option<&T> {
        self.max().map(|node| node.value())
    }

    /// Removes and returns the smallest value.
    pub fn pop_first(&mut self) -> Option<T> {
        self.pop_extreme(0)
    }

    /// Removes and returns the largest value.
    pub fn pop_last(&mut self) -> Option<T> {
        self.pop_extreme(1)
    }

    /// Gets an iterator over the values in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        match self.root {
            None => Iter::new(None, None, 0),
            Some(root_ptr) => unsafe {
                Iter::new(
                    Some(node::extreme(root_ptr, 0)),
                    Some(node::extreme(root_ptr, 1)),
                    self.num_nodes,
                )
            },
        }
    }

    fn bottom(&self, a: usize) -> Option<NodeRef<'_, T>> {
        self.root
            .map(|root_ptr| NodeRef::new(unsafe { node::extreme(root_ptr, a) }))
    }

    fn pop_extreme(&mut self, a: usize) -> Option<T> {
        let root_ptr = self.root?;
        let (value, _) = unsafe { remove_extreme(a, &mut self.root, root_ptr) };
        debug_assert!(self.num_nodes >= 1);
        self.num_nodes -= 1;
        Some(value)
    }

    fn postorder<F: FnMut(NodePtr<T>)>(root: Link<T>, mut visit: F) {
        if let Some(mut node_ptr) = root {
            let mut dir = Direction::FromParent;
            loop {
                match dir {
                    Direction::FromParent => {
                        if let Some(left_ptr) = unsafe { node_ptr.as_ref().children[0] } {
                            node_ptr = left_ptr;
                        } else {
                            dir = Direction::FromLeft;
                        }
                    }
                    Direction::FromLeft => {
                        if let Some(right_ptr) = unsafe { node_ptr.as_ref().children[1] } {
                            node_ptr = right_ptr;
                            dir = Direction::FromParent;
                        } else {
                            dir = Direction::FromRight;
                        }
                    }
                    Direction::FromRight => {
                        // The visitor may free the node, so read its links first.
                        if let Some(parent_ptr) = unsafe { node_ptr.as_ref().parent } {
                            if Some(node_ptr) == unsafe { parent_ptr.as_ref().children[0] } {
                                dir = Direction::FromLeft;
                            } else {
                                dir = Direction::FromRight;
                            }
                            visit(node_ptr);
                            node_ptr = parent_ptr;
                        } else {
                            visit(node_ptr);
                            break;
                        }
                    }
                }
            }
        }
    }
}

impl<T, C: Compare<T>> Tree<T, C> {
    /// Creates an empty tree ordered by `compare`.
    pub fn with_comparator(compare: C) -> Self {
        Self {
            root: None,
            num_nodes: 0,
            compare,
            marker: PhantomData,
        }
    }

    /// Returns the stored value that compares equal to `value`.
    pub fn get(&self, value: &T) -> Option<&T> {
        self.find(value)
            .map(|node_ptr| &unsafe { &*node_ptr.as_ptr() }.value)
    }

    /// Returns true if the tree holds a value that compares equal to `value`.
    pub fn contains(&self, value: &T) -> bool {
        self.find(value).is_some()
    }

    /// Inserts a value into the tree.
    ///
    /// If an equal value is already stored it is replaced, and the old value is
    /// returned. The number of values only grows when `None` is returned.
    pub fn insert(&mut self, value: T) -> Option<T> {
        let (replaced, _) = unsafe { insert_at(&self.compare, None, &mut self.root, value) };
        if replaced.is_none() {
            self.num_nodes += 1;
        }
        replaced
    }

    /// Removes the value that compares equal to `value`.
    /// Returns the removed value if there was one.
    pub fn remove(&mut self, value: &T) -> Option<T> {
        let (removed, _) = unsafe { remove_at(&self.compare, &mut self.root, value) };
        if removed.is_some() {
            debug_assert!(self.num_nodes >= 1);
            self.num_nodes -= 1;
        }
        removed
    }

    /// Checks every structural invariant of the tree.
    ///
    /// Returns the first violation found: parent links, balance factors against
    /// recomputed heights, strict in-order ascent under the comparator, and the
    /// recorded length.
    pub fn validate(&self) -> Result<(), InvariantViolation> {
        let root_ptr = match self.root {
            None if self.num_nodes == 0 => return Ok(()),
            None => {
                return Err(InvariantViolation::LenMismatch {
                    recorded: self.num_nodes,
                    counted: 0,
                })
            }
            Some(root_ptr) => root_ptr,
        };

        unsafe {
            if root_ptr.as_ref().parent.is_some() {
                return Err(InvariantViolation::RootHasParent);
            }
            check_subtree(root_ptr)?;

            let mut counted = 1;
            let mut prev_ptr = node::extreme(root_ptr, 0);
            while let Some(next_ptr) = node::step(prev_ptr, 1) {
                let order = self
                    .compare
                    .compare(&prev_ptr.as_ref().value, &next_ptr.as_ref().value);
                if order != Ordering::Less {
                    return Err(InvariantViolation::OutOfOrder { position: counted });
                }
                counted += 1;
                prev_ptr = next_ptr;
            }

            if counted != self.num_nodes {
                return Err(InvariantViolation::LenMismatch {
                    recorded: self.num_nodes,
                    counted,
                });
            }
        }
        Ok(())
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        if let Err(violation) = self.validate() {
            panic!("inconsistent tree: {violation}");
        }
    }

    fn find(&self, value: &T) -> Link<T> {
        let mut current = self.root;
        while let Some(node_ptr) = current {
            current = unsafe {
                match self.compare.compare(value, &node_ptr.as_ref().value) {
                    Ordering::Equal => break,
                    Ordering::Less => node_ptr.as_ref().children[0],
                    Ordering::Greater => node_ptr.as_ref().children[1],
                }
            }
        }
        current
    }
}

/// Inserts `value` below `slot`, whose owner is `parent`.
///
/// Returns the value replaced by an equal one and whether the subtree held by
/// `slot` grew by one level.
unsafe fn insert_at<T, C: Compare<T>>(
    compare: &C,
    parent: Link<T>,
    slot: &mut Link<T>,
    value: T,
) -> (Option<T>, bool) {
    let mut node_ptr = match *slot {
        None => {
            *slot = Some(Node::create(parent, value));
            return (None, true);
        }
        Some(node_ptr) => node_ptr,
    };

    let c = match compare.compare(&value, &node_ptr.as_ref().value) {
        Ordering::Equal => {
            let old = mem::replace(&mut node_ptr.as_mut().value, value);
            return (Some(old), false);
        }
        Ordering::Less => -1,
        Ordering::Greater => 1,
    };

    let child_slot = &mut node_ptr.as_mut().children[node::side(c)];
    let (replaced, grew) = insert_at(compare, Some(node_ptr), child_slot, value);
    if !grew {
        return (replaced, false);
    }
    let (root_ptr, grew) = insert_fix(c, node_ptr);
    *slot = Some(root_ptr);
    (replaced, grew)
}

/// Restores balance at `s` after its subtree on side `c` grew.
/// Returns the new subtree root and whether the subtree grew.
unsafe fn insert_fix<T>(c: i8, mut s: NodePtr<T>) -> (NodePtr<T>, bool) {
    let balance = s.as_ref().balance;
    if balance == 0 {
        s.as_mut().balance = c;
        return (s, true);
    }
    if balance == -c {
        s.as_mut().balance = 0;
        return (s, false);
    }

    // A rotation puts the subtree back at its height before the insert.
    if node::heavy_child_balance(s, c) == c {
        (node::single_rotate(c, s), false)
    } else {
        (node::double_rotate(c, s), false)
    }
}

/// Removes the value equal to `value` from the subtree held by `slot`.
///
/// Returns the removed value and whether the subtree shrank by one level.
unsafe fn remove_at<T, C: Compare<T>>(
    compare: &C,
    slot: &mut Link<T>,
    value: &T,
) -> (Option<T>, bool) {
    let mut node_ptr = match *slot {
        None => return (None, false),
        Some(node_ptr) => node_ptr,
    };

    let c = match compare.compare(value, &node_ptr.as_ref().value) {
        Ordering::Less => -1,
        Ordering::Greater => 1,
        Ordering::Equal => {
            let Some(right_ptr) = node_ptr.as_ref().children[1] else {
                let left = node_ptr.as_ref().children[0];
                if let Some(mut left_ptr) = left {
                    left_ptr.as_mut().parent = node_ptr.as_ref().parent;
                }
                *slot = left;
                return (Some(Node::destroy(node_ptr)), true);
            };

            // The successor's value moves up, the successor's node goes away.
            let right_slot = &mut node_ptr.as_mut().children[1];
            let (successor, shrank) = remove_extreme(0, right_slot, right_ptr);
            let removed = mem::replace(&mut node_ptr.as_mut().value, successor);
            if !shrank {
                return (Some(removed), false);
            }
            let (root_ptr, shrank) = remove_fix(-1, node_ptr);
            *slot = Some(root_ptr);
            return (Some(removed), shrank);
        }
    };

    let child_slot = &mut node_ptr.as_mut().children[node::side(c)];
    let (removed, shrank) = remove_at(compare, child_slot, value);
    if !shrank {
        return (removed, false);
    }
    let (root_ptr, shrank) = remove_fix(-c, node_ptr);
    *slot = Some(root_ptr);
    (removed, shrank)
}

/// Unlinks the outermost node on side `a` of the subtree rooted at `node_ptr`,
/// which is held by `slot`: the minimum for `a == 0`, the maximum for `a == 1`.
///
/// Returns its value and whether the subtree shrank by one level.
unsafe fn remove_extreme<T>(a: usize, slot: &mut Link<T>, mut node_ptr: NodePtr<T>) -> (T, bool) {
    let Some(child_ptr) = node_ptr.as_ref().children[a] else {
        let other = node_ptr.as_ref().children[a ^ 1];
        if let Some(mut other_ptr) = other {
            other_ptr.as_mut().parent = node_ptr.as_ref().parent;
        }
        *slot = other;
        return (Node::destroy(node_ptr), true);
    };

    let child_slot = &mut node_ptr.as_mut().children[a];
    let (value, shrank) = remove_extreme(a, child_slot, child_ptr);
    if !shrank {
        return (value, false);
    }
    let c = if a == 0 { 1 } else { -1 };
    let (root_ptr, shrank) = remove_fix(c, node_ptr);
    *slot = Some(root_ptr);
    (value, shrank)
}

/// Restores balance at `s` after its subtree opposite to side `c` shrank.
/// Returns the new subtree root and whether the subtree shrank.
unsafe fn remove_fix<T>(c: i8, mut s: NodePtr<T>) -> (NodePtr<T>, bool) {
    let balance = s.as_ref().balance;
    if balance == 0 {
        s.as_mut().balance = c;
        return (s, false);
    }
    if balance == -c {
        s.as_mut().balance = 0;
        return (s, true);
    }

    match node::heavy_child_balance(s, c) {
        0 => {
            // The demoted node keeps its lean and the height is unchanged.
            tracing::trace!(direction = c, "rotation without height change");
            let mut r = node::rotate(c, s);
            r.as_mut().balance = -c;
            (r, false)
        }
        b if b == c => (node::single_rotate(c, s), true),
        _ => (node::double_rotate(c, s), true),
    }
}

/// Returns the height in levels of the subtree at `node_ptr`, or the first
/// broken link or balance factor found below it.
unsafe fn check_subtree<T>(node_ptr: NodePtr<T>) -> Result<isize, InvariantViolation> {
    let mut heights = [0isize; 2];
    for (a, height) in heights.iter_mut().enumerate() {
        if let Some(child_ptr) = node_ptr.as_ref().children[a] {
            if child_ptr.as_ref().parent != Some(node_ptr) {
                return Err(InvariantViolation::BrokenParentLink { side: a });
            }
            *height = check_subtree(child_ptr)?;
        }
    }

    let difference = heights[1] - heights[0];
    if difference.abs() > 1 {
        return Err(InvariantViolation::Unbalanced { difference });
    }
    let stored = node_ptr.as_ref().balance;
    if stored as isize != difference {
        return Err(InvariantViolation::BalanceMismatch {
            stored,
            actual: difference,
        });
    }
    Ok(1 + heights[0].max(heights[1]))
}

unsafe fn clone_subtree<T: Clone>(node_ptr: NodePtr<T>, parent: Link<T>) -> NodePtr<T> {
    let node = node_ptr.as_ref();
    let mut copy_ptr = Node::create(parent, node.value.clone());
    copy_ptr.as_mut().balance = node.balance;
    for (a, child) in node.children.iter().enumerate() {
        if let Some(child_ptr) = *child {
            copy_ptr.as_mut().children[a] = Some(clone_subtree(child_ptr, Some(copy_ptr)));
        }
    }
    copy_ptr
}

impl<T, C> Drop for Tree<T, C> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T, C: Compare<T> + Default> Default for Tree<T, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<T: Clone, C: Clone> Clone for Tree<T, C> {
    fn clone(&self) -> Self {
        Self {
            root: self
                .root
                .map(|root_ptr| unsafe { clone_subtree(root_ptr, None) }),
            num_nodes: self.num_nodes,
            compare: self.compare.clone(),
            marker: PhantomData,
        }
    }
}

impl<T: fmt::Debug, C> fmt::Debug for Tree<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, C: Compare<T> + Default> FromIterator<T> for Tree<T, C> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = Self::default();
        tree.extend(iter);
        tree
    }
}

impl<T, C: Compare<T>> Extend<T> for Tree<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<'a, T, C> IntoIterator for &'a Tree<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, C> IntoIterator for Tree<T, C> {
    type Item = T;
    type IntoIter = IntoIter<T, C>;
    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}
