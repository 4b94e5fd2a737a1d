//! The total order a tree is built on.

use std::cmp::Ordering;

/// A total order over `T`.
///
/// One comparator is fixed for the lifetime of a tree. It must be consistent:
/// antisymmetric, transitive and stable for every value ever stored in the same
/// tree. An inconsistent order does not cause undefined behavior, but the tree
/// may panic or stop finding values.
///
/// Any `Fn(&T, &T) -> Ordering` is a comparator:
///
/// ```
/// use avl_threaded::Tree;
/// let mut tree = Tree::with_comparator(|a: &i32, b: &i32| b.cmp(a));
/// tree.insert(1);
/// tree.insert(2);
/// assert_eq!(tree.first(), Some(&2));
/// ```
pub trait Compare<T: ?Sized> {
    /// Compares `a` against `b`.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T: ?Sized, F> Compare<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// The order given by `T: Ord`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Natural;

impl<T: Ord + ?Sized> Compare<T> for Natural {
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}
