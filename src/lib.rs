//! An ordered collection of unique values stored in an AVL tree.
//!
//! Every node keeps a balance factor (the height of its higher subtree minus the
//! height of its lower one) in `-1..=1`. Insertion and removal restore it with at
//! most one single or double rotation per level on the way back up, and stop as
//! soon as a subtree's height is known to be unchanged.
//!
//! Nodes also link to their parent. [`NodeRef::next`] and [`NodeRef::prev`]
//! use these links to walk the tree in order without a stack.
//!
//! ```
//! use avl_threaded::Tree;
//! let mut tree = Tree::new();
//! for x in [3, 1, 4, 1, 5] {
//!     tree.insert(x);
//! }
//! assert_eq!(tree.len(), 4);
//! assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [1, 3, 4, 5]);
//! assert_eq!(tree.remove(&4), Some(4));
//! assert_eq!(tree.get(&4), None);
//! ```

mod compare;
mod error;
mod iter;
mod node;
mod tree;

pub use compare::{Compare, Natural};
pub use error::InvariantViolation;
pub use iter::{IntoIter, Iter, NodeRef};
pub use tree::Tree;
