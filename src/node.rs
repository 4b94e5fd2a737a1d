use std::ptr::NonNull;

pub(crate) type NodePtr<T> = NonNull<Node<T>>;
pub(crate) type Link<T> = Option<NodePtr<T>>;

/// A tree node.
///
/// `children` own the subtrees, `parent` is a plain back pointer that is only
/// read for traversal and never used to free a node.
/// `balance` is height(children[1]) - height(children[0]) and stays in -1..=1
/// outside of a running fix-up.
pub(crate) struct Node<T> {
    pub(crate) value: T,
    pub(crate) children: [Link<T>; 2],
    pub(crate) parent: Link<T>,
    pub(crate) balance: i8,
}

impl<T> Node<T> {
    pub(crate) fn create(parent: Link<T>, value: T) -> NodePtr<T> {
        let boxed = Box::new(Node {
            value,
            children: [None, None],
            parent,
            balance: 0,
        });
        unsafe { NodePtr::new_unchecked(Box::into_raw(boxed)) }
    }

    /// Frees the node and hands back its value.
    ///
    /// The node must already be unlinked from the tree.
    pub(crate) unsafe fn destroy(node_ptr: NodePtr<T>) -> T {
        Box::from_raw(node_ptr.as_ptr()).value
    }
}

/// Maps a direction (-1 or +1) to a child index (0 or 1).
#[inline]
pub(crate) fn side(c: i8) -> usize {
    debug_assert!(c == -1 || c == 1);
    ((c + 1) / 2) as usize
}

/// Returns the child of `node_ptr` on the side of direction `c`.
///
/// Only called where the balance factor guarantees the child exists.
unsafe fn heavy_child<T>(node_ptr: NodePtr<T>, c: i8) -> NodePtr<T> {
    match node_ptr.as_ref().children[side(c)] {
        Some(child_ptr) => child_ptr,
        None => panic!("balance factor {c} points at a missing child"),
    }
}

/// Returns the balance factor of the child of `node_ptr` on the side of `c`.
pub(crate) unsafe fn heavy_child_balance<T>(node_ptr: NodePtr<T>, c: i8) -> i8 {
    heavy_child(node_ptr, c).as_ref().balance
}

/// Promotes the child of `s` on the side of `c` into the place of `s`.
///
/// Rewrites the links among `s`, the promoted node and the subtree that moves
/// between them, and returns the new subtree root. The link that used to own `s`
/// is left to the caller.
pub(crate) unsafe fn rotate<T>(c: i8, mut s: NodePtr<T>) -> NodePtr<T> {
    let a = side(c);
    let mut r = heavy_child(s, c);

    let inner = r.as_ref().children[a ^ 1];
    s.as_mut().children[a] = inner;
    if let Some(mut inner_ptr) = inner {
        inner_ptr.as_mut().parent = Some(s);
    }

    r.as_mut().children[a ^ 1] = Some(s);
    r.as_mut().parent = s.as_ref().parent;
    s.as_mut().parent = Some(r);
    r
}

/// Rotation for a straight imbalance: `s` and its child lean the same way.
pub(crate) unsafe fn single_rotate<T>(c: i8, mut s: NodePtr<T>) -> NodePtr<T> {
    tracing::trace!(direction = c, "single rotation");
    s.as_mut().balance = 0;
    let mut r = rotate(c, s);
    r.as_mut().balance = 0;
    r
}

/// Rotation for a zig-zag imbalance: the child of `s` leans against `s`.
///
/// Panics if the two demoted nodes do not end up below the new root, which can
/// only happen after an earlier corruption of the tree.
pub(crate) unsafe fn double_rotate<T>(c: i8, mut s: NodePtr<T>) -> NodePtr<T> {
    tracing::trace!(direction = c, "double rotation");
    let a = side(c);
    let mut r = heavy_child(s, c);
    s.as_mut().children[a] = Some(rotate(-c, r));
    let mut p = rotate(c, s);
    if r.as_ref().parent != Some(p) || s.as_ref().parent != Some(p) {
        panic!("double rotation left inconsistent parent links");
    }

    // The old grandchild's lean says which of the two demoted nodes is short.
    let (s_balance, r_balance) = match p.as_ref().balance {
        b if b == c => (-c, 0),
        b if b == -c => (0, c),
        _ => (0, 0),
    };
    s.as_mut().balance = s_balance;
    r.as_mut().balance = r_balance;
    p.as_mut().balance = 0;
    p
}

/// Returns the in-order neighbour of `node_ptr`: the successor for `a == 1`,
/// the predecessor for `a == 0`.
///
/// Walks down into the subtree on side `a` when there is one, otherwise climbs
/// the parent links until arriving from the other side.
pub(crate) unsafe fn step<T>(mut node_ptr: NodePtr<T>, a: usize) -> Link<T> {
    if let Some(child_ptr) = node_ptr.as_ref().children[a] {
        return Some(extreme(child_ptr, a ^ 1));
    }

    let mut parent = node_ptr.as_ref().parent;
    while let Some(parent_ptr) = parent {
        if parent_ptr.as_ref().children[a] != Some(node_ptr) {
            break;
        }
        node_ptr = parent_ptr;
        parent = parent_ptr.as_ref().parent;
    }
    parent
}

/// Descends from `node_ptr` along side `a` as far as possible.
pub(crate) unsafe fn extreme<T>(mut node_ptr: NodePtr<T>, a: usize) -> NodePtr<T> {
    while let Some(child_ptr) = node_ptr.as_ref().children[a] {
        node_ptr = child_ptr;
    }
    node_ptr
}
