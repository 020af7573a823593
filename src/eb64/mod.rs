//! Trees keyed by 64-bit scalars, unsigned or signed.
//!
//! Everything works as in the 32-bit variant, over the wider key: the key
//! lives in its unsigned representation and the `_signed` operations walk
//! on the sign-flipped image so that negative keys sort first.

use core::{
    iter::FusedIterator,
    marker::PhantomData,
    ptr::{self, NonNull},
};
use crate::{
    bits::fls64,
    node::{walk_down, Node, RawIter, Root},
    tag::{Kind, Side, Troot},
};

#[cfg(test)]
mod tests;

const SIGN: u64 = 1 << 63;

/// A cell carrying a 64-bit key, to be embedded in a caller-owned record.
#[derive(Debug)]
#[repr(C)]
pub struct Eb64Node {
    pub(crate) node: Node,
    key: u64,
}

impl Eb64Node {
    /// Creates an unlinked cell carrying `key`.
    #[inline(always)]
    pub const fn new(key: u64) -> Self {
        Self {
            node: Node::new(),
            key,
        }
    }
    /// Creates an unlinked cell carrying the signed key `key`.
    #[inline(always)]
    pub const fn new_signed(key: i64) -> Self {
        Self::new(key as u64)
    }
    /// Returns the key.
    #[inline(always)]
    pub fn key(&self) -> u64 {
        self.key
    }
    /// Returns the key reinterpreted as signed.
    #[inline(always)]
    pub fn key_signed(&self) -> i64 {
        self.key as i64
    }
    /// Returns `true` while the cell is linked in a tree.
    #[inline(always)]
    pub fn is_linked(&self) -> bool {
        self.node.is_linked()
    }

    /// Returns the cell holding the next greater key, duplicates included
    /// in insertion order, or `None` from the last cell.
    ///
    /// # Safety
    /// `self` must be linked, and every cell of its tree live and unmoved.
    pub unsafe fn next(&self) -> Option<NonNull<Self>> {
        self.node.next().map(entry)
    }
    /// Returns the cell holding the next smaller key, duplicates included
    /// in reverse insertion order, or `None` from the first cell.
    ///
    /// # Safety
    /// `self` must be linked, and every cell of its tree live and unmoved.
    pub unsafe fn prev(&self) -> Option<NonNull<Self>> {
        self.node.prev().map(entry)
    }
    /// Like [`next`], but steps over the remaining duplicates of the key.
    ///
    /// # Safety
    /// `self` must be linked, and every cell of its tree live and unmoved.
    ///
    /// [`next`]: #method.next " "
    pub unsafe fn next_unique(&self) -> Option<NonNull<Self>> {
        self.node.next_unique().map(entry)
    }
    /// Like [`prev`], but lands on the last duplicate of the previous key.
    ///
    /// # Safety
    /// `self` must be linked, and every cell of its tree live and unmoved.
    ///
    /// [`prev`]: #method.prev " "
    pub unsafe fn prev_unique(&self) -> Option<NonNull<Self>> {
        self.node.prev_unique().map(entry)
    }
    /// Unlinks the cell from its tree in constant time; a no-op if it is
    /// not linked. Afterwards the cell may be dropped or inserted again.
    ///
    /// # Safety
    /// Every cell of the tree must be live and unmoved.
    pub unsafe fn delete(&mut self) {
        Node::delete(ptr::addr_of_mut!(self.node));
    }
}

#[inline(always)]
fn entry(node: NonNull<Node>) -> NonNull<Eb64Node> {
    node.cast::<Eb64Node>()
}

/// Returns the cell with the smallest key, or `None` on an empty tree.
///
/// # Safety
/// Every cell of the tree must be live and unmoved.
pub unsafe fn first(root: &Root) -> Option<NonNull<Eb64Node>> {
    root.first().map(entry)
}

/// Returns the cell with the greatest key, or `None` on an empty tree.
///
/// # Safety
/// Every cell of the tree must be live and unmoved.
pub unsafe fn last(root: &Root) -> Option<NonNull<Eb64Node>> {
    root.last().map(entry)
}

/// Links `new` into the tree, keeping unsigned key order.
///
/// Only the key needs to be set beforehand. Returns `new` once linked —
/// except in a unique-keys tree already holding the key, where the cell
/// already carrying it is returned instead and `new` stays unlinked.
///
/// # Safety
/// `new` must be unlinked and pinned for as long as it stays linked; every
/// cell of the tree must be live and unmoved; no other tree operation may
/// run concurrently.
pub unsafe fn insert(root: &mut Root, new: &mut Eb64Node) -> NonNull<Eb64Node> {
    insert_impl(root, new, false)
}

/// Links `new` into the tree, keeping signed key order.
///
/// Behaves like [`insert`] in every other respect. A tree must be fed
/// through only one of the two orderings over its lifetime.
///
/// # Safety
/// As for [`insert`].
///
/// [`insert`]: fn.insert.html " "
pub unsafe fn insert_signed(root: &mut Root, new: &mut Eb64Node) -> NonNull<Eb64Node> {
    insert_impl(root, new, true)
}

unsafe fn insert_impl(root: &mut Root, new: &mut Eb64Node, signed: bool) -> NonNull<Eb64Node> {
    let tree = root as *mut Root;
    let new = new as *mut Eb64Node;
    let unique = (*tree).is_unique();

    let newkey = (*new).key;
    let newkey_walk = if signed { newkey ^ SIGN } else { newkey };
    let new_branches = ptr::addr_of_mut!((*new).node.branches);

    let mut root = tree;
    let mut side = Side::Left;
    let mut troot = (*root).branch(Side::Left);
    if troot.is_null() {
        (*root).b[Side::Left as usize] = Troot::down(new_branches, Kind::Leaf);
        (*new).node.leaf_p = Troot::up(root, Side::Left);
        (*new).node.node_p = Troot::NULL;
        return NonNull::new_unchecked(new);
    }

    let mut old: *mut Eb64Node;
    let up_ptr: *mut Troot;
    loop {
        if troot.kind() == Kind::Leaf {
            old = troot.node_ptr().cast::<Eb64Node>();
            (*new).node.node_p = (*old).node.leaf_p;
            up_ptr = ptr::addr_of_mut!((*old).node.leaf_p);
            break;
        }

        old = troot.node_ptr().cast::<Eb64Node>();
        let old_bit = (*old).node.bit;

        // Either the keys part company above the discriminated bit, or a
        // duplicate sub-tree blocks the way; both mean inserting here.
        if old_bit < 0 || ((newkey ^ (*old).key) >> old_bit) >= 2 {
            (*new).node.node_p = (*old).node.node_p;
            up_ptr = ptr::addr_of_mut!((*old).node.node_p);
            break;
        }

        root = ptr::addr_of_mut!((*old).node.branches);
        side = Side::from_bit(((newkey_walk >> old_bit) & 1) as usize);
        troot = (*root).branch(side);
    }

    let new_left = Troot::up(new_branches, Side::Left);
    let new_rght = Troot::up(new_branches, Side::Right);
    let new_leaf = Troot::down(new_branches, Kind::Leaf);

    let oldkey = (*old).key;
    if newkey == oldkey {
        (*new).node.bit = -1;
        if unique {
            return NonNull::new_unchecked(old);
        }
        if troot.kind() != Kind::Leaf {
            let node = ptr::addr_of_mut!((*old).node);
            return Node::insert_dup(node, ptr::addr_of_mut!((*new).node)).cast::<Eb64Node>();
        }
    } else {
        (*new).node.bit = (fls64(newkey ^ oldkey) - 1) as i16;
    }

    let ge = if signed {
        newkey as i64 >= oldkey as i64
    } else {
        newkey >= oldkey
    };
    if ge {
        (*new).node.branches.b[Side::Left as usize] = troot;
        (*new).node.branches.b[Side::Right as usize] = new_leaf;
        (*new).node.leaf_p = new_rght;
        *up_ptr = new_left;
    } else {
        (*new).node.branches.b[Side::Left as usize] = new_leaf;
        (*new).node.branches.b[Side::Right as usize] = troot;
        (*new).node.leaf_p = new_left;
        *up_ptr = new_rght;
    }

    (*root).b[side as usize] = Troot::down(new_branches, Kind::Node);
    NonNull::new_unchecked(new)
}

/// Returns the oldest cell carrying exactly `x`, or `None`.
///
/// # Safety
/// Every cell of the tree must be live and unmoved.
pub unsafe fn lookup(root: &Root, x: u64) -> Option<NonNull<Eb64Node>> {
    lookup_impl(root, x, x)
}

/// Returns the oldest cell carrying exactly the signed key `x`, or `None`.
///
/// # Safety
/// Every cell of the tree must be live and unmoved.
pub unsafe fn lookup_signed(root: &Root, x: i64) -> Option<NonNull<Eb64Node>> {
    lookup_impl(root, x as u64, x as u64 ^ SIGN)
}

unsafe fn lookup_impl(root: &Root, x: u64, walk: u64) -> Option<NonNull<Eb64Node>> {
    let mut troot = root.branch(Side::Left);
    if troot.is_null() {
        return None;
    }

    loop {
        if troot.kind() == Kind::Leaf {
            let node = troot.node_ptr().cast::<Eb64Node>();
            return if (*node).key == x {
                Some(NonNull::new_unchecked(node))
            } else {
                None
            };
        }
        let node = troot.node_ptr().cast::<Eb64Node>();
        let node_bit = (*node).node.bit;

        let y = (*node).key ^ x;
        if y == 0 {
            // on a duplicate sub-tree the oldest entry is leftmost
            if node_bit < 0 {
                troot = (*node).node.branches.branch(Side::Left);
                while troot.kind() != Kind::Leaf {
                    troot = (*troot.root_ptr()).branch(Side::Left);
                }
                return Some(NonNull::new_unchecked(troot.node_ptr().cast::<Eb64Node>()));
            }
            return Some(NonNull::new_unchecked(node));
        }

        if node_bit < 0 {
            return None;
        }
        if (y >> node_bit) >= 2 {
            return None; // no common bits above the discriminated one
        }

        troot = (*node)
            .node
            .branches
            .branch(Side::from_bit(((walk >> node_bit) & 1) as usize));
    }
}

/// Returns the newest cell with the greatest key not above `x`, or `None`.
///
/// # Safety
/// Every cell of the tree must be live and unmoved.
pub unsafe fn lookup_le(root: &Root, x: u64) -> Option<NonNull<Eb64Node>> {
    lookup_le_impl(root, x, false)
}

/// Signed-order counterpart of [`lookup_le`].
///
/// # Safety
/// Every cell of the tree must be live and unmoved.
///
/// [`lookup_le`]: fn.lookup_le.html " "
pub unsafe fn lookup_le_signed(root: &Root, x: i64) -> Option<NonNull<Eb64Node>> {
    lookup_le_impl(root, x as u64, true)
}

unsafe fn lookup_le_impl(root: &Root, x: u64, signed: bool) -> Option<NonNull<Eb64Node>> {
    let bias = if signed { SIGN } else { 0 };
    let walk = x ^ bias;
    let mut troot = root.branch(Side::Left);
    if troot.is_null() {
        return None;
    }

    loop {
        if troot.kind() == Kind::Leaf {
            let node = troot.node_ptr().cast::<Eb64Node>();
            if (*node).key ^ bias <= walk {
                return Some(NonNull::new_unchecked(node));
            }
            troot = (*node).node.leaf_p;
            break;
        }
        let node = troot.node_ptr().cast::<Eb64Node>();
        let node_bit = (*node).node.bit;

        if node_bit < 0 {
            if (*node).key ^ bias <= walk {
                // matched: the newest duplicate is the rightmost leaf
                troot = (*node).node.branches.branch(Side::Right);
                while troot.kind() != Kind::Leaf {
                    troot = (*troot.root_ptr()).branch(Side::Right);
                }
                return Some(NonNull::new_unchecked(troot.node_ptr().cast::<Eb64Node>()));
            }
            troot = (*node).node.node_p;
            break;
        }

        if ((x ^ (*node).key) >> node_bit) >= 2 {
            // the subtree sits entirely on one side of <x>
            if ((*node).key ^ bias) >> node_bit < walk >> node_bit {
                troot = (*node).node.branches.branch(Side::Right);
                return walk_down(troot, Side::Right).map(entry);
            }
            troot = (*node).node.node_p;
            break;
        }
        troot = (*node)
            .node
            .branches
            .branch(Side::from_bit(((walk >> node_bit) & 1) as usize));
    }

    // climb until an ancestor is reached from the right; the previous key
    // is the rightmost leaf across it
    while troot.side() == Side::Left {
        if (*troot.root_ptr()).branch(Side::Right).is_null() {
            return None;
        }
        troot = (*troot.node_ptr()).node_p;
    }
    troot = (*troot.root_ptr()).branch(Side::Left);
    walk_down(troot, Side::Right).map(entry)
}

/// Returns the oldest cell with the smallest key not below `x`, or `None`.
///
/// # Safety
/// Every cell of the tree must be live and unmoved.
pub unsafe fn lookup_ge(root: &Root, x: u64) -> Option<NonNull<Eb64Node>> {
    lookup_ge_impl(root, x, false)
}

/// Signed-order counterpart of [`lookup_ge`].
///
/// # Safety
/// Every cell of the tree must be live and unmoved.
///
/// [`lookup_ge`]: fn.lookup_ge.html " "
pub unsafe fn lookup_ge_signed(root: &Root, x: i64) -> Option<NonNull<Eb64Node>> {
    lookup_ge_impl(root, x as u64, true)
}

unsafe fn lookup_ge_impl(root: &Root, x: u64, signed: bool) -> Option<NonNull<Eb64Node>> {
    let bias = if signed { SIGN } else { 0 };
    let walk = x ^ bias;
    let mut troot = root.branch(Side::Left);
    if troot.is_null() {
        return None;
    }

    loop {
        if troot.kind() == Kind::Leaf {
            let node = troot.node_ptr().cast::<Eb64Node>();
            if (*node).key ^ bias >= walk {
                return Some(NonNull::new_unchecked(node));
            }
            troot = (*node).node.leaf_p;
            break;
        }
        let node = troot.node_ptr().cast::<Eb64Node>();
        let node_bit = (*node).node.bit;

        if node_bit < 0 {
            if (*node).key ^ bias >= walk {
                // matched: the oldest duplicate is the leftmost leaf
                troot = (*node).node.branches.branch(Side::Left);
                while troot.kind() != Kind::Leaf {
                    troot = (*troot.root_ptr()).branch(Side::Left);
                }
                return Some(NonNull::new_unchecked(troot.node_ptr().cast::<Eb64Node>()));
            }
            troot = (*node).node.node_p;
            break;
        }

        if ((x ^ (*node).key) >> node_bit) >= 2 {
            if ((*node).key ^ bias) >> node_bit > walk >> node_bit {
                troot = (*node).node.branches.branch(Side::Left);
                return walk_down(troot, Side::Left).map(entry);
            }
            troot = (*node).node.node_p;
            break;
        }
        troot = (*node)
            .node
            .branches
            .branch(Side::from_bit(((walk >> node_bit) & 1) as usize));
    }

    // climb until an ancestor is reached from the left; the next key is
    // the leftmost leaf across it
    while troot.side() != Side::Left {
        troot = (*troot.node_ptr()).node_p;
    }
    troot = (*troot.root_ptr()).branch(Side::Right);
    if troot.is_null() {
        return None;
    }
    walk_down(troot, Side::Left).map(entry)
}

/// An iterator over the cells of a tree in unsigned key order, duplicates
/// in insertion order. Created by [`iter`].
///
/// [`iter`]: fn.iter.html " "
#[derive(Debug)]
pub struct Iter<'a> {
    inner: RawIter,
    _tree: PhantomData<&'a Root>,
}

/// Iterates over the tree in unsigned key order.
///
/// The iterator borrows the root shared, so the mutating operations of
/// this module cannot be called on the same tree while it lives.
///
/// # Safety
/// Every cell of the tree must be live, unmoved, and not mutated through
/// other handles while the iterator is in use.
pub unsafe fn iter(root: &Root) -> Iter<'_> {
    Iter {
        inner: RawIter::new(root),
        _tree: PhantomData,
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Eb64Node;

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: liveness is upheld by the contract of `iter`
        unsafe { self.inner.step().map(|n| &*(n.as_ptr() as *const Eb64Node)) }
    }
}
impl FusedIterator for Iter<'_> {}
