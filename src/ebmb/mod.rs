//! Trees keyed by fixed-width byte blocks.
//!
//! Keys compare in memcmp order. Unlike the scalar variants, a node's
//! `bit` does not name a bit position inside a word but the count of
//! leading bits its two children share; descent samples the key bit right
//! after the shared prefix. All cells of one tree carry the same width
//! `N`, which may not exceed 4095 bytes so the count fits the header.

use core::{
    iter::FusedIterator,
    marker::PhantomData,
    ptr::{self, NonNull},
};
use crate::{
    bits::{equal_bits, get_bit},
    node::{Node, RawIter, Root},
    tag::{Kind, Side, Troot},
};

#[cfg(test)]
mod tests;

/// A cell carrying an `N`-byte key, to be embedded in a caller-owned
/// record.
#[derive(Debug)]
#[repr(C)]
pub struct EbMbNode<const N: usize> {
    pub(crate) node: Node,
    key: [u8; N],
}

impl<const N: usize> EbMbNode<N> {
    /// Creates an unlinked cell carrying `key`.
    #[inline(always)]
    pub const fn new(key: [u8; N]) -> Self {
        Self {
            node: Node::new(),
            key,
        }
    }
    /// Returns the key.
    #[inline(always)]
    pub fn key(&self) -> &[u8; N] {
        &self.key
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
fn entry<const N: usize>(node: NonNull<Node>) -> NonNull<EbMbNode<N>> {
    node.cast::<EbMbNode<N>>()
}

/// Returns the cell with the smallest key, or `None` on an empty tree.
///
/// # Safety
/// Every cell of the tree must be live and unmoved.
pub unsafe fn first<const N: usize>(root: &Root) -> Option<NonNull<EbMbNode<N>>> {
    root.first().map(entry)
}

/// Returns the cell with the greatest key, or `None` on an empty tree.
///
/// # Safety
/// Every cell of the tree must be live and unmoved.
pub unsafe fn last<const N: usize>(root: &Root) -> Option<NonNull<EbMbNode<N>>> {
    root.last().map(entry)
}

/// Links `new` into the tree, keeping memcmp key order.
///
/// Only the key needs to be set beforehand. Returns `new` once linked —
/// except in a unique-keys tree already holding the key, where the cell
/// already carrying it is returned instead and `new` stays unlinked.
///
/// # Safety
/// `new` must be unlinked and pinned for as long as it stays linked; every
/// cell of the tree must be live, unmoved and of the same width `N`; no
/// other tree operation may run concurrently.
pub unsafe fn insert<const N: usize>(root: &mut Root, new: &mut EbMbNode<N>) -> NonNull<EbMbNode<N>> {
    let tree = root as *mut Root;
    let new = new as *mut EbMbNode<N>;
    let unique = (*tree).is_unique();
    let len = N << 3;
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

    // <bit> carries the number of leading bits known to be shared between
    // the new key and the keys along the walked path; it may run ahead of
    // a node's own count when whole bytes agree.
    let mut bit = 0_usize;
    let mut old: *mut EbMbNode<N>;
    let up_ptr: *mut Troot;
    loop {
        if troot.kind() == Kind::Leaf {
            old = troot.node_ptr().cast::<EbMbNode<N>>();
            (*new).node.node_p = (*old).node.leaf_p;
            up_ptr = ptr::addr_of_mut!((*old).node.leaf_p);
            bit = equal_bits(&(*new).key, &(*old).key, bit, len);
            break;
        }

        old = troot.node_ptr().cast::<EbMbNode<N>>();
        let old_bit = (*old).node.bit;

        if old_bit < 0 {
            // above a duplicate sub-tree the whole key decides
            (*new).node.node_p = (*old).node.node_p;
            up_ptr = ptr::addr_of_mut!((*old).node.node_p);
            bit = equal_bits(&(*new).key, &(*old).key, bit, len);
            break;
        }
        let old_bit = old_bit as usize;

        if bit < old_bit {
            bit = equal_bits(&(*new).key, &(*old).key, bit, old_bit);
            if bit < old_bit {
                // the keys part company inside this node's shared prefix
                (*new).node.node_p = (*old).node.node_p;
                up_ptr = ptr::addr_of_mut!((*old).node.node_p);
                break;
            }
        }

        root = ptr::addr_of_mut!((*old).node.branches);
        side = Side::from_bit(get_bit(&(*new).key, old_bit));
        troot = (*root).branch(side);
    }

    let new_left = Troot::up(new_branches, Side::Left);
    let new_rght = Troot::up(new_branches, Side::Right);
    let new_leaf = Troot::down(new_branches, Kind::Leaf);

    if bit >= len {
        // equal over the whole width
        (*new).node.bit = -1;
        if unique {
            return NonNull::new_unchecked(old);
        }
        if troot.kind() != Kind::Leaf {
            let node = ptr::addr_of_mut!((*old).node);
            return Node::insert_dup(node, ptr::addr_of_mut!((*new).node)).cast::<EbMbNode<N>>();
        }
    } else {
        (*new).node.bit = bit as i16;
    }

    // the first differing bit orients the pair; equal keys pair up with
    // the newcomer on the right
    let ge = bit >= len || get_bit(&(*new).key, bit) != 0;
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
/// Every cell of the tree must be live, unmoved and of width `N`.
pub unsafe fn lookup<const N: usize>(root: &Root, x: &[u8; N]) -> Option<NonNull<EbMbNode<N>>> {
    let mut troot = root.branch(Side::Left);
    if troot.is_null() {
        return None;
    }

    let mut bit = 0_usize;
    loop {
        if troot.kind() == Kind::Leaf {
            let node = troot.node_ptr().cast::<EbMbNode<N>>();
            return if (*node).key == *x {
                Some(NonNull::new_unchecked(node))
            } else {
                None
            };
        }
        let node = troot.node_ptr().cast::<EbMbNode<N>>();
        let node_bit = (*node).node.bit;

        if node_bit < 0 {
            // a duplicate sub-tree matches as a whole or not at all; the
            // oldest entry is its leftmost leaf
            if (*node).key != *x {
                return None;
            }
            troot = (*node).node.branches.branch(Side::Left);
            while troot.kind() != Kind::Leaf {
                troot = (*troot.root_ptr()).branch(Side::Left);
            }
            return Some(NonNull::new_unchecked(troot.node_ptr().cast::<EbMbNode<N>>()));
        }
        let node_bit = node_bit as usize;

        if bit < node_bit {
            bit = equal_bits(x, &(*node).key, bit, node_bit);
            if bit < node_bit {
                return None; // the sought key leaves the path early
            }
        }
        troot = (*node)
            .node
            .branches
            .branch(Side::from_bit(get_bit(x, node_bit)));
    }
}

/// An iterator over the cells of a tree in memcmp key order, duplicates in
/// insertion order. Created by [`iter`].
///
/// [`iter`]: fn.iter.html " "
#[derive(Debug)]
pub struct Iter<'a, const N: usize> {
    inner: RawIter,
    _tree: PhantomData<&'a Root>,
}

/// Iterates over the tree in memcmp key order.
///
/// # Safety
/// Every cell of the tree must be live, unmoved, of width `N`, and not
/// mutated through other handles while the iterator is in use.
pub unsafe fn iter<const N: usize>(root: &Root) -> Iter<'_, N> {
    Iter {
        inner: RawIter::new(root),
        _tree: PhantomData,
    }
}

impl<'a, const N: usize> Iterator for Iter<'a, N> {
    type Item = &'a EbMbNode<N>;

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: liveness is upheld by the contract of `iter`
        unsafe { self.inner.step().map(|n| &*(n.as_ptr() as *const EbMbNode<N>)) }
    }
}
impl<const N: usize> FusedIterator for Iter<'_, N> {}
