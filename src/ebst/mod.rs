//! Trees keyed by NUL-terminated strings.
//!
//! The cell stores a pointer to the key bytes rather than the bytes
//! themselves, so strings of different lengths mix freely in one tree.
//! Keys compare as byte strings up to and including the terminator, which
//! also guarantees that no key can be a strict prefix of another. A
//! comparison which runs through both terminators reports a negative bit
//! count, and that is what flags an exact duplicate.

use core::{
    ffi::CStr,
    iter::FusedIterator,
    marker::PhantomData,
    ptr::{self, NonNull},
};
use crate::{
    bits::{get_bit, string_equal_bits},
    node::{Node, RawIter, Root},
    tag::{Kind, Side, Troot},
};


/// A cell carrying a NUL-terminated string key, to be embedded in a
/// caller-owned record. Only the pointer is stored; the bytes stay with
/// the caller.
#[derive(Debug)]
#[repr(C)]
pub struct EbStNode {
    pub(crate) node: Node,
    key: *const u8,
}

impl EbStNode {
    /// Creates an unlinked cell keyed by `key`. The referenced bytes must
    /// outlive every use of the cell in a tree.
    #[inline(always)]
    pub fn new(key: &CStr) -> Self {
        Self {
            node: Node::new(),
            key: key.as_ptr().cast(),
        }
    }
    /// Returns the key.
    ///
    /// # Safety
    /// The bytes passed to [`new`] must still be live.
    ///
    /// [`new`]: #method.new " "
    #[inline(always)]
    pub unsafe fn key(&self) -> &CStr {
        CStr::from_ptr(self.key.cast())
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
fn entry(node: NonNull<Node>) -> NonNull<EbStNode> {
    node.cast::<EbStNode>()
}

/// The key bytes of a cell, terminator included.
///
/// # Safety
/// The key bytes registered with the cell must still be live.
unsafe fn key_bytes<'a>(key: *const u8) -> &'a [u8] {
    CStr::from_ptr(key.cast()).to_bytes_with_nul()
}

/// Returns the cell with the smallest key, or `None` on an empty tree.
///
/// # Safety
/// Every cell of the tree must be live and unmoved.
pub unsafe fn first(root: &Root) -> Option<NonNull<EbStNode>> {
    root.first().map(entry)
}

/// Returns the cell with the greatest key, or `None` on an empty tree.
///
/// # Safety
/// Every cell of the tree must be live and unmoved.
pub unsafe fn last(root: &Root) -> Option<NonNull<EbStNode>> {
    root.last().map(entry)
}

/// Links `new` into the tree, keeping byte-string key order.
///
/// Returns `new` once linked — except in a unique-keys tree already
/// holding the key, where the cell already carrying it is returned
/// instead and `new` stays unlinked.
///
/// # Safety
/// `new` must be unlinked and pinned for as long as it stays linked; its
/// key bytes and every cell of the tree (with their key bytes) must be
/// live and unmoved; no other tree operation may run concurrently.
pub unsafe fn insert(root: &mut Root, new: &mut EbStNode) -> NonNull<EbStNode> {
    let tree = root as *mut Root;
    let new = new as *mut EbStNode;
    let unique = (*tree).is_unique();
    let new_key = key_bytes((*new).key);
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

    // <bit> counts the bits known shared with the walked path; it turns
    // negative once the new key has matched a stored key through the
    // terminator, after which no more comparing is needed.
    let mut bit = 0_isize;
    let mut old: *mut EbStNode;
    let up_ptr: *mut Troot;
    loop {
        if troot.kind() == Kind::Leaf {
            old = troot.node_ptr().cast::<EbStNode>();
            (*new).node.node_p = (*old).node.leaf_p;
            up_ptr = ptr::addr_of_mut!((*old).node.leaf_p);
            if bit >= 0 {
                bit = string_equal_bits(new_key, key_bytes((*old).key), bit as usize);
            }
            break;
        }

        old = troot.node_ptr().cast::<EbStNode>();
        let old_bit = isize::from((*old).node.bit);

        if old_bit < 0 {
            // above a duplicate sub-tree the whole string decides
            (*new).node.node_p = (*old).node.node_p;
            up_ptr = ptr::addr_of_mut!((*old).node.node_p);
            if bit >= 0 {
                bit = string_equal_bits(new_key, key_bytes((*old).key), bit as usize);
            }
            break;
        }

        if bit >= 0 && bit < old_bit {
            bit = string_equal_bits(new_key, key_bytes((*old).key), bit as usize);
            if bit >= 0 && bit < old_bit {
                // the keys part company inside this node's shared prefix
                (*new).node.node_p = (*old).node.node_p;
                up_ptr = ptr::addr_of_mut!((*old).node.node_p);
                break;
            }
            // A negative count means the new key equals this node's key;
            // its twin leaf sits further down, so keep walking towards it.
        }

        root = ptr::addr_of_mut!((*old).node.branches);
        side = Side::from_bit(get_bit(new_key, old_bit as usize));
        troot = (*root).branch(side);
    }

    let new_left = Troot::up(new_branches, Side::Left);
    let new_rght = Troot::up(new_branches, Side::Right);
    let new_leaf = Troot::down(new_branches, Kind::Leaf);

    if bit < 0 {
        // the key was already there
        (*new).node.bit = -1;
        if unique {
            return NonNull::new_unchecked(old);
        }
        if troot.kind() != Kind::Leaf {
            let node = ptr::addr_of_mut!((*old).node);
            return Node::insert_dup(node, ptr::addr_of_mut!((*new).node)).cast::<EbStNode>();
        }
    } else {
        (*new).node.bit = bit as i16;
    }

    let ge = bit < 0 || get_bit(new_key, bit as usize) != 0;
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
/// Every cell of the tree and its key bytes must be live and unmoved.
pub unsafe fn lookup(root: &Root, x: &CStr) -> Option<NonNull<EbStNode>> {
    let xb = x.to_bytes_with_nul();
    let mut troot = root.branch(Side::Left);
    if troot.is_null() {
        return None;
    }

    let mut bit = 0_isize;
    loop {
        if troot.kind() == Kind::Leaf {
            let node = troot.node_ptr().cast::<EbStNode>();
            return if key_bytes((*node).key) == xb {
                Some(NonNull::new_unchecked(node))
            } else {
                None
            };
        }
        let node = troot.node_ptr().cast::<EbStNode>();
        let node_bit = isize::from((*node).node.bit);

        if node_bit < 0 {
            // a duplicate sub-tree matches as a whole or not at all; the
            // oldest entry is its leftmost leaf
            if key_bytes((*node).key) != xb {
                return None;
            }
            troot = (*node).node.branches.branch(Side::Left);
            while troot.kind() != Kind::Leaf {
                troot = (*troot.root_ptr()).branch(Side::Left);
            }
            return Some(NonNull::new_unchecked(troot.node_ptr().cast::<EbStNode>()));
        }

        if bit >= 0 && bit < node_bit {
            bit = string_equal_bits(xb, key_bytes((*node).key), bit as usize);
            if bit >= 0 && bit < node_bit {
                return None; // the sought key leaves the path early
            }
        }
        troot = (*node)
            .node
            .branches
            .branch(Side::from_bit(get_bit(xb, node_bit as usize)));
    }
}

/// An iterator over the cells of a tree in byte-string key order,
/// duplicates in insertion order. Created by [`iter`].
///
/// [`iter`]: fn.iter.html " "
#[derive(Debug)]
pub struct Iter<'a> {
    inner: RawIter,
    _tree: PhantomData<&'a Root>,
}

/// Iterates over the tree in byte-string key order.
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
    type Item = &'a EbStNode;

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: liveness is upheld by the contract of `iter`
        unsafe { self.inner.step().map(|n| &*(n.as_ptr() as *const EbStNode)) }
    }
}
impl FusedIterator for Iter<'_> {}
