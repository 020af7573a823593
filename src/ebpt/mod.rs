//! Trees keyed by pointers.
//!
//! A pointer compares as the unsigned integer of its address, so the cell
//! is laid out exactly like the scalar cell of the target's pointer width
//! and every keyed operation is carried out by the matching scalar
//! variant on a reinterpreted cell. The key is never dereferenced.

use core::{
    iter::FusedIterator,
    marker::PhantomData,
    ptr::{self, NonNull},
};
use crate::node::{Node, RawIter, Root};

#[cfg(test)]
mod tests;

#[cfg(target_pointer_width = "64")]
use crate::eb64::Eb64Node as ScalarNode;
#[cfg(target_pointer_width = "32")]
use crate::eb32::Eb32Node as ScalarNode;

/// A cell carrying a pointer key, to be embedded in a caller-owned record.
///
/// Laid out bit for bit like the scalar cell of the platform's pointer
/// width, which is what the keyed operations cast it to.
#[derive(Debug)]
#[repr(C)]
pub struct EbPtNode {
    pub(crate) node: Node,
    key: *const (),
}

impl EbPtNode {
    /// Creates an unlinked cell carrying `key`. The pointee is never
    /// accessed; only the address matters.
    #[inline(always)]
    pub const fn new(key: *const ()) -> Self {
        Self {
            node: Node::new(),
            key,
        }
    }
    /// Returns the key.
    #[inline(always)]
    pub fn key(&self) -> *const () {
        self.key
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
fn entry(node: NonNull<Node>) -> NonNull<EbPtNode> {
    node.cast::<EbPtNode>()
}

#[inline(always)]
fn from_scalar(node: NonNull<ScalarNode>) -> NonNull<EbPtNode> {
    node.cast::<EbPtNode>()
}

/// Returns the cell with the lowest key address, or `None` on an empty
/// tree.
///
/// # Safety
/// Every cell of the tree must be live and unmoved.
pub unsafe fn first(root: &Root) -> Option<NonNull<EbPtNode>> {
    root.first().map(entry)
}

/// Returns the cell with the highest key address, or `None` on an empty
/// tree.
///
/// # Safety
/// Every cell of the tree must be live and unmoved.
pub unsafe fn last(root: &Root) -> Option<NonNull<EbPtNode>> {
    root.last().map(entry)
}

/// Links `new` into the tree, keyed by its pointer's address.
///
/// Returns `new` once linked — except in a unique-keys tree already
/// holding the key, where the cell already carrying it is returned
/// instead and `new` stays unlinked.
///
/// # Safety
/// `new` must be unlinked and pinned for as long as it stays linked; every
/// cell of the tree must be live and unmoved; no other tree operation may
/// run concurrently.
pub unsafe fn insert(root: &mut Root, new: &mut EbPtNode) -> NonNull<EbPtNode> {
    let new = (new as *mut EbPtNode).cast::<ScalarNode>();
    #[cfg(target_pointer_width = "64")]
    {
        from_scalar(crate::eb64::insert(root, &mut *new))
    }
    #[cfg(target_pointer_width = "32")]
    {
        from_scalar(crate::eb32::insert(root, &mut *new))
    }
}

/// Returns the oldest cell carrying exactly `x`, or `None`.
///
/// # Safety
/// Every cell of the tree must be live and unmoved.
pub unsafe fn lookup(root: &Root, x: *const ()) -> Option<NonNull<EbPtNode>> {
    #[cfg(target_pointer_width = "64")]
    {
        crate::eb64::lookup(root, x as usize as u64).map(from_scalar)
    }
    #[cfg(target_pointer_width = "32")]
    {
        crate::eb32::lookup(root, x as usize as u32).map(from_scalar)
    }
}

/// Returns the newest cell with the highest key address not above `x`, or
/// `None`.
///
/// # Safety
/// Every cell of the tree must be live and unmoved.
pub unsafe fn lookup_le(root: &Root, x: *const ()) -> Option<NonNull<EbPtNode>> {
    #[cfg(target_pointer_width = "64")]
    {
        crate::eb64::lookup_le(root, x as usize as u64).map(from_scalar)
    }
    #[cfg(target_pointer_width = "32")]
    {
        crate::eb32::lookup_le(root, x as usize as u32).map(from_scalar)
    }
}

/// Returns the oldest cell with the lowest key address not below `x`, or
/// `None`.
///
/// # Safety
/// Every cell of the tree must be live and unmoved.
pub unsafe fn lookup_ge(root: &Root, x: *const ()) -> Option<NonNull<EbPtNode>> {
    #[cfg(target_pointer_width = "64")]
    {
        crate::eb64::lookup_ge(root, x as usize as u64).map(from_scalar)
    }
    #[cfg(target_pointer_width = "32")]
    {
        crate::eb32::lookup_ge(root, x as usize as u32).map(from_scalar)
    }
}

/// An iterator over the cells of a tree in key address order, duplicates
/// in insertion order. Created by [`iter`].
///
/// [`iter`]: fn.iter.html " "
#[derive(Debug)]
pub struct Iter<'a> {
    inner: RawIter,
    _tree: PhantomData<&'a Root>,
}

/// Iterates over the tree in key address order.
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
    type Item = &'a EbPtNode;

    fn next(&mut self) -> Option<Self::Item> {
        // SAFETY: liveness is upheld by the contract of `iter`
        unsafe { self.inner.step().map(|n| &*(n.as_ptr() as *const EbPtNode)) }
    }
}
impl FusedIterator for Iter<'_> {}
