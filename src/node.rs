//! The type-agnostic core shared by every tree variant.
//!
//! A tree is a [`Root`] under whose left slot cells hang, each cell being a
//! [`Node`] header embedded in a caller-owned record. One cell plays two
//! roles at once: a leaf carrying its key, and an intermediate node whose
//! branch pair discriminates a bit of the key space. The intermediate role
//! always sits somewhere above its own leaf role, so inserting a record
//! adds exactly one cell and removing one releases exactly one, with no
//! allocation in between — the two roles are pulled apart and snapped back
//! together elastically as neighbors come and go.
//!
//! Everything here is key-agnostic: walking, deletion and duplicate
//! stacking only ever follow tagged references and the `bit` field. The key
//! itself is read by the typed front-end modules alone.
//!
//! [`Root`]: struct.Root.html " "
//! [`Node`]: struct.Node.html " "

use core::{
    fmt::{self, Debug, Formatter},
    ptr::{self, NonNull},
};
use crate::tag::{Kind, Side, Troot};

/// The anchor of a tree, and equally the branch pair inside every cell.
///
/// A standalone `Root` heads a tree: cells hang under its left slot and the
/// right slot stays effectively null for the root's entire life, which is
/// also how upward walks recognize it. The low bit of the right slot
/// carries the tree-wide unique-keys flag.
///
/// The same type doubles as the `branches` field of [`Node`], where both
/// slots reference the two children. All upward references address a
/// `Root`, never a cell directly.
///
/// [`Node`]: struct.Node.html " "
#[repr(C)]
pub struct Root {
    pub(crate) b: [Troot; 2],
}

impl Root {
    /// Creates the head of an empty tree which accepts duplicate keys.
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            b: [Troot::NULL, Troot::NULL],
        }
    }
    /// Creates the head of an empty tree which rejects duplicate keys.
    ///
    /// Inserting a key already present in such a tree links nothing and
    /// returns the cell already carrying the key.
    #[inline(always)]
    pub const fn new_unique() -> Self {
        Self {
            b: [Troot::NULL, Troot::NULL_UNIQUE],
        }
    }
    /// Returns `true` if the tree holds no cell.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.b[Side::Left as usize].is_null()
    }
    /// Returns `true` if the tree was created with [`new_unique`].
    ///
    /// [`new_unique`]: #method.new_unique " "
    #[inline(always)]
    pub(crate) fn is_unique(&self) -> bool {
        self.b[Side::Right as usize].tag() != 0
    }
    #[inline(always)]
    pub(crate) fn branch(&self, side: Side) -> Troot {
        self.b[side as usize]
    }

    /// Returns the cell with the smallest key, or `None` on an empty tree.
    ///
    /// # Safety
    /// Every cell linked below `self` must still be live and unmoved.
    pub unsafe fn first(&self) -> Option<NonNull<Node>> {
        walk_down(self.branch(Side::Left), Side::Left)
    }
    /// Returns the cell with the greatest key, or `None` on an empty tree.
    ///
    /// # Safety
    /// Every cell linked below `self` must still be live and unmoved.
    pub unsafe fn last(&self) -> Option<NonNull<Node>> {
        walk_down(self.branch(Side::Left), Side::Right)
    }
}

impl Default for Root {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Root {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("left", &self.b[0])
            .field("right", &self.b[1])
            .finish()
    }
}

/// The header embedded in every record stored in a tree.
///
/// The branch pair must stay the first field: upward references address it,
/// and recovering the cell from such a reference is a cast back from the
/// pair's address. `leaf_p` is null exactly while the cell is unlinked;
/// `node_p` is null while the cell's intermediate role is unused, which
/// only happens for the sole cell sitting directly under the root.
///
/// `bit` is the discrimination bit position for scalar trees and the count
/// of bits shared by the two children for multi-byte trees; negative values
/// mark the spine of a duplicate sub-tree. `pfx` is reserved for prefix
/// keyed multi-byte trees and stays 0 everywhere else.
#[repr(C)]
pub struct Node {
    pub(crate) branches: Root,
    pub(crate) node_p: Troot,
    pub(crate) leaf_p: Troot,
    pub(crate) bit: i16,
    pub(crate) pfx: i16,
}

impl Node {
    /// Creates an unlinked header.
    #[inline(always)]
    pub(crate) const fn new() -> Self {
        Self {
            branches: Root::new(),
            node_p: Troot::NULL,
            leaf_p: Troot::NULL,
            bit: 0,
            pfx: 0,
        }
    }

    /// Returns `true` while the cell is linked in a tree.
    #[inline(always)]
    pub fn is_linked(&self) -> bool {
        !self.leaf_p.is_null()
    }

    /// Returns the cell holding the next greater key, duplicates included
    /// in insertion order, or `None` from the last cell.
    ///
    /// # Safety
    /// `self` must be linked, and every cell of its tree live and unmoved.
    pub unsafe fn next(&self) -> Option<NonNull<Node>> {
        let mut t = self.leaf_p;
        while t.side() != Side::Left {
            // climbing from a right branch, the root cannot be right above
            t = (*t.node_ptr()).node_p;
        }
        let t = (*t.root_ptr()).branch(Side::Right);
        if t.is_null() {
            return None;
        }
        walk_down(t, Side::Left)
    }

    /// Returns the cell holding the next smaller key, duplicates included
    /// in reverse insertion order, or `None` from the first cell.
    ///
    /// # Safety
    /// `self` must be linked, and every cell of its tree live and unmoved.
    pub unsafe fn prev(&self) -> Option<NonNull<Node>> {
        let mut t = self.leaf_p;
        while t.side() == Side::Left {
            // a null right slot above a left climb means we hit the root
            if (*t.root_ptr()).branch(Side::Right).is_null() {
                return None;
            }
            t = (*t.node_ptr()).node_p;
        }
        let t = (*t.root_ptr()).branch(Side::Left);
        walk_down(t, Side::Right)
    }

    /// Like [`next`], but steps over the remaining duplicates of the
    /// current key.
    ///
    /// # Safety
    /// `self` must be linked, and every cell of its tree live and unmoved.
    ///
    /// [`next`]: #method.next " "
    pub unsafe fn next_unique(&self) -> Option<NonNull<Node>> {
        let mut t = self.leaf_p;
        loop {
            if t.side() == Side::Left {
                if (*t.root_ptr()).branch(Side::Right).is_null() {
                    return None; // we reached the root
                }
                let node = t.node_ptr();
                // left of a regular node: the next key lives across it
                if (*node).bit >= 0 {
                    break;
                }
                t = (*node).node_p;
            } else {
                // climbing from a right branch, the root cannot be above
                t = (*t.node_ptr()).node_p;
            }
        }
        let t = (*t.root_ptr()).branch(Side::Right);
        if t.is_null() {
            return None;
        }
        walk_down(t, Side::Left)
    }

    /// Like [`prev`], but lands on the last duplicate of the preceding key.
    ///
    /// # Safety
    /// `self` must be linked, and every cell of its tree live and unmoved.
    ///
    /// [`prev`]: #method.prev " "
    pub unsafe fn prev_unique(&self) -> Option<NonNull<Node>> {
        let mut t = self.leaf_p;
        loop {
            if t.side() != Side::Left {
                let node = t.node_ptr();
                // right of a regular node: the previous key is across it
                if (*node).bit >= 0 {
                    break;
                }
                t = (*node).node_p;
            } else {
                if (*t.root_ptr()).branch(Side::Right).is_null() {
                    return None; // we reached the root
                }
                t = (*t.node_ptr()).node_p;
            }
        }
        let t = (*t.root_ptr()).branch(Side::Left);
        walk_down(t, Side::Right)
    }

    /// Unlinks the cell at `node` from its tree in constant time, leaving
    /// the cell unlinked (`leaf_p` null) and ready for reuse. A cell which
    /// is not linked is left untouched.
    ///
    /// # Safety
    /// `node` must point at a live cell; if linked, every cell of its tree
    /// must be live and unmoved. `node` may alias cells reached through the
    /// tree, which is why this takes a raw pointer.
    pub(crate) unsafe fn delete(node: *mut Node) {
        if (*node).leaf_p.is_null() {
            return;
        }

        // locate our parent and the side we hang under
        let pside = (*node).leaf_p.side();
        let parent = (*node).leaf_p.node_ptr();

        // Attachment to the root is always by its left slot, and only the
        // root has a null right slot. In that case `parent` is the bare
        // tree root, of which only the branch pair may be touched.
        if (*parent).branches.branch(Side::Right).is_null() {
            (*parent).branches.b[Side::Left as usize] = Troot::NULL;
            (*node).leaf_p = Troot::NULL;
            return;
        }

        // Reparent our sibling onto the grand-parent slot which held the
        // parent, draining the parent cell's node role.
        let gpside = (*parent).node_p.side();
        let gparent = (*parent).node_p.root_ptr();

        let sib = (*parent).branches.branch(pside.other());
        (*gparent).b[gpside as usize] = sib;
        match sib.kind() {
            Kind::Leaf => (*sib.node_ptr()).leaf_p = Troot::up(gparent, gpside),
            Kind::Node => (*sib.node_ptr()).node_p = Troot::up(gparent, gpside),
        }
        // The parent may be our own cell; then both roles die together and
        // the null node_p below doubles as our own exit condition.
        (*parent).node_p = Troot::NULL;

        // If our node role was unused we are done.
        if (*node).node_p.is_null() {
            (*node).leaf_p = Troot::NULL;
            return;
        }

        // Our node role is in use elsewhere. The drained parent cell sat
        // below us, so its key shares every bit ours discriminates: move
        // it into our node role and repoint the neighbors.
        (*parent).node_p = (*node).node_p;
        (*parent).branches.b = (*node).branches.b;
        (*parent).bit = (*node).bit;

        let parent_branches = ptr::addr_of_mut!((*parent).branches);
        let gpside = (*parent).node_p.side();
        let gparent = (*parent).node_p.root_ptr();
        (*gparent).b[gpside as usize] = Troot::down(parent_branches, Kind::Node);

        for &side in &[Side::Left, Side::Right] {
            let child = (*parent).branches.branch(side);
            let up = Troot::up(parent_branches, side);
            match child.kind() {
                Kind::Leaf => (*child.node_ptr()).leaf_p = up,
                Kind::Node => (*child.node_ptr()).node_p = up,
            }
        }

        (*node).leaf_p = Troot::NULL;
    }

    /// Stacks `new` into the duplicate sub-tree headed by `sub`, which must
    /// already hold at least two cells of the key. Duplicates always append
    /// on the right-deep side, which is what makes in-order walks visit
    /// them in insertion order.
    ///
    /// The spine is walked remembering the shallowest level gap; `new`
    /// either opens a fresh level right above the last leaf (`bit` −1) or
    /// is wedged in above the remembered cell one level below it.
    ///
    /// # Safety
    /// `sub` must be the head of a duplicate sub-tree of a live tree and
    /// `new` an unlinked cell carrying the same key.
    pub(crate) unsafe fn insert_dup(sub: *mut Node, new: *mut Node) -> NonNull<Node> {
        let mut sub = sub;
        let mut head = sub;

        let new_branches = ptr::addr_of_mut!((*new).branches);
        let new_left = Troot::up(new_branches, Side::Left);
        let new_rght = Troot::up(new_branches, Side::Right);
        let new_leaf = Troot::down(new_branches, Kind::Leaf);

        // identify the deepest hole along the right spine
        while (*head).branches.branch(Side::Right).kind() != Kind::Leaf {
            let last = head;
            head = (*head).branches.branch(Side::Right).node_ptr();
            if (*head).bit > (*last).bit + 1 {
                sub = head; // a hole opens here
            }
        }

        if (*head).bit < -1 {
            // a hole exists right before the last leaf, insert there
            (*new).bit = -1;
            let leaf = (*head).branches.branch(Side::Right).node_ptr();
            (*head).branches.b[Side::Right as usize] = Troot::down(new_branches, Kind::Node);

            (*new).node_p = (*leaf).leaf_p;
            (*new).leaf_p = new_rght;
            (*leaf).leaf_p = new_left;
            (*new).branches.b[Side::Left as usize] =
                Troot::down(ptr::addr_of_mut!((*leaf).branches), Kind::Leaf);
            (*new).branches.b[Side::Right as usize] = new_leaf;
        } else {
            // No hole before the leaf: insert right above <sub>, which may
            // also be the head and thus hang under either side.
            (*new).bit = (*sub).bit - 1;
            let side = (*sub).node_p.side();
            let above = (*sub).node_p.root_ptr();
            (*above).b[side as usize] = Troot::down(new_branches, Kind::Node);

            (*new).node_p = (*sub).node_p;
            (*new).leaf_p = new_rght;
            (*sub).node_p = new_left;
            (*new).branches.b[Side::Left as usize] =
                Troot::down(ptr::addr_of_mut!((*sub).branches), Kind::Node);
            (*new).branches.b[Side::Right as usize] = new_leaf;
        }
        NonNull::new_unchecked(new)
    }
}

impl Debug for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("branches", &self.branches)
            .field("node_p", &self.node_p)
            .field("leaf_p", &self.leaf_p)
            .field("bit", &self.bit)
            .field("pfx", &self.pfx)
            .finish()
    }
}

/// Descends from the branch reference `start`, always taking `side`, and
/// stops at the first cell entered as a leaf. A null `start` is reported as
/// `None`.
///
/// # Safety
/// `start` must be null or a live branch reference of a live tree.
pub(crate) unsafe fn walk_down(start: Troot, side: Side) -> Option<NonNull<Node>> {
    let mut t = start;
    while t.kind() == Kind::Node {
        t = (*t.root_ptr()).branch(side);
    }
    // a null reference carries the leaf tag and falls straight through
    NonNull::new(t.root_ptr().cast::<Node>())
}

/// The key-order cursor underneath every typed iterator: `first`, then
/// `next` until exhausted.
#[derive(Debug)]
pub(crate) struct RawIter {
    next: Option<NonNull<Node>>,
}

impl RawIter {
    /// # Safety
    /// Every cell of the tree must be live and unmoved.
    pub(crate) unsafe fn new(root: &Root) -> Self {
        Self { next: root.first() }
    }
    /// # Safety
    /// The tree must not have been mutated since [`new`].
    ///
    /// [`new`]: #method.new " "
    pub(crate) unsafe fn step(&mut self) -> Option<NonNull<Node>> {
        let cur = self.next?;
        self.next = cur.as_ref().next();
        Some(cur)
    }
}
