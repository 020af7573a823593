//! The tagged reference word which links cells together.
//!
//! Every inter-cell reference in the tree is a machine word holding the
//! address of the target cell's branch pair with its lowest bit repurposed
//! as a tag. In upward references the tag is the side ([`Side`]) under which
//! the cell hangs below its parent; in downward references it is the role
//! ([`Kind`]) in which the target is entered. The branch pair is two words
//! wide, so the address of a real target always has its low bit free.

use core::fmt::{self, Debug, Formatter};
use crate::node::{Node, Root};

/// The side under which a cell hangs below its parent's branch pair.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(usize)]
pub(crate) enum Side {
    /// The left branch, holding the lesser keys.
    Left = 0,
    /// The right branch, holding the greater keys.
    Right = 1,
}

impl Side {
    /// Returns the opposite side.
    #[inline(always)]
    pub(crate) fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
    #[inline(always)]
    pub(crate) fn from_bit(bit: usize) -> Self {
        if bit == 0 { Self::Left } else { Self::Right }
    }
}

/// The role in which a downward reference enters its target cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(usize)]
pub(crate) enum Kind {
    /// The target is entered as a leaf.
    Leaf = 0,
    /// The target is entered as an intermediate node.
    Node = 1,
}

/// A tagged reference to a cell's branch pair.
///
/// The all-zero value is null; the value `1` is the null right slot of a
/// unique-keys root, which must still test as null. Both are covered by
/// [`is_null`], which ignores the tag bit.
///
/// [`is_null`]: #method.is_null " "
#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub(crate) struct Troot(usize);

impl Troot {
    /// The null reference.
    pub(crate) const NULL: Self = Self(0);
    /// The null reference carrying the unique-keys flag, only ever stored
    /// in a root's right slot.
    pub(crate) const NULL_UNIQUE: Self = Self(1);

    /// Tags `root` with the side it hangs under, for storage in an upward
    /// reference.
    #[inline(always)]
    pub(crate) fn up(root: *mut Root, side: Side) -> Self {
        Self(root as usize | side as usize)
    }
    /// Tags `root` with the role it is entered in, for storage in a branch
    /// slot.
    #[inline(always)]
    pub(crate) fn down(root: *mut Root, kind: Kind) -> Self {
        Self(root as usize | kind as usize)
    }

    /// Returns `true` if the reference addresses no cell at all, no matter
    /// the tag bit.
    #[inline(always)]
    pub(crate) fn is_null(self) -> bool {
        self.0 & !1 == 0
    }
    /// Returns the raw tag bit.
    #[inline(always)]
    pub(crate) fn tag(self) -> usize {
        self.0 & 1
    }
    /// Reads the tag as a side. Only meaningful for upward references.
    #[inline(always)]
    pub(crate) fn side(self) -> Side {
        Side::from_bit(self.tag())
    }
    /// Reads the tag as a role. Only meaningful for branch slots.
    #[inline(always)]
    pub(crate) fn kind(self) -> Kind {
        if self.tag() == 0 { Kind::Leaf } else { Kind::Node }
    }

    /// Strips the tag, yielding the address of the target's branch pair.
    #[inline(always)]
    pub(crate) fn root_ptr(self) -> *mut Root {
        (self.0 & !1) as *mut Root
    }
    /// Strips the tag and recovers the cell holding the target branch pair.
    ///
    /// # Safety
    /// The reference must be non-null and must address the `branches` field
    /// of a live [`Node`]; the branch pair is the first field of the cell,
    /// so the addresses coincide.
    ///
    /// [`Node`]: ../node/struct.Node.html " "
    #[inline(always)]
    pub(crate) unsafe fn node_ptr(self) -> *mut Node {
        self.root_ptr().cast::<Node>()
    }
}

impl Debug for Troot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "Troot(null/{})", self.tag())
        } else {
            write!(f, "Troot({:p}/{})", self.root_ptr(), self.tag())
        }
    }
}
