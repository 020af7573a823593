//! Implements intrusive elastic binary trees and interfaces to work with them.
//!
//! # Overview
//! An elastic binary tree is a radix tree in which every stored record
//! contributes exactly one cell, and that cell serves two roles at once: a
//! *leaf* carrying the record's key, and an *intermediate node* whose two
//! branches discriminate one position of the key space somewhere above that
//! leaf. Because the two roles share one allocation, inserting a record
//! links one cell, removing it unlinks one cell, and the structure never
//! allocates on its own — the roles are merely pulled apart and snapped
//! back together as neighboring keys come and go, which is where the name
//! comes from.
//!
//! The payoff of this layout is an ordered, duplicate-friendly container
//! with in-order and reverse traversal, exact and range lookups
//! (less-or-equal / greater-or-equal on scalar keys), and removal in
//! worst-case constant time with no rebalancing. The tree is deliberately
//! unbalanced: its depth is bounded by the key width in bits, and each
//! level costs only a couple of word operations. Duplicate keys are stacked
//! in a small secondary tree and always walk in insertion order, which
//! makes the trees well suited for schedulers and timer queues.
//!
//! # Storage
//! The container is *intrusive*: a cell type such as [`Eb32Node`] is
//! embedded inside a caller-owned record, and the library only ever links
//! and unlinks the embedded header. The caller allocates records wherever
//! it wants, keeps them pinned while they are linked, and frees them after
//! (or instead of) removal. A cell reports its own linkage through
//! `is_linked`, and removal of an unlinked cell is a harmless no-op.
//!
//! In exchange, most operations are `unsafe fn`s: the library cannot prove
//! that every linked cell is still alive, unmoved and keyed consistently,
//! so each operation documents the contract the caller upholds in its
//! `# Safety` section.
//!
//! # Feature flags
//! Each tree variant sits behind its own feature flag, all of them enabled
//! by default:
//! - `eb32` — trees keyed by 32-bit scalars, unsigned or signed.
//! - `eb64` — trees keyed by 64-bit scalars, unsigned or signed.
//! - `eb128` — trees keyed by 128-bit scalars, with dual-64-bit
//!   convenience wrappers.
//! - `ebpt` — trees keyed by pointers; selects the 32-bit or 64-bit scalar
//!   machinery to match the target's pointer width.
//! - `ebmb` — trees keyed by fixed-width byte blocks in memcmp order.
//! - `ebst` — trees keyed by NUL-terminated strings, stored indirectly.
//!
//! # Public dependencies
//! None. The crate is `no_std`, depends only on `core`, and performs no
//! allocation whatsoever.

#![warn(
    rust_2018_idioms,
    clippy::cargo,
    clippy::pedantic,
    clippy::nursery,
    missing_debug_implementations,
    missing_docs,
    unused_qualifications,
    variant_size_differences,
    clippy::unwrap_used, // Only .expect() allowed
)]
#![deny(anonymous_parameters, bare_trait_objects)]
#![allow(
    clippy::module_name_repetitions, // Annoying and stupid
    clippy::cast_possible_truncation, // The discrimination bit always fits
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss, // Signed keys are stored as their raw bits
    clippy::similar_names, // leaf_p/node_p and friends are the domain jargon
    clippy::shadow_unrelated, // Countless false positives, very annoying
)]
#![no_std]
#![cfg_attr(feature = "doc_cfg", feature(doc_cfg))]

#[cfg(test)]
extern crate std;

pub mod bits;
mod node;
pub use node::{Node, Root};

pub(crate) mod tag;

#[cfg(feature = "eb32")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "eb32")))]
pub mod eb32;
#[cfg(feature = "eb32")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "eb32")))]
pub use eb32::Eb32Node;

#[cfg(feature = "eb64")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "eb64")))]
pub mod eb64;
#[cfg(feature = "eb64")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "eb64")))]
pub use eb64::Eb64Node;

#[cfg(feature = "eb128")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "eb128")))]
pub mod eb128;
#[cfg(feature = "eb128")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "eb128")))]
pub use eb128::Eb128Node;

#[cfg(feature = "ebpt")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "ebpt")))]
pub mod ebpt;
#[cfg(feature = "ebpt")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "ebpt")))]
pub use ebpt::EbPtNode;

#[cfg(feature = "ebmb")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "ebmb")))]
pub mod ebmb;
#[cfg(feature = "ebmb")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "ebmb")))]
pub use ebmb::EbMbNode;

#[cfg(feature = "ebst")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "ebst")))]
pub mod ebst;
#[cfg(feature = "ebst")]
#[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "ebst")))]
pub use ebst::EbStNode;

/// A prelude for using the crate, containing the most used types in a
/// renamed form for safe glob-importing.
pub mod prelude {
    #[doc(no_inline)]
    pub use crate::{Node as EbNode, Root as EbRoot};
    #[cfg(feature = "eb32")]
    #[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "eb32")))]
    #[doc(no_inline)]
    pub use crate::eb32::{Eb32Node, Iter as Eb32Iter};
    #[cfg(feature = "eb64")]
    #[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "eb64")))]
    #[doc(no_inline)]
    pub use crate::eb64::{Eb64Node, Iter as Eb64Iter};
    #[cfg(feature = "eb128")]
    #[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "eb128")))]
    #[doc(no_inline)]
    pub use crate::eb128::{Eb128Node, Iter as Eb128Iter};
    #[cfg(feature = "ebpt")]
    #[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "ebpt")))]
    #[doc(no_inline)]
    pub use crate::ebpt::{EbPtNode, Iter as EbPtIter};
    #[cfg(feature = "ebmb")]
    #[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "ebmb")))]
    #[doc(no_inline)]
    pub use crate::ebmb::{EbMbNode, Iter as EbMbIter};
    #[cfg(feature = "ebst")]
    #[cfg_attr(feature = "doc_cfg", doc(cfg(feature = "ebst")))]
    #[doc(no_inline)]
    pub use crate::ebst::{EbStNode, Iter as EbStIter};
}
