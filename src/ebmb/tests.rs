use super::*;
use std::{boxed::Box, vec::Vec};

fn cells(keys: &[[u8; 4]]) -> Vec<Box<EbMbNode<4>>> {
    keys.iter().map(|&k| Box::new(EbMbNode::new(k))).collect()
}

unsafe fn keys_in_order(root: &Root) -> Vec<[u8; 4]> {
    iter::<4>(root).map(|n| *n.key()).collect()
}

#[test]
fn memcmp_ordering() {
    let keys = [
        *b"zeta",
        *b"alfa",
        *b"beta",
        *b"alf\0",
        *b"bet\xFF",
    ];
    let mut root = Root::new();
    let mut cells = cells(&keys);
    unsafe {
        for cell in &mut cells {
            insert(&mut root, cell);
        }
        let mut sorted = keys.to_vec();
        sorted.sort_unstable();
        assert_eq!(keys_in_order(&root), sorted);

        for k in &keys {
            assert_eq!(lookup(&root, k).unwrap().as_ref().key(), k);
        }
        assert!(lookup(&root, b"gamm").is_none());
        assert!(lookup(&root, b"alfb").is_none());
        assert!(lookup(&root, b"\0\0\0\0").is_none());
    }
}

#[test]
fn duplicate_blocks() {
    let mut root = Root::new();
    let mut a = EbMbNode::new(*b"dupe");
    let mut b = EbMbNode::new(*b"dupe");
    let mut c = EbMbNode::new(*b"dupe");
    let mut other = EbMbNode::new(*b"oth\0");
    unsafe {
        insert(&mut root, &mut a);
        insert(&mut root, &mut b);
        insert(&mut root, &mut other);
        insert(&mut root, &mut c);

        // duplicates stay in insertion order and lookup takes the oldest
        let dupes: Vec<*const EbMbNode<4>> = iter::<4>(&root)
            .filter(|n| n.key() == b"dupe")
            .map(|n| n as *const _)
            .collect();
        assert_eq!(dupes, [
            &a as *const EbMbNode<4>,
            &b as *const EbMbNode<4>,
            &c as *const EbMbNode<4>,
        ]);
        assert_eq!(lookup(&root, b"dupe").unwrap().as_ptr(), &mut a as *mut _);

        // removing the middle duplicate keeps the others ordered
        b.delete();
        let dupes: Vec<*const EbMbNode<4>> = iter::<4>(&root)
            .filter(|n| n.key() == b"dupe")
            .map(|n| n as *const _)
            .collect();
        assert_eq!(dupes, [&a as *const EbMbNode<4>, &c as *const EbMbNode<4>]);
    }
}

#[test]
fn unique_blocks() {
    let mut root = Root::new_unique();
    let mut a = EbMbNode::new([1, 2, 3, 4]);
    let mut b = EbMbNode::new([1, 2, 3, 4]);
    unsafe {
        assert_eq!(insert(&mut root, &mut a).as_ptr(), &mut a as *mut _);
        assert_eq!(insert(&mut root, &mut b).as_ptr(), &mut a as *mut _);
        assert!(!b.is_linked());
        assert_eq!(iter::<4>(&root).count(), 1);
    }
}

#[test]
fn shared_prefixes_split_late() {
    // keys agreeing on three bytes force deep discrimination counts
    let keys = [
        [9, 9, 9, 0],
        [9, 9, 9, 255],
        [9, 9, 9, 128],
        [9, 9, 9, 1],
    ];
    let mut root = Root::new();
    let mut cells = cells(&keys);
    unsafe {
        for cell in &mut cells {
            insert(&mut root, cell);
        }
        assert_eq!(
            keys_in_order(&root),
            [[9, 9, 9, 0], [9, 9, 9, 1], [9, 9, 9, 128], [9, 9, 9, 255]]
        );

        // drain and refill to cross the delete/insert paths
        for cell in &mut cells {
            cell.delete();
        }
        assert!(root.is_empty());
        for cell in cells.iter_mut().rev() {
            insert(&mut root, cell);
        }
        assert_eq!(
            keys_in_order(&root),
            [[9, 9, 9, 0], [9, 9, 9, 1], [9, 9, 9, 128], [9, 9, 9, 255]]
        );
    }
}
