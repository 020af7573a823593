use super::*;
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::{boxed::Box, vec::Vec};

unsafe fn keys_in_order(root: &Root) -> Vec<u64> {
    iter(root).map(Eb64Node::key).collect()
}

#[test]
fn unique_mode_rejects_duplicates() {
    let mut root = Root::new_unique();
    let mut a = Eb64Node::new(42);
    let mut b = Eb64Node::new(42);
    unsafe {
        let first_in = insert(&mut root, &mut a);
        assert_eq!(first_in.as_ptr(), &mut a as *mut _);

        // the second cell must bounce off and stay unlinked
        let second_in = insert(&mut root, &mut b);
        assert_eq!(second_in.as_ptr(), &mut a as *mut _);
        assert!(!b.is_linked());
        assert!(a.is_linked());
        assert_eq!(keys_in_order(&root), [42]);

        // a distinct key still goes in
        let mut c = Eb64Node::new(43);
        insert(&mut root, &mut c);
        assert_eq!(keys_in_order(&root), [42, 43]);
        c.delete();
        a.delete();
    }
}

#[test]
fn duplicates_keep_insertion_order() {
    let mut root = Root::new();
    let mut a = Eb64Node::new(7);
    let mut b = Eb64Node::new(7);
    let mut c = Eb64Node::new(7);
    unsafe {
        insert(&mut root, &mut a);
        insert(&mut root, &mut b);
        insert(&mut root, &mut c);

        // forward: insertion order; backward: reversed
        let seq: Vec<*const Eb64Node> = iter(&root).map(|n| n as *const _).collect();
        assert_eq!(seq, [
            &a as *const Eb64Node,
            &b as *const Eb64Node,
            &c as *const Eb64Node,
        ]);
        let mut back = Vec::new();
        let mut cur = last(&root);
        while let Some(n) = cur {
            back.push(n.as_ptr() as *const Eb64Node);
            cur = n.as_ref().prev();
        }
        assert_eq!(back, [
            &c as *const Eb64Node,
            &b as *const Eb64Node,
            &a as *const Eb64Node,
        ]);

        // an exact lookup always lands on the oldest duplicate
        assert_eq!(lookup(&root, 7).unwrap().as_ptr(), &mut a as *mut _);
    }
}

#[test]
fn unique_walks_skip_duplicates() {
    let mut root = Root::new();
    let keys = [5_u64, 5, 5, 9, 9, 2];
    let mut cells: Vec<Box<Eb64Node>> =
        keys.iter().map(|&k| Box::new(Eb64Node::new(k))).collect();
    unsafe {
        for cell in &mut cells {
            insert(&mut root, cell);
        }
        assert_eq!(keys_in_order(&root), [2, 5, 5, 5, 9, 9]);

        let mut uniq = Vec::new();
        let mut cur = first(&root);
        while let Some(n) = cur {
            uniq.push(n.as_ref().key());
            cur = n.as_ref().next_unique();
        }
        assert_eq!(uniq, [2, 5, 9]);

        let mut back = Vec::new();
        let mut cur = last(&root);
        while let Some(n) = cur {
            back.push(n.as_ref().key());
            cur = n.as_ref().prev_unique();
        }
        assert_eq!(back, [9, 5, 2]);
    }
}

#[test]
fn range_lookups_with_duplicates() {
    let mut root = Root::new();
    let keys = [10_u64, 20, 20, 20, 30];
    let mut cells: Vec<Box<Eb64Node>> =
        keys.iter().map(|&k| Box::new(Eb64Node::new(k))).collect();
    unsafe {
        for cell in &mut cells {
            insert(&mut root, cell);
        }
        // le lands on the newest duplicate, ge on the oldest
        let le = lookup_le(&root, 25).unwrap();
        assert_eq!(le.as_ref().key(), 20);
        assert_eq!(le.as_ptr() as *const _, &*cells[3] as *const Eb64Node);

        let ge = lookup_ge(&root, 15).unwrap();
        assert_eq!(ge.as_ref().key(), 20);
        assert_eq!(ge.as_ptr() as *const _, &*cells[1] as *const Eb64Node);
    }
}

#[test]
fn random_round_trip() {
    let mut rng = ChaCha8Rng::seed_from_u64(64);
    let mut keys: Vec<u64> = (0..500).map(|i| i * 3).collect();
    keys.shuffle(&mut rng);

    let mut root = Root::new();
    let mut cells: Vec<Box<Eb64Node>> =
        keys.iter().map(|&k| Box::new(Eb64Node::new(k))).collect();
    unsafe {
        for cell in &mut cells {
            insert(&mut root, cell);
        }
        let got = keys_in_order(&root);
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(got, sorted);

        // delete in another random order; the tree must drain completely
        cells.shuffle(&mut rng);
        let mut remaining = cells.len();
        for cell in &mut cells {
            cell.delete();
            remaining -= 1;
            assert_eq!(iter(&root).count(), remaining);
        }
        assert!(root.is_empty());
        assert!(first(&root).is_none());
        assert!(last(&root).is_none());
    }
}

#[test]
fn signed_range_lookups() {
    let mut root = Root::new();
    let keys = [-100_i64, -1, 0, 55];
    let mut cells: Vec<Box<Eb64Node>> = keys
        .iter()
        .map(|&k| Box::new(Eb64Node::new_signed(k)))
        .collect();
    unsafe {
        for cell in &mut cells {
            insert_signed(&mut root, cell);
        }
        let got: Vec<i64> = iter(&root).map(Eb64Node::key_signed).collect();
        assert_eq!(got, [-100, -1, 0, 55]);

        assert_eq!(
            lookup_le_signed(&root, -2).unwrap().as_ref().key_signed(),
            -100
        );
        assert_eq!(
            lookup_ge_signed(&root, -2).unwrap().as_ref().key_signed(),
            -1
        );
        assert_eq!(
            lookup_le_signed(&root, 54).unwrap().as_ref().key_signed(),
            0
        );
        assert!(lookup_ge_signed(&root, 56).is_none());
    }
}
