use ebtree::{eb64, Eb64Node, Root};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn boxed_cells(keys: &[u64]) -> Vec<Box<Eb64Node>> {
    keys.iter().map(|&k| Box::new(Eb64Node::new(k))).collect()
}

unsafe fn keys_by_next(root: &Root) -> Vec<u64> {
    let mut out = Vec::new();
    let mut cur = eb64::first(root);
    while let Some(n) = cur {
        out.push(n.as_ref().key());
        cur = n.as_ref().next();
    }
    out
}

unsafe fn keys_by_prev(root: &Root) -> Vec<u64> {
    let mut out = Vec::new();
    let mut cur = eb64::last(root);
    while let Some(n) = cur {
        out.push(n.as_ref().key());
        cur = n.as_ref().prev();
    }
    out
}

#[test]
fn traversal_is_sorted() {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    for round in 0..20 {
        let n = 1 + (round * 37) % 400;
        let keys: Vec<u64> = (0..n).map(|_| rng.gen()).collect();
        let mut cells = boxed_cells(&keys);

        let mut root = Root::new();
        unsafe {
            for cell in &mut cells {
                eb64::insert(&mut root, cell);
            }

            let forward = keys_by_next(&root);
            let mut expected = keys.clone();
            expected.sort_unstable();
            assert_eq!(forward, expected, "round {}", round);

            let mut backward = keys_by_prev(&root);
            backward.reverse();
            assert_eq!(backward, expected, "round {}", round);
        }
    }
}

#[test]
fn mass_round_trip_drains_clean() {
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let keys: Vec<u64> = (0..10_000).map(|_| rng.gen()).collect();
    let mut cells = boxed_cells(&keys);

    let mut root = Root::new();
    unsafe {
        for cell in &mut cells {
            eb64::insert(&mut root, cell);
        }

        cells.shuffle(&mut rng);
        for (i, cell) in cells.iter_mut().enumerate() {
            assert!(cell.is_linked());
            cell.delete();
            assert!(!cell.is_linked());

            // a full recount every step would swamp the test, spot checks
            // keep it honest
            if i % 500 == 0 {
                let alive = keys.len() - i - 1;
                assert_eq!(count_cells(&root), alive);
            }
        }
        assert!(root.is_empty());
        assert!(eb64::first(&root).is_none());
        assert!(eb64::last(&root).is_none());
    }
}

unsafe fn count_cells(root: &Root) -> usize {
    eb64::iter(root).count()
}

#[test]
fn deletion_only_removes_its_key() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let keys: Vec<u64> = (0..300).map(|_| rng.gen_range(0..1000)).collect();
    let mut cells = boxed_cells(&keys);

    let mut root = Root::new();
    unsafe {
        for cell in &mut cells {
            eb64::insert(&mut root, cell);
        }
        let mut expected = keys.clone();
        expected.sort_unstable();

        let mut order: Vec<usize> = (0..cells.len()).collect();
        order.shuffle(&mut rng);
        for i in order {
            let key = cells[i].key();
            cells[i].delete();

            // exactly one instance of the key must be gone
            let pos = expected.binary_search(&key).expect("key was present");
            expected.remove(pos);
            assert_eq!(keys_by_next(&root), expected);
        }
    }
}

#[test]
fn signed_traversal_is_sorted() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let keys: Vec<i64> = (0..500).map(|_| rng.gen()).collect();
    let mut cells: Vec<Box<Eb64Node>> = keys
        .iter()
        .map(|&k| Box::new(Eb64Node::new_signed(k)))
        .collect();

    let mut root = Root::new();
    unsafe {
        for cell in &mut cells {
            eb64::insert_signed(&mut root, cell);
        }
        let mut got = Vec::new();
        let mut cur = eb64::first(&root);
        while let Some(n) = cur {
            got.push(n.as_ref().key_signed());
            cur = n.as_ref().next();
        }
        let mut expected = keys.clone();
        expected.sort_unstable();
        assert_eq!(got, expected);
    }
}
