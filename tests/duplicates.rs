use ebtree::{eb64, Eb64Node, Root};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// Each cell records its insertion rank so that walks can be checked for
// insertion-order stability among equal keys.
struct Entry {
    cell: Box<Eb64Node>,
    rank: usize,
}

unsafe fn walk(root: &Root) -> Vec<*const Eb64Node> {
    let mut out = Vec::new();
    let mut cur = eb64::first(root);
    while let Some(n) = cur {
        out.push(n.as_ptr() as *const Eb64Node);
        cur = n.as_ref().next();
    }
    out
}

#[test]
fn duplicates_walk_in_insertion_order() {
    let mut rng = ChaCha8Rng::seed_from_u64(21);
    // few distinct keys, many cells: every key collects a deep pile
    let mut entries: Vec<Entry> = (0..400)
        .map(|rank| Entry {
            cell: Box::new(Eb64Node::new(rng.gen_range(0..16))),
            rank,
        })
        .collect();

    let mut root = Root::new();
    unsafe {
        for e in &mut entries {
            eb64::insert(&mut root, &mut e.cell);
        }

        let seq = walk(&root);
        // keys must be non-decreasing, ranks increasing within a key
        let lookup_entry = |p: *const Eb64Node| {
            entries
                .iter()
                .find(|e| &*e.cell as *const Eb64Node == p)
                .expect("walked an unknown cell")
        };
        for pair in seq.windows(2) {
            let (a, b) = (lookup_entry(pair[0]), lookup_entry(pair[1]));
            assert!(a.cell.key() <= b.cell.key());
            if a.cell.key() == b.cell.key() {
                assert!(a.rank < b.rank, "{} !< {}", a.rank, b.rank);
            }
        }
        assert_eq!(seq.len(), entries.len());

        // the reverse walk mirrors it exactly
        let mut back = Vec::new();
        let mut cur = eb64::last(&root);
        while let Some(n) = cur {
            back.push(n.as_ptr() as *const Eb64Node);
            cur = n.as_ref().prev();
        }
        back.reverse();
        assert_eq!(back, seq);
    }
}

#[test]
fn unique_walks_visit_each_key_once() {
    let mut rng = ChaCha8Rng::seed_from_u64(22);
    let mut cells: Vec<Box<Eb64Node>> = (0..300)
        .map(|_| Box::new(Eb64Node::new(rng.gen_range(0..32))))
        .collect();

    let mut root = Root::new();
    unsafe {
        for cell in &mut cells {
            eb64::insert(&mut root, cell);
        }
        let mut distinct: Vec<u64> = cells.iter().map(|c| c.key()).collect();
        distinct.sort_unstable();
        distinct.dedup();

        let mut uniq = Vec::new();
        let mut cur = eb64::first(&root);
        while let Some(n) = cur {
            uniq.push(n.as_ref().key());
            cur = n.as_ref().next_unique();
        }
        assert_eq!(uniq, distinct);

        let mut back = Vec::new();
        let mut cur = eb64::last(&root);
        while let Some(n) = cur {
            back.push(n.as_ref().key());
            cur = n.as_ref().prev_unique();
        }
        back.reverse();
        assert_eq!(back, distinct);
    }
}

#[test]
fn unique_mode_keeps_first_cell() {
    let mut rng = ChaCha8Rng::seed_from_u64(23);
    let mut root = Root::new_unique();
    let mut cells: Vec<Box<Eb64Node>> = (0..200)
        .map(|_| Box::new(Eb64Node::new(rng.gen_range(0..64))))
        .collect();

    unsafe {
        let mut winners: Vec<*const Eb64Node> = Vec::new();
        for cell in &mut cells {
            let key = cell.key();
            let got = eb64::insert(&mut root, cell);
            let already = winners
                .iter()
                .find(|&&w| (*w).key() == key)
                .copied();
            match already {
                Some(w) => {
                    // repeat keys bounce back to the first owner
                    assert_eq!(got.as_ptr() as *const Eb64Node, w);
                    assert!(!cell.is_linked());
                }
                None => {
                    assert!(cell.is_linked());
                    winners.push(got.as_ptr() as *const Eb64Node);
                }
            }
        }

        // no two linked cells share a key
        let seq = walk(&root);
        for pair in seq.windows(2) {
            assert!((*pair[0]).key() < (*pair[1]).key());
        }
        assert_eq!(seq.len(), winners.len());
    }
}

#[test]
fn deleting_inside_duplicate_piles() {
    let mut rng = ChaCha8Rng::seed_from_u64(24);
    let mut cells: Vec<Box<Eb64Node>> = (0..250)
        .map(|_| Box::new(Eb64Node::new(rng.gen_range(0..8))))
        .collect();

    let mut root = Root::new();
    unsafe {
        for cell in &mut cells {
            eb64::insert(&mut root, cell);
        }

        // remove cells in random order; the survivors must stay sorted
        // with duplicate ranks still increasing
        let mut order: Vec<usize> = (0..cells.len()).collect();
        order.shuffle(&mut rng);
        let mut expected: Vec<*const Eb64Node> = walk(&root);

        for i in order {
            let gone = &*cells[i] as *const Eb64Node;
            cells[i].delete();
            expected.retain(|&p| p != gone);
            assert_eq!(walk(&root), expected);
        }
        assert!(root.is_empty());
    }
}

#[test]
fn exact_lookup_returns_oldest_duplicate() {
    let mut rng = ChaCha8Rng::seed_from_u64(25);
    let mut cells: Vec<Box<Eb64Node>> = (0..300)
        .map(|_| Box::new(Eb64Node::new(rng.gen_range(0..24))))
        .collect();

    let mut root = Root::new();
    unsafe {
        for cell in &mut cells {
            eb64::insert(&mut root, cell);
        }
        for key in 0..24 {
            let oldest = cells
                .iter()
                .find(|c| c.key() == key)
                .map(|c| &**c as *const Eb64Node);
            let got = eb64::lookup(&root, key).map(|n| n.as_ptr() as *const Eb64Node);
            assert_eq!(got, oldest, "key {}", key);
        }
    }
}
