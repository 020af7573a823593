use std::collections::BTreeSet;

use ebtree::{eb32, eb64, Eb32Node, Eb64Node, Root};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

// The lookups are validated against a BTreeSet holding the same keys: le
// is the last key of ..=x, ge the first key of x.. .

#[test]
fn u64_lookups_match_model() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    // a narrow key range makes hits, misses and near-misses all common
    let keys: Vec<u64> = (0..800).map(|_| rng.gen_range(0..2_000)).collect();
    let model: BTreeSet<u64> = keys.iter().copied().collect();
    let mut cells: Vec<Box<Eb64Node>> =
        keys.iter().map(|&k| Box::new(Eb64Node::new(k))).collect();

    let mut root = Root::new();
    unsafe {
        for cell in &mut cells {
            eb64::insert(&mut root, cell);
        }

        for _ in 0..4_000 {
            let probe = rng.gen_range(0..2_100);

            let exact = eb64::lookup(&root, probe).map(|n| n.as_ref().key());
            assert_eq!(exact, model.get(&probe).copied(), "lookup({})", probe);

            let le = eb64::lookup_le(&root, probe).map(|n| n.as_ref().key());
            assert_eq!(
                le,
                model.range(..=probe).next_back().copied(),
                "lookup_le({})",
                probe
            );

            let ge = eb64::lookup_ge(&root, probe).map(|n| n.as_ref().key());
            assert_eq!(
                ge,
                model.range(probe..).next().copied(),
                "lookup_ge({})",
                probe
            );
        }

        // the extremes of the key space
        assert_eq!(
            eb64::lookup_le(&root, u64::MAX).map(|n| n.as_ref().key()),
            model.iter().next_back().copied()
        );
        assert_eq!(
            eb64::lookup_ge(&root, 0).map(|n| n.as_ref().key()),
            model.iter().next().copied()
        );
    }
}

#[test]
fn u32_lookups_match_model() {
    let mut rng = ChaCha8Rng::seed_from_u64(12);
    let keys: Vec<u32> = (0..500).map(|_| rng.gen()).collect();
    let model: BTreeSet<u32> = keys.iter().copied().collect();
    let mut cells: Vec<Box<Eb32Node>> =
        keys.iter().map(|&k| Box::new(Eb32Node::new(k))).collect();

    let mut root = Root::new();
    unsafe {
        for cell in &mut cells {
            eb32::insert(&mut root, cell);
        }

        // probe both random points and the stored keys themselves
        for _ in 0..2_000 {
            let probe = if rng.gen_bool(0.5) {
                rng.gen()
            } else {
                keys[rng.gen_range(0..keys.len())]
            };

            assert_eq!(
                eb32::lookup(&root, probe).map(|n| n.as_ref().key()),
                model.get(&probe).copied()
            );
            assert_eq!(
                eb32::lookup_le(&root, probe).map(|n| n.as_ref().key()),
                model.range(..=probe).next_back().copied()
            );
            assert_eq!(
                eb32::lookup_ge(&root, probe).map(|n| n.as_ref().key()),
                model.range(probe..).next().copied()
            );
        }
    }
}

#[test]
fn signed_lookups_match_model() {
    let mut rng = ChaCha8Rng::seed_from_u64(13);
    let keys: Vec<i32> = (0..600).map(|_| rng.gen_range(-1_000..1_000)).collect();
    let model: BTreeSet<i32> = keys.iter().copied().collect();
    let mut cells: Vec<Box<Eb32Node>> = keys
        .iter()
        .map(|&k| Box::new(Eb32Node::new_signed(k)))
        .collect();

    let mut root = Root::new();
    unsafe {
        for cell in &mut cells {
            eb32::insert_signed(&mut root, cell);
        }

        for probe in -1_100..1_100 {
            assert_eq!(
                eb32::lookup_signed(&root, probe).map(|n| n.as_ref().key_signed()),
                model.get(&probe).copied()
            );
            assert_eq!(
                eb32::lookup_le_signed(&root, probe).map(|n| n.as_ref().key_signed()),
                model.range(..=probe).next_back().copied(),
                "lookup_le_signed({})",
                probe
            );
            assert_eq!(
                eb32::lookup_ge_signed(&root, probe).map(|n| n.as_ref().key_signed()),
                model.range(probe..).next().copied(),
                "lookup_ge_signed({})",
                probe
            );
        }
    }
}

#[test]
fn lookups_survive_interleaved_deletions() {
    let mut rng = ChaCha8Rng::seed_from_u64(14);
    let keys: Vec<u64> = (0..400).map(|_| rng.gen_range(0..1_000)).collect();
    let mut model: BTreeSet<u64> = keys.iter().copied().collect();
    let mut cells: Vec<Box<Eb64Node>> =
        keys.iter().map(|&k| Box::new(Eb64Node::new(k))).collect();

    let mut root = Root::new();
    unsafe {
        for cell in &mut cells {
            eb64::insert(&mut root, cell);
        }

        for i in 0..cells.len() {
            let key = cells[i].key();
            cells[i].delete();
            // keep the model in sync; duplicates leave the key present
            if !cells[..i].iter().chain(&cells[i + 1..]).any(|c| c.is_linked() && c.key() == key) {
                model.remove(&key);
            }

            let probe = rng.gen_range(0..1_100);
            assert_eq!(
                eb64::lookup_le(&root, probe).map(|n| n.as_ref().key()),
                model.range(..=probe).next_back().copied()
            );
            assert_eq!(
                eb64::lookup_ge(&root, probe).map(|n| n.as_ref().key()),
                model.range(probe..).next().copied()
            );
        }
        assert!(root.is_empty());
    }
}
