use super::*;
use std::vec::Vec;

#[test]
fn address_ordering() {
    // a static array gives addresses with a known relative order
    static SLOTS: [u8; 4] = [0; 4];
    let keys: [*const (); 4] = [
        (&SLOTS[2] as *const u8).cast(),
        (&SLOTS[0] as *const u8).cast(),
        (&SLOTS[3] as *const u8).cast(),
        (&SLOTS[1] as *const u8).cast(),
    ];

    let mut root = Root::new();
    let mut cells: Vec<EbPtNode> = keys.iter().map(|&k| EbPtNode::new(k)).collect();
    unsafe {
        for cell in &mut cells {
            insert(&mut root, cell);
        }
        let got: Vec<*const ()> = iter(&root).map(EbPtNode::key).collect();
        let mut sorted = keys.to_vec();
        sorted.sort_unstable();
        assert_eq!(got, sorted);

        for &k in &keys {
            assert_eq!(lookup(&root, k).unwrap().as_ref().key(), k);
        }
        assert!(lookup(&root, core::ptr::null()).is_none());

        // the range lookups follow address order too
        assert_eq!(
            lookup_le(&root, sorted[2]).unwrap().as_ref().key(),
            sorted[2]
        );
        assert_eq!(
            lookup_ge(&root, sorted[0]).unwrap().as_ref().key(),
            sorted[0]
        );

        for cell in &mut cells {
            cell.delete();
        }
        assert!(root.is_empty());
    }
}

#[test]
fn traversal_wrappers() {
    static SLOTS: [u64; 3] = [0; 3];
    let mut root = Root::new();
    let mut cells: Vec<EbPtNode> = SLOTS
        .iter()
        .map(|s| EbPtNode::new((s as *const u64).cast()))
        .collect();
    unsafe {
        for cell in &mut cells {
            insert(&mut root, cell);
        }
        let lo = first(&root).unwrap();
        let hi = last(&root).unwrap();
        assert!(lo.as_ref().key() < hi.as_ref().key());
        assert_eq!(lo.as_ref().next().unwrap().as_ref().prev().unwrap(), lo);
        assert!(hi.as_ref().next().is_none());
        assert!(lo.as_ref().prev().is_none());
        assert_eq!(lo.as_ref().next_unique().unwrap().as_ref().key(),
                   cells_sorted_second(&cells));

        for cell in &mut cells {
            cell.delete();
        }
    }
}

fn cells_sorted_second(cells: &[EbPtNode]) -> *const () {
    let mut keys: Vec<*const ()> = cells.iter().map(EbPtNode::key).collect();
    keys.sort_unstable();
    keys[1]
}
