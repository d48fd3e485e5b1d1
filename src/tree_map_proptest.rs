#![cfg(test)]

// Property tests for TreeMap kept inside the crate so they can check the
// arena links directly.

use crate::error::MapError;
use crate::tree_map::TreeMap;
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Insert(u8, i32),
    Index(u8, i32),
    Remove(u8),
    RemoveAt(u8),
    ValueOf(u8),
    Walk,
    CloneEq,
}

fn arb_op() -> impl Strategy<Value = Op> {
    // Narrow key space so removals and duplicates hit often.
    let key = 0u8..48;
    prop_oneof![
        4 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => (key.clone(), any::<i32>()).prop_map(|(k, v)| Op::Index(k, v)),
        3 => key.clone().prop_map(Op::Remove),
        2 => key.clone().prop_map(Op::RemoveAt),
        2 => key.prop_map(Op::ValueOf),
        1 => Just(Op::Walk),
        1 => Just(Op::CloneEq),
    ]
}

// Property: state-machine equivalence against BTreeMap.
// Invariants exercised across random operation sequences:
// - BST order, parent links and arena reachability hold after every op.
// - `insert` rejects duplicates without touching the stored value.
// - Index inserts a default once, then updates in place.
// - `remove`/`remove_at` return the model's pair; absent keys fail with
//   `KeyNotFound` and leave size unchanged.
// - Forward and backward position walks match the model's ordering.
// - Clones compare equal and share no storage with the source.
proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine(ops in proptest::collection::vec(arb_op(), 1..120)) {
        let mut sut: TreeMap<u8, i32> = TreeMap::new();
        let mut model: BTreeMap<u8, i32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let already = model.contains_key(&k);
                    match sut.insert(k, v) {
                        Ok(pos) => {
                            prop_assert!(!already, "insert must fail on duplicate");
                            prop_assert_eq!(pos.value(&sut), Ok(&v));
                            model.insert(k, v);
                        }
                        Err(e) => {
                            prop_assert!(already);
                            prop_assert_eq!(e, MapError::DuplicateKey);
                        }
                    }
                }
                Op::Index(k, d) => {
                    let slot = sut.get_or_insert_default(k);
                    *slot = slot.wrapping_add(d);
                    let m = model.entry(k).or_default();
                    *m = m.wrapping_add(d);
                }
                Op::Remove(k) => {
                    let before = sut.len();
                    match model.remove(&k) {
                        Some(v) => prop_assert_eq!(sut.remove(&k), Ok((k, v))),
                        None => {
                            prop_assert_eq!(sut.remove(&k), Err(MapError::KeyNotFound));
                            prop_assert_eq!(sut.len(), before);
                        }
                    }
                }
                Op::RemoveAt(k) => {
                    let pos = sut.find(&k);
                    match model.remove(&k) {
                        Some(v) => prop_assert_eq!(sut.remove_at(pos), Ok((k, v))),
                        None => {
                            prop_assert!(pos.is_end());
                            prop_assert_eq!(sut.remove_at(pos), Err(MapError::InvalidIterator));
                        }
                    }
                }
                Op::ValueOf(k) => {
                    let expected = model.get(&k).ok_or(MapError::KeyNotFound);
                    prop_assert_eq!(sut.value_of(&k), expected);
                }
                Op::Walk => {
                    let mut forward = Vec::new();
                    let mut pos = sut.begin();
                    while !pos.is_end() {
                        let (k, v) = sut.entry_at(pos).unwrap();
                        forward.push((*k, *v));
                        pos = sut.next(pos).unwrap();
                    }
                    let expected: Vec<(u8, i32)> = model.iter().map(|(k, v)| (*k, *v)).collect();
                    prop_assert_eq!(&forward, &expected);

                    let backward: Vec<(u8, i32)> = sut.iter().rev().map(|(k, v)| (*k, *v)).collect();
                    let expected_rev: Vec<(u8, i32)> = expected.into_iter().rev().collect();
                    prop_assert_eq!(backward, expected_rev);
                }
                Op::CloneEq => {
                    let copy = sut.clone();
                    copy.assert_invariants();
                    prop_assert!(copy == sut);
                    prop_assert_eq!(copy.height(), sut.height());
                }
            }

            sut.assert_invariants();
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
        }
    }
}

// Property: equality depends only on the pair set, not on the insertion
// order that shaped each tree.
proptest! {
    #[test]
    fn prop_equality_ignores_insertion_order(
        keys in proptest::collection::btree_set(any::<u16>(), 0..64),
        seed in any::<u64>(),
    ) {
        let pairs: Vec<(u16, u32)> = keys.iter().map(|&k| (k, u32::from(k) * 3)).collect();
        let mut shuffled = pairs.clone();
        // Deterministic shuffle from the seed.
        let mut s = seed | 1;
        for i in (1..shuffled.len()).rev() {
            s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            shuffled.swap(i, (s >> 33) as usize % (i + 1));
        }

        let a: TreeMap<u16, u32> = pairs.into_iter().collect();
        let b: TreeMap<u16, u32> = shuffled.into_iter().collect();
        a.assert_invariants();
        b.assert_invariants();
        prop_assert!(a == b);
        prop_assert!(b == a);
    }
}
