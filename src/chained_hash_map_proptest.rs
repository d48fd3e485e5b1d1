#![cfg(test)]

// Property tests for ChainedHashMap kept inside the crate so they can check
// bucket placement directly.

use crate::chained_hash_map::ChainedHashMap;
use crate::error::MapError;
use crate::hasher::IdentityState;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

#[derive(Clone, Debug)]
enum Op {
    Insert(u32, i32),
    Index(u32, i32),
    Remove(u32),
    RemoveAt(u32),
    ValueOf(u32),
    Walk,
    CloneEq,
}

fn arb_op() -> impl Strategy<Value = Op> {
    let key = 0u32..64;
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

// Property: state-machine equivalence against std HashMap, with a small
// bucket count so chains grow long and removals shift positions.
// Invariants exercised across random operation sequences:
// - Every entry sits in bucket `hash % buckets`; no duplicates; len parity.
// - `insert` rejects duplicates; index inserts once then updates.
// - `remove`/`remove_at` return the model's pair; absent keys fail without
//   mutation.
// - Forward and backward walks visit each live entry exactly once, in
//   mirrored order.
// - Clones compare equal.
fn run(buckets: usize, ops: Vec<Op>) -> Result<(), TestCaseError> {
    let mut sut: ChainedHashMap<u32, i32> =
        ChainedHashMap::with_buckets_and_hasher(buckets, IdentityState);
    let mut model: HashMap<u32, i32> = HashMap::new();

    for op in ops {
        match op {
            Op::Insert(k, v) => {
                let already = model.contains_key(&k);
                match sut.insert(k, v) {
                    Ok(pos) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        prop_assert_eq!(pos.bucket(), Some(k as usize % buckets));
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
                let forward: Vec<(u32, i32)> = sut.iter().map(|(k, v)| (*k, *v)).collect();
                let mut backward: Vec<(u32, i32)> =
                    sut.iter().rev().map(|(k, v)| (*k, *v)).collect();
                backward.reverse();
                prop_assert_eq!(&forward, &backward);

                let seen: BTreeSet<(u32, i32)> = forward.iter().copied().collect();
                let expected: BTreeSet<(u32, i32)> =
                    model.iter().map(|(k, v)| (*k, *v)).collect();
                prop_assert_eq!(seen.len(), forward.len(), "entry visited twice");
                prop_assert_eq!(seen, expected);

                let buckets_seen: Vec<usize> =
                    forward.iter().map(|(k, _)| *k as usize % buckets).collect();
                prop_assert!(buckets_seen.windows(2).all(|w| w[0] <= w[1]));
            }
            Op::CloneEq => {
                let copy = sut.clone();
                copy.assert_invariants();
                prop_assert!(copy == sut);
            }
        }

        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_small_table(ops in proptest::collection::vec(arb_op(), 1..120)) {
        run(5, ops)?;
    }

    #[test]
    fn prop_state_machine_single_bucket(ops in proptest::collection::vec(arb_op(), 1..120)) {
        run(1, ops)?;
    }
}
