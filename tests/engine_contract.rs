// Engine contract suite, run once per engine.
//
// Every check is written against `MapEngine` only, so both engines must
// pass it unchanged. Core invariants exercised:
// - Round-trip: after insert(k, v), find(k) resolves to v.
// - Size: len() equals the number of entries a full forward walk visits.
// - Failed operations (duplicate insert, absent remove) leave the map as is.
// - Sentinels: begin() == end() iff empty; stepping past either end fails
//   with InvalidIterator; reading end fails with DereferenceOfEndPosition.
// - Cursors: next-then-prev and prev-then-next return to the start.
// - take(): the source ends empty, the destination holds the old contents.
// - A saved next position survives removal of the current one.
// - iter_mut visits every entry once, in traversal order.
use map_engines::{ChainedHashMap, Cursor, MapEngine, MapError, TreeMap};

fn walk_len<M: MapEngine<u32, String>>(m: &M) -> usize {
    let mut n = 0;
    let mut pos = m.begin();
    while pos != m.end() {
        n += 1;
        pos = m.next(pos).expect("forward step inside range");
    }
    n
}

fn filled<M: MapEngine<u32, String> + Default>(keys: &[u32]) -> M {
    let mut m = M::default();
    for &k in keys {
        m.insert(k, format!("v{k}")).expect("fresh key");
    }
    m
}

fn round_trip<M: MapEngine<u32, String> + Default>() {
    let m: M = filled(&[10, 3, 7, 65537, 0]);
    for k in [10, 3, 7, 65537, 0] {
        let pos = m.find(&k);
        assert_ne!(pos, m.end());
        let (key, value) = m.entry_at(pos).unwrap();
        assert_eq!(*key, k);
        assert_eq!(*value, format!("v{k}"));
    }
    assert_eq!(m.find(&4), m.end());
}

fn size_matches_walk<M: MapEngine<u32, String> + Default>() {
    let mut m: M = filled(&[1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(m.len(), walk_len(&m));
    for k in [2, 8, 5] {
        m.remove(&k).unwrap();
        assert_eq!(m.len(), walk_len(&m));
    }
    *m.get_or_insert_default(100) = "hundred".to_string();
    assert_eq!(m.len(), 6);
    assert_eq!(m.len(), walk_len(&m));
    assert_eq!(m.iter().count(), m.len());
}

fn duplicate_insert_rejected<M: MapEngine<u32, String> + Default>() {
    let mut m: M = filled(&[1]);
    assert_eq!(m.insert(1, "other".to_string()), Err(MapError::DuplicateKey));
    assert_eq!(m.value_of(&1), Ok(&"v1".to_string()));
    assert_eq!(m.len(), 1);
}

fn remove_twice_fails<M: MapEngine<u32, String> + Default>() {
    let mut m: M = filled(&[1, 2]);
    assert_eq!(m.remove(&1), Ok((1, "v1".to_string())));
    assert_eq!(m.remove(&1), Err(MapError::KeyNotFound));
    assert_eq!(m.len(), 1);
}

fn value_of_semantics<M: MapEngine<u32, String> + Default>() {
    let mut m: M = filled(&[4]);
    assert_eq!(m.value_of(&5), Err(MapError::KeyNotFound));
    m.value_of_mut(&4).unwrap().push('!');
    assert_eq!(m.value_of(&4), Ok(&"v4!".to_string()));
    assert_eq!(m.value_of_mut(&5), Err(MapError::KeyNotFound));
    assert_eq!(m.len(), 1, "value_of must not insert");
}

fn index_inserts_default<M: MapEngine<u32, String> + Default>() {
    let mut m: M = M::default();
    assert!(m.get_or_insert_default(9).is_empty());
    m.get_or_insert_default(9).push_str("nine");
    assert_eq!(m.value_of(&9), Ok(&"nine".to_string()));
    assert_eq!(m.len(), 1);
}

fn sentinels<M: MapEngine<u32, String> + Default>() {
    let mut m: M = M::default();
    assert_eq!(m.begin(), m.end());
    assert_eq!(m.next(m.end()), Err(MapError::InvalidIterator));
    assert_eq!(m.prev(m.end()), Err(MapError::InvalidIterator));
    assert_eq!(m.entry_at(m.end()), Err(MapError::DereferenceOfEndPosition));
    let end = m.end();
    assert_eq!(m.value_at_mut(end), Err(MapError::DereferenceOfEndPosition));
    assert_eq!(m.remove_at(end), Err(MapError::InvalidIterator));

    m.insert(1, "v1".to_string()).unwrap();
    assert_ne!(m.begin(), m.end());
    assert_eq!(m.next(m.begin()), Ok(m.end()));
    assert_eq!(m.prev(m.end()), Ok(m.begin()));
    assert_eq!(m.prev(m.begin()), Err(MapError::InvalidIterator));
}

fn cursor_protocol<M: MapEngine<u32, String> + Default>() {
    let m: M = filled(&[5, 1, 9, 3]);
    let mut c = m.cursor();
    let mut seen = Vec::new();
    while !c.is_end() {
        seen.push(*c.key().unwrap());
        let here = c;
        c.move_next().unwrap();
        let mut back = c;
        back.move_prev().unwrap();
        assert_eq!(back, here, "prev(next(p)) == p");
    }
    assert_eq!(seen.len(), 4);
    assert_eq!(c.move_next(), Err(MapError::InvalidIterator));
    assert!(c.is_end(), "failed step leaves the cursor in place");
    assert_eq!(c.value(), Err(MapError::DereferenceOfEndPosition));

    let mut c = m.cursor();
    assert_eq!(c.move_prev(), Err(MapError::InvalidIterator));
    assert_eq!(c, m.cursor());

    // Cursors over different maps never compare equal.
    let other: M = filled(&[5, 1, 9, 3]);
    let a: Cursor<'_, u32, String, M> = m.cursor();
    let b: Cursor<'_, u32, String, M> = other.cursor();
    assert_ne!(a, b);
}

fn remove_through_positions<M: MapEngine<u32, String> + Default>() {
    let mut m: M = filled(&[4, 2, 6, 1, 3, 5, 7]);
    while m.begin() != m.end() {
        let pos = m.begin();
        let (k, _) = m.remove_at(pos).unwrap();
        assert_eq!(m.find(&k), m.end());
        assert_eq!(m.len(), walk_len(&m));
    }
    assert!(m.is_empty());
}

fn take_moves_everything<M: MapEngine<u32, String> + Default>() {
    let mut a: M = filled(&[1, 2, 3]);
    let expected: Vec<(u32, String)> = a.iter().map(|(k, v)| (*k, v.clone())).collect();
    let b = a.take();
    assert_eq!(a.len(), 0);
    assert_eq!(a.begin(), a.end());
    let got: Vec<(u32, String)> = b.iter().map(|(k, v)| (*k, v.clone())).collect();
    assert_eq!(got, expected);

    // Move-assign: the destination's previous contents are dropped.
    let mut c: M = filled(&[42]);
    assert_eq!(c.len(), 1);
    let mut b = b;
    c = b.take();
    assert_eq!(c.len(), 3);
    assert_eq!(c.find(&42), c.end());
    assert!(b.is_empty());
}

fn clear_empties<M: MapEngine<u32, String> + Default>() {
    let mut m: M = filled(&[1, 2, 3]);
    m.clear();
    assert!(m.is_empty());
    assert_eq!(m.begin(), m.end());
    m.insert(2, "again".to_string()).unwrap();
    assert_eq!(m.len(), 1);
}

fn iter_both_ends<M: MapEngine<u32, String> + Default>() {
    let m: M = filled(&[8, 4, 12, 2, 6]);
    let forward: Vec<u32> = m.iter().map(|(k, _)| *k).collect();
    let mut backward: Vec<u32> = m.iter().rev().map(|(k, _)| *k).collect();
    backward.reverse();
    assert_eq!(forward, backward);

    let mut it = m.iter();
    assert_eq!(it.len(), 5);
    let first = it.next().map(|(k, _)| *k);
    let last = it.next_back().map(|(k, _)| *k);
    assert_eq!(first, forward.first().copied());
    assert_eq!(last, forward.last().copied());
    assert_eq!(it.len(), 3);
    assert_eq!(it.count(), 3);
}

fn iter_mut_updates_values<M: MapEngine<u32, String> + Default>() {
    let mut m: M = filled(&[3, 65537, 1, 7]);
    let order: Vec<u32> = m.iter().map(|(k, _)| *k).collect();
    let mut seen = Vec::new();
    for (k, v) in m.iter_mut() {
        seen.push(*k);
        v.push_str("+1");
    }
    assert_eq!(seen, order, "iter_mut follows traversal order");
    for k in order {
        assert_eq!(m.value_of(&k), Ok(&format!("v{k}+1")));
    }
    assert_eq!(m.iter_mut().len(), m.len());
}

fn remove_while_advancing<M: MapEngine<u32, String> + Default>() {
    let mut m: M = filled(&[0, 65537, 131074, 5, 2, 9]);
    let mut pos = m.begin();
    let mut removed = 0;
    while pos != m.end() {
        let next = m.next(pos).expect("next of a live position");
        m.remove_at(pos).expect("saved position stays valid");
        removed += 1;
        pos = next;
    }
    assert_eq!(removed, 6);
    assert!(m.is_empty());
}

macro_rules! contract_suite {
    ($name:ident, $engine:ty) => {
        mod $name {
            use super::*;

            #[test]
            fn round_trip() {
                super::round_trip::<$engine>();
            }
            #[test]
            fn size_matches_walk() {
                super::size_matches_walk::<$engine>();
            }
            #[test]
            fn duplicate_insert_rejected() {
                super::duplicate_insert_rejected::<$engine>();
            }
            #[test]
            fn remove_twice_fails() {
                super::remove_twice_fails::<$engine>();
            }
            #[test]
            fn value_of_semantics() {
                super::value_of_semantics::<$engine>();
            }
            #[test]
            fn index_inserts_default() {
                super::index_inserts_default::<$engine>();
            }
            #[test]
            fn sentinels() {
                super::sentinels::<$engine>();
            }
            #[test]
            fn cursor_protocol() {
                super::cursor_protocol::<$engine>();
            }
            #[test]
            fn remove_through_positions() {
                super::remove_through_positions::<$engine>();
            }
            #[test]
            fn take_moves_everything() {
                super::take_moves_everything::<$engine>();
            }
            #[test]
            fn clear_empties() {
                super::clear_empties::<$engine>();
            }
            #[test]
            fn iter_both_ends() {
                super::iter_both_ends::<$engine>();
            }
            #[test]
            fn iter_mut_updates_values() {
                super::iter_mut_updates_values::<$engine>();
            }
            #[test]
            fn remove_while_advancing() {
                super::remove_while_advancing::<$engine>();
            }
        }
    };
}

contract_suite!(tree, TreeMap<u32, String>);
contract_suite!(chained, ChainedHashMap<u32, String>);
