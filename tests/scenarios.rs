// Concrete scenarios for each engine, through the public API.
//
// - Tree: the seven-key example keeps ascending order through a
//   two-children root removal.
// - Hash: keys 0 and 65537 collide in the default table yet stay
//   independent, and positions in one chain survive removals around them.
// - Construction from a list is first-wins on duplicate keys.
// - Equality holds across insertion orders and engine shapes.
use map_engines::{ChainedHashMap, MapError, TreeMap, DEFAULT_BUCKETS};

#[test]
fn tree_seven_keys_and_root_removal() {
    let mut m: TreeMap<i32, &str> = TreeMap::new();
    for k in [5, 3, 8, 1, 4, 7, 9] {
        *m.get_or_insert_default(k) = "x";
    }
    let keys: Vec<i32> = m.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, vec![1, 3, 4, 5, 7, 8, 9]);
    assert_eq!(m.height(), 3);

    assert_eq!(m.remove(&5), Ok((5, "x")));
    let keys: Vec<i32> = m.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, vec![1, 3, 4, 7, 8, 9]);
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn tree_remove_through_position_walk() {
    let mut m: TreeMap<i32, i32> = (0..32).map(|k| ((k * 7) % 32, k)).collect();
    assert_eq!(m.len(), 32);
    // Remove every other key while walking positions.
    let mut pos = m.begin();
    while !pos.is_end() {
        let next = m.next(pos).unwrap();
        if pos.key(&m).unwrap() % 2 == 0 {
            m.remove_at(pos).unwrap();
        }
        pos = next;
    }
    let keys: Vec<i32> = m.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, (0..32).filter(|k| k % 2 == 1).collect::<Vec<_>>());
}

#[test]
fn hash_colliding_keys() {
    let mut m: ChainedHashMap<usize, String> = ChainedHashMap::new();
    assert_eq!(m.bucket_count(), DEFAULT_BUCKETS);
    let p0 = m.insert(0, "zero".to_string()).unwrap();
    let p1 = m.insert(65537, "wrap".to_string()).unwrap();
    assert_eq!(p0.bucket(), p1.bucket());

    assert_eq!(m.value_of(&0).map(String::as_str), Ok("zero"));
    assert_eq!(m.value_of(&65537).map(String::as_str), Ok("wrap"));

    m.remove(&65537).unwrap();
    assert_eq!(m.value_of(&0).map(String::as_str), Ok("zero"));
    assert_eq!(m.value_of(&65537), Err(MapError::KeyNotFound));
    assert_eq!(m.len(), 1);
}

#[test]
fn hash_remove_through_position_walk() {
    // 0, 65537, 131074, ... all share bucket 0 of the default table.
    let mut m: ChainedHashMap<usize, usize> =
        (0..8).map(|i| (i * DEFAULT_BUCKETS, i)).collect();
    assert_eq!(m.len(), 8);
    // Remove every other entry of the one chain while walking positions.
    let mut pos = m.begin();
    while !pos.is_end() {
        let next = m.next(pos).unwrap();
        if pos.value(&m).unwrap() % 2 == 0 {
            m.remove_at(pos).unwrap();
        }
        pos = next;
    }
    let values: Vec<usize> = m.iter().map(|(_, v)| *v).collect();
    assert_eq!(values, vec![1, 3, 5, 7]);

    // And drain the rest the same way.
    let mut pos = m.begin();
    while !pos.is_end() {
        let next = m.next(pos).unwrap();
        m.remove_at(pos).unwrap();
        pos = next;
    }
    assert!(m.is_empty());
    assert_eq!(m.begin(), m.end());
}

#[test]
fn hash_traversal_is_bucket_order() {
    let m: ChainedHashMap<usize, ()> = [(65538, ()), (3, ()), (1, ()), (2, ())].into();
    // 65538 lands in bucket 1 ahead of 1, which was inserted later.
    let keys: Vec<usize> = m.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, vec![65538, 1, 2, 3]);
}

#[test]
fn list_construction_is_first_wins() {
    let t: TreeMap<&str, i32> = [("a", 1), ("b", 2), ("a", 3)].into();
    assert_eq!(t.len(), 2);
    assert_eq!(t.value_of("a"), Ok(&1));

    let h: ChainedHashMap<&str, i32> = [("a", 1), ("b", 2), ("a", 3)].into();
    assert_eq!(h.len(), 2);
    assert_eq!(h.value_of("a"), Ok(&1));

    let mut e: TreeMap<&str, i32> = TreeMap::new();
    e.extend([("z", 26), ("z", 0)]);
    assert_eq!(e.get("z"), Some(&26));
}

#[test]
fn equality_across_insertion_orders() {
    let a: TreeMap<u32, u32> = [(4, 40), (2, 20), (6, 60), (1, 10)].into();
    let b: TreeMap<u32, u32> = [(1, 10), (2, 20), (4, 40), (6, 60)].into();
    assert_eq!(a, b);
    assert_ne!(a.height(), b.height());

    let c: ChainedHashMap<u32, u32> = [(4, 40), (65541, 1), (2, 20)].into();
    let d: ChainedHashMap<u32, u32> = [(65541, 1), (2, 20), (4, 40)].into();
    assert_eq!(c, d);

    let mut e = d.clone();
    *e.get_mut(&2).unwrap() = 21;
    assert_ne!(c, e);
}

#[test]
fn copies_are_independent() {
    let mut a: TreeMap<u32, String> = [(2, "b".to_string()), (1, "a".to_string())].into();
    let b = a.clone();
    a.value_of_mut(&1).unwrap().push('!');
    assert_eq!(b.value_of(&1), Ok(&"a".to_string()));

    let mut h: ChainedHashMap<u32, String> = [(2, "b".to_string())].into();
    let g = h.clone();
    h.remove(&2).unwrap();
    assert_eq!(g.len(), 1);
}

#[test]
fn move_leaves_source_empty() {
    let mut a: TreeMap<u32, u32> = [(1, 1), (2, 2)].into();
    let b = a.take();
    assert!(a.is_empty());
    assert_eq!(a.begin(), a.end());
    assert_eq!(b.len(), 2);

    let mut h: ChainedHashMap<u32, u32> = [(1, 1), (2, 2)].into();
    let g = h.take();
    assert!(h.is_empty());
    assert_eq!(h.begin(), h.end());
    assert_eq!(g.len(), 2);
}

#[test]
fn debug_lists_entries_in_traversal_order() {
    let t: TreeMap<u32, char> = [(2, 'b'), (1, 'a')].into();
    assert_eq!(format!("{t:?}"), "{1: 'a', 2: 'b'}");
    let h: ChainedHashMap<u32, char> = [(2, 'b'), (1, 'a')].into();
    assert_eq!(format!("{h:?}"), "{1: 'a', 2: 'b'}");
}

#[test]
fn errors_are_std_errors() {
    let m: TreeMap<u32, u32> = TreeMap::new();
    let err: Box<dyn std::error::Error> = Box::new(m.value_of(&1).unwrap_err());
    assert_eq!(err.to_string(), "key not found");
}
