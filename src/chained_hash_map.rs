//! ChainedHashMap: unordered engine with a fixed bucket table and separate
//! chaining.
//!
//! Entries live in a generational slot arena; each bucket is an ordered chain
//! of entry keys. An entry belongs to bucket `hash(key) % bucket_count` and
//! each chain keeps insertion order. The bucket count is fixed at
//! construction and never grows. The chain table itself is allocated on the
//! first insertion, so an empty or taken-from map holds no bucket storage.
//!
//! Traversal runs bucket by bucket, then in insertion order inside a bucket.
//! A position is a bucket plus an entry key. Inserting or removing other
//! entries never disturbs it; once its own entry is removed it fails with
//! `InvalidIterator`, even if the arena slot is reused.

use crate::cursor::{Cursor, Iter, IterMut};
use crate::engine::MapEngine;
use crate::error::MapError;
use crate::hasher::IdentityState;
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use slotmap::{new_key_type, SlotMap};

/// Bucket count used by `new` and `with_hasher`. Prime, so integer keys
/// spread evenly under the identity hasher.
pub const DEFAULT_BUCKETS: usize = 65537;

new_key_type! {
    struct EntryKey;
}

struct Entry<K, V> {
    key: K,
    value: V,
}

/// A copyable reference to a hash map entry or to the end sentinel.
///
/// Positions are generation-checked against the map they are used with. A
/// position obtained from a different map is not detected and may name an
/// unrelated entry; carry a `Cursor` when the owning map must travel with it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Position(Slot);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
enum Slot {
    Entry { bucket: usize, entry: EntryKey },
    End,
}

impl Position {
    pub const END: Position = Position(Slot::End);

    fn entry(bucket: usize, entry: EntryKey) -> Self {
        Position(Slot::Entry { bucket, entry })
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.0 == Slot::End
    }

    /// Bucket index, or `None` for the end position.
    pub fn bucket(&self) -> Option<usize> {
        match self.0 {
            Slot::Entry { bucket, .. } => Some(bucket),
            Slot::End => None,
        }
    }

    pub fn key<'a, K, V, S>(&self, map: &'a ChainedHashMap<K, V, S>) -> Result<&'a K, MapError> {
        map.entry_at(*self).map(|(k, _)| k)
    }

    pub fn value<'a, K, V, S>(&self, map: &'a ChainedHashMap<K, V, S>) -> Result<&'a V, MapError> {
        map.entry_at(*self).map(|(_, v)| v)
    }

    pub fn value_mut<'a, K, V, S>(
        &self,
        map: &'a mut ChainedHashMap<K, V, S>,
    ) -> Result<&'a mut V, MapError> {
        map.value_at_mut(*self)
    }
}

/// Entry arena plus bucket chains. `chains` is either empty (not yet
/// allocated) or exactly `bucket_count` long, and every live entry key sits
/// in exactly one chain.
struct Table<K, V> {
    entries: SlotMap<EntryKey, Entry<K, V>>,
    chains: Vec<Vec<EntryKey>>,
    bucket_count: usize,
}

impl<K, V> Table<K, V> {
    fn new(bucket_count: usize) -> Self {
        Self {
            entries: SlotMap::with_key(),
            chains: Vec::new(),
            bucket_count,
        }
    }

    fn chain(&self, bucket: usize) -> &[EntryKey] {
        match self.chains.get(bucket) {
            Some(chain) => chain,
            None => &[],
        }
    }

    /// Appends to `bucket`, allocating the chain table on first use.
    fn push(&mut self, bucket: usize, key: K, value: V) -> EntryKey {
        if self.chains.is_empty() {
            self.chains.resize_with(self.bucket_count, Vec::new);
        }
        let e = self.entries.insert(Entry { key, value });
        self.chains[bucket].push(e);
        e
    }

    /// Index of `entry` within `bucket`, if the entry is live and chained
    /// there.
    fn index_of(&self, bucket: usize, entry: EntryKey) -> Option<usize> {
        if !self.entries.contains_key(entry) {
            return None;
        }
        self.chain(bucket).iter().position(|&e| e == entry)
    }

    /// Erases an entry, keeping the order of the rest of its bucket.
    fn erase(&mut self, bucket: usize, index: usize) -> (K, V) {
        let e = self.chains[bucket].remove(index);
        let entry = self
            .entries
            .remove(e)
            .expect("chained entry must still be in the arena");
        (entry.key, entry.value)
    }

    fn first_from(&self, bucket: usize) -> Option<(usize, EntryKey)> {
        (bucket..self.chains.len()).find_map(|b| self.chains[b].first().map(|&e| (b, e)))
    }

    fn last_before(&self, bucket: usize) -> Option<(usize, EntryKey)> {
        (0..bucket.min(self.chains.len()))
            .rev()
            .find_map(|b| self.chains[b].last().map(|&e| (b, e)))
    }
}

/// Hash map with a fixed number of separately chained buckets.
pub struct ChainedHashMap<K, V, S = IdentityState> {
    hasher: S,
    table: Table<K, V>,
    reentrancy: DebugReentrancy,
}

impl<K, V> ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(IdentityState)
    }
}

impl<K, V, S> ChainedHashMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_buckets_and_hasher(DEFAULT_BUCKETS, hasher)
    }

    /// Fixes the bucket count for the lifetime of the map. A count of zero
    /// is raised to one.
    pub fn with_buckets_and_hasher(bucket_count: usize, hasher: S) -> Self {
        Self {
            hasher,
            table: Table::new(bucket_count.max(1)),
            reentrancy: DebugReentrancy::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.entries.is_empty()
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Drops every entry and releases the bucket table.
    pub fn clear(&mut self) {
        self.table = Table::new(self.table.bucket_count);
    }

    /// First entry of the first non-empty bucket, or `end()`.
    pub fn begin(&self) -> Position {
        self.table
            .first_from(0)
            .map_or(Position::END, |(b, e)| Position::entry(b, e))
    }

    #[inline]
    pub fn end(&self) -> Position {
        Position::END
    }

    /// Resolves `pos` to `(bucket, index, entry)`; `None` for the end.
    fn live(&self, pos: Position) -> Result<Option<(usize, usize, EntryKey)>, MapError> {
        match pos.0 {
            Slot::End => Ok(None),
            Slot::Entry { bucket, entry } => self
                .table
                .index_of(bucket, entry)
                .map(|i| Some((bucket, i, entry)))
                .ok_or(MapError::InvalidIterator),
        }
    }

    pub fn next(&self, pos: Position) -> Result<Position, MapError> {
        let (bucket, index, _) = self.live(pos)?.ok_or(MapError::InvalidIterator)?;
        if let Some(&e) = self.table.chain(bucket).get(index + 1) {
            return Ok(Position::entry(bucket, e));
        }
        Ok(self
            .table
            .first_from(bucket + 1)
            .map_or(Position::END, |(b, e)| Position::entry(b, e)))
    }

    pub fn prev(&self, pos: Position) -> Result<Position, MapError> {
        let found = match self.live(pos)? {
            None => self.table.last_before(self.table.chains.len()),
            Some((bucket, index, _)) if index > 0 => {
                Some((bucket, self.table.chain(bucket)[index - 1]))
            }
            Some((bucket, _, _)) => self.table.last_before(bucket),
        };
        found
            .map(|(b, e)| Position::entry(b, e))
            .ok_or(MapError::InvalidIterator)
    }

    pub fn entry_at(&self, pos: Position) -> Result<(&K, &V), MapError> {
        match self.live(pos)? {
            None => Err(MapError::DereferenceOfEndPosition),
            Some((_, _, e)) => {
                let entry = &self.table.entries[e];
                Ok((&entry.key, &entry.value))
            }
        }
    }

    pub fn value_at_mut(&mut self, pos: Position) -> Result<&mut V, MapError> {
        match self.live(pos)? {
            None => Err(MapError::DereferenceOfEndPosition),
            Some((_, _, e)) => Ok(&mut self.table.entries[e].value),
        }
    }

    /// Removes the entry at `pos`. Positions to every other entry stay valid.
    pub fn remove_at(&mut self, pos: Position) -> Result<(K, V), MapError> {
        match self.live(pos)? {
            None => Err(MapError::InvalidIterator),
            Some((b, i, _)) => Ok(self.table.erase(b, i)),
        }
    }

    /// Lends every value mutably, bucket by bucket.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let order: Vec<EntryKey> = self.table.chains.iter().flatten().copied().collect();
        IterMut::in_order(&mut self.table.entries, &order, |e| (&e.key, &mut e.value))
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn bucket_of<Q>(&self, q: &Q) -> usize
    where
        Q: ?Sized + Hash,
    {
        (self.hasher.hash_one(q) % self.table.bucket_count as u64) as usize
    }

    /// Linear scan of the key's bucket: `(bucket, index)` on a hit, the
    /// bucket on a miss.
    fn locate<Q>(&self, q: &Q) -> Result<(usize, usize), usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let bucket = self.bucket_of(q);
        self.table
            .chain(bucket)
            .iter()
            .position(|&e| Borrow::<Q>::borrow(&self.table.entries[e].key) == q)
            .map(|i| (bucket, i))
            .ok_or(bucket)
    }

    pub fn find<Q>(&self, q: &Q) -> Position
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        self.locate(q).map_or(Position::END, |(b, i)| {
            Position::entry(b, self.table.chains[b][i])
        })
    }

    pub fn contains_key<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        !self.find(q).is_end()
    }

    pub fn get<Q>(&self, q: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.value_of(q).ok()
    }

    pub fn get_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.value_of_mut(q).ok()
    }

    pub fn value_of<Q>(&self, q: &Q) -> Result<&V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let (b, i) = self.locate(q).map_err(|_| MapError::KeyNotFound)?;
        Ok(&self.table.entries[self.table.chains[b][i]].value)
    }

    pub fn value_of_mut<Q>(&mut self, q: &Q) -> Result<&mut V, MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let (b, i) = self.locate(q).map_err(|_| MapError::KeyNotFound)?;
        let e = self.table.chains[b][i];
        Ok(&mut self.table.entries[e].value)
    }

    /// Appends to the key's bucket. An existing key is left untouched and
    /// reported as `DuplicateKey`.
    pub fn insert(&mut self, key: K, value: V) -> Result<Position, MapError> {
        self.insert_with(key, || value)
    }

    pub fn insert_with<F>(&mut self, key: K, default: F) -> Result<Position, MapError>
    where
        F: FnOnce() -> V,
    {
        let _g = self.reentrancy.enter();
        match self.locate(&key) {
            Ok(_) => Err(MapError::DuplicateKey),
            Err(bucket) => {
                let e = self.table.push(bucket, key, default());
                Ok(Position::entry(bucket, e))
            }
        }
    }

    pub fn get_or_insert_with<F>(&mut self, key: K, default: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let _g = self.reentrancy.enter();
        let e = match self.locate(&key) {
            Ok((b, i)) => self.table.chains[b][i],
            Err(bucket) => self.table.push(bucket, key, default()),
        };
        &mut self.table.entries[e].value
    }

    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    pub fn remove<Q>(&mut self, q: &Q) -> Result<(K, V), MapError>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let (b, i) = self.locate(q).map_err(|_| MapError::KeyNotFound)?;
        Ok(self.table.erase(b, i))
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Clone,
{
    /// Moves every entry into the returned map in O(1), leaving `self`
    /// empty with the same hasher and bucket count.
    pub fn take(&mut self) -> Self {
        let empty = Self::with_buckets_and_hasher(self.bucket_count(), self.hasher.clone());
        core::mem::replace(self, empty)
    }

    pub fn iter(&self) -> Iter<'_, K, V, Self> {
        Iter::new(self)
    }

    pub fn cursor(&self) -> Cursor<'_, K, V, Self> {
        Cursor::new(self, self.begin())
    }

    pub fn cursor_at(&self, pos: Position) -> Cursor<'_, K, V, Self> {
        Cursor::new(self, pos)
    }
}

impl<K, V, S> MapEngine<K, V> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Clone,
{
    type Position = Position;

    fn len(&self) -> usize {
        ChainedHashMap::len(self)
    }

    fn begin(&self) -> Position {
        ChainedHashMap::begin(self)
    }

    fn end(&self) -> Position {
        Position::END
    }

    fn find(&self, key: &K) -> Position {
        ChainedHashMap::find(self, key)
    }

    fn next(&self, pos: Position) -> Result<Position, MapError> {
        ChainedHashMap::next(self, pos)
    }

    fn prev(&self, pos: Position) -> Result<Position, MapError> {
        ChainedHashMap::prev(self, pos)
    }

    fn entry_at(&self, pos: Position) -> Result<(&K, &V), MapError> {
        ChainedHashMap::entry_at(self, pos)
    }

    fn value_at_mut(&mut self, pos: Position) -> Result<&mut V, MapError> {
        ChainedHashMap::value_at_mut(self, pos)
    }

    fn insert(&mut self, key: K, value: V) -> Result<Position, MapError> {
        ChainedHashMap::insert(self, key, value)
    }

    fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        ChainedHashMap::get_or_insert_default(self, key)
    }

    fn value_of(&self, key: &K) -> Result<&V, MapError> {
        ChainedHashMap::value_of(self, key)
    }

    fn value_of_mut(&mut self, key: &K) -> Result<&mut V, MapError> {
        ChainedHashMap::value_of_mut(self, key)
    }

    fn remove(&mut self, key: &K) -> Result<(K, V), MapError> {
        ChainedHashMap::remove(self, key)
    }

    fn remove_at(&mut self, pos: Position) -> Result<(K, V), MapError> {
        ChainedHashMap::remove_at(self, pos)
    }

    fn clear(&mut self) {
        ChainedHashMap::clear(self)
    }

    fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        ChainedHashMap::iter_mut(self)
    }

    fn take(&mut self) -> Self {
        ChainedHashMap::take(self)
    }
}

impl<K, V, S> Default for ChainedHashMap<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

/// Re-inserts every pair in traversal order into a map with the same
/// hasher and bucket count.
impl<K, V, S> Clone for ChainedHashMap<K, V, S>
where
    K: Eq + Hash + Clone,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn clone(&self) -> Self {
        let _g = self.reentrancy.enter();
        let mut copy = Self::with_buckets_and_hasher(self.bucket_count(), self.hasher.clone());
        for &e in self.table.chains.iter().flatten() {
            let entry = &self.table.entries[e];
            let bucket = copy.bucket_of(&entry.key);
            copy.table.push(bucket, entry.key.clone(), entry.value.clone());
        }
        copy
    }
}

/// Equal iff both hold the same pairs; bucket layout and order are ignored.
impl<K, V, S> PartialEq for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        let _g = self.reentrancy.enter();
        let _h = (!core::ptr::eq(self, other)).then(|| other.reentrancy.enter());
        self.table.entries.values().all(|entry| match other.locate(&entry.key) {
            Ok((b, i)) => other.table.entries[other.table.chains[b][i]].value == entry.value,
            Err(_) => false,
        })
    }
}

impl<K, V, S> Eq for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher + Clone,
{
}

impl<K, V, S> fmt::Debug for ChainedHashMap<K, V, S>
where
    K: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Applies `insert` in order; a later duplicate key is dropped.
impl<K, V, S> FromIterator<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            let _ = self.insert(k, v);
        }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ChainedHashMap<K, V>
where
    K: Eq + Hash,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Clone,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, ChainedHashMap<K, V, S>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut ChainedHashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Panics unless every entry is chained exactly once, in its hash
    /// bucket, and keys are unique.
    pub(crate) fn assert_invariants(&self) {
        let chains = &self.table.chains;
        assert!(
            chains.is_empty() || chains.len() == self.table.bucket_count,
            "bucket table has the wrong size"
        );
        let mut chained = 0usize;
        for (b, chain) in chains.iter().enumerate() {
            for (i, &e) in chain.iter().enumerate() {
                let key = &self
                    .table
                    .entries
                    .get(e)
                    .expect("chain names a dead entry")
                    .key;
                assert_eq!(self.bucket_of(key), b, "entry in the wrong bucket");
                // The first match must be this entry, so no earlier duplicate.
                assert_eq!(self.locate(key), Ok((b, i)), "duplicate key in bucket");
                chained += 1;
            }
        }
        assert_eq!(chained, self.table.entries.len(), "arena holds unchained entries");
    }
}
