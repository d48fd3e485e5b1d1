//! The engine-agnostic map contract implemented by `TreeMap` and
//! `ChainedHashMap`.
//!
//! Code written against `MapEngine` behaves the same on either engine apart
//! from traversal order: ascending keys for the tree, bucket then insertion
//! order for the hash map.

use crate::cursor::{Cursor, Iter, IterMut};
use crate::error::MapError;
use core::fmt::Debug;

pub trait MapEngine<K, V> {
    /// Copyable reference to an entry or to the end sentinel.
    type Position: Copy + Eq + Debug;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First entry in traversal order, or `end()` when empty.
    fn begin(&self) -> Self::Position;

    /// The one-past-the-last sentinel.
    fn end(&self) -> Self::Position;

    /// Position of `key`, or `end()` when absent.
    fn find(&self, key: &K) -> Self::Position;

    /// Step forward. Fails with `InvalidIterator` at `end()` or on a stale
    /// position.
    fn next(&self, pos: Self::Position) -> Result<Self::Position, MapError>;

    /// Step backward. Fails with `InvalidIterator` at `begin()` or on a stale
    /// position; from `end()` it yields the last entry.
    fn prev(&self, pos: Self::Position) -> Result<Self::Position, MapError>;

    /// Entry at `pos`. `DereferenceOfEndPosition` at `end()`.
    fn entry_at(&self, pos: Self::Position) -> Result<(&K, &V), MapError>;

    fn value_at_mut(&mut self, pos: Self::Position) -> Result<&mut V, MapError>;

    /// Adds `key -> value`; `DuplicateKey` leaves the existing entry intact.
    fn insert(&mut self, key: K, value: V) -> Result<Self::Position, MapError>;

    /// Index operation: the value for `key`, inserting `V::default()` first
    /// when absent.
    fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default;

    fn value_of(&self, key: &K) -> Result<&V, MapError>;

    fn value_of_mut(&mut self, key: &K) -> Result<&mut V, MapError>;

    /// Removes `key`, returning the owned pair. `KeyNotFound` when absent.
    fn remove(&mut self, key: &K) -> Result<(K, V), MapError>;

    /// Removes the entry at `pos`. `InvalidIterator` at `end()`.
    fn remove_at(&mut self, pos: Self::Position) -> Result<(K, V), MapError>;

    fn clear(&mut self);

    /// Every `(&K, &mut V)` in traversal order.
    fn iter_mut(&mut self) -> IterMut<'_, K, V>;

    /// Moves the contents out in constant time, leaving `self` empty and
    /// usable.
    fn take(&mut self) -> Self
    where
        Self: Sized;

    fn cursor(&self) -> Cursor<'_, K, V, Self>
    where
        Self: Sized,
    {
        Cursor::new(self, self.begin())
    }

    fn cursor_at(&self, pos: Self::Position) -> Cursor<'_, K, V, Self>
    where
        Self: Sized,
    {
        Cursor::new(self, pos)
    }

    fn iter(&self) -> Iter<'_, K, V, Self>
    where
        Self: Sized,
    {
        Iter::new(self)
    }
}
