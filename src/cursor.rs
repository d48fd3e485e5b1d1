//! Bidirectional traversal shared by both engines.
//!
//! `Cursor` is the position-at-a-time protocol: it borrows the map without
//! owning it, steps with `move_next` / `move_prev`, and reports stepping past
//! either sentinel as `MapError::InvalidIterator`. `Iter` is the std iterator
//! view over the same stepping, usable from both ends. `IterMut` lends every
//! value mutably in the same traversal order.

use crate::engine::MapEngine;
use crate::error::MapError;
use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use slotmap::{Key, SecondaryMap, SlotMap};

pub struct Cursor<'a, K, V, M: MapEngine<K, V>> {
    map: &'a M,
    pos: M::Position,
    _pd: PhantomData<&'a (K, V)>,
}

impl<'a, K, V, M: MapEngine<K, V>> Cursor<'a, K, V, M> {
    pub fn new(map: &'a M, pos: M::Position) -> Self {
        Self {
            map,
            pos,
            _pd: PhantomData,
        }
    }

    #[inline]
    pub fn position(&self) -> M::Position {
        self.pos
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.pos == self.map.end()
    }

    /// Advance to the next entry. On failure the cursor stays where it was.
    pub fn move_next(&mut self) -> Result<(), MapError> {
        self.pos = self.map.next(self.pos)?;
        Ok(())
    }

    /// Step back to the previous entry. On failure the cursor stays where it
    /// was.
    pub fn move_prev(&mut self) -> Result<(), MapError> {
        self.pos = self.map.prev(self.pos)?;
        Ok(())
    }

    pub fn entry(&self) -> Result<(&'a K, &'a V), MapError> {
        self.map.entry_at(self.pos)
    }

    pub fn key(&self) -> Result<&'a K, MapError> {
        self.entry().map(|(k, _)| k)
    }

    pub fn value(&self) -> Result<&'a V, MapError> {
        self.entry().map(|(_, v)| v)
    }
}

impl<K, V, M: MapEngine<K, V>> Clone for Cursor<'_, K, V, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, M: MapEngine<K, V>> Copy for Cursor<'_, K, V, M> {}

/// Cursors are equal when they walk the same container and sit on the same
/// position.
impl<K, V, M: MapEngine<K, V>> PartialEq for Cursor<'_, K, V, M> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.map, other.map) && self.pos == other.pos
    }
}

impl<K, V, M: MapEngine<K, V>> Eq for Cursor<'_, K, V, M> {}

impl<K, V, M: MapEngine<K, V>> fmt::Debug for Cursor<'_, K, V, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor").field("pos", &self.pos).finish()
    }
}

/// Iterator over `(&K, &V)` in the engine's traversal order.
pub struct Iter<'a, K, V, M: MapEngine<K, V>> {
    map: &'a M,
    front: M::Position,
    // Exclusive: the entry at `back` has already been yielded (or is `end`).
    back: M::Position,
    remaining: usize,
    _pd: PhantomData<&'a (K, V)>,
}

impl<'a, K, V, M: MapEngine<K, V>> Iter<'a, K, V, M> {
    pub(crate) fn new(map: &'a M) -> Self {
        Self {
            map,
            front: map.begin(),
            back: map.end(),
            remaining: map.len(),
            _pd: PhantomData,
        }
    }
}

impl<'a, K, V, M: MapEngine<K, V>> Iterator for Iter<'a, K, V, M> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let item = self.map.entry_at(self.front).ok()?;
        self.remaining -= 1;
        if let Ok(next) = self.map.next(self.front) {
            self.front = next;
        }
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, M: MapEngine<K, V>> DoubleEndedIterator for Iter<'_, K, V, M> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.back = self.map.prev(self.back).ok()?;
        self.remaining -= 1;
        self.map.entry_at(self.back).ok()
    }
}

impl<K, V, M: MapEngine<K, V>> ExactSizeIterator for Iter<'_, K, V, M> {}

impl<K, V, M: MapEngine<K, V>> FusedIterator for Iter<'_, K, V, M> {}

impl<K, V, M: MapEngine<K, V>> Clone for Iter<'_, K, V, M> {
    fn clone(&self) -> Self {
        Self {
            map: self.map,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
            _pd: PhantomData,
        }
    }
}

/// Iterator over `(&K, &mut V)` in the engine's traversal order.
pub struct IterMut<'a, K, V> {
    inner: std::vec::IntoIter<(&'a K, &'a mut V)>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    /// Lends the entries of `arena` in the order `order` lists their keys.
    /// `order` names each live key exactly once.
    pub(crate) fn in_order<A: Key, T>(
        arena: &'a mut SlotMap<A, T>,
        order: &[A],
        split: fn(&'a mut T) -> (&'a K, &'a mut V),
    ) -> Self {
        let mut rank = SecondaryMap::with_capacity(order.len());
        for (i, &k) in order.iter().enumerate() {
            rank.insert(k, i);
        }
        let mut slots: Vec<Option<(&'a K, &'a mut V)>> = Vec::with_capacity(order.len());
        slots.resize_with(order.len(), || None);
        for (k, item) in arena.iter_mut() {
            if let Some(&i) = rank.get(k) {
                slots[i] = Some(split(item));
            }
        }
        let entries: Vec<(&'a K, &'a mut V)> = slots.into_iter().flatten().collect();
        Self {
            inner: entries.into_iter(),
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}
