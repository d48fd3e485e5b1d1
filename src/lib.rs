//! map-engines: two interchangeable single-threaded map engines behind one
//! contract.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: an associative map (unique keys) with two backing engines that a
//!   caller can swap without behavioral change apart from traversal order.
//! - Engines:
//!   - TreeMap<K, V>: unbalanced binary search tree stored in a generational
//!     slot arena. Parent links are arena keys, not owners. Ascending key
//!     order.
//!   - ChainedHashMap<K, V, S>: fixed bucket table with separate chaining.
//!     Bucket order, then insertion order within a bucket.
//! - Contract: `MapEngine<K, V>` (find / insert / index / value_of /
//!   remove / remove_at / positional stepping / take), implemented by both.
//! - Traversal: `Cursor` is the shared bidirectional position protocol;
//!   `Iter` is the std iterator over it; `IterMut` lends values mutably in
//!   the same order.
//!
//! Positions
//! - A position is a small `Copy` tag: an entry or `End`. There is no
//!   allocated sentinel; `End` is one past the last entry and stepping back
//!   from it reaches the last entry.
//! - Tree positions are generation-checked slot keys; removing a node makes
//!   every position to it fail with `InvalidIterator`.
//! - Hash positions are a bucket plus a generation-checked entry key. Removing
//!   an entry invalidates only positions to that entry, so a walk may save
//!   `next(pos)` and then remove `pos`, on either engine.
//! - A position is only checked against the map it is handed to. One taken
//!   from a different map may resolve to an unrelated entry; `Cursor` pairs a
//!   position with its map and is the safe way to carry one around.
//!
//! Constraints
//! - Single-threaded: both engines are `!Send`/`!Sync` (no atomics, no
//!   locks). Callers that share a map across threads must wrap it themselves.
//! - No rebalancing: tree height follows insertion order. All whole-tree
//!   walks (clone, equality, height) use explicit stacks.
//! - No resizing: the bucket count is fixed at construction
//!   (`DEFAULT_BUCKETS = 65537`).
//! - Failed operations never mutate. Errors are reported as `MapError`.
//!
//! Duplicate keys
//! - `insert` rejects an existing key with `MapError::DuplicateKey` and keeps
//!   the stored value. Building from an iterator applies `insert` in order, so
//!   the first occurrence of a key wins.
//!
//! Reentrancy policy
//! - Each engine carries a debug-only reentrancy guard entered by every
//!   method that runs user `Ord` / `Hash` / `Eq` code. Reaching back into the
//!   same map from those impls panics in debug builds and is unchecked in
//!   release builds.

mod chained_hash_map_proptest;
mod reentrancy;
mod tree_map_proptest;

pub mod chained_hash_map;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod tree_map;

// Public surface
pub use chained_hash_map::{ChainedHashMap, DEFAULT_BUCKETS};
pub use cursor::{Cursor, Iter, IterMut};
pub use engine::MapEngine;
pub use error::MapError;
pub use hasher::{IdentityHasher, IdentityState};
pub use tree_map::TreeMap;
