//! Default bucket hasher for `ChainedHashMap`.
//!
//! Integer keys hash to themselves, so a `usize` key `k` lands in bucket
//! `k % buckets`. Byte input (strings, slices) is folded with a small
//! multiplicative mix. Deterministic across runs and processes.

use core::hash::{BuildHasher, Hasher};

const FOLD: u64 = 31;

/// Hasher behind [`IdentityState`].
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityHasher {
    state: u64,
}

impl IdentityHasher {
    #[inline]
    fn fold(&mut self, v: u64) {
        self.state = self.state.wrapping_mul(FOLD).wrapping_add(v);
    }
}

impl Hasher for IdentityHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.fold(u64::from(b));
        }
    }

    #[inline]
    fn write_u8(&mut self, i: u8) {
        self.fold(u64::from(i));
    }

    #[inline]
    fn write_u16(&mut self, i: u16) {
        self.fold(u64::from(i));
    }

    #[inline]
    fn write_u32(&mut self, i: u32) {
        self.fold(u64::from(i));
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.fold(i);
    }

    #[inline]
    fn write_usize(&mut self, i: usize) {
        self.fold(i as u64);
    }
}

/// `BuildHasher` producing [`IdentityHasher`]s; the default `S` of
/// `ChainedHashMap`.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityState;

impl BuildHasher for IdentityState {
    type Hasher = IdentityHasher;

    #[inline]
    fn build_hasher(&self) -> IdentityHasher {
        IdentityHasher::default()
    }
}
