//! Error type shared by both engines.

use core::fmt;

/// Failure of a map or cursor operation. A failed operation never mutates
/// the container.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MapError {
    /// The requested key is not present.
    KeyNotFound,
    /// The position is the end sentinel where an entry is required, a step
    /// would leave the `[begin, end]` range, or the position is stale.
    InvalidIterator,
    /// Reading the entry at the end sentinel.
    DereferenceOfEndPosition,
    /// `insert` was given a key that is already present.
    DuplicateKey,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::KeyNotFound => f.write_str("key not found"),
            MapError::InvalidIterator => f.write_str("invalid iterator position"),
            MapError::DereferenceOfEndPosition => {
                f.write_str("attempt to dereference the end position")
            }
            MapError::DuplicateKey => f.write_str("key already present"),
        }
    }
}

impl std::error::Error for MapError {}
