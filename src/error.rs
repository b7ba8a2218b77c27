//! Error types surfaced by the map and its side indices.

use thiserror::Error;

/// Failure of a lookup or re-key operation on `BiMap`.
///
/// Routine rejections (duplicate insert, removing an absent key, a change
/// that would be a no-op) are reported as `bool` instead.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Error)]
pub enum BiMapError {
    /// The key that anchors the operation is not present.
    #[error("key not found")]
    NotFound,
    /// The new key already labels a different entry.
    #[error("key already belongs to another entry")]
    Conflict,
}

/// Rejection raised by a side index insert.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum InsertError {
    #[error("duplicate key in side index")]
    DuplicateKey,
    #[error("handle does not refer to a live entry")]
    StaleHandle,
}

/// Structural inconsistency found by `BiMap::validate`.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum ValidationError {
    #[error("size mismatch: store has {store} entries, first index {first}, second index {second}")]
    SizeMismatch {
        store: usize,
        first: usize,
        second: usize,
    },
    #[error("first index does not resolve entry #{position} to itself")]
    FirstIndexStale { position: usize },
    #[error("second index does not resolve entry #{position} to itself")]
    SecondIndexStale { position: usize },
    #[error("insertion-order links are broken after {walked} of {expected} entries")]
    BrokenLinks { walked: usize, expected: usize },
}
