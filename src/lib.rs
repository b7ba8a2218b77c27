//! bidimap: a single-threaded bijective map. Every pair `(A, B)` is stored
//! once, and both the `A` side and the `B` side can be used to look up,
//! remove, or re-key the pair.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep two lookup indices in lock-step with one physical store of
//!   pairs, without storing any key twice, while allowing either side of a
//!   pair to be rewritten in place.
//! - Layers:
//!   - EntryStore<A, B>: owns the pairs in a generational `SlotMap`,
//!     threaded into an insertion-ordered linked list. Hands out stable
//!     `EntryHandle`s.
//!   - Side indices: `KeyIndex<K>` / `KeyLookup<K, Q>` strategies holding
//!     handles only. `HashedIndex<S>` probes a `hashbrown::HashTable`;
//!     `OrderedIndex<O>` binary-searches a sorted vector. Both read keys
//!     through the store on every comparison or hash.
//!   - BiMap<A, B, IA, IB>: public API. Checks uniqueness on both indices,
//!     then mutates the store, then erases/inserts index records.
//!
//! Constraints
//! - Single-threaded: mutation requires `&mut BiMap`; no internal locking.
//! - Bijection: no two entries share a first value or a second value, and
//!   `store.len() == firsts.len() == seconds.len()` after every operation.
//! - No key copies: index records are handles; a key's identity in an index
//!   is whatever the store currently holds for that handle.
//! - Re-keying is explicit: the stale record is erased before the field is
//!   overwritten and the new record inserted after.
//!
//! Error policy
//! - Routine rejections (`insert` of a present key, removing an absent key,
//!   a change that is already in effect) return `bool`.
//! - Lookup misses and re-key anchors that do not exist are
//!   `BiMapError::NotFound`; a new key owned by another entry is
//!   `BiMapError::Conflict`.
//! - Index-level `InsertError`s never reach callers; the facade pre-checks
//!   and rolls back if an index still refuses a key.
//!
//! Same-typed sides
//! - Methods are always named by side (`at_first`/`at_second`,
//!   `remove_first`/`remove_second`, ...). Index sugar uses the `First` and
//!   `Second` wrappers, so `BiMap<T, T>` stays unambiguous.
//!
//! Notes and non-goals
//! - Cloning copies the store and re-indexes the copy; moving a map moves
//!   all three structures as they are.
//! - No range queries; `OrdBiMap` only offers sorted iteration per side.
//! - No persistence and no thread-safe variant.
//! - With the `tracing` feature, mutations emit `tracing` events.

mod bi_map;
mod bi_map_proptest;
mod entry_store;
pub mod error;
pub mod hashed_index;
pub mod ordered_index;
pub mod side_index;
mod trace;

// Public surface
pub use bi_map::{BiMap, First, HashBiMap, IntoIter, Iter, OrdBiMap, Second};
pub use entry_store::EntryHandle;
pub use error::{BiMapError, InsertError, ValidationError};
pub use hashed_index::HashedIndex;
pub use ordered_index::{KeyOrder, NaturalOrder, OrderBy, OrderedIndex};
pub use side_index::{KeyIndex, KeyLookup, KeySource};
