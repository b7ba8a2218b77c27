//! Side index contract shared by the hashed and ordered strategies.
//!
//! A side index maps one projection of an entry (its first or its second
//! value) to the entry's `EntryHandle`. It never stores key data: every
//! comparison or hash reads the key through a `KeySource`, which resolves a
//! handle against the entry store. Because of that, an entry's key must not
//! change while it is indexed; callers `erase` the handle, rewrite the key,
//! then `insert` it again.

use crate::entry_store::EntryHandle;
use crate::error::InsertError;

/// Resolves handles to the keys a side index is built over.
pub trait KeySource<K: ?Sized> {
    /// The key for `handle`, or `None` if the handle is stale.
    fn key(&self, handle: EntryHandle) -> Option<&K>;
}

/// Unique-key index over keys of type `K`, holding non-owning handles.
pub trait KeyIndex<K> {
    /// Number of indexed handles.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index `handle` under its current key.
    ///
    /// Fails with `InsertError::DuplicateKey` if an equal key is already
    /// indexed; the index is left unchanged in that case.
    fn insert<S>(&mut self, handle: EntryHandle, keys: &S) -> Result<(), InsertError>
    where
        S: KeySource<K>;

    /// Remove the record for `handle`, located through its current key.
    /// Returns `false` if `handle` was not indexed under that key.
    fn erase<S>(&mut self, handle: EntryHandle, keys: &S) -> bool
    where
        S: KeySource<K>;

    fn clear(&mut self);

    /// Reserve room for `additional` more handles.
    fn reserve<S>(&mut self, additional: usize, keys: &S)
    where
        S: KeySource<K>;
}

/// Lookup by a borrowed form `Q` of the indexed key type `K`.
///
/// Each strategy states which bounds `Q` needs (`Hash + Eq` for hashed
/// indices, an order over `Q` for ordered ones).
pub trait KeyLookup<K, Q: ?Sized = K>: KeyIndex<K> {
    fn find<S>(&self, q: &Q, keys: &S) -> Option<EntryHandle>
    where
        S: KeySource<K>;
}
