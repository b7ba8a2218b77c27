//! HashedIndex: hash-based side index over handles.

use crate::entry_store::EntryHandle;
use crate::error::InsertError;
use crate::side_index::{KeyIndex, KeyLookup, KeySource};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::HashTable;
use std::collections::hash_map::RandomState;

/// Side index probing a `HashTable` of handles with a caller-supplied
/// `BuildHasher`. Lookups are O(1) on average.
///
/// Hashes are recomputed from the stored key when the table grows, so `K:
/// Hash` must stay consistent for as long as the key is indexed.
#[derive(Clone, Debug)]
pub struct HashedIndex<S = RandomState> {
    hasher: S,
    table: HashTable<EntryHandle>,
}

impl HashedIndex {
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }
}

impl<S: Default> Default for HashedIndex<S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<S> HashedIndex<S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            hasher,
            table: HashTable::new(),
        }
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Self {
        Self {
            hasher,
            table: HashTable::with_capacity(capacity),
        }
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }
}

impl<K, S> KeyIndex<K> for HashedIndex<S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    fn len(&self) -> usize {
        self.table.len()
    }

    fn insert<Src>(&mut self, handle: EntryHandle, keys: &Src) -> Result<(), InsertError>
    where
        Src: KeySource<K>,
    {
        let key = keys.key(handle).ok_or(InsertError::StaleHandle)?;
        let hasher = &self.hasher;
        let hash = hasher.hash_one(key);
        match self.table.entry(
            hash,
            |&h| keys.key(h).map(|k| k == key).unwrap_or(false),
            |&h| keys.key(h).map(|k| hasher.hash_one(k)).unwrap_or(0),
        ) {
            hashbrown::hash_table::Entry::Occupied(_) => Err(InsertError::DuplicateKey),
            hashbrown::hash_table::Entry::Vacant(v) => {
                let _ = v.insert(handle);
                Ok(())
            }
        }
    }

    fn erase<Src>(&mut self, handle: EntryHandle, keys: &Src) -> bool
    where
        Src: KeySource<K>,
    {
        let Some(key) = keys.key(handle) else {
            return false;
        };
        let hash = self.hasher.hash_one(key);
        match self.table.find_entry(hash, |&h| h == handle) {
            Ok(occupied) => {
                let _ = occupied.remove();
                true
            }
            Err(_) => false,
        }
    }

    fn clear(&mut self) {
        self.table.clear();
    }

    fn reserve<Src>(&mut self, additional: usize, keys: &Src)
    where
        Src: KeySource<K>,
    {
        let hasher = &self.hasher;
        self.table.reserve(additional, |&h| {
            keys.key(h).map(|k| hasher.hash_one(k)).unwrap_or(0)
        });
    }
}

impl<K, Q, S> KeyLookup<K, Q> for HashedIndex<S>
where
    K: Hash + Eq + Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    fn find<Src>(&self, q: &Q, keys: &Src) -> Option<EntryHandle>
    where
        Src: KeySource<K>,
    {
        let hash = self.hasher.hash_one(q);
        self.table
            .find(hash, |&h| {
                keys.key(h)
                    .map(|k| k.borrow() == q)
                    .unwrap_or(false)
            })
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry_store::EntryStore;

    #[derive(Clone, Default)]
    struct ConstBuildHasher;
    struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl core::hash::Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        fn finish(&self) -> u64 {
            0
        } // force all keys into the same hash bucket
    }

    fn index_all<S: BuildHasher>(
        store: &EntryStore<String, i32>,
        index: &mut HashedIndex<S>,
    ) -> Vec<EntryHandle> {
        let handles: Vec<EntryHandle> = store.iter().map(|(h, _a, _b)| h).collect();
        for &h in &handles {
            index.insert(h, &store.first_keys()).unwrap();
        }
        handles
    }

    /// Invariant: a second handle carrying an equal key is rejected and the
    /// index keeps resolving the key to the original handle.
    #[test]
    fn duplicate_key_rejected() {
        let mut store: EntryStore<String, i32> = EntryStore::new();
        let h1 = store.append("dup".to_string(), 1);
        let h2 = store.append("dup".to_string(), 2);
        let mut index = HashedIndex::new();

        index.insert(h1, &store.first_keys()).unwrap();
        match index.insert(h2, &store.first_keys()) {
            Err(InsertError::DuplicateKey) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(KeyIndex::<String>::len(&index), 1);
        assert_eq!(index.find("dup", &store.first_keys()), Some(h1));
    }

    /// Invariant: borrowed lookup works (store `String`, query with `&str`).
    #[test]
    fn borrowed_lookup_with_str() {
        let mut store: EntryStore<String, i32> = EntryStore::new();
        store.append("hello".to_string(), 1);
        let mut index = HashedIndex::new();
        let handles = index_all(&store, &mut index);

        assert_eq!(index.find("hello", &store.first_keys()), Some(handles[0]));
        assert!(index.find("world", &store.first_keys()).is_none());
    }

    /// Invariant: lookups and erasures work under heavy hash collisions;
    /// equality resolves to the correct handle.
    #[test]
    fn collision_handling_with_const_hasher() {
        let mut store: EntryStore<String, i32> = EntryStore::new();
        for (i, k) in ["a", "b", "c"].iter().enumerate() {
            store.append((*k).to_string(), i as i32);
        }
        let mut index = HashedIndex::with_hasher(ConstBuildHasher);
        let handles = index_all(&store, &mut index);

        let keys = store.first_keys();
        assert_eq!(index.find("a", &keys), Some(handles[0]));
        assert_eq!(index.find("b", &keys), Some(handles[1]));
        assert_eq!(index.find("c", &keys), Some(handles[2]));

        assert!(KeyIndex::<String>::erase(&mut index, handles[1], &keys));
        assert!(index.find("b", &keys).is_none());
        assert_eq!(index.find("a", &keys), Some(handles[0]));
        assert_eq!(index.find("c", &keys), Some(handles[2]));
    }

    /// Invariant: erasing a handle that is not indexed leaves the index alone.
    #[test]
    fn erase_unindexed_handle_is_false() {
        let mut store: EntryStore<String, i32> = EntryStore::new();
        let indexed = store.append("in".to_string(), 1);
        let loose = store.append("out".to_string(), 2);
        let mut index = HashedIndex::new();
        index.insert(indexed, &store.first_keys()).unwrap();

        assert!(!KeyIndex::<String>::erase(&mut index, loose, &store.first_keys()));
        assert_eq!(KeyIndex::<String>::len(&index), 1);

        let _ = store.erase(loose);
        assert!(!KeyIndex::<String>::erase(&mut index, loose, &store.first_keys()));
        assert_eq!(
            index.insert(loose, &store.first_keys()),
            Err(InsertError::StaleHandle)
        );
    }

    /// Invariant: growing the table rehashes through the key source and keeps
    /// every handle reachable.
    #[test]
    fn growth_keeps_all_keys_reachable() {
        let mut store: EntryStore<String, i32> = EntryStore::new();
        for i in 0..500 {
            store.append(format!("k{}", i), i);
        }
        let mut index = HashedIndex::new();
        index.reserve(8, &store.first_keys());
        let handles = index_all(&store, &mut index);
        for (i, h) in handles.iter().enumerate() {
            assert_eq!(index.find(&format!("k{}", i), &store.first_keys()), Some(*h));
        }
        KeyIndex::<String>::clear(&mut index);
        assert!(KeyIndex::<String>::is_empty(&index));
    }
}
