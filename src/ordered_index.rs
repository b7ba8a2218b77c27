//! OrderedIndex: comparator-based side index over handles.
//!
//! Handles are kept in a `Vec` sorted by the key each one resolves to, so
//! lookups are a binary search (O(log n)) and the index doubles as a sorted
//! view of its side. Inserting or erasing shifts the tail of the vector.

use crate::entry_store::EntryHandle;
use crate::error::InsertError;
use crate::side_index::{KeyIndex, KeyLookup, KeySource};
use core::borrow::Borrow;
use core::cmp::Ordering;

/// Total order over keys of type `Q`, supplied when building an ordered map.
pub trait KeyOrder<Q: ?Sized> {
    fn compare(&self, a: &Q, b: &Q) -> Ordering;
}

/// Order given by `Q: Ord`.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct NaturalOrder;

impl<Q: ?Sized + Ord> KeyOrder<Q> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &Q, b: &Q) -> Ordering {
        a.cmp(b)
    }
}

/// Order given by a comparison function.
#[derive(Copy, Clone, Debug, Default)]
pub struct OrderBy<F>(pub F);

impl<Q, F> KeyOrder<Q> for OrderBy<F>
where
    Q: ?Sized,
    F: Fn(&Q, &Q) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &Q, b: &Q) -> Ordering {
        (self.0)(a, b)
    }
}

#[derive(Clone, Debug, Default)]
pub struct OrderedIndex<O = NaturalOrder> {
    order: O,
    sorted: Vec<EntryHandle>,
}

impl OrderedIndex {
    pub fn new() -> Self {
        Self::with_order(NaturalOrder)
    }
}

impl<O> OrderedIndex<O> {
    pub fn with_order(order: O) -> Self {
        Self {
            order,
            sorted: Vec::new(),
        }
    }

    pub fn order(&self) -> &O {
        &self.order
    }

    /// Indexed handles in ascending key order.
    pub(crate) fn handles(&self) -> &[EntryHandle] {
        &self.sorted
    }

    fn search<K, Q, Src>(&self, q: &Q, keys: &Src) -> Result<usize, usize>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        O: KeyOrder<Q>,
        Src: KeySource<K>,
    {
        self.sorted.binary_search_by(|&h| match keys.key(h) {
            Some(k) => self.order.compare(k.borrow(), q),
            None => Ordering::Less,
        })
    }
}

impl<K, O> KeyIndex<K> for OrderedIndex<O>
where
    O: KeyOrder<K>,
{
    #[inline]
    fn len(&self) -> usize {
        self.sorted.len()
    }

    fn insert<Src>(&mut self, handle: EntryHandle, keys: &Src) -> Result<(), InsertError>
    where
        Src: KeySource<K>,
    {
        let key = keys.key(handle).ok_or(InsertError::StaleHandle)?;
        match self.search::<K, K, Src>(key, keys) {
            Ok(_) => Err(InsertError::DuplicateKey),
            Err(pos) => {
                self.sorted.insert(pos, handle);
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
        match self.search::<K, K, Src>(key, keys) {
            Ok(pos) if self.sorted[pos] == handle => {
                self.sorted.remove(pos);
                true
            }
            _ => false,
        }
    }

    fn clear(&mut self) {
        self.sorted.clear();
    }

    fn reserve<Src>(&mut self, additional: usize, _keys: &Src)
    where
        Src: KeySource<K>,
    {
        self.sorted.reserve(additional);
    }
}

impl<K, Q, O> KeyLookup<K, Q> for OrderedIndex<O>
where
    K: Borrow<Q>,
    Q: ?Sized,
    O: KeyOrder<K> + KeyOrder<Q>,
{
    fn find<Src>(&self, q: &Q, keys: &Src) -> Option<EntryHandle>
    where
        Src: KeySource<K>,
    {
        self.search::<K, Q, Src>(q, keys)
            .ok()
            .map(|pos| self.sorted[pos])
    }
}
