//! BiMap: the bijective facade over one entry store and two side indices.

use crate::entry_store::{self, EntryHandle, EntryStore};
use crate::error::{BiMapError, ValidationError};
use crate::hashed_index::HashedIndex;
use crate::ordered_index::{NaturalOrder, OrderedIndex};
use crate::side_index::{KeyIndex, KeyLookup};
use crate::trace::{debug, trace};
use core::fmt;
use core::ops::Index;
use std::collections::hash_map::RandomState;

/// A one-to-one map between values of `A` ("first") and values of `B`
/// ("second").
///
/// Each pair is stored once; `IA` indexes the first values and `IB` the
/// second values by handle into that store. Either side can be looked up,
/// removed by, or re-keyed in place.
pub struct BiMap<A, B, IA = HashedIndex, IB = HashedIndex> {
    store: EntryStore<A, B>,
    firsts: IA,
    seconds: IB,
}

/// `BiMap` with hashed lookups on both sides.
pub type HashBiMap<A, B, S = RandomState> = BiMap<A, B, HashedIndex<S>, HashedIndex<S>>;

/// `BiMap` with ordered lookups on both sides.
pub type OrdBiMap<A, B, OA = NaturalOrder, OB = NaturalOrder> =
    BiMap<A, B, OrderedIndex<OA>, OrderedIndex<OB>>;

/// Index key selecting the first side: `map[First(&a)]` yields the second value.
#[derive(Copy, Clone, Debug)]
pub struct First<'q, Q: ?Sized>(pub &'q Q);

/// Index key selecting the second side: `map[Second(&b)]` yields the first value.
#[derive(Copy, Clone, Debug)]
pub struct Second<'q, Q: ?Sized>(pub &'q Q);

impl<A, B, IA, IB> BiMap<A, B, IA, IB>
where
    IA: Default,
    IB: Default,
{
    pub fn new() -> Self {
        Self::with_indices(IA::default(), IB::default())
    }
}

impl<A, B, IA, IB> Default for BiMap<A, B, IA, IB>
where
    IA: Default,
    IB: Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<A, B, IA, IB> BiMap<A, B, IA, IB> {
    /// Build an empty map around preconfigured side indices, e.g. a
    /// `HashedIndex` with a custom hasher or an `OrderedIndex` with a custom
    /// comparator. Both indices must be empty.
    pub fn with_indices(firsts: IA, seconds: IB) -> Self {
        Self {
            store: EntryStore::new(),
            firsts,
            seconds,
        }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    /// Pairs in insertion order.
    pub fn iter(&self) -> Iter<'_, A, B> {
        Iter {
            inner: self.store.iter(),
        }
    }

    /// First values in insertion order.
    pub fn firsts(&self) -> impl DoubleEndedIterator<Item = &A> + ExactSizeIterator + '_ {
        self.store.iter().map(|(_h, a, _b)| a)
    }

    /// Second values in insertion order.
    pub fn seconds(&self) -> impl DoubleEndedIterator<Item = &B> + ExactSizeIterator + '_ {
        self.store.iter().map(|(_h, _a, b)| b)
    }
}

impl<A, B, IA, IB> BiMap<A, B, IA, IB>
where
    IA: KeyLookup<A>,
    IB: KeyLookup<B>,
{
    pub fn with_capacity(capacity: usize) -> Self
    where
        IA: Default,
        IB: Default,
    {
        let mut map = Self::new();
        map.reserve(capacity);
        map
    }

    pub fn reserve(&mut self, additional: usize) {
        self.store.reserve(additional);
        KeyIndex::<A>::reserve(&mut self.firsts, additional, &self.store.first_keys());
        KeyIndex::<B>::reserve(&mut self.seconds, additional, &self.store.second_keys());
    }

    fn handle_by_first<Q>(&self, first: &Q) -> Option<EntryHandle>
    where
        Q: ?Sized,
        IA: KeyLookup<A, Q>,
    {
        <IA as KeyLookup<A, Q>>::find(&self.firsts, first, &self.store.first_keys())
    }

    fn handle_by_second<Q>(&self, second: &Q) -> Option<EntryHandle>
    where
        Q: ?Sized,
        IB: KeyLookup<B, Q>,
    {
        <IB as KeyLookup<B, Q>>::find(&self.seconds, second, &self.store.second_keys())
    }

    #[inline]
    fn debug_check_sizes(&self) {
        debug_assert_eq!(
            self.store.len(),
            KeyIndex::<A>::len(&self.firsts),
            "first index out of step with the entry store"
        );
        debug_assert_eq!(
            self.store.len(),
            KeyIndex::<B>::len(&self.seconds),
            "second index out of step with the entry store"
        );
    }

    /// Insert the pair `(first, second)`.
    ///
    /// Returns `false` and leaves the map untouched if `first` or `second`
    /// is already present, including when the identical pair is present.
    pub fn insert(&mut self, first: A, second: B) -> bool {
        self.debug_check_sizes();
        if self.contains_first(&first) || self.contains_second(&second) {
            trace!(len = self.store.len(), "insert rejected: key already present");
            return false;
        }

        let handle = self.store.append(first, second);
        if KeyIndex::<A>::insert(&mut self.firsts, handle, &self.store.first_keys()).is_err() {
            let _ = self.store.erase(handle);
            debug!("insert rolled back: first index refused a key it reported absent");
            return false;
        }
        if KeyIndex::<B>::insert(&mut self.seconds, handle, &self.store.second_keys()).is_err() {
            KeyIndex::<A>::erase(&mut self.firsts, handle, &self.store.first_keys());
            let _ = self.store.erase(handle);
            debug!("insert rolled back: second index refused a key it reported absent");
            return false;
        }

        self.debug_check_sizes();
        trace!(len = self.store.len(), "inserted pair");
        true
    }

    /// Replace the first value of the entry whose second value is `second`.
    ///
    /// - `Err(NotFound)` if no entry has `second`.
    /// - `Err(Conflict)` if `new_first` already belongs to another entry.
    /// - `Ok(false)` if the entry already has `new_first`.
    /// - `Ok(true)` once the entry is re-keyed; the second index is untouched.
    pub fn change_first<Q>(&mut self, new_first: A, second: &Q) -> Result<bool, BiMapError>
    where
        Q: ?Sized,
        IB: KeyLookup<B, Q>,
    {
        self.debug_check_sizes();
        let handle = self
            .handle_by_second(second)
            .ok_or(BiMapError::NotFound)?;
        match self.handle_by_first(&new_first) {
            Some(owner) if owner == handle => return Ok(false),
            Some(_) => {
                trace!("change_first rejected: new key belongs to another entry");
                return Err(BiMapError::Conflict);
            }
            None => {}
        }
        self.rekey_first(handle, new_first)?;
        Ok(true)
    }

    /// Replace the second value of the entry whose first value is `first`.
    ///
    /// Outcomes mirror `change_first`.
    pub fn change_second<Q>(&mut self, first: &Q, new_second: B) -> Result<bool, BiMapError>
    where
        Q: ?Sized,
        IA: KeyLookup<A, Q>,
    {
        self.debug_check_sizes();
        let handle = self
            .handle_by_first(first)
            .ok_or(BiMapError::NotFound)?;
        match self.handle_by_second(&new_second) {
            Some(owner) if owner == handle => return Ok(false),
            Some(_) => {
                trace!("change_second rejected: new key belongs to another entry");
                return Err(BiMapError::Conflict);
            }
            None => {}
        }
        self.rekey_second(handle, new_second)?;
        Ok(true)
    }

    /// Re-key whichever side of an existing entry is not already `(first, second)`.
    ///
    /// If only `first` is present, that entry's second value becomes `second`;
    /// if only `second` is present, that entry's first value becomes `first`.
    /// Neither present is `Err(NotFound)`. Both present on the same entry is
    /// `Ok(false)`; on different entries it is `Err(Conflict)`.
    pub fn change(&mut self, first: A, second: B) -> Result<bool, BiMapError> {
        self.debug_check_sizes();
        match (self.handle_by_first(&first), self.handle_by_second(&second)) {
            (None, None) => Err(BiMapError::NotFound),
            (Some(h1), Some(h2)) if h1 == h2 => Ok(false),
            (Some(_), Some(_)) => Err(BiMapError::Conflict),
            (Some(handle), None) => {
                self.rekey_second(handle, second)?;
                Ok(true)
            }
            (None, Some(handle)) => {
                self.rekey_first(handle, first)?;
                Ok(true)
            }
        }
    }

    // Erase the stale record, overwrite the field, index the new key. If the
    // index still refuses the key, the old value is put back.
    fn rekey_first(&mut self, handle: EntryHandle, new_first: A) -> Result<(), BiMapError> {
        KeyIndex::<A>::erase(&mut self.firsts, handle, &self.store.first_keys());
        let old = self
            .store
            .replace_first(handle, new_first)
            .expect("indexed handle must refer to a live entry");
        if KeyIndex::<A>::insert(&mut self.firsts, handle, &self.store.first_keys()).is_err() {
            let _ = self.store.replace_first(handle, old);
            let _ = KeyIndex::<A>::insert(&mut self.firsts, handle, &self.store.first_keys());
            debug!("first key change rolled back: index refused the new key");
            return Err(BiMapError::Conflict);
        }
        self.debug_check_sizes();
        trace!("first key changed");
        Ok(())
    }

    fn rekey_second(&mut self, handle: EntryHandle, new_second: B) -> Result<(), BiMapError> {
        KeyIndex::<B>::erase(&mut self.seconds, handle, &self.store.second_keys());
        let old = self
            .store
            .replace_second(handle, new_second)
            .expect("indexed handle must refer to a live entry");
        if KeyIndex::<B>::insert(&mut self.seconds, handle, &self.store.second_keys()).is_err() {
            let _ = self.store.replace_second(handle, old);
            let _ = KeyIndex::<B>::insert(&mut self.seconds, handle, &self.store.second_keys());
            debug!("second key change rolled back: index refused the new key");
            return Err(BiMapError::Conflict);
        }
        self.debug_check_sizes();
        trace!("second key changed");
        Ok(())
    }

    /// Remove the entry whose first value is `first`. Returns `false` if absent.
    pub fn remove_first<Q>(&mut self, first: &Q) -> bool
    where
        Q: ?Sized,
        IA: KeyLookup<A, Q>,
    {
        self.take_by_first(first).is_some()
    }

    /// Remove the entry whose second value is `second`. Returns `false` if absent.
    pub fn remove_second<Q>(&mut self, second: &Q) -> bool
    where
        Q: ?Sized,
        IB: KeyLookup<B, Q>,
    {
        self.take_by_second(second).is_some()
    }

    /// Remove the entry whose first value is `first` and return its pair.
    pub fn take_by_first<Q>(&mut self, first: &Q) -> Option<(A, B)>
    where
        Q: ?Sized,
        IA: KeyLookup<A, Q>,
    {
        let handle = self.handle_by_first(first)?;
        self.remove_entry(handle)
    }

    /// Remove the entry whose second value is `second` and return its pair.
    pub fn take_by_second<Q>(&mut self, second: &Q) -> Option<(A, B)>
    where
        Q: ?Sized,
        IB: KeyLookup<B, Q>,
    {
        let handle = self.handle_by_second(second)?;
        self.remove_entry(handle)
    }

    fn remove_entry(&mut self, handle: EntryHandle) -> Option<(A, B)> {
        self.debug_check_sizes();
        KeyIndex::<A>::erase(&mut self.firsts, handle, &self.store.first_keys());
        KeyIndex::<B>::erase(&mut self.seconds, handle, &self.store.second_keys());
        let pair = self.store.erase(handle);
        self.debug_check_sizes();
        trace!(len = self.store.len(), "removed pair");
        pair
    }

    /// The second value paired with `first`, or `Err(NotFound)`.
    pub fn at_first<Q>(&self, first: &Q) -> Result<&B, BiMapError>
    where
        Q: ?Sized,
        IA: KeyLookup<A, Q>,
    {
        self.get_by_first(first).ok_or(BiMapError::NotFound)
    }

    /// The first value paired with `second`, or `Err(NotFound)`.
    pub fn at_second<Q>(&self, second: &Q) -> Result<&A, BiMapError>
    where
        Q: ?Sized,
        IB: KeyLookup<B, Q>,
    {
        self.get_by_second(second).ok_or(BiMapError::NotFound)
    }

    pub fn get_by_first<Q>(&self, first: &Q) -> Option<&B>
    where
        Q: ?Sized,
        IA: KeyLookup<A, Q>,
    {
        self.handle_by_first(first)
            .and_then(|h| self.store.second(h))
    }

    pub fn get_by_second<Q>(&self, second: &Q) -> Option<&A>
    where
        Q: ?Sized,
        IB: KeyLookup<B, Q>,
    {
        self.handle_by_second(second)
            .and_then(|h| self.store.first(h))
    }

    pub fn contains_first<Q>(&self, first: &Q) -> bool
    where
        Q: ?Sized,
        IA: KeyLookup<A, Q>,
    {
        self.handle_by_first(first).is_some()
    }

    pub fn contains_second<Q>(&self, second: &Q) -> bool
    where
        Q: ?Sized,
        IB: KeyLookup<B, Q>,
    {
        self.handle_by_second(second).is_some()
    }

    /// Remove every pair. Indices keep their strategy configuration.
    pub fn clear(&mut self) {
        self.store.clear();
        KeyIndex::<A>::clear(&mut self.firsts);
        KeyIndex::<B>::clear(&mut self.seconds);
        self.debug_check_sizes();
        trace!("cleared");
    }

    /// Index every stored entry from scratch. Both indices must be empty.
    fn rebuild_indices(&mut self) {
        KeyIndex::<A>::reserve(&mut self.firsts, self.store.len(), &self.store.first_keys());
        KeyIndex::<B>::reserve(&mut self.seconds, self.store.len(), &self.store.second_keys());
        for (handle, _a, _b) in self.store.iter() {
            KeyIndex::<A>::insert(&mut self.firsts, handle, &self.store.first_keys())
                .expect("stored first values are unique");
            KeyIndex::<B>::insert(&mut self.seconds, handle, &self.store.second_keys())
                .expect("stored second values are unique");
        }
        self.debug_check_sizes();
        debug!(len = self.store.len(), "rebuilt side indices");
    }

    /// Check every structural invariant: equal sizes, each entry reachable
    /// from both indices under its own keys, intact insertion-order links.
    #[doc(hidden)]
    pub fn validate(&self) -> Result<(), ValidationError> {
        let store = self.store.len();
        let first = KeyIndex::<A>::len(&self.firsts);
        let second = KeyIndex::<B>::len(&self.seconds);
        if store != first || store != second {
            return Err(ValidationError::SizeMismatch {
                store,
                first,
                second,
            });
        }
        let walked = self.store.linked_len();
        if walked != store {
            return Err(ValidationError::BrokenLinks {
                walked,
                expected: store,
            });
        }
        for (position, (handle, a, b)) in self.store.iter().enumerate() {
            if self.handle_by_first(a) != Some(handle) {
                return Err(ValidationError::FirstIndexStale { position });
            }
            if self.handle_by_second(b) != Some(handle) {
                return Err(ValidationError::SecondIndexStale { position });
            }
        }
        Ok(())
    }
}

impl<A, B, O, IB> BiMap<A, B, OrderedIndex<O>, IB> {
    /// Pairs in ascending order of their first values.
    pub fn iter_by_first(&self) -> impl DoubleEndedIterator<Item = (&A, &B)> + '_ {
        self.firsts
            .handles()
            .iter()
            .filter_map(move |&h| self.store.get(h))
    }
}

impl<A, B, IA, O> BiMap<A, B, IA, OrderedIndex<O>> {
    /// Pairs in ascending order of their second values.
    pub fn iter_by_second(&self) -> impl DoubleEndedIterator<Item = (&A, &B)> + '_ {
        self.seconds
            .handles()
            .iter()
            .filter_map(move |&h| self.store.get(h))
    }
}

/// Cloning copies the entries and indexes the copy afresh; the clone shares
/// nothing with the original.
impl<A, B, IA, IB> Clone for BiMap<A, B, IA, IB>
where
    A: Clone,
    B: Clone,
    IA: KeyLookup<A> + Clone,
    IB: KeyLookup<B> + Clone,
{
    fn clone(&self) -> Self {
        let mut firsts = self.firsts.clone();
        let mut seconds = self.seconds.clone();
        KeyIndex::<A>::clear(&mut firsts);
        KeyIndex::<B>::clear(&mut seconds);
        let mut map = Self {
            store: self.store.clone(),
            firsts,
            seconds,
        };
        map.rebuild_indices();
        map
    }
}

impl<A, B, IA, IB> fmt::Debug for BiMap<A, B, IA, IB>
where
    A: fmt::Debug,
    B: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Two maps are equal when they hold the same pairs, in any order.
impl<A, B, IA, IB> PartialEq for BiMap<A, B, IA, IB>
where
    B: PartialEq,
    IA: KeyLookup<A>,
    IB: KeyLookup<B>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(a, b)| other.get_by_first(a) == Some(b))
    }
}

impl<A, B, IA, IB> Eq for BiMap<A, B, IA, IB>
where
    B: Eq,
    IA: KeyLookup<A>,
    IB: KeyLookup<B>,
{
}

/// Pairs are inserted in order; a pair colliding with an earlier one is dropped.
impl<A, B, IA, IB> Extend<(A, B)> for BiMap<A, B, IA, IB>
where
    IA: KeyLookup<A>,
    IB: KeyLookup<B>,
{
    fn extend<T: IntoIterator<Item = (A, B)>>(&mut self, iter: T) {
        for (a, b) in iter {
            let _ = self.insert(a, b);
        }
    }
}

impl<A, B, IA, IB> FromIterator<(A, B)> for BiMap<A, B, IA, IB>
where
    IA: KeyLookup<A> + Default,
    IB: KeyLookup<B> + Default,
{
    fn from_iter<T: IntoIterator<Item = (A, B)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<A, B, IA, IB, const N: usize> From<[(A, B); N]> for BiMap<A, B, IA, IB>
where
    IA: KeyLookup<A> + Default,
    IB: KeyLookup<B> + Default,
{
    fn from(pairs: [(A, B); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<A, B, IA, IB, Q> Index<First<'_, Q>> for BiMap<A, B, IA, IB>
where
    Q: ?Sized,
    IA: KeyLookup<A> + KeyLookup<A, Q>,
    IB: KeyLookup<B>,
{
    type Output = B;

    /// Panics if no entry has the given first value.
    fn index(&self, key: First<'_, Q>) -> &B {
        self.get_by_first(key.0)
            .expect("no entry found for first value")
    }
}

impl<A, B, IA, IB, Q> Index<Second<'_, Q>> for BiMap<A, B, IA, IB>
where
    Q: ?Sized,
    IA: KeyLookup<A>,
    IB: KeyLookup<B> + KeyLookup<B, Q>,
{
    type Output = A;

    /// Panics if no entry has the given second value.
    fn index(&self, key: Second<'_, Q>) -> &A {
        self.get_by_second(key.0)
            .expect("no entry found for second value")
    }
}

/// Iterator over `(&A, &B)` in insertion order.
pub struct Iter<'a, A, B> {
    inner: entry_store::Iter<'a, A, B>,
}

impl<A, B> Clone for Iter<'_, A, B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, A, B> Iterator for Iter<'a, A, B> {
    type Item = (&'a A, &'a B);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_h, a, b)| (a, b))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<A, B> DoubleEndedIterator for Iter<'_, A, B> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_h, a, b)| (a, b))
    }
}

impl<A, B> ExactSizeIterator for Iter<'_, A, B> {}

/// Owning iterator over `(A, B)` in insertion order.
pub struct IntoIter<A, B> {
    inner: entry_store::IntoIter<A, B>,
}

impl<A, B> Iterator for IntoIter<A, B> {
    type Item = (A, B);
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<A, B> DoubleEndedIterator for IntoIter<A, B> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<A, B> ExactSizeIterator for IntoIter<A, B> {}

impl<'a, A, B, IA, IB> IntoIterator for &'a BiMap<A, B, IA, IB> {
    type Item = (&'a A, &'a B);
    type IntoIter = Iter<'a, A, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<A, B, IA, IB> IntoIterator for BiMap<A, B, IA, IB> {
    type Item = (A, B);
    type IntoIter = IntoIter<A, B>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.store.into_iter(),
        }
    }
}
