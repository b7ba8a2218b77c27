//! EntryStore: owning storage for `(A, B)` pairs with stable handles.
//!
//! Entries live in a `SlotMap` and are threaded into a doubly linked list so
//! iteration follows insertion order even after slots are reused. A handle
//! stays valid until its own entry is erased; erasing bumps the slot
//! generation so a stale handle never resolves to a later entry.

use crate::side_index::KeySource;
use slotmap::{DefaultKey, SlotMap};

/// Opaque, stable reference to one entry of a map.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct EntryHandle(DefaultKey);

impl EntryHandle {
    pub(crate) fn new(k: DefaultKey) -> Self {
        EntryHandle(k)
    }
    pub(crate) fn raw_handle(&self) -> DefaultKey {
        self.0
    }
}

#[derive(Clone, Debug)]
struct Node<A, B> {
    first: A,
    second: B,
    prev: Option<DefaultKey>,
    next: Option<DefaultKey>,
}

#[derive(Clone, Debug)]
pub(crate) struct EntryStore<A, B> {
    slots: SlotMap<DefaultKey, Node<A, B>>,
    head: Option<DefaultKey>,
    tail: Option<DefaultKey>,
}

impl<A, B> Default for EntryStore<A, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, B> EntryStore<A, B> {
    pub(crate) fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        self.slots.reserve(additional);
    }

    /// Append a pair at the back of the insertion order.
    pub(crate) fn append(&mut self, first: A, second: B) -> EntryHandle {
        let prev = self.tail;
        let k = self.slots.insert(Node {
            first,
            second,
            prev,
            next: None,
        });
        match prev {
            Some(p) => {
                if let Some(node) = self.slots.get_mut(p) {
                    node.next = Some(k);
                }
            }
            None => self.head = Some(k),
        }
        self.tail = Some(k);
        EntryHandle::new(k)
    }

    /// Remove an entry, relinking its neighbours. Only `handle` is invalidated.
    pub(crate) fn erase(&mut self, handle: EntryHandle) -> Option<(A, B)> {
        let node = self.slots.remove(handle.raw_handle())?;
        match node.prev {
            Some(p) => {
                if let Some(prev) = self.slots.get_mut(p) {
                    prev.next = node.next;
                }
            }
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => {
                if let Some(next) = self.slots.get_mut(n) {
                    next.prev = node.prev;
                }
            }
            None => self.tail = node.prev,
        }
        Some((node.first, node.second))
    }

    pub(crate) fn get(&self, handle: EntryHandle) -> Option<(&A, &B)> {
        self.slots
            .get(handle.raw_handle())
            .map(|n| (&n.first, &n.second))
    }

    pub(crate) fn first(&self, handle: EntryHandle) -> Option<&A> {
        self.slots.get(handle.raw_handle()).map(|n| &n.first)
    }

    pub(crate) fn second(&self, handle: EntryHandle) -> Option<&B> {
        self.slots.get(handle.raw_handle()).map(|n| &n.second)
    }

    /// Overwrite the first field in place; returns the previous value.
    ///
    /// The caller re-keys the first-side index around this call.
    pub(crate) fn replace_first(&mut self, handle: EntryHandle, first: A) -> Option<A> {
        self.slots
            .get_mut(handle.raw_handle())
            .map(|n| core::mem::replace(&mut n.first, first))
    }

    /// Overwrite the second field in place; returns the previous value.
    pub(crate) fn replace_second(&mut self, handle: EntryHandle, second: B) -> Option<B> {
        self.slots
            .get_mut(handle.raw_handle())
            .map(|n| core::mem::replace(&mut n.second, second))
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.tail = None;
    }

    pub(crate) fn iter(&self) -> Iter<'_, A, B> {
        Iter {
            slots: &self.slots,
            front: self.head,
            back: self.tail,
            remaining: self.slots.len(),
        }
    }

    /// Count entries reachable by walking the links from the head.
    pub(crate) fn linked_len(&self) -> usize {
        let mut walked = 0;
        let mut cursor = self.head;
        while let Some(k) = cursor {
            if walked > self.slots.len() {
                break;
            }
            walked += 1;
            cursor = self.slots.get(k).and_then(|n| n.next);
        }
        walked
    }

    pub(crate) fn first_keys(&self) -> FirstKeys<'_, A, B> {
        FirstKeys(self)
    }

    pub(crate) fn second_keys(&self) -> SecondKeys<'_, A, B> {
        SecondKeys(self)
    }
}

/// Key projection resolving a handle to its entry's first value.
pub(crate) struct FirstKeys<'a, A, B>(&'a EntryStore<A, B>);

/// Key projection resolving a handle to its entry's second value.
pub(crate) struct SecondKeys<'a, A, B>(&'a EntryStore<A, B>);

impl<A, B> KeySource<A> for FirstKeys<'_, A, B> {
    #[inline]
    fn key(&self, handle: EntryHandle) -> Option<&A> {
        self.0.first(handle)
    }
}

impl<A, B> KeySource<B> for SecondKeys<'_, A, B> {
    #[inline]
    fn key(&self, handle: EntryHandle) -> Option<&B> {
        self.0.second(handle)
    }
}

/// Insertion-ordered iterator over stored entries.
pub(crate) struct Iter<'a, A, B> {
    slots: &'a SlotMap<DefaultKey, Node<A, B>>,
    front: Option<DefaultKey>,
    back: Option<DefaultKey>,
    remaining: usize,
}

impl<A, B> Clone for Iter<'_, A, B> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

impl<'a, A, B> Iterator for Iter<'a, A, B> {
    type Item = (EntryHandle, &'a A, &'a B);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.front?;
        let node = self.slots.get(k)?;
        self.front = node.next;
        self.remaining -= 1;
        Some((EntryHandle::new(k), &node.first, &node.second))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<A, B> DoubleEndedIterator for Iter<'_, A, B> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let k = self.back?;
        let node = self.slots.get(k)?;
        self.back = node.prev;
        self.remaining -= 1;
        Some((EntryHandle::new(k), &node.first, &node.second))
    }
}

impl<A, B> ExactSizeIterator for Iter<'_, A, B> {}

/// Owning iterator draining the store front to back.
pub(crate) struct IntoIter<A, B> {
    store: EntryStore<A, B>,
}

impl<A, B> IntoIterator for EntryStore<A, B> {
    type Item = (A, B);
    type IntoIter = IntoIter<A, B>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter { store: self }
    }
}

impl<A, B> Iterator for IntoIter<A, B> {
    type Item = (A, B);

    fn next(&mut self) -> Option<Self::Item> {
        let head = self.store.head?;
        self.store.erase(EntryHandle::new(head))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.store.len();
        (n, Some(n))
    }
}

impl<A, B> DoubleEndedIterator for IntoIter<A, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let tail = self.store.tail?;
        self.store.erase(EntryHandle::new(tail))
    }
}

impl<A, B> ExactSizeIterator for IntoIter<A, B> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn firsts(store: &EntryStore<i32, String>) -> Vec<i32> {
        store.iter().map(|(_h, a, _b)| *a).collect()
    }

    /// Iteration follows insertion order, including after a freed slot is reused.
    #[test]
    fn iteration_follows_insertion_order_across_slot_reuse() {
        let mut s: EntryStore<i32, String> = EntryStore::new();
        let h1 = s.append(1, "one".to_string());
        s.append(2, "two".to_string());
        s.append(3, "three".to_string());
        assert_eq!(firsts(&s), vec![1, 2, 3]);

        s.erase(h1).unwrap();
        s.append(4, "four".to_string());
        assert_eq!(firsts(&s), vec![2, 3, 4]);

        let rev: Vec<i32> = s.iter().rev().map(|(_h, a, _b)| *a).collect();
        assert_eq!(rev, vec![4, 3, 2]);
        assert_eq!(s.iter().len(), 3);
        assert_eq!(s.linked_len(), 3);
    }

    /// Erasing from the middle, head and tail keeps the links consistent.
    #[test]
    fn erase_relinks_neighbours() {
        let mut s: EntryStore<i32, String> = EntryStore::new();
        let hs: Vec<EntryHandle> = (0..5).map(|i| s.append(i, i.to_string())).collect();

        assert_eq!(s.erase(hs[2]), Some((2, "2".to_string())));
        assert_eq!(firsts(&s), vec![0, 1, 3, 4]);
        s.erase(hs[0]).unwrap();
        s.erase(hs[4]).unwrap();
        assert_eq!(firsts(&s), vec![1, 3]);
        assert_eq!(s.linked_len(), s.len());

        s.erase(hs[1]).unwrap();
        s.erase(hs[3]).unwrap();
        assert_eq!(s.len(), 0);
        assert!(s.iter().next().is_none());
        assert_eq!(s.linked_len(), 0);
    }

    /// Handles of other entries survive appends and erasures; a stale handle
    /// does not resolve even when its slot is reused.
    #[test]
    fn handles_are_stable_and_stale_handles_do_not_alias() {
        let mut s: EntryStore<i32, String> = EntryStore::new();
        let keep = s.append(1, "keep".to_string());
        let gone = s.append(2, "gone".to_string());
        for i in 10..50 {
            s.append(i, i.to_string());
        }
        assert_eq!(s.get(keep), Some((&1, &"keep".to_string())));

        s.erase(gone).unwrap();
        let fresh = s.append(99, "fresh".to_string());
        assert_ne!(gone, fresh);
        assert!(s.get(gone).is_none());
        assert!(s.erase(gone).is_none());
        assert_eq!(s.first(keep), Some(&1));
        assert_eq!(s.second(fresh), Some(&"fresh".to_string()));
    }

    /// In-place replacement changes only the targeted field.
    #[test]
    fn replace_fields_in_place() {
        let mut s: EntryStore<i32, String> = EntryStore::new();
        let h = s.append(1, "a".to_string());
        assert_eq!(s.replace_first(h, 7), Some(1));
        assert_eq!(s.replace_second(h, "b".to_string()), Some("a".to_string()));
        assert_eq!(s.get(h), Some((&7, &"b".to_string())));
        assert_eq!(s.first_keys().key(h), Some(&7));
        assert_eq!(s.second_keys().key(h), Some(&"b".to_string()));
    }

    /// Owning iteration drains from both ends in insertion order.
    #[test]
    fn into_iter_drains_in_order() {
        let mut s: EntryStore<i32, String> = EntryStore::new();
        for i in 0..4 {
            s.append(i, i.to_string());
        }
        let mut it = s.into_iter();
        assert_eq!(it.len(), 4);
        assert_eq!(it.next(), Some((0, "0".to_string())));
        assert_eq!(it.next_back(), Some((3, "3".to_string())));
        let rest: Vec<(i32, String)> = it.collect();
        assert_eq!(rest, vec![(1, "1".to_string()), (2, "2".to_string())]);
    }

    #[test]
    fn clear_resets_links() {
        let mut s: EntryStore<i32, String> = EntryStore::new();
        s.reserve(8);
        s.append(1, "a".to_string());
        s.append(2, "b".to_string());
        s.clear();
        assert_eq!(s.len(), 0);
        assert!(s.iter().next().is_none());
        s.append(3, "c".to_string());
        assert_eq!(firsts(&s), vec![3]);
    }
}
