#![cfg(test)]

// Property tests for BiMap kept inside the crate so both backings can be
// driven through the same model without exposing internals.

use crate::bi_map::BiMap;
use crate::error::BiMapError;
use crate::hashed_index::HashedIndex;
use crate::ordered_index::OrderedIndex;
use crate::side_index::KeyLookup;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed first values shrink toward earlier keys; second values are
// drawn from a small range so collisions on both sides are frequent.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, u8),
    ChangeFirst(usize, u8),
    ChangeSecond(usize, u8),
    Change(usize, u8),
    RemoveFirst(usize),
    RemoveSecond(u8),
    Lookup(usize, u8),
    CloneAndCompare,
    Clear,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,4}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let second = 0u8..8;
        let op = prop_oneof![
            6 => (idx.clone(), second.clone()).prop_map(|(i, b)| Op::Insert(i, b)),
            2 => (idx.clone(), second.clone()).prop_map(|(i, b)| Op::ChangeFirst(i, b)),
            2 => (idx.clone(), second.clone()).prop_map(|(i, b)| Op::ChangeSecond(i, b)),
            2 => (idx.clone(), second.clone()).prop_map(|(i, b)| Op::Change(i, b)),
            2 => idx.clone().prop_map(Op::RemoveFirst),
            2 => second.clone().prop_map(Op::RemoveSecond),
            3 => (idx.clone(), second.clone()).prop_map(|(i, b)| Op::Lookup(i, b)),
            1 => Just(Op::CloneAndCompare),
            1 => Just(Op::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn position_of_first(model: &[(Key, i32)], k: &Key) -> Option<usize> {
    model.iter().position(|(a, _)| a == k)
}

fn position_of_second(model: &[(Key, i32)], b: i32) -> Option<usize> {
    model.iter().position(|(_, bb)| *bb == b)
}

// State-machine equivalence against an insertion-ordered Vec of pairs.
// Invariants exercised across random operation sequences:
// - Insert succeeds iff neither side is present; rejection changes nothing.
// - Change outcomes: NotFound (anchor absent), Conflict (key owned elsewhere),
//   Ok(false) (already set), Ok(true) (re-keyed in place, order kept).
// - Removal by either side drops the whole pair.
// - Borrowed (`&str`) and owned lookups agree with the model.
// - `validate()` holds and iteration order matches the model after every op.
fn run_scenario<IA, IB>(
    mut sut: BiMap<Key, i32, IA, IB>,
    pool: Vec<String>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError>
where
    IA: KeyLookup<Key> + KeyLookup<Key, str> + Clone,
    IB: KeyLookup<i32> + Clone,
{
    let mut model: Vec<(Key, i32)> = Vec::new();

    for op in ops {
        match op {
            Op::Insert(i, b) => {
                let k = key_from(&pool, i);
                let b = b as i32;
                let expected =
                    position_of_first(&model, &k).is_none() && position_of_second(&model, b).is_none();
                prop_assert_eq!(sut.insert(k.clone(), b), expected);
                if expected {
                    model.push((k, b));
                }
            }
            Op::ChangeFirst(i, b) => {
                let k = key_from(&pool, i);
                let b = b as i32;
                let expected = match position_of_second(&model, b) {
                    None => Err(BiMapError::NotFound),
                    Some(anchor) => match position_of_first(&model, &k) {
                        Some(owner) if owner == anchor => Ok(false),
                        Some(_) => Err(BiMapError::Conflict),
                        None => {
                            model[anchor].0 = k.clone();
                            Ok(true)
                        }
                    },
                };
                prop_assert_eq!(sut.change_first(k, &b), expected);
            }
            Op::ChangeSecond(i, b) => {
                let k = key_from(&pool, i);
                let b = b as i32;
                let expected = match position_of_first(&model, &k) {
                    None => Err(BiMapError::NotFound),
                    Some(anchor) => match position_of_second(&model, b) {
                        Some(owner) if owner == anchor => Ok(false),
                        Some(_) => Err(BiMapError::Conflict),
                        None => {
                            model[anchor].1 = b;
                            Ok(true)
                        }
                    },
                };
                prop_assert_eq!(sut.change_second(k.0.as_str(), b), expected);
            }
            Op::Change(i, b) => {
                let k = key_from(&pool, i);
                let b = b as i32;
                let expected = match (position_of_first(&model, &k), position_of_second(&model, b)) {
                    (None, None) => Err(BiMapError::NotFound),
                    (Some(p1), Some(p2)) if p1 == p2 => Ok(false),
                    (Some(_), Some(_)) => Err(BiMapError::Conflict),
                    (Some(p), None) => {
                        model[p].1 = b;
                        Ok(true)
                    }
                    (None, Some(p)) => {
                        model[p].0 = k.clone();
                        Ok(true)
                    }
                };
                prop_assert_eq!(sut.change(k, b), expected);
            }
            Op::RemoveFirst(i) => {
                let k = key_from(&pool, i);
                let pos = position_of_first(&model, &k);
                prop_assert_eq!(sut.remove_first(k.0.as_str()), pos.is_some());
                if let Some(p) = pos {
                    model.remove(p);
                }
            }
            Op::RemoveSecond(b) => {
                let b = b as i32;
                let pos = position_of_second(&model, b);
                prop_assert_eq!(sut.remove_second(&b), pos.is_some());
                if let Some(p) = pos {
                    model.remove(p);
                }
            }
            Op::Lookup(i, b) => {
                let k = key_from(&pool, i);
                let b = b as i32;
                let by_first = position_of_first(&model, &k).map(|p| &model[p].1);
                let by_second = position_of_second(&model, b).map(|p| &model[p].0);
                prop_assert_eq!(sut.get_by_first(k.0.as_str()), by_first);
                prop_assert_eq!(sut.get_by_first(&k), by_first);
                prop_assert_eq!(sut.get_by_second(&b), by_second);
                prop_assert_eq!(sut.at_first(&k).ok(), by_first);
                prop_assert_eq!(
                    sut.at_second(&b).err(),
                    by_second.is_none().then_some(BiMapError::NotFound)
                );
            }
            Op::CloneAndCompare => {
                let copy = sut.clone();
                prop_assert!(copy.validate().is_ok());
                prop_assert!(copy == sut);
            }
            Op::Clear => {
                sut.clear();
                model.clear();
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.validate(), Ok(()));
        prop_assert_eq!(sut.len(), model.len());
        let pairs: Vec<(Key, i32)> = sut.iter().map(|(a, b)| (a.clone(), *b)).collect();
        prop_assert_eq!(&pairs, &model);
    }
    Ok(())
}

// Collision variant using a constant hasher to stress equality resolution.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn prop_state_machine_hashed((pool, ops) in arb_scenario()) {
        let sut: BiMap<Key, i32> = BiMap::new();
        run_scenario(sut, pool, ops)?;
    }

    #[test]
    fn prop_state_machine_ordered((pool, ops) in arb_scenario()) {
        let sut: BiMap<Key, i32, OrderedIndex, OrderedIndex> = BiMap::new();
        run_scenario(sut, pool, ops)?;
    }

    // Same invariants under worst-case collision behavior (constant hasher).
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut = BiMap::with_indices(
            HashedIndex::with_hasher(ConstBuildHasher),
            HashedIndex::with_hasher(ConstBuildHasher),
        );
        run_scenario(sut, pool, ops)?;
    }

    // Mixed backings: ordered first side, hashed second side.
    #[test]
    fn prop_state_machine_mixed((pool, ops) in arb_scenario()) {
        let sut: BiMap<Key, i32, OrderedIndex, HashedIndex> = BiMap::new();
        run_scenario(sut, pool, ops)?;
    }
}
