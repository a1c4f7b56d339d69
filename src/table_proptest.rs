#![cfg(test)]

// Property tests for the compact containers kept inside the crate so they
// can assert engine-level invariants (capacity, fill accounting) alongside
// model equivalence.

use crate::compact_map::CompactMap;
use crate::compact_set::CompactSet;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum MapOp {
    Insert(usize, i32),
    Remove(usize),
    Get(usize),
    GetOrInsert(usize, i32),
    Iterate,
    Clear,
}

fn arb_map_scenario() -> impl Strategy<Value = (Vec<String>, Vec<MapOp>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            8 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| MapOp::Insert(i, v)),
            6 => idx.clone().prop_map(MapOp::Remove),
            4 => idx.clone().prop_map(MapOp::Get),
            3 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| MapOp::GetOrInsert(i, v)),
            2 => Just(MapOp::Iterate),
            1 => Just(MapOp::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: state-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - insert/remove/get parity with the model, including overwrite returns.
// - len parity after each op; iteration yields exactly len entries.
// - capacity is always a power of two and never drops below one.
// - live load factor stays at or below one half.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_map_matches_model((pool, ops) in arb_map_scenario()) {
        let mut sut: CompactMap<String, i32> = CompactMap::new();
        let mut model: HashMap<String, i32> = HashMap::new();

        for op in ops {
            match op {
                MapOp::Insert(i, v) => {
                    let key = pool[i].clone();
                    prop_assert_eq!(sut.insert(key.clone(), v), model.insert(key, v));
                }
                MapOp::Remove(i) => {
                    let key = &pool[i];
                    prop_assert_eq!(sut.remove(key.as_str()), model.remove(key));
                }
                MapOp::Get(i) => {
                    let key = &pool[i];
                    prop_assert_eq!(sut.get(key.as_str()), model.get(key));
                    prop_assert_eq!(sut.contains_key(key.as_str()), model.contains_key(key));
                }
                MapOp::GetOrInsert(i, v) => {
                    let key = pool[i].clone();
                    let got = *sut.get_or_insert_with(key.clone(), || v);
                    let want = *model.entry(key).or_insert(v);
                    prop_assert_eq!(got, want);
                }
                MapOp::Iterate => {
                    prop_assert_eq!(sut.iter().count(), model.len());
                    for (k, v) in sut.iter() {
                        prop_assert_eq!(model.get(k), Some(v));
                    }
                }
                MapOp::Clear => {
                    sut.clear();
                    model.clear();
                    prop_assert_eq!(sut.capacity(), 1);
                }
            }

            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.capacity().is_power_of_two());
            prop_assert!(sut.len() * 2 <= sut.capacity() || sut.capacity() == 1);
        }
    }
}

#[derive(Clone, Debug)]
enum SetOp {
    Insert(usize),
    Remove(usize),
    Contains(usize),
    Walk,
    Clear,
}

fn arb_set_scenario() -> impl Strategy<Value = (Vec<String>, Vec<SetOp>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            8 => idx.clone().prop_map(SetOp::Insert),
            6 => idx.clone().prop_map(SetOp::Remove),
            4 => idx.clone().prop_map(SetOp::Contains),
            2 => Just(SetOp::Walk),
            1 => Just(SetOp::Clear),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Property: state-machine equivalence against std::collections::HashSet,
// with every full walk performed through a fresh versioned cursor. A cursor
// created after the mutation must complete its walk without invalidation
// and visit exactly the model's elements.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_set_matches_model((pool, ops) in arb_set_scenario()) {
        let mut sut: CompactSet<String> = CompactSet::new();
        let mut model: HashSet<String> = HashSet::new();

        for op in ops {
            match op {
                SetOp::Insert(i) => {
                    let value = pool[i].clone();
                    prop_assert_eq!(sut.insert(value.clone()), model.insert(value));
                }
                SetOp::Remove(i) => {
                    let value = &pool[i];
                    prop_assert_eq!(sut.remove(value.as_str()), model.remove(value));
                }
                SetOp::Contains(i) => {
                    let value = &pool[i];
                    prop_assert_eq!(sut.contains(value.as_str()), model.contains(value));
                }
                SetOp::Walk => {
                    let mut cursor = sut.cursor();
                    let mut seen = HashSet::new();
                    while let Some(v) = cursor.next(&sut).expect("fresh cursor stays valid") {
                        prop_assert!(seen.insert(v.clone()), "element visited twice");
                    }
                    prop_assert_eq!(&seen, &model);
                }
                SetOp::Clear => {
                    sut.clear();
                    model.clear();
                    prop_assert_eq!(sut.capacity(), 1);
                }
            }

            prop_assert_eq!(sut.len(), model.len());
            prop_assert!(sut.capacity().is_power_of_two());
            prop_assert_eq!(sut.iter().count(), model.len());
        }
    }
}
