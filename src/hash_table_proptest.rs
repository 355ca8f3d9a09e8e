#![cfg(test)]

// Property tests for HashTable kept inside the crate so they can inspect
// bucket layout through crate-private helpers.

use crate::hash_table::HashTable;
use crate::prime::is_prime;
use proptest::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hasher};

// Pool-indexed operations so shrinking walks toward earlier keys and
// shorter op lists.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    Remove(usize),
    Contains(String),
    Match(usize, i32),
    Clear,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            6 => (idx.clone(), -4i32..4).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => idx.clone().prop_map(OpI::Remove),
            2 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
            2 => (idx.clone(), -4i32..4).prop_map(|(i, v)| OpI::Match(i, v)),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn run_against_model<S: BuildHasher>(
    mut sut: HashTable<String, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<String, i32> = HashMap::new();
    for op in ops {
        let cap_before = sut.capacity();
        match op {
            OpI::Insert(i, v) => {
                let k = pool[i].clone();
                prop_assert!(sut.insert(k.clone(), v), "insert always reports true");
                model.insert(k, v);
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.remove(k.as_str()), model.remove(k).is_some());
                prop_assert_eq!(sut.capacity(), cap_before, "removal never resizes");
            }
            OpI::Contains(s) => {
                prop_assert_eq!(sut.contains(s.as_str()), model.contains_key(&s));
            }
            OpI::Match(i, v) => {
                let k = &pool[i];
                prop_assert_eq!(sut.matches(k.as_str(), &v), model.get(k) == Some(&v));
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.capacity(), cap_before, "clear keeps capacity");
            }
            OpI::Iterate => {
                let seen: BTreeMap<_, _> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let expected: BTreeMap<_, _> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(seen, expected);
            }
        }

        // Post-conditions after each op
        prop_assert_eq!(sut.size(), model.len());
        prop_assert_eq!(sut.bucket_lens().iter().sum::<usize>(), model.len());
        prop_assert!(is_prime(sut.capacity()));
        prop_assert!(sut.capacity() >= cap_before);
        prop_assert!(sut.size() <= sut.capacity(), "load factor stays at most 1");
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// Small starting capacities force several rehashes per case.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario(), start in 2usize..12) {
        let sut: HashTable<String, i32> = HashTable::with_capacity(start).unwrap();
        run_against_model(sut, &pool, ops)?;
    }
}

// Collision variant using a constant hasher to stress chain scanning.
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

// Property: same invariants under worst-case collisions (one chain holds
// every key).
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario(), start in 2usize..12) {
        let sut: HashTable<String, i32, ConstBuildHasher> =
            HashTable::with_capacity_and_hasher(start, ConstBuildHasher).unwrap();
        run_against_model(sut, &pool, ops)?;
    }
}
