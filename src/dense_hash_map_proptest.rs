#![cfg(test)]

// Property tests for DenseHashMap kept inside the crate so they can check the
// chain structure directly through `assert_invariants`.

use crate::policy::{Transparent, TransparentHash};
use crate::DenseHashMap;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::cell::Cell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};

// Key newtype with Borrow<str>, so `str` is an `Equivalent<Key>`.
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

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Insert(usize, i32),
    InsertOrAssign(usize, i32),
    TryEmplace(usize, i32),
    Erase(usize),
    EraseAt(usize),
    EraseRange(usize, usize),
    Retain(i32),
    Find(usize),
    Contains(String),
    Rehash(usize),
    Reserve(usize),
    SetMaxLoadFactor(f32),
    Clear,
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::InsertOrAssign(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::TryEmplace(i, v)),
            2 => idx.clone().prop_map(OpI::Erase),
            1 => any::<usize>().prop_map(OpI::EraseAt),
            1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| OpI::EraseRange(a, b)),
            1 => any::<i32>().prop_map(OpI::Retain),
            2 => idx.clone().prop_map(OpI::Find),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(OpI::Contains),
            1 => (0usize..64).prop_map(OpI::Rehash),
            1 => (0usize..64).prop_map(OpI::Reserve),
            1 => (0.25f32..4.0f32).prop_map(OpI::SetMaxLoadFactor),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// State-machine equivalence against std::collections::HashMap. After every
// operation the chains must reach each dense index exactly once from the
// bucket its stored hash selects, and the load must respect the bound.
fn run_state_machine<S>(
    mut sut: DenseHashMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    S: TransparentHash,
{
    let mut model: HashMap<Key, i32> = HashMap::new();
    let constructed = Cell::new(0);

    for op in ops {
        match op {
            OpI::Insert(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let (index, inserted) = sut.insert(k.clone(), v);
                prop_assert_eq!(inserted, !already, "insert must reject duplicates");
                prop_assert_eq!(sut.get_index(index).map(|(kk, _)| kk), Some(&k));
                model.entry(k).or_insert(v);
            }
            OpI::InsertOrAssign(i, v) => {
                let k = key_from(pool, i);
                let (index, inserted) = sut.insert_or_assign(k.clone(), v);
                prop_assert_eq!(inserted, model.insert(k, v).is_none());
                prop_assert_eq!(sut.get_index(index).map(|(_, vv)| *vv), Some(v));
            }
            OpI::TryEmplace(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let before = constructed.get();
                let (_, inserted) = sut.try_emplace(k.clone(), || {
                    constructed.set(constructed.get() + 1);
                    v
                });
                prop_assert_eq!(inserted, !already);
                let expected_calls = if already { before } else { before + 1 };
                prop_assert_eq!(constructed.get(), expected_calls, "value built only on insertion");
                model.entry(k).or_insert(v);
            }
            OpI::Erase(i) => {
                let k = key_from(pool, i);
                let expected = usize::from(model.remove(&k).is_some());
                prop_assert_eq!(sut.erase(&k), expected);
            }
            OpI::EraseAt(raw) => {
                if !sut.is_empty() {
                    let index = raw % sut.len();
                    let victim = sut.get_index(index).map(|(k, _)| k.clone()).unwrap();
                    prop_assert_eq!(sut.erase_at(index), index);
                    prop_assert!(model.remove(&victim).is_some());
                }
            }
            OpI::EraseRange(a, b) => {
                let len = sut.len();
                let start = a % (len + 1);
                let end = start + b % (len - start + 1);
                let victims: Vec<Key> = sut.keys().skip(start).take(end - start).cloned().collect();
                prop_assert_eq!(sut.erase_range(start..end), start);
                for k in victims {
                    prop_assert!(model.remove(&k).is_some());
                }
            }
            OpI::Retain(threshold) => {
                sut.retain(|_, v| *v >= threshold);
                model.retain(|_, v| *v >= threshold);
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                let found = sut.find(&k).and_then(|index| sut.get_index(index)).map(|(_, v)| *v);
                prop_assert_eq!(found, model.get(&k).copied());
                prop_assert_eq!(sut.count(&k), usize::from(model.contains_key(&k)));
            }
            OpI::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key_equiv(s.as_str()), has_model);
                prop_assert_eq!(sut.get_equiv(s.as_str()).copied(), model.get(s.as_str()).copied());
            }
            OpI::Rehash(n) => {
                sut.rehash(n);
                prop_assert!(sut.bucket_count() >= n);
            }
            OpI::Reserve(n) => {
                sut.reserve(n);
                prop_assert!(sut.capacity() >= n);
            }
            OpI::SetMaxLoadFactor(f) => {
                prop_assert!(sut.set_max_load_factor(f).is_ok());
                prop_assert_eq!(sut.max_load_factor(), f);
            }
            OpI::Clear => {
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.bucket_count(), 8);
            }
            OpI::Iterate => {
                let s: BTreeMap<_, _> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let m: BTreeMap<_, _> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(sut.iter().len(), sut.len());
                prop_assert_eq!(s, m);
            }
        }

        sut.assert_invariants();
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.load_factor() <= sut.max_load_factor());
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let sut: DenseHashMap<Key, i32, Transparent> = DenseHashMap::default();
        run_state_machine(sut, &pool, ops)?;
    }
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
impl TransparentHash for ConstBuildHasher {}

// Same state machine with every key in one chain: every erase relocates a
// node whose only reference is an interior link or the bucket head.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut: DenseHashMap<Key, i32, ConstBuildHasher> = DenseHashMap::with_hasher(ConstBuildHasher);
        run_state_machine(sut, &pool, ops)?;
    }
}
