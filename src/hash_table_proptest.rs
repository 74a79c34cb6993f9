#![cfg(test)]

// State-machine property tests for HashTable, kept inside the crate so the
// structural checks can look at bucket sizes and cursors directly.

use crate::error::InsertError;
use crate::hash_table::{Cursor, HashTable};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};
use std::rc::Rc;

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

// Pool-indexed operations so shrinking moves toward earlier keys and
// shorter op lists.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    InsertWith(usize, i32),
    Remove(usize),
    Erase(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Rehash(usize),
    Reserve(usize),
    SetMaxLoadFactor(f32),
    Walk,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<Op>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=12).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::InsertWith(i, v)),
            2 => idx.clone().prop_map(Op::Remove),
            2 => idx.clone().prop_map(Op::Erase),
            2 => idx.clone().prop_map(Op::Find),
            1 => prop_oneof![contains_pool, "[a-z]{0,5}"].prop_map(Op::Contains),
            1 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => (0usize..40).prop_map(Op::Rehash),
            1 => (0usize..40).prop_map(Op::Reserve),
            1 => (1u32..=16).prop_map(|q| Op::SetMaxLoadFactor(q as f32 * 0.25)),
            1 => Just(Op::Walk),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Structural checks that must hold between any two operations.
fn check_structure<S: BuildHasher>(
    sut: &HashTable<Key, i32, S>,
    model: &HashMap<Key, i32>,
) -> Result<(), TestCaseError> {
    prop_assert_eq!(sut.len(), model.len());
    prop_assert_eq!(sut.is_empty(), model.is_empty());

    let bc = sut.bucket_count();
    prop_assert!(
        sut.len() as f64 <= sut.max_load_factor() as f64 * bc as f64,
        "load factor {} above max {}",
        sut.load_factor(),
        sut.max_load_factor()
    );
    let per_bucket: usize = (0..bc).map(|b| sut.bucket_size(b)).sum();
    prop_assert_eq!(per_bucket, sut.len());

    for (k, v) in model {
        let c = sut.find(k);
        prop_assert_eq!(c.entry(sut), Some((k, v)));
        prop_assert_eq!(sut.bucket(k), Some(c.bucket()));
    }
    Ok(())
}

fn run_scenario<S: BuildHasher>(
    mut sut: HashTable<Key, i32, S>,
    pool: Vec<String>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut live: HashMap<Key, Cursor> = HashMap::new();
    let mut stale: Vec<Cursor> = Vec::new();
    let default_calls = Rc::new(Cell::new(0));

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                match sut.insert(k.clone(), v) {
                    Ok(c) => {
                        prop_assert!(!already, "insert must fail on duplicate");
                        prop_assert_eq!(c.key(&sut), Some(&k));
                        live.insert(k.clone(), c);
                        model.insert(k, v);
                    }
                    Err(InsertError::DuplicateKey(c)) => {
                        prop_assert!(already, "duplicate error only when key exists");
                        prop_assert_eq!(c.value(&sut), model.get(&k));
                    }
                }
            }
            Op::InsertWith(i, v) => {
                let k = key_from(&pool, i);
                let already = model.contains_key(&k);
                let counter = default_calls.clone();
                let before = counter.get();
                let r = sut.insert_with(k.clone(), move || {
                    counter.set(counter.get() + 1);
                    v
                });
                match r {
                    Ok(c) => {
                        prop_assert!(!already);
                        prop_assert_eq!(default_calls.get(), before + 1, "constructor runs once");
                        live.insert(k.clone(), c);
                        model.insert(k, v);
                    }
                    Err(InsertError::DuplicateKey(_)) => {
                        prop_assert!(already);
                        prop_assert_eq!(default_calls.get(), before, "constructor must not run");
                    }
                }
            }
            Op::Remove(i) => {
                let k = key_from(&pool, i);
                let got = sut.remove_entry(k.0.as_str());
                let want = model.remove(&k).map(|v| (k.clone(), v));
                prop_assert_eq!(got, want);
                if let Some(c) = live.remove(&k) {
                    stale.push(c);
                }
            }
            Op::Erase(i) => {
                let k = key_from(&pool, i);
                if let Some(c) = live.remove(&k) {
                    let expected_next = sut.advance(c);
                    let next = sut.erase(c);
                    prop_assert_eq!(next, expected_next);
                    prop_assert!(model.remove(&k).is_some());
                    stale.push(c);
                } else {
                    prop_assert!(sut.find(&k).is_end());
                }
            }
            Op::Find(i) => {
                let k = key_from(&pool, i);
                let c = sut.find(&k);
                prop_assert_eq!(!c.is_end(), model.contains_key(&k));
                if let Some(&tracked) = live.get(&k) {
                    // The tracked cursor may predate a rehash; it must still resolve.
                    prop_assert_eq!(tracked.key(&sut), c.key(&sut));
                }
            }
            Op::Contains(s) => {
                let has = sut.contains_key(s.as_str());
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(has, has_model);
            }
            Op::Mutate(i, d) => {
                let k = key_from(&pool, i);
                if let Some(&c) = live.get(&k) {
                    match c.value_mut(&mut sut) {
                        Some(v) => {
                            *v = v.saturating_add(d);
                            if let Some(mv) = model.get_mut(&k) {
                                *mv = mv.saturating_add(d);
                            }
                        }
                        None => prop_assert!(false, "live cursor should resolve"),
                    }
                }
            }
            Op::Rehash(n) => {
                sut.rehash(n);
                prop_assert!(sut.bucket_count() >= n);
            }
            Op::Reserve(n) => {
                sut.reserve(n);
                prop_assert!(sut.bucket_count() as f64 * sut.max_load_factor() as f64 >= n as f64);
            }
            Op::SetMaxLoadFactor(lf) => {
                sut.set_max_load_factor(lf);
                prop_assert_eq!(sut.max_load_factor(), lf);
            }
            Op::Walk => {
                let mut c = sut.begin();
                let mut walked = BTreeSet::new();
                while let Some(k) = c.key(&sut) {
                    prop_assert!(walked.insert(k.clone()), "walk revisited {:?}", k);
                    c = sut.advance(c);
                }
                prop_assert_eq!(c, sut.end());
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(&walked, &m_keys);
                let i_keys: BTreeSet<_> = sut.iter().map(|(k, _)| k.clone()).collect();
                prop_assert_eq!(&i_keys, &m_keys);
            }
        }

        for &c in &stale {
            prop_assert!(c.value(&sut).is_none());
        }
        check_structure(&sut, &model)?;
    }
    Ok(())
}

// Property: state-machine equivalence against std::collections::HashMap.
// - Duplicate keys are rejected and the error points at the stored entry.
// - `find`/`contains_key` parity; tracked cursors keep resolving across rehash.
// - `erase(c)` returns exactly what `advance(c)` returned before the erase.
// - Erased cursors never resolve.
// - Cursor walk and `iter` each yield every live entry exactly once.
// - Bucket sizes sum to `len` and the load factor never exceeds the maximum.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run_scenario(HashTable::new(), pool, ops)?;
    }

    #[test]
    fn prop_state_machine_from_zero_buckets((pool, ops) in arb_scenario()) {
        run_scenario(HashTable::with_buckets(0), pool, ops)?;
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

// Property: same invariants under worst-case collisions; every entry shares
// bucket 0 no matter how many buckets exist.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        run_scenario(HashTable::with_hasher(ConstBuildHasher), pool, ops)?;
    }
}

// Property: rehashing to any count moves entries without cloning or dropping
// them, and leaves the key/value set unchanged.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_rehash_preserves_entries(
        keys in proptest::collection::btree_set(any::<u16>(), 0..64),
        targets in proptest::collection::vec(0usize..128, 1..8),
    ) {
        let drops = Rc::new(Cell::new(0usize));
        struct Tracked(u16, Rc<Cell<usize>>);
        impl Drop for Tracked {
            fn drop(&mut self) {
                self.1.set(self.1.get() + 1);
            }
        }

        let mut t: HashTable<u16, Tracked> = HashTable::new();
        for &k in &keys {
            prop_assert!(t.insert(k, Tracked(k, drops.clone())).is_ok());
        }
        for n in targets {
            t.rehash(n);
            prop_assert_eq!(drops.get(), 0);
            prop_assert_eq!(t.len(), keys.len());
            for &k in &keys {
                prop_assert_eq!(t.get(&k).map(|v| v.0), Some(k));
            }
        }
        drop(t);
        prop_assert_eq!(drops.get(), keys.len());
    }
}
