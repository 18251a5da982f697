use dense_hashmap::DenseHashMap;
use proptest::prelude::*;
use std::collections::BTreeMap;

// Model random insert/erase traffic against BTreeMap and check that
// positions, buckets and iteration agree with it after every step.
proptest! {
    #[test]
    fn prop_positions_and_buckets_agree(keys in 1u16..=200, ops in proptest::collection::vec((0u8..=3u8, 0u16..1000u16), 1..300)) {
        let mut m: DenseHashMap<u16, u32> = DenseHashMap::new();
        let mut model: BTreeMap<u16, u32> = BTreeMap::new();

        for (step, (op, raw_k)) in ops.into_iter().enumerate() {
            let k = raw_k % keys;
            let v = step as u32;
            match op {
                // Insert never overwrites
                0 => {
                    let (_, inserted) = m.insert(k, v);
                    prop_assert_eq!(inserted, !model.contains_key(&k));
                    model.entry(k).or_insert(v);
                }
                // Assign always stores the new value
                1 => {
                    m.insert_or_assign(k, v);
                    model.insert(k, v);
                }
                // Erase by key
                2 => {
                    prop_assert_eq!(m.remove(&k), model.remove(&k));
                }
                // Erase by position of the key, if present
                3 => {
                    if let Some(index) = m.find(&k) {
                        prop_assert_eq!(m.erase_at(index), index);
                        model.remove(&k);
                    }
                }
                _ => unreachable!(),
            }

            prop_assert_eq!(m.len(), model.len());
            prop_assert!(m.load_factor() <= m.max_load_factor());
            prop_assert!(m.bucket_count().is_power_of_two());
        }

        // Every key's position points back to it.
        for (k, v) in &model {
            let index = m.find(k);
            prop_assert!(index.is_some());
            prop_assert_eq!(m.get_index(index.unwrap()), Some((k, v)));
        }

        // Buckets partition the entries: each key sits in the chain of the
        // bucket it hashes to, and chain lengths add up to len().
        let total: usize = (0..m.bucket_count()).map(|b| m.bucket_size(b)).sum();
        prop_assert_eq!(total, m.len());
        for k in model.keys() {
            let bucket = m.bucket(k);
            prop_assert!(m.bucket_iter(bucket).any(|(kk, _)| kk == k));
        }

        // Dense iteration yields exactly the model.
        let seen: BTreeMap<u16, u32> = m.iter().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(seen, model);
    }
}

// Retain against the model, then drain: the map ends empty and reusable.
proptest! {
    #[test]
    fn prop_retain_then_drain(pairs in proptest::collection::vec((any::<u32>(), any::<u32>()), 0..200), modulus in 1u32..7) {
        let mut m: DenseHashMap<u32, u32> = DenseHashMap::new();
        let mut model: BTreeMap<u32, u32> = BTreeMap::new();
        for (k, v) in pairs {
            m.insert(k, v);
            model.entry(k).or_insert(v);
        }

        m.retain(|k, _| k % modulus == 0);
        model.retain(|k, _| k % modulus == 0);
        prop_assert_eq!(m.len(), model.len());
        for (k, v) in &model {
            prop_assert_eq!(m.get(k), Some(v));
        }

        let drained: BTreeMap<u32, u32> = m.drain().collect();
        prop_assert_eq!(drained, model);
        prop_assert!(m.is_empty());
        prop_assert_eq!(m.bucket_count(), 8);
        m.insert(1, 1);
        prop_assert_eq!(m.get(&1), Some(&1));
    }
}

// Rehash to arbitrary counts never loses entries and always lands on the
// smallest power of two covering both the request and the load bound.
proptest! {
    #[test]
    fn prop_rehash_keeps_entries(len in 0usize..300, request in 0usize..5000) {
        let mut m: DenseHashMap<usize, usize> = (0..len).map(|k| (k, k)).collect();
        m.rehash(request);
        let required = ((len as f64) / (m.max_load_factor() as f64)).ceil() as usize;
        let expected = request.max(required).max(1).next_power_of_two();
        prop_assert_eq!(m.bucket_count(), expected);
        for k in 0..len {
            prop_assert_eq!(m.get(&k), Some(&k));
        }
    }
}
