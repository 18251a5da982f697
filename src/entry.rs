//! Entry API for in-place insert-or-update.

use crate::allocator::MapAllocator;
use crate::dense_hash_map::DenseHashMap;
use core::fmt;
use core::mem;

/// A view into a single key's slot, obtained from [`DenseHashMap::entry`].
pub enum Entry<'a, K, V, S, E, A: MapAllocator> {
    Occupied(OccupiedEntry<'a, K, V, S, E, A>),
    Vacant(VacantEntry<'a, K, V, S, E, A>),
}

/// An entry whose key is present.
pub struct OccupiedEntry<'a, K, V, S, E, A: MapAllocator> {
    map: &'a mut DenseHashMap<K, V, S, E, A>,
    index: usize,
}

/// An entry whose key is absent. Holds the key and its precomputed hash.
pub struct VacantEntry<'a, K, V, S, E, A: MapAllocator> {
    map: &'a mut DenseHashMap<K, V, S, E, A>,
    hash: u64,
    key: K,
}

impl<'a, K, V, S, E, A: MapAllocator> Entry<'a, K, V, S, E, A> {
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(o) => o.key(),
            Entry::Vacant(v) => v.key(),
        }
    }

    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(o) => o.into_mut(),
            Entry::Vacant(v) => v.insert(default),
        }
    }

    pub fn or_insert_with<F: FnOnce() -> V>(self, make: F) -> &'a mut V {
        match self {
            Entry::Occupied(o) => o.into_mut(),
            Entry::Vacant(v) => v.insert(make()),
        }
    }

    pub fn or_insert_with_key<F: FnOnce(&K) -> V>(self, make: F) -> &'a mut V {
        match self {
            Entry::Occupied(o) => o.into_mut(),
            Entry::Vacant(v) => {
                let value = make(&v.key);
                v.insert(value)
            }
        }
    }

    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }

    pub fn and_modify<F: FnOnce(&mut V)>(mut self, f: F) -> Self {
        if let Entry::Occupied(o) = &mut self {
            f(o.get_mut());
        }
        self
    }
}

impl<'a, K, V, S, E, A: MapAllocator> OccupiedEntry<'a, K, V, S, E, A> {
    pub(crate) fn new(map: &'a mut DenseHashMap<K, V, S, E, A>, index: usize) -> Self {
        Self { map, index }
    }

    /// Dense position of the entry.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn key(&self) -> &K {
        &self.map.node_at(self.index).key
    }

    pub fn get(&self) -> &V {
        &self.map.node_at(self.index).value
    }

    pub fn get_mut(&mut self) -> &mut V {
        self.map.value_at_mut(self.index)
    }

    pub fn into_mut(self) -> &'a mut V {
        let Self { map, index } = self;
        map.value_at_mut(index)
    }

    /// Replace the value, returning the old one.
    pub fn insert(&mut self, value: V) -> V {
        mem::replace(self.get_mut(), value)
    }

    /// Remove the entry; the last entry moves into its position.
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    pub fn remove_entry(self) -> (K, V) {
        self.map.take_at(self.index)
    }
}

impl<'a, K, V, S, E, A: MapAllocator> VacantEntry<'a, K, V, S, E, A> {
    pub(crate) fn new(map: &'a mut DenseHashMap<K, V, S, E, A>, hash: u64, key: K) -> Self {
        Self { map, hash, key }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn into_key(self) -> K {
        self.key
    }

    /// Insert `value` under the entry's key. May grow the table.
    pub fn insert(self, value: V) -> &'a mut V {
        let Self { map, hash, key } = self;
        let index = map.insert_new(hash, key, value);
        map.value_at_mut(index)
    }

    /// Like [`insert`](Self::insert), returning the new entry's position.
    pub fn insert_index(self, value: V) -> usize {
        self.map.insert_new(self.hash, self.key, value)
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S, E, A: MapAllocator> fmt::Debug for Entry<'_, K, V, S, E, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Occupied(o) => f.debug_tuple("Entry").field(o).finish(),
            Entry::Vacant(v) => f.debug_tuple("Entry").field(v).finish(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S, E, A: MapAllocator> fmt::Debug
    for OccupiedEntry<'_, K, V, S, E, A>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OccupiedEntry")
            .field("key", self.key())
            .field("value", self.get())
            .field("index", &self.index)
            .finish()
    }
}

impl<K: fmt::Debug, V, S, E, A: MapAllocator> fmt::Debug for VacantEntry<'_, K, V, S, E, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VacantEntry").field(&self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{DenseHashMap, Entry};

    #[test]
    fn or_insert_then_modify_counts_words() {
        let mut counts: DenseHashMap<&str, u32> = DenseHashMap::new();
        for w in "a b a c b a".split(' ') {
            counts.entry(w).and_modify(|n| *n += 1).or_insert(1);
        }
        assert_eq!(counts.get(&"a"), Some(&3));
        assert_eq!(counts.get(&"b"), Some(&2));
        assert_eq!(counts.get(&"c"), Some(&1));
        counts.assert_invariants();
    }

    #[test]
    fn vacant_insert_survives_growth() {
        let mut m: DenseHashMap<u32, u32> = DenseHashMap::new();
        for k in 0..7 {
            m.insert(k, k);
        }
        assert_eq!(m.bucket_count(), 8);
        // The eighth entry triggers a rehash; the returned reference is to it.
        *m.entry(7).or_insert(0) += 70;
        assert_eq!(m.bucket_count(), 16);
        assert_eq!(m.get(&7), Some(&70));
        m.assert_invariants();
    }

    #[test]
    fn occupied_entry_replace_and_remove() {
        let mut m: DenseHashMap<u32, &str> = [(1, "one"), (2, "two"), (3, "three")].into();
        match m.entry(1) {
            Entry::Occupied(mut o) => {
                assert_eq!(o.index(), 0);
                assert_eq!(o.insert("uno"), "one");
                assert_eq!(o.remove(), "uno");
            }
            Entry::Vacant(_) => panic!("key 1 should be present"),
        }
        assert_eq!(m.len(), 2);
        assert_eq!(m.find(&3), Some(0), "tail relocated into the freed slot");
        m.assert_invariants();
    }

    #[test]
    fn or_insert_with_key_runs_only_when_vacant() {
        let mut m: DenseHashMap<u32, u32> = DenseHashMap::new();
        assert_eq!(*m.entry(4).or_insert_with_key(|k| k * 2), 8);
        assert_eq!(*m.entry(4).or_insert_with_key(|_| unreachable!()), 8);
        match m.entry(9) {
            Entry::Vacant(v) => assert_eq!(v.into_key(), 9),
            Entry::Occupied(_) => panic!("key 9 should be absent"),
        }
        assert!(!m.contains_key(&9));
    }
}
