//! DenseHashMap: dense entry store with collisions chained through indices.

use crate::allocator::MapAllocator;
use crate::buckets::BucketDirectory;
use crate::chain::{self, Probe};
use crate::entry::{Entry, OccupiedEntry, VacantEntry};
use crate::error::{CapacityExceededSnafu, Error, KeyNotFoundSnafu};
use crate::growth::{self, GrowthPolicy, DEFAULT_BUCKET_COUNT};
use crate::iter::{
    BucketIter, BucketIterMut, Drain, IntoIter, IntoKeys, IntoValues, Iter, IterMut, Keys, Values,
    ValuesMut,
};
use crate::node::Node;
use crate::policy::{bucket_for, DefaultKeyEqual, HashPolicy, KeyEqual, TransparentHash};
use allocator_api2::alloc::Global;
use allocator_api2::vec::Vec;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;
use core::ops::{Bound, Index, Range, RangeBounds};
use equivalent::Equivalent;
use log::{debug, trace};
use snafu::OptionExt;
use std::collections::hash_map::RandomState;

/// A hash map whose entries live in one contiguous sequence.
///
/// Buckets hold the index of the first entry of their chain and every entry
/// holds the index of the next one, so lookups cost a hash plus a short walk
/// while iteration is a plain slice scan.
///
/// Positions returned by `find`, `insert` and friends are indices into the
/// dense sequence (`len()` stands for "end"). A position stays valid until
/// the next erase: erasing relocates the last entry into the freed slot.
/// Using a stale position is not detected; it reads whatever entry lives
/// there now, or panics when out of range.
#[derive(Clone)]
pub struct DenseHashMap<K, V, S = RandomState, E = DefaultKeyEqual, A: MapAllocator = Global> {
    pub(crate) nodes: Vec<Node<K, V>, A>,
    pub(crate) buckets: BucketDirectory<A>,
    pub(crate) policy: HashPolicy<S, E>,
    pub(crate) growth: GrowthPolicy,
}

#[cold]
#[inline(never)]
fn capacity_overflow(err: Error) -> ! {
    panic!("capacity overflow: {}", err)
}

fn resolve_range<R: RangeBounds<usize>>(range: R, len: usize) -> Range<usize> {
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => e.saturating_add(1),
        Bound::Excluded(&e) => e,
        Bound::Unbounded => len,
    };
    assert!(
        start <= end && end <= len,
        "range {}..{} out of bounds for map of length {}",
        start,
        end,
        len
    );
    start..end
}

impl<K, V> DenseHashMap<K, V> {
    /// Empty map with 8 buckets.
    pub fn new() -> Self {
        Self::with_bucket_count(DEFAULT_BUCKET_COUNT)
    }

    /// Empty map with at least `bucket_count` buckets (rounded up to a
    /// power of two).
    pub fn with_bucket_count(bucket_count: usize) -> Self {
        Self::with_parts(bucket_count, RandomState::new(), DefaultKeyEqual, Global)
    }
}

impl<K, V, S> DenseHashMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_bucket_count_and_hasher(DEFAULT_BUCKET_COUNT, hasher)
    }

    pub fn with_bucket_count_and_hasher(bucket_count: usize, hasher: S) -> Self {
        Self::with_parts(bucket_count, hasher, DefaultKeyEqual, Global)
    }
}

impl<K, V, S, E, A> DenseHashMap<K, V, S, E, A>
where
    S: Default,
    E: Default,
    A: MapAllocator,
{
    pub fn new_in(alloc: A) -> Self {
        Self::with_bucket_count_in(DEFAULT_BUCKET_COUNT, alloc)
    }

    pub fn with_bucket_count_in(bucket_count: usize, alloc: A) -> Self {
        Self::with_parts(bucket_count, S::default(), E::default(), alloc)
    }
}

impl<K, V, S, E, A: MapAllocator> DenseHashMap<K, V, S, E, A> {
    /// Fully specified constructor: bucket-count hint, hash builder, key
    /// predicate and allocator.
    ///
    /// # Panics
    ///
    /// If no power of two `>= bucket_count` fits in memory.
    pub fn with_parts(bucket_count: usize, hasher: S, key_eq: E, alloc: A) -> Self {
        let count = match growth::bucket_count_for_hint(bucket_count) {
            Some(count) => count,
            None => capacity_overflow(
                CapacityExceededSnafu {
                    requested: bucket_count,
                }
                .build(),
            ),
        };
        Self {
            nodes: Vec::new_in(alloc.clone()),
            buckets: BucketDirectory::with_count_in(count, alloc),
            policy: HashPolicy::new(hasher, key_eq),
            growth: GrowthPolicy::default(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Entries the dense store can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.count()
    }

    pub fn max_bucket_count(&self) -> usize {
        growth::max_bucket_count()
    }

    /// Upper bound on `len()`: what the entry store can address, capped by
    /// what the largest directory holds at the current max load factor.
    pub fn max_len(&self) -> usize {
        let by_store = isize::MAX as usize / mem::size_of::<Node<K, V>>().max(1);
        let by_directory = (growth::max_bucket_count() as f64
            * self.growth.max_load_factor() as f64) as usize;
        by_store.min(by_directory)
    }

    /// Number of entries chained in bucket `n`.
    ///
    /// # Panics
    ///
    /// If `n >= bucket_count()`.
    pub fn bucket_size(&self, n: usize) -> usize {
        self.bucket_iter(n).count()
    }

    #[inline]
    pub fn load_factor(&self) -> f32 {
        self.nodes.len() as f32 / self.buckets.count() as f32
    }

    #[inline]
    pub fn max_load_factor(&self) -> f32 {
        self.growth.max_load_factor()
    }

    pub fn hasher(&self) -> &S {
        self.policy.hasher()
    }

    pub fn key_eq(&self) -> &E {
        self.policy.key_eq_fn()
    }

    pub fn allocator(&self) -> &A {
        self.nodes.allocator()
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.nodes.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.nodes.iter_mut(),
        }
    }

    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys {
            inner: self.nodes.iter(),
        }
    }

    pub fn values(&self) -> Values<'_, K, V> {
        Values {
            inner: self.nodes.iter(),
        }
    }

    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.nodes.iter_mut(),
        }
    }

    pub fn into_keys(self) -> IntoKeys<K, V, A> {
        IntoKeys {
            inner: self.nodes.into_iter(),
        }
    }

    pub fn into_values(self) -> IntoValues<K, V, A> {
        IntoValues {
            inner: self.nodes.into_iter(),
        }
    }

    /// Walk bucket `n`'s chain, most recently inserted entry first.
    ///
    /// # Panics
    ///
    /// If `n >= bucket_count()`.
    pub fn bucket_iter(&self, n: usize) -> BucketIter<'_, K, V> {
        BucketIter {
            nodes: &self.nodes,
            cursor: self.buckets.heads()[n],
        }
    }

    /// Mutable counterpart of [`bucket_iter`](Self::bucket_iter).
    pub fn bucket_iter_mut(&mut self, n: usize) -> BucketIterMut<'_, K, V> {
        let head = self.buckets.heads()[n];
        BucketIterMut::new(&mut self.nodes, head)
    }

    /// Entry at dense position `index`.
    pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
        self.nodes.get(index).map(Node::refs)
    }

    pub fn get_index_mut(&mut self, index: usize) -> Option<(&K, &mut V)> {
        self.nodes.get_mut(index).map(Node::ref_mut)
    }

    /// Remove every entry and return to the default 8 buckets. Keeps the
    /// entry store's allocation.
    pub fn clear(&mut self) {
        trace!("clear: dropping {} entries", self.nodes.len());
        // Buckets first: a panicking drop below must not leave chains
        // pointing past the end of the store.
        self.buckets.reset_to(DEFAULT_BUCKET_COUNT);
        self.nodes.clear();
    }

    /// Remove every entry, yielding them in dense order. The map is left as
    /// after [`clear`](Self::clear), even if the iterator is not consumed.
    pub fn drain(&mut self) -> Drain<'_, K, V, A> {
        self.buckets.reset_to(DEFAULT_BUCKET_COUNT);
        Drain {
            inner: self.nodes.drain(..),
        }
    }

    /// Remove the entry at dense position `index`, moving the last entry
    /// into its slot.
    pub fn swap_remove_index(&mut self, index: usize) -> Option<(K, V)> {
        let (bucket, probe) = self.locate_index(index)?;
        Some(self.remove_located(bucket, index, probe.predecessor))
    }

    /// Erase the entry at `index` and return the position of the entry that
    /// now follows the erased slot in dense order: `index` itself (now
    /// holding the former last entry) or `len()` when nothing follows.
    ///
    /// # Panics
    ///
    /// If `index >= len()`.
    pub fn erase_at(&mut self, index: usize) -> usize {
        let len = self.nodes.len();
        assert!(
            index < len,
            "erase position {} out of bounds for map of length {}",
            index,
            len
        );
        self.swap_remove_index(index);
        index
    }

    /// Erase every entry whose dense position lies in `range` and return
    /// the position just past the removed range in the resulting order.
    ///
    /// Entries are removed from the back of the range, so each relocation
    /// pulls an entry from beyond the range into a position already
    /// processed.
    ///
    /// # Panics
    ///
    /// If the range is out of bounds.
    pub fn erase_range<R: RangeBounds<usize>>(&mut self, range: R) -> usize {
        let range = resolve_range(range, self.nodes.len());
        for index in range.clone().rev() {
            self.swap_remove_index(index);
        }
        range.start
    }

    /// Keep only the entries for which `keep` returns `true`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut index = 0;
        while index < self.nodes.len() {
            let node = &mut self.nodes[index];
            if keep(&node.key, &mut node.value) {
                index += 1;
            } else {
                // The former last entry now sits at `index`; examine it next.
                self.swap_remove_index(index);
            }
        }
    }

    /// Rebuild the bucket directory for `bucket_count` buckets (rounded up
    /// to a power of two and never below what the current size requires).
    /// Entries do not move.
    ///
    /// # Panics
    ///
    /// If the bucket count overflows.
    pub fn rehash(&mut self, bucket_count: usize) {
        let count = self
            .growth
            .rehash_target(bucket_count, self.nodes.len())
            .unwrap_or_else(|e| capacity_overflow(e));
        if count != self.buckets.count() {
            let buckets = BucketDirectory::with_count_in(count, self.allocator().clone());
            self.install_buckets(buckets);
        }
    }

    /// Fallible [`rehash`](Self::rehash); the map is unchanged on error.
    pub fn try_rehash(&mut self, bucket_count: usize) -> Result<(), Error> {
        let count = self.growth.rehash_target(bucket_count, self.nodes.len())?;
        if count != self.buckets.count() {
            let buckets = BucketDirectory::try_with_count_in(count, self.allocator().clone())?;
            self.install_buckets(buckets);
        }
        Ok(())
    }

    /// Make room for `n` entries in total. Same as
    /// `rehash(ceil(n / max_load_factor()))`, so a directory enlarged past
    /// that target shrinks back to it; the entry store also reserves space
    /// for `n` entries.
    ///
    /// # Panics
    ///
    /// If the bucket count overflows.
    pub fn reserve(&mut self, n: usize) {
        let request = self
            .growth
            .reserve_request(n)
            .unwrap_or_else(|e| capacity_overflow(e));
        self.nodes.reserve(n.saturating_sub(self.nodes.len()));
        self.rehash(request);
    }

    /// Fallible [`reserve`](Self::reserve); the map is unchanged on error.
    pub fn try_reserve(&mut self, n: usize) -> Result<(), Error> {
        let request = self.growth.reserve_request(n)?;
        let count = self.growth.rehash_target(request, self.nodes.len())?;
        let buckets = if count != self.buckets.count() {
            Some(BucketDirectory::try_with_count_in(count, self.allocator().clone())?)
        } else {
            None
        };
        self.nodes
            .try_reserve(n.saturating_sub(self.nodes.len()))
            .map_err(|_| CapacityExceededSnafu { requested: n }.build())?;
        if let Some(buckets) = buckets {
            self.install_buckets(buckets);
        }
        Ok(())
    }

    // Grow-only reservation for bulk inserts.
    fn reserve_additional(&mut self, additional: usize) {
        let n = self.nodes.len().saturating_add(additional);
        let request = self
            .growth
            .reserve_request(n)
            .unwrap_or_else(|e| capacity_overflow(e));
        self.nodes.reserve(additional);
        if request > self.buckets.count() {
            self.rehash(request);
        }
    }

    /// Shrink the directory to the smallest bucket count the current size
    /// allows, and the entry store to its length.
    pub fn shrink_to_fit(&mut self) {
        self.rehash(0);
        self.nodes.shrink_to_fit();
    }

    /// Set the max load factor, growing immediately if the current load
    /// breaks the new bound. On error the previous factor stays in force.
    pub fn set_max_load_factor(&mut self, max_load_factor: f32) -> Result<(), Error> {
        let growth = GrowthPolicy::new(max_load_factor)?;
        if growth.exceeded(self.nodes.len(), self.buckets.count()) {
            let count = growth.required_bucket_count(self.nodes.len())?;
            let buckets = BucketDirectory::try_with_count_in(count, self.allocator().clone())?;
            self.install_buckets(buckets);
        }
        self.growth = growth;
        Ok(())
    }

    /// Exchange the contents of two maps.
    ///
    /// When `A::PROPAGATE_ON_SWAP` is `false`, each map keeps its allocator
    /// and the entries are moved into storage owned by it.
    pub fn swap(&mut self, other: &mut Self) {
        if A::PROPAGATE_ON_SWAP {
            mem::swap(self, other);
            return;
        }
        trace!(
            "swap without allocator propagation: {} <-> {} entries",
            self.nodes.len(),
            other.nodes.len()
        );
        mem::swap(&mut self.policy, &mut other.policy);
        mem::swap(&mut self.growth, &mut other.growth);
        let ours = self.take_storage();
        let theirs = other.take_storage();
        self.adopt_storage(theirs);
        other.adopt_storage(ours);
    }

    fn take_storage(&mut self) -> (Vec<Node<K, V>, A>, BucketDirectory<A>) {
        let alloc = self.allocator().clone();
        let nodes = mem::replace(&mut self.nodes, Vec::new_in(alloc.clone()));
        let buckets = mem::replace(&mut self.buckets, BucketDirectory::with_count_in(1, alloc));
        (nodes, buckets)
    }

    fn adopt_storage(&mut self, (nodes, buckets): (Vec<Node<K, V>, A>, BucketDirectory<A>)) {
        let alloc = self.allocator().clone();
        let mut own_nodes = Vec::with_capacity_in(nodes.len(), alloc.clone());
        own_nodes.extend(nodes);
        let mut own_buckets = BucketDirectory::with_count_in(buckets.count(), alloc);
        own_buckets.heads_mut().copy_from_slice(buckets.heads());
        self.nodes = own_nodes;
        self.buckets = own_buckets;
    }

    /// Relink every entry into `buckets` and make it the live directory.
    fn install_buckets(&mut self, mut buckets: BucketDirectory<A>) {
        debug!(
            "rehash: {} entries, {} -> {} buckets",
            self.nodes.len(),
            self.buckets.count(),
            buckets.count()
        );
        chain::rebuild(buckets.heads_mut(), &mut self.nodes);
        self.buckets = buckets;
    }

    /// Grow when the entry just linked pushed the load past the bound. Runs
    /// strictly after linking; the table is consistent on entry.
    pub(crate) fn maybe_grow_after_insert(&mut self) {
        let len = self.nodes.len();
        if self.growth.exceeded(len, self.buckets.count()) {
            let count = self
                .growth
                .required_bucket_count(len)
                .unwrap_or_else(|e| capacity_overflow(e));
            let buckets = BucketDirectory::with_count_in(count, self.allocator().clone());
            self.install_buckets(buckets);
        }
    }

    /// Append a node and link it at the head of its bucket. No growth.
    fn push_linked(&mut self, hash: u64, key: K, value: V) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node::new(key, value, hash));
        let bucket = bucket_for(hash, self.buckets.count());
        chain::insert_at_head(self.buckets.heads_mut(), &mut self.nodes, bucket, index);
        index
    }

    /// Insert a key known to be absent. Rehash never moves entries, so the
    /// returned position survives the growth step.
    pub(crate) fn insert_new(&mut self, hash: u64, key: K, value: V) -> usize {
        let index = self.push_linked(hash, key, value);
        self.maybe_grow_after_insert();
        index
    }

    /// Walk the chain for `hash` with an arbitrary key matcher.
    #[inline]
    fn locate_with<F>(&self, hash: u64, mut is_match: F) -> (usize, Probe)
    where
        F: FnMut(&K) -> bool,
    {
        let bucket = bucket_for(hash, self.buckets.count());
        let probe = chain::probe(self.buckets.heads(), &self.nodes, bucket, |_, node| {
            node.hash == hash && is_match(&node.key)
        });
        (bucket, probe)
    }

    /// Bucket and chain predecessor of the node at `index`.
    fn locate_index(&self, index: usize) -> Option<(usize, Probe)> {
        let hash = self.nodes.get(index)?.hash;
        let bucket = bucket_for(hash, self.buckets.count());
        let probe = chain::probe(self.buckets.heads(), &self.nodes, bucket, |i, _| i == index);
        debug_assert_eq!(probe.found, Some(index));
        Some((bucket, probe))
    }

    /// Unlink `index`, relocate the tail into its slot and repair the chain
    /// that referenced the tail.
    fn remove_located(&mut self, bucket: usize, index: usize, predecessor: Option<usize>) -> (K, V) {
        chain::unlink(self.buckets.heads_mut(), &mut self.nodes, bucket, index, predecessor);
        let node = self.nodes.swap_remove(index);
        let last = self.nodes.len();
        if index < last {
            chain::relink_after_relocation(self.buckets.heads_mut(), &mut self.nodes, last, index);
        }
        node.key_value()
    }

    #[inline]
    pub(crate) fn value_at_mut(&mut self, index: usize) -> &mut V {
        &mut self.nodes[index].value
    }

    #[inline]
    pub(crate) fn node_at(&self, index: usize) -> &Node<K, V> {
        &self.nodes[index]
    }

    pub(crate) fn take_at(&mut self, index: usize) -> (K, V) {
        match self.swap_remove_index(index) {
            Some(pair) => pair,
            None => unreachable!("entry position {index} vanished"),
        }
    }
}

impl<K, V, S, E, A> DenseHashMap<K, V, S, E, A>
where
    K: Hash,
    S: BuildHasher,
    E: KeyEqual<K>,
    A: MapAllocator,
{
    #[inline]
    fn locate(&self, hash: u64, key: &K) -> (usize, Probe) {
        self.locate_with(hash, |k| self.policy.key_eq(k, key))
    }

    /// Bucket index `key` maps to.
    pub fn bucket(&self, key: &K) -> usize {
        bucket_for(self.policy.hash(key), self.buckets.count())
    }

    /// Dense position of `key`.
    pub fn find(&self, key: &K) -> Option<usize> {
        let hash = self.policy.hash(key);
        self.locate(hash, key).1.found
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let index = self.find(key)?;
        Some(&self.nodes[index].value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let index = self.find(key)?;
        Some(&mut self.nodes[index].value)
    }

    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        let index = self.find(key)?;
        Some(self.nodes[index].refs())
    }

    /// Value for `key`, or [`Error::KeyNotFound`].
    pub fn at(&self, key: &K) -> Result<&V, Error> {
        self.get(key).context(KeyNotFoundSnafu)
    }

    pub fn at_mut(&mut self, key: &K) -> Result<&mut V, Error> {
        self.get_mut(key).context(KeyNotFoundSnafu)
    }

    /// 1 if `key` is present, else 0.
    pub fn count(&self, key: &K) -> usize {
        usize::from(self.find(key).is_some())
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// `i..i + 1` for the entry at position `i`, or `len()..len()`.
    pub fn equal_range(&self, key: &K) -> Range<usize> {
        match self.find(key) {
            Some(index) => index..index + 1,
            None => self.len()..self.len(),
        }
    }

    /// Insert `key -> value` unless `key` is present. Returns the entry's
    /// position and whether it was inserted; an existing value is untouched
    /// and the rejected arguments are dropped.
    pub fn insert(&mut self, key: K, value: V) -> (usize, bool) {
        let hash = self.policy.hash(&key);
        match self.locate(hash, &key).1.found {
            Some(index) => (index, false),
            None => (self.insert_new(hash, key, value), true),
        }
    }

    /// Same contract as [`insert`](Self::insert): the key and value are
    /// moved into the map on success and dropped, never cloned, otherwise.
    pub fn emplace(&mut self, key: K, value: V) -> (usize, bool) {
        self.insert(key, value)
    }

    /// [`insert`](Self::insert) that accepts a position hint and ignores
    /// it; returns only the position.
    pub fn insert_hint(&mut self, _hint: usize, key: K, value: V) -> usize {
        self.insert(key, value).0
    }

    /// Alias of [`insert_hint`](Self::insert_hint).
    pub fn emplace_hint(&mut self, hint: usize, key: K, value: V) -> usize {
        self.insert_hint(hint, key, value)
    }

    /// Insert, or overwrite the value of an existing entry.
    pub fn insert_or_assign(&mut self, key: K, value: V) -> (usize, bool) {
        let hash = self.policy.hash(&key);
        match self.locate(hash, &key).1.found {
            Some(index) => {
                self.nodes[index].value = value;
                (index, false)
            }
            None => (self.insert_new(hash, key, value), true),
        }
    }

    /// Insert `key` with the value built by `make`, unless `key` is present.
    /// `make` only runs when the entry is inserted.
    pub fn try_emplace<F>(&mut self, key: K, make: F) -> (usize, bool)
    where
        F: FnOnce() -> V,
    {
        let hash = self.policy.hash(&key);
        match self.locate(hash, &key).1.found {
            Some(index) => (index, false),
            None => (self.insert_new(hash, key, make()), true),
        }
    }

    /// Fallible [`insert`](Self::insert). Storage for the new entry is
    /// secured before anything is linked, so on error the map is unchanged.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<(usize, bool), Error> {
        let hash = self.policy.hash(&key);
        if let Some(index) = self.locate(hash, &key).1.found {
            return Ok((index, false));
        }
        let len = self.nodes.len() + 1;
        self.nodes
            .try_reserve(1)
            .map_err(|_| CapacityExceededSnafu { requested: len }.build())?;
        if self.growth.exceeded(len, self.buckets.count()) {
            let count = self.growth.required_bucket_count(len)?;
            let buckets = BucketDirectory::try_with_count_in(count, self.allocator().clone())?;
            self.install_buckets(buckets);
        }
        Ok((self.push_linked(hash, key, value), true))
    }

    /// Value for `key`, inserting `make()` first if absent.
    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let (index, _) = self.try_emplace(key, make);
        &mut self.nodes[index].value
    }

    /// Value for `key`, inserting `V::default()` first if absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, S, E, A> {
        let hash = self.policy.hash(&key);
        match self.locate(hash, &key).1.found {
            Some(index) => Entry::Occupied(OccupiedEntry::new(self, index)),
            None => Entry::Vacant(VacantEntry::new(self, hash, key)),
        }
    }

    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let hash = self.policy.hash(key);
        let (bucket, probe) = self.locate(hash, key);
        let index = probe.found?;
        Some(self.remove_located(bucket, index, probe.predecessor))
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Erase `key`, returning how many entries were removed (0 or 1).
    pub fn erase(&mut self, key: &K) -> usize {
        usize::from(self.remove_entry(key).is_some())
    }

    /// Check every structural invariant; panics on the first violation.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let count = self.buckets.count();
        assert!(count.is_power_of_two(), "bucket count {count}");
        assert!(
            !self.growth.exceeded(self.nodes.len(), count),
            "load {} over max {}",
            self.load_factor(),
            self.max_load_factor()
        );
        let mut seen = std::vec![0u8; self.nodes.len()];
        for bucket in 0..count {
            for index in chain::chain_of(self.buckets.heads(), &self.nodes, bucket) {
                let node = &self.nodes[index];
                assert_eq!(bucket_for(node.hash, count), bucket, "node {index} in wrong bucket");
                assert_eq!(self.policy.hash(&node.key), node.hash, "stale hash at {index}");
                seen[index] += 1;
            }
        }
        assert!(seen.iter().all(|&n| n == 1), "reachability counts {:?}", seen);
    }
}

// Only with `DefaultKeyEqual`: `Equivalent` must agree with `K: Eq`, which
// no custom key predicate is bound by.
impl<K, V, S, A> DenseHashMap<K, V, S, DefaultKeyEqual, A>
where
    S: TransparentHash,
    A: MapAllocator,
{
    #[inline]
    fn locate_equiv<Q>(&self, q: &Q) -> (usize, Probe)
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let hash = self.policy.hash(q);
        self.locate_with(hash, |k| q.equivalent(k))
    }

    /// Transparent [`find`](Self::find).
    pub fn find_equiv<Q>(&self, q: &Q) -> Option<usize>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.locate_equiv(q).1.found
    }

    pub fn get_equiv<Q>(&self, q: &Q) -> Option<&V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let index = self.find_equiv(q)?;
        Some(&self.nodes[index].value)
    }

    pub fn get_equiv_mut<Q>(&mut self, q: &Q) -> Option<&mut V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let index = self.find_equiv(q)?;
        Some(&mut self.nodes[index].value)
    }

    pub fn at_equiv<Q>(&self, q: &Q) -> Result<&V, Error>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.get_equiv(q).context(KeyNotFoundSnafu)
    }

    pub fn count_equiv<Q>(&self, q: &Q) -> usize
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        usize::from(self.find_equiv(q).is_some())
    }

    pub fn contains_key_equiv<Q>(&self, q: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.find_equiv(q).is_some()
    }

    pub fn equal_range_equiv<Q>(&self, q: &Q) -> Range<usize>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        match self.find_equiv(q) {
            Some(index) => index..index + 1,
            None => self.len()..self.len(),
        }
    }

    pub fn remove_equiv<Q>(&mut self, q: &Q) -> Option<(K, V)>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let (bucket, probe) = self.locate_equiv(q);
        let index = probe.found?;
        Some(self.remove_located(bucket, index, probe.predecessor))
    }
}

impl<K, V, S, E, A> Default for DenseHashMap<K, V, S, E, A>
where
    S: Default,
    E: Default,
    A: MapAllocator + Default,
{
    fn default() -> Self {
        Self::new_in(A::default())
    }
}

impl<K, V, S, E, A> fmt::Debug for DenseHashMap<K, V, S, E, A>
where
    K: fmt::Debug,
    V: fmt::Debug,
    A: MapAllocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Order-insensitive: two maps are equal when they hold the same pairs.
impl<K, V, S, E, A> PartialEq for DenseHashMap<K, V, S, E, A>
where
    K: Hash,
    V: PartialEq,
    S: BuildHasher,
    E: KeyEqual<K>,
    A: MapAllocator,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(k, v)| other.get(k).map_or(false, |ov| v == ov))
    }
}

impl<K, V, S, E, A> Eq for DenseHashMap<K, V, S, E, A>
where
    K: Hash,
    V: Eq,
    S: BuildHasher,
    E: KeyEqual<K>,
    A: MapAllocator,
{
}

impl<K, V, S, E, A> Index<&K> for DenseHashMap<K, V, S, E, A>
where
    K: Hash,
    S: BuildHasher,
    E: KeyEqual<K>,
    A: MapAllocator,
{
    type Output = V;

    /// # Panics
    ///
    /// If `key` is absent.
    fn index(&self, key: &K) -> &V {
        match self.get(key) {
            Some(v) => v,
            None => panic!("key not found"),
        }
    }
}

/// Pairs whose key is already present are dropped, as with `insert`.
impl<K, V, S, E, A> Extend<(K, V)> for DenseHashMap<K, V, S, E, A>
where
    K: Hash,
    S: BuildHasher,
    E: KeyEqual<K>,
    A: MapAllocator,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.reserve_additional(lower);
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S, E, A> FromIterator<(K, V)> for DenseHashMap<K, V, S, E, A>
where
    K: Hash,
    S: BuildHasher + Default,
    E: KeyEqual<K> + Default,
    A: MapAllocator + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for DenseHashMap<K, V>
where
    K: Hash + Eq,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self::from_iter(pairs)
    }
}

impl<K, V, S, E, A: MapAllocator> IntoIterator for DenseHashMap<K, V, S, E, A> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, A>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.nodes.into_iter(),
        }
    }
}

impl<'a, K, V, S, E, A: MapAllocator> IntoIterator for &'a DenseHashMap<K, V, S, E, A> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S, E, A: MapAllocator> IntoIterator for &'a mut DenseHashMap<K, V, S, E, A> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
