//! dense-hashmap: a hash map that keeps its entries in one contiguous
//! sequence and resolves collisions with chains of indices.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: `HashMap`-style lookups with slice-speed iteration and no
//!   per-entry allocation.
//! - Layers:
//!   - Entry store: a `Vec` of nodes `(key, value, hash, next)` in
//!     insertion order, modulo the relocation caused by erasure.
//!   - Bucket directory: a power-of-two `Vec` of chain heads. A head is the
//!     store index of the most recently inserted node of that bucket.
//!   - Growth controller: max load factor (default 0.875) and the
//!     bucket-count arithmetic shared by insert, `rehash` and `reserve`.
//!   - Hash policy: hash builder plus key predicate (`KeyEqual`).
//!     Heterogeneous lookups (`*_equiv`) exist only for hash builders
//!     marked `TransparentHash` on maps comparing with `DefaultKeyEqual`.
//!   - `DenseHashMap<K, V, S, E, A>`: public facade tying them together.
//!
//! Positions
//! - Lookups and inserts report entries as dense indices; `len()` is the
//!   end position. Erasing the entry at `i` moves the last entry into `i`,
//!   so positions other than the erased one and the former last one stay
//!   valid. There is no stale-position detection.
//!
//! Hasher and rehashing invariants
//! - Each node stores its full `u64` hash and indexing always uses the
//!   stored hash; `K: Hash` is never invoked after insertion. Rehash and
//!   relocation only rewrite links.
//! - Every node is reachable from exactly one bucket head, the one its
//!   stored hash selects, and is visited once along that chain.
//! - Growth is reactive: it runs after the new node is linked, when
//!   `len / bucket_count` exceeds the max load factor. Rehash never moves
//!   an entry, so the position an insert returns survives it.
//!
//! Failure semantics
//! - Infallible operations panic on arithmetic capacity overflow and leave
//!   allocation failure to the allocator's handler. `try_*` variants report
//!   [`Error::CapacityExceeded`] and leave the map unchanged.
//! - User code (`Hash`, `KeyEqual`, value constructors, `Drop`) runs only
//!   while the table is consistent: removed pairs are handed back after
//!   unlinking and relocation have completed.
//!
//! Allocators
//! - Both the store and the directory come from the same allocator `A`.
//!   `MapAllocator::PROPAGATE_ON_SWAP` decides whether `swap` exchanges
//!   allocators along with the contents.
//!
//! Notes and non-goals
//! - Unique keys only; no multimap.
//! - Not concurrent; mutation needs `&mut`.

mod allocator;
mod buckets;
mod chain;
mod dense_hash_map;
mod dense_hash_map_proptest;
mod entry;
mod error;
mod growth;
mod iter;
mod node;
mod policy;
#[cfg(feature = "serde")]
mod serde;

// Public surface
pub use crate::allocator::MapAllocator;
pub use crate::dense_hash_map::DenseHashMap;
pub use crate::entry::{Entry, OccupiedEntry, VacantEntry};
pub use crate::error::Error;
pub use crate::iter::{
    BucketIter, BucketIterMut, Drain, IntoIter, IntoKeys, IntoValues, Iter, IterMut, Keys, Values,
    ValuesMut,
};
pub use crate::policy::{DefaultKeyEqual, KeyEqual, Transparent, TransparentHash};
pub use allocator_api2::alloc::{AllocError, Allocator, Global};
pub use equivalent::Equivalent;
