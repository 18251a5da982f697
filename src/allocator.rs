//! Allocator capability used for the entry store and the bucket directory.

use allocator_api2::alloc::{Allocator, Global};

/// An allocator a `DenseHashMap` can store its entries and buckets in.
///
/// `PROPAGATE_ON_SWAP` decides what `DenseHashMap::swap` does with the two
/// allocators: when `true` the maps exchange storage and allocators
/// wholesale; when `false` each map keeps its own allocator and the
/// contents are moved into storage owned by it.
pub trait MapAllocator: Allocator + Clone {
    const PROPAGATE_ON_SWAP: bool;
}

impl MapAllocator for Global {
    const PROPAGATE_ON_SWAP: bool = true;
}
