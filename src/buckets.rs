//! Bucket directory: one chain head per bucket, power-of-two sized.
//!
//! The directory owns no entries and is never a source of truth for size or
//! content; it is rebuilt wholesale on every rehash.

use crate::error::{CapacityExceededSnafu, Error};
use crate::node::Link;
use allocator_api2::alloc::{Allocator, Global};
use allocator_api2::vec::Vec;
use core::iter;

#[derive(Clone, Debug)]
pub(crate) struct BucketDirectory<A: Allocator = Global> {
    heads: Vec<Link, A>,
}

impl<A: Allocator> BucketDirectory<A> {
    /// Directory of `count` empty buckets. Allocation failure is handled by
    /// the allocator's error handler, as for any infallible collection.
    pub(crate) fn with_count_in(count: usize, alloc: A) -> Self {
        debug_assert!(count.is_power_of_two());
        let mut heads = Vec::with_capacity_in(count, alloc);
        heads.extend(iter::repeat(Link::END).take(count));
        Self { heads }
    }

    /// Fallible counterpart of `with_count_in`.
    pub(crate) fn try_with_count_in(count: usize, alloc: A) -> Result<Self, Error> {
        debug_assert!(count.is_power_of_two());
        let mut heads = Vec::new_in(alloc);
        heads
            .try_reserve_exact(count)
            .map_err(|_| CapacityExceededSnafu { requested: count }.build())?;
        heads.extend(iter::repeat(Link::END).take(count));
        Ok(Self { heads })
    }

    #[inline]
    pub(crate) fn count(&self) -> usize {
        self.heads.len()
    }

    #[inline]
    pub(crate) fn heads(&self) -> &[Link] {
        &self.heads
    }

    #[inline]
    pub(crate) fn heads_mut(&mut self) -> &mut [Link] {
        &mut self.heads
    }

    pub(crate) fn allocator(&self) -> &A {
        self.heads.allocator()
    }

    /// Empty every bucket and resize the directory to `count` buckets,
    /// reusing the existing allocation when it is large enough.
    pub(crate) fn reset_to(&mut self, count: usize) {
        debug_assert!(count.is_power_of_two());
        self.heads.truncate(count);
        for head in self.heads.iter_mut() {
            *head = Link::END;
        }
        let missing = count - self.heads.len();
        self.heads.extend(iter::repeat(Link::END).take(missing));
    }
}
