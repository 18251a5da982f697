//! Growth controller: bucket-count arithmetic and the max load factor.

use crate::error::{CapacityExceededSnafu, Error, InvalidMaxLoadFactorSnafu};
use crate::node::Link;
use snafu::{ensure, OptionExt};

pub(crate) const DEFAULT_BUCKET_COUNT: usize = 8;
pub(crate) const DEFAULT_MAX_LOAD_FACTOR: f32 = 0.875;

/// Largest bucket count whose directory fits in an allocation.
pub(crate) const fn max_bucket_count() -> usize {
    let max = isize::MAX as usize / core::mem::size_of::<Link>();
    1 << (usize::BITS - 1 - max.leading_zeros())
}

/// Smallest power of two `>= n` (and `>= 1`), if representable.
pub(crate) fn bucket_count_for_hint(n: usize) -> Option<usize> {
    let count = n.max(1).checked_next_power_of_two()?;
    (count <= max_bucket_count()).then_some(count)
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct GrowthPolicy {
    max_load_factor: f32,
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self {
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
        }
    }
}

impl GrowthPolicy {
    pub(crate) fn new(max_load_factor: f32) -> Result<Self, Error> {
        ensure!(
            max_load_factor.is_finite() && max_load_factor > 0.0,
            InvalidMaxLoadFactorSnafu {
                value: max_load_factor
            }
        );
        Ok(Self { max_load_factor })
    }

    #[inline]
    pub(crate) fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    /// Whether `len` entries over `bucket_count` buckets break the bound.
    #[inline]
    pub(crate) fn exceeded(&self, len: usize, bucket_count: usize) -> bool {
        len as f64 / bucket_count as f64 > self.max_load_factor as f64
    }

    /// Smallest power of two `b` such that `target_len / b <= max_load_factor`.
    pub(crate) fn required_bucket_count(&self, target_len: usize) -> Result<usize, Error> {
        let min = (target_len as f64 / self.max_load_factor as f64).ceil();
        ensure!(
            min <= max_bucket_count() as f64,
            CapacityExceededSnafu {
                requested: target_len
            }
        );
        let mut count = bucket_count_for_hint(min as usize).context(CapacityExceededSnafu {
            requested: target_len,
        })?;
        // Guards against the division above rounding down at the boundary.
        while self.exceeded(target_len, count) {
            count = count
                .checked_mul(2)
                .filter(|&c| c <= max_bucket_count())
                .context(CapacityExceededSnafu {
                    requested: target_len,
                })?;
        }
        Ok(count)
    }

    /// Bucket count `rehash(requested)` settles on for a map of `len` entries.
    pub(crate) fn rehash_target(&self, requested: usize, len: usize) -> Result<usize, Error> {
        let required = self.required_bucket_count(len)?;
        bucket_count_for_hint(requested.max(required))
            .context(CapacityExceededSnafu { requested })
    }

    /// Bucket count `reserve(n)` asks `rehash` for: `ceil(n / max_load_factor)`.
    pub(crate) fn reserve_request(&self, n: usize) -> Result<usize, Error> {
        let wanted = (n as f64 / self.max_load_factor as f64).ceil();
        ensure!(
            wanted <= max_bucket_count() as f64,
            CapacityExceededSnafu { requested: n }
        );
        Ok(wanted as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_bucket_count_is_power_of_two() {
        assert!(max_bucket_count().is_power_of_two());
        assert!(max_bucket_count().checked_mul(core::mem::size_of::<Link>()).is_some());
    }

    #[test]
    fn hint_rounds_up_to_power_of_two() {
        assert_eq!(bucket_count_for_hint(0), Some(1));
        assert_eq!(bucket_count_for_hint(1), Some(1));
        assert_eq!(bucket_count_for_hint(5), Some(8));
        assert_eq!(bucket_count_for_hint(1000), Some(1024));
        assert_eq!(bucket_count_for_hint(usize::MAX), None);
    }

    #[test]
    fn rejects_non_positive_or_non_finite_factors() {
        for bad in [0.0f32, -0.5, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                GrowthPolicy::new(bad),
                Err(Error::InvalidMaxLoadFactor { .. })
            ));
        }
        assert_eq!(GrowthPolicy::new(0.2).unwrap().max_load_factor(), 0.2);
    }

    #[test]
    fn required_bucket_count_respects_factor() {
        let g = GrowthPolicy::default();
        assert_eq!(g.required_bucket_count(0).unwrap(), 1);
        assert_eq!(g.required_bucket_count(7).unwrap(), 8);
        assert_eq!(g.required_bucket_count(8).unwrap(), 16);
        assert_eq!(g.required_bucket_count(1000).unwrap(), 2048);

        let strict = GrowthPolicy::new(0.2).unwrap();
        assert_eq!(strict.required_bucket_count(2).unwrap(), 16);

        let loose = GrowthPolicy::new(4.0).unwrap();
        assert_eq!(loose.required_bucket_count(8).unwrap(), 2);
    }

    #[test]
    fn required_bucket_count_never_violates_bound() {
        for factor in [0.1f32, 0.3, 0.5, 0.875, 1.0, 1.7, 3.0] {
            let g = GrowthPolicy::new(factor).unwrap();
            for len in 0..300 {
                let b = g.required_bucket_count(len).unwrap();
                assert!(b.is_power_of_two());
                assert!(!g.exceeded(len, b), "len {len} factor {factor} -> {b}");
                if b > 1 {
                    assert!(g.exceeded(len, b / 2), "{b} is not the smallest");
                }
            }
        }
    }

    #[test]
    fn rehash_target_takes_max_of_request_and_requirement() {
        let g = GrowthPolicy::default();
        assert_eq!(g.rehash_target(1000, 2).unwrap(), 1024);
        assert_eq!(g.rehash_target(0, 2).unwrap(), 4);
        assert_eq!(g.rehash_target(3, 100).unwrap(), 128);
    }

    #[test]
    fn oversized_requests_report_capacity_exceeded() {
        let g = GrowthPolicy::default();
        assert!(matches!(
            g.rehash_target(usize::MAX, 0),
            Err(Error::CapacityExceeded { .. })
        ));
        assert!(matches!(
            g.required_bucket_count(usize::MAX),
            Err(Error::CapacityExceeded { .. })
        ));
        assert!(matches!(
            g.reserve_request(usize::MAX),
            Err(Error::CapacityExceeded { .. })
        ));
    }
}
