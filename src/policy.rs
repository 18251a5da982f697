//! Hash/equality policy: the hash builder and key predicate a map is built with.
//!
//! Lookups come in two modes:
//! - homogeneous: the argument is a `&K`, hashed by `S` and compared with `E`;
//! - transparent: the argument is any `Q: Hash + Equivalent<K>`. These
//!   methods exist only when the hash builder carries the [`TransparentHash`]
//!   marker and the key predicate is [`DefaultKeyEqual`], so a map whose
//!   hasher or predicate never agreed to foreign key forms cannot be
//!   queried with one.

use core::fmt;
use core::hash::{BuildHasher, Hash};
use std::collections::hash_map::RandomState;

/// Equality predicate over stored keys.
pub trait KeyEqual<K: ?Sized> {
    fn key_eq(&self, a: &K, b: &K) -> bool;
}

/// `KeyEqual` backed by the key's own `Eq`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DefaultKeyEqual;

impl<K: ?Sized + Eq> KeyEqual<K> for DefaultKeyEqual {
    #[inline]
    fn key_eq(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// Marker for hash builders that promise to hash every `Q: Equivalent<K>`
/// exactly as they hash the `K` it is equivalent to.
///
/// Implementing this enables the `*_equiv` lookups on `DenseHashMap`, for
/// maps using [`DefaultKeyEqual`] only. Those lookups compare through
/// `Equivalent`, which is expected to agree with `K: Eq`; a custom
/// [`KeyEqual`] carries no such link, so its maps offer no `*_equiv` methods:
///
/// ```compile_fail
/// use dense_hashmap::{DenseHashMap, KeyEqual, Transparent};
///
/// #[derive(Default)]
/// struct CaseInsensitive;
/// impl KeyEqual<String> for CaseInsensitive {
///     fn key_eq(&self, a: &String, b: &String) -> bool {
///         a.eq_ignore_ascii_case(b)
///     }
/// }
///
/// let m: DenseHashMap<String, i32, Transparent, CaseInsensitive> = DenseHashMap::default();
/// m.find_equiv("bob");
/// ```
pub trait TransparentHash: BuildHasher {}

/// Adapter that opts a hash builder into transparent lookup.
///
/// ```
/// use dense_hashmap::{DenseHashMap, Transparent};
///
/// let mut m: DenseHashMap<String, i32, Transparent> = DenseHashMap::default();
/// m.insert("bob".to_string(), 42);
/// assert_eq!(m.get_equiv("bob"), Some(&42));
/// ```
#[derive(Copy, Clone, Default)]
pub struct Transparent<S = RandomState>(pub S);

impl<S> Transparent<S> {
    pub fn into_inner(self) -> S {
        self.0
    }
}

impl<S> fmt::Debug for Transparent<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transparent")
    }
}

impl<S: BuildHasher> BuildHasher for Transparent<S> {
    type Hasher = S::Hasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        self.0.build_hasher()
    }
}

impl<S: BuildHasher> TransparentHash for Transparent<S> {}

/// The hash builder and key predicate of one map. Holds no table state.
#[derive(Clone, Debug, Default)]
pub(crate) struct HashPolicy<S, E> {
    hasher: S,
    key_eq: E,
}

impl<S, E> HashPolicy<S, E> {
    pub(crate) fn new(hasher: S, key_eq: E) -> Self {
        Self { hasher, key_eq }
    }

    pub(crate) fn hasher(&self) -> &S {
        &self.hasher
    }

    pub(crate) fn key_eq_fn(&self) -> &E {
        &self.key_eq
    }
}

impl<S: BuildHasher, E> HashPolicy<S, E> {
    #[inline]
    pub(crate) fn hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    #[inline]
    pub(crate) fn key_eq<K: ?Sized>(&self, a: &K, b: &K) -> bool
    where
        E: KeyEqual<K>,
    {
        self.key_eq.key_eq(a, b)
    }
}

/// `hash mod bucket_count`; `bucket_count` is always a power of two.
#[inline]
pub(crate) fn bucket_for(hash: u64, bucket_count: usize) -> usize {
    debug_assert!(bucket_count.is_power_of_two());
    (hash as usize) & (bucket_count - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::hash::Hasher;

    #[test]
    fn default_key_equal_uses_eq() {
        let eq = DefaultKeyEqual;
        assert!(KeyEqual::<str>::key_eq(&eq, "a", "a"));
        assert!(!KeyEqual::<str>::key_eq(&eq, "a", "b"));
    }

    #[test]
    fn transparent_hashes_like_inner_builder() {
        let inner = RandomState::new();
        let t = Transparent(inner.clone());
        assert_eq!(t.hash_one("bob"), inner.hash_one("bob"));
        // String and str hash identically under the same builder.
        assert_eq!(t.hash_one("bob"), t.hash_one(&"bob".to_string()));
    }

    #[test]
    fn bucket_for_masks_low_bits() {
        assert_eq!(bucket_for(0, 8), 0);
        assert_eq!(bucket_for(9, 8), 1);
        assert_eq!(bucket_for(u64::MAX, 1), 0);
        assert_eq!(bucket_for(1023, 1024), 1023);
    }

    #[test]
    fn policy_routes_hash_and_equality() {
        #[derive(Clone, Default)]
        struct CaseInsensitive;
        impl KeyEqual<String> for CaseInsensitive {
            fn key_eq(&self, a: &String, b: &String) -> bool {
                a.eq_ignore_ascii_case(b)
            }
        }

        #[derive(Clone, Default)]
        struct LenHasher(u64);
        impl Hasher for LenHasher {
            fn write(&mut self, bytes: &[u8]) {
                self.0 += bytes.len() as u64;
            }
            fn finish(&self) -> u64 {
                self.0
            }
        }
        #[derive(Clone, Default)]
        struct LenBuild;
        impl BuildHasher for LenBuild {
            type Hasher = LenHasher;
            fn build_hasher(&self) -> LenHasher {
                LenHasher::default()
            }
        }

        let p = HashPolicy::new(LenBuild, CaseInsensitive);
        assert_eq!(p.hash(&"abc".to_string()), p.hash(&"XYZ".to_string()));
        assert!(p.key_eq(&"Bob".to_string(), &"bOB".to_string()));
    }
}
