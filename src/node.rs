//! Entry-store nodes and the links threading them into chains.

use core::fmt;

/// Dense-store index of the next node in a chain, or `END`.
///
/// Links are indices, never addresses: nodes move when the store relocates
/// its tail on erase.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) struct Link(usize);

impl Link {
    pub(crate) const END: Link = Link(usize::MAX);

    #[inline(always)]
    pub(crate) fn to(index: usize) -> Self {
        debug_assert!(index != usize::MAX);
        Link(index)
    }

    #[inline(always)]
    pub(crate) fn get(self) -> Option<usize> {
        if self == Self::END {
            None
        } else {
            Some(self.0)
        }
    }

    #[inline(always)]
    pub(crate) fn is_end(self) -> bool {
        self == Self::END
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(i) => write!(f, "Link({})", i),
            None => f.write_str("Link(END)"),
        }
    }
}

/// One stored entry. `hash` is computed once, at insertion, and reused by
/// rehash and relocation so user `Hash` never runs on a half-updated table.
#[derive(Clone, Debug)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) hash: u64,
    pub(crate) next: Link,
}

impl<K, V> Node<K, V> {
    #[inline]
    pub(crate) fn new(key: K, value: V, hash: u64) -> Self {
        Self {
            key,
            value,
            hash,
            next: Link::END,
        }
    }

    // field accessors, used as `f` in `.map(f)`
    #[inline]
    pub(crate) fn refs(&self) -> (&K, &V) {
        (&self.key, &self.value)
    }

    #[inline]
    pub(crate) fn ref_mut(&mut self) -> (&K, &mut V) {
        (&self.key, &mut self.value)
    }

    #[inline]
    pub(crate) fn key_value(self) -> (K, V) {
        (self.key, self.value)
    }
}
