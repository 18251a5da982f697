//! Iterators over a `DenseHashMap`.
//!
//! Map-wide iterators walk the entry store in dense order; bucket iterators
//! walk a single chain, most recently inserted first.

use crate::node::{Link, Node};
use allocator_api2::alloc::{Allocator, Global};
use allocator_api2::vec;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ptr::NonNull;
use core::slice;

/// Immutable dense-order iterator, yielding `(&K, &V)`.
pub struct Iter<'a, K, V> {
    pub(crate) inner: slice::Iter<'a, Node<K, V>>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Node::refs)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(Node::refs)
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Mutable dense-order iterator, yielding `(&K, &mut V)`. Keys stay immutable.
pub struct IterMut<'a, K, V> {
    pub(crate) inner: slice::IterMut<'a, Node<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Node::ref_mut)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(Node::ref_mut)
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Dense-order iterator over keys.
pub struct Keys<'a, K, V> {
    pub(crate) inner: slice::Iter<'a, Node<K, V>>,
}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Keys {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|n| &n.key)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// Dense-order iterator over values.
pub struct Values<'a, K, V> {
    pub(crate) inner: slice::Iter<'a, Node<K, V>>,
}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Values {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|n| &n.value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// Dense-order iterator over mutable values.
pub struct ValuesMut<'a, K, V> {
    pub(crate) inner: slice::IterMut<'a, Node<K, V>>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|n| &mut n.value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}

/// Owning dense-order iterator.
pub struct IntoIter<K, V, A: Allocator = Global> {
    pub(crate) inner: vec::IntoIter<Node<K, V>, A>,
}

impl<K, V, A: Allocator> Iterator for IntoIter<K, V, A> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Node::key_value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, A: Allocator> DoubleEndedIterator for IntoIter<K, V, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(Node::key_value)
    }
}

impl<K, V, A: Allocator> ExactSizeIterator for IntoIter<K, V, A> {}
impl<K, V, A: Allocator> FusedIterator for IntoIter<K, V, A> {}

/// Owning iterator over keys.
pub struct IntoKeys<K, V, A: Allocator = Global> {
    pub(crate) inner: vec::IntoIter<Node<K, V>, A>,
}

impl<K, V, A: Allocator> Iterator for IntoKeys<K, V, A> {
    type Item = K;

    #[inline]
    fn next(&mut self) -> Option<K> {
        self.inner.next().map(|n| n.key)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, A: Allocator> ExactSizeIterator for IntoKeys<K, V, A> {}
impl<K, V, A: Allocator> FusedIterator for IntoKeys<K, V, A> {}

/// Owning iterator over values.
pub struct IntoValues<K, V, A: Allocator = Global> {
    pub(crate) inner: vec::IntoIter<Node<K, V>, A>,
}

impl<K, V, A: Allocator> Iterator for IntoValues<K, V, A> {
    type Item = V;

    #[inline]
    fn next(&mut self) -> Option<V> {
        self.inner.next().map(|n| n.value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, A: Allocator> ExactSizeIterator for IntoValues<K, V, A> {}
impl<K, V, A: Allocator> FusedIterator for IntoValues<K, V, A> {}

/// Draining iterator returned by `DenseHashMap::drain`. The bucket
/// directory is already empty when this is handed out.
pub struct Drain<'a, K, V, A: Allocator = Global> {
    pub(crate) inner: vec::Drain<'a, Node<K, V>, A>,
}

impl<K, V, A: Allocator> Iterator for Drain<'_, K, V, A> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Node::key_value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, A: Allocator> ExactSizeIterator for Drain<'_, K, V, A> {}
impl<K, V, A: Allocator> FusedIterator for Drain<'_, K, V, A> {}

/// Iterator over a single bucket's chain, yielding `(&K, &V)`.
pub struct BucketIter<'a, K, V> {
    pub(crate) nodes: &'a [Node<K, V>],
    pub(crate) cursor: Link,
}

impl<K, V> Clone for BucketIter<'_, K, V> {
    fn clone(&self) -> Self {
        BucketIter {
            nodes: self.nodes,
            cursor: self.cursor,
        }
    }
}

impl<'a, K, V> Iterator for BucketIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let node = &self.nodes[self.cursor.get()?];
        self.cursor = node.next;
        Some(node.refs())
    }
}

impl<K, V> FusedIterator for BucketIter<'_, K, V> {}

/// Iterator over a single bucket's chain, yielding `(&K, &mut V)`.
pub struct BucketIterMut<'a, K, V> {
    nodes: NonNull<Node<K, V>>,
    len: usize,
    cursor: Link,
    _pd: PhantomData<&'a mut [Node<K, V>]>,
}

impl<'a, K, V> BucketIterMut<'a, K, V> {
    pub(crate) fn new(nodes: &'a mut [Node<K, V>], head: Link) -> Self {
        Self {
            len: nodes.len(),
            nodes: NonNull::from(nodes).cast(),
            cursor: head,
            _pd: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for BucketIterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor.get()?;
        debug_assert!(index < self.len, "chain link {index} out of bounds");
        // SAFETY: every link in a chain names a live node, so `index` is in
        // bounds of the slice borrowed for 'a. A chain visits every index at
        // most once, so no node is handed out twice and the returned borrows
        // never alias.
        let node = unsafe { &mut *self.nodes.as_ptr().add(index) };
        self.cursor = node.next;
        Some(node.ref_mut())
    }
}

impl<K, V> FusedIterator for BucketIterMut<'_, K, V> {}

// SAFETY: behaves like `&'a mut [Node<K, V>]`.
unsafe impl<K: Send, V: Send> Send for BucketIterMut<'_, K, V> {}
// SAFETY: behaves like `&'a mut [Node<K, V>]`.
unsafe impl<K: Sync, V: Sync> Sync for BucketIterMut<'_, K, V> {}
