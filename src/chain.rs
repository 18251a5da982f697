//! Chain maintenance over the bucket directory and the dense entry store.
//!
//! Each bucket head starts a singly linked chain of store indices; a node's
//! `next` continues it. Invariants kept by every function here:
//! - every node index appears in exactly one chain, the one selected by its
//!   stored hash;
//! - new nodes are prepended, so the most recent insertion is probed first;
//! - no link ever refers to an index `>= nodes.len()` once a function returns.

use crate::node::{Link, Node};
use crate::policy::bucket_for;

/// Outcome of walking one chain.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Probe {
    /// Index of the matching node, if any.
    pub(crate) found: Option<usize>,
    /// Chain predecessor of `found`; `None` when it is the bucket head (or
    /// nothing matched).
    pub(crate) predecessor: Option<usize>,
}

/// Walk `bucket`'s chain until `is_match(index, node)` holds.
#[inline]
pub(crate) fn probe<K, V, F>(heads: &[Link], nodes: &[Node<K, V>], bucket: usize, mut is_match: F) -> Probe
where
    F: FnMut(usize, &Node<K, V>) -> bool,
{
    let mut predecessor = None;
    let mut cursor = heads[bucket];
    while let Some(index) = cursor.get() {
        let node = &nodes[index];
        if is_match(index, node) {
            return Probe {
                found: Some(index),
                predecessor,
            };
        }
        predecessor = Some(index);
        cursor = node.next;
    }
    Probe {
        found: None,
        predecessor: None,
    }
}

/// Make `index` the head of `bucket`, in front of the previous head.
#[inline]
pub(crate) fn insert_at_head<K, V>(heads: &mut [Link], nodes: &mut [Node<K, V>], bucket: usize, index: usize) {
    nodes[index].next = heads[bucket];
    heads[bucket] = Link::to(index);
}

/// Remove `removed` from `bucket`'s chain. `predecessor` comes from `probe`.
pub(crate) fn unlink<K, V>(
    heads: &mut [Link],
    nodes: &mut [Node<K, V>],
    bucket: usize,
    removed: usize,
    predecessor: Option<usize>,
) {
    let next = nodes[removed].next;
    match predecessor {
        None => {
            debug_assert_eq!(heads[bucket], Link::to(removed));
            heads[bucket] = next;
        }
        Some(p) => {
            debug_assert_eq!(nodes[p].next, Link::to(removed));
            nodes[p].next = next;
        }
    }
    nodes[removed].next = Link::END;
}

/// Repair the single link that still refers to `old_index` after the node
/// that lived there was moved to `new_index`.
///
/// `nodes[new_index]` must already hold the relocated node and `old_index`
/// must no longer be a valid store index. The walk stops on the link equal
/// to `old_index`, so it never dereferences the stale slot.
pub(crate) fn relink_after_relocation<K, V>(
    heads: &mut [Link],
    nodes: &mut [Node<K, V>],
    old_index: usize,
    new_index: usize,
) {
    let bucket = bucket_for(nodes[new_index].hash, heads.len());
    let stale = Link::to(old_index);
    if heads[bucket] == stale {
        heads[bucket] = Link::to(new_index);
        return;
    }
    let mut cursor = heads[bucket];
    while let Some(index) = cursor.get() {
        if nodes[index].next == stale {
            nodes[index].next = Link::to(new_index);
            return;
        }
        cursor = nodes[index].next;
    }
    unreachable!("relocated node {old_index} is missing from bucket {bucket}");
}

/// Relink every node into a freshly emptied directory, in store order.
pub(crate) fn rebuild<K, V>(heads: &mut [Link], nodes: &mut [Node<K, V>]) {
    debug_assert!(heads.iter().all(|h| h.is_end()));
    let count = heads.len();
    for index in 0..nodes.len() {
        let bucket = bucket_for(nodes[index].hash, count);
        insert_at_head(heads, nodes, bucket, index);
    }
}

/// Store indices of `bucket`'s chain, head first.
#[cfg(test)]
pub(crate) fn chain_of<K, V>(heads: &[Link], nodes: &[Node<K, V>], bucket: usize) -> std::vec::Vec<usize> {
    let mut out = std::vec::Vec::new();
    let mut cursor = heads[bucket];
    while let Some(index) = cursor.get() {
        out.push(index);
        cursor = nodes[index].next;
    }
    out
}
