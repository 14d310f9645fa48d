//! Byte trie for keyword and metadata search
//!
//! Nodes live in an arena (`Vec<TrieNode>`, root at index 0) and address
//! their children by index. Each node keeps only the edges that exist, as a
//! sorted `SmallVec<[(u8, usize); 4]>`, instead of a fixed 256-slot table.
//!
//! Every node holds a set of values. Deleting values never frees nodes: an
//! emptied node stays in the arena as a shell and is reused by later puts.
//!
//! The trie exposes forward operations only. Reverting a mutation is the
//! caller's job (the store records inverse commands in its undo log).

use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::BTreeSet;

const ROOT: usize = 0;

#[derive(Debug, Clone)]
struct TrieNode<V> {
    values: BTreeSet<V>,
    // Sorted by label; binary searched.
    children: SmallVec<[(u8, usize); 4]>,
}

impl<V> TrieNode<V> {
    fn new() -> Self {
        TrieNode {
            values: BTreeSet::new(),
            children: SmallVec::new(),
        }
    }

    fn child(&self, label: u8) -> Option<usize> {
        self.children
            .binary_search_by_key(&label, |(l, _)| *l)
            .ok()
            .map(|i| self.children[i].1)
    }
}

/// Arena-backed trie mapping byte strings to sets of values
#[derive(Debug, Clone)]
pub struct Trie<V> {
    nodes: Vec<TrieNode<V>>,
}

impl<V: Ord + Clone> Default for Trie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Ord + Clone> Trie<V> {
    /// Create an empty trie (root node only)
    pub fn new() -> Self {
        Trie {
            nodes: vec![TrieNode::new()],
        }
    }

    /// Number of allocated nodes, including empty shells
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of (key, value) associations
    pub fn value_count(&self) -> usize {
        self.nodes.iter().map(|node| node.values.len()).sum()
    }

    /// Add `value` under `key`, creating intermediate nodes as needed
    ///
    /// Returns `false` if the value was already stored under this key.
    pub fn put(&mut self, key: &str, value: V) -> bool {
        let idx = self.locate_or_create(key);
        self.nodes[idx].values.insert(value)
    }

    /// Values stored under exactly `key`
    pub fn get(&self, key: &str) -> BTreeSet<V> {
        self.locate(key)
            .map(|idx| self.nodes[idx].values.clone())
            .unwrap_or_default()
    }

    /// Check if `value` is stored under exactly `key`
    pub fn contains(&self, key: &str, value: &V) -> bool {
        self.locate(key)
            .map_or(false, |idx| self.nodes[idx].values.contains(value))
    }

    /// Values stored under exactly `key`, sorted in DESCENDING comparator order
    ///
    /// Used for relevance ranking: the value the comparator ranks highest
    /// comes first. Ties keep the set's natural order.
    pub fn get_sorted<F>(&self, key: &str, mut compare: F) -> Vec<V>
    where
        F: FnMut(&V, &V) -> Ordering,
    {
        let mut values: Vec<V> = self.get(key).into_iter().collect();
        values.sort_by(|a, b| compare(b, a));
        values
    }

    /// Values under `prefix` and all its descendants, deduplicated
    pub fn get_all_with_prefix(&self, prefix: &str) -> BTreeSet<V> {
        let mut collected = BTreeSet::new();
        if let Some(start) = self.locate(prefix) {
            for idx in self.subtree(start) {
                collected.extend(self.nodes[idx].values.iter().cloned());
            }
        }
        collected
    }

    /// Values under `prefix` and all its descendants, deduplicated and
    /// sorted in ASCENDING comparator order
    pub fn get_all_with_prefix_sorted<F>(&self, prefix: &str, mut compare: F) -> Vec<V>
    where
        F: FnMut(&V, &V) -> Ordering,
    {
        let collected = self.get_all_with_prefix(prefix);
        let mut values: Vec<V> = collected.into_iter().collect();
        values.sort_by(|a, b| compare(a, b));
        values
    }

    /// Remove `value` from the set stored under exactly `key`
    ///
    /// Returns the removed value, or `None` if it was not there.
    pub fn delete(&mut self, key: &str, value: &V) -> Option<V> {
        let idx = self.locate(key)?;
        self.nodes[idx].values.take(value)
    }

    /// Clear the set stored under exactly `key`, returning what was removed
    pub fn delete_all(&mut self, key: &str) -> BTreeSet<V> {
        match self.locate(key) {
            Some(idx) => std::mem::take(&mut self.nodes[idx].values),
            None => BTreeSet::new(),
        }
    }

    /// Clear every set under `prefix` and its descendants, returning the
    /// union of what was removed. Node shells stay allocated.
    pub fn delete_all_with_prefix(&mut self, prefix: &str) -> BTreeSet<V> {
        let mut removed = BTreeSet::new();
        let Some(start) = self.locate(prefix) else {
            return removed;
        };
        for idx in self.subtree(start) {
            removed.append(&mut self.nodes[idx].values);
        }
        removed
    }

    /// Remove `value` from every set it appears in, wherever it is stored
    ///
    /// Walks the whole arena; for callers that no longer know which keys
    /// the value was stored under. Returns the number of sets it was removed
    /// from.
    pub fn delete_value(&mut self, value: &V) -> usize {
        let mut removed = 0;
        for node in &mut self.nodes {
            if node.values.remove(value) {
                removed += 1;
            }
        }
        removed
    }

    fn locate(&self, key: &str) -> Option<usize> {
        let mut idx = ROOT;
        for &byte in key.as_bytes() {
            idx = self.nodes[idx].child(byte)?;
        }
        Some(idx)
    }

    fn locate_or_create(&mut self, key: &str) -> usize {
        let mut idx = ROOT;
        for &byte in key.as_bytes() {
            idx = match self.nodes[idx]
                .children
                .binary_search_by_key(&byte, |(l, _)| *l)
            {
                Ok(i) => self.nodes[idx].children[i].1,
                Err(i) => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode::new());
                    self.nodes[idx].children.insert(i, (byte, child));
                    child
                }
            };
        }
        idx
    }

    /// Indices of `start` and every node below it, depth first
    fn subtree(&self, start: usize) -> Vec<usize> {
        let mut order = Vec::new();
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            order.push(idx);
            stack.extend(self.nodes[idx].children.iter().rev().map(|(_, child)| *child));
        }
        order
    }
}
