//! Indexed min-heap for LRU eviction
//!
//! This module provides `EvictionHeap`, a binary min-heap keyed by last-use
//! time that also supports removing or re-prioritising an arbitrary element:
//! - `entries`: the array-backed heap (key, priority, insertion sequence)
//! - `positions`: key → current array index, kept in sync on every swap
//!
//! The minimum (index 0) is the least recently used key, i.e. the next
//! eviction candidate. Equal priorities are ordered by insertion sequence so
//! that equal-priority entries never trade places.
//!
//! All mutating operations are O(log n); lookups are O(1).

use rustc_hash::FxHashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
struct HeapEntry<K> {
    key: K,
    priority: u64,
    seq: u64,
}

impl<K> HeapEntry<K> {
    fn rank(&self) -> (u64, u64) {
        (self.priority, self.seq)
    }
}

/// Min-heap over keys with O(log n) arbitrary removal and re-prioritisation
#[derive(Debug, Clone)]
pub struct EvictionHeap<K> {
    entries: Vec<HeapEntry<K>>,
    positions: FxHashMap<K, usize>,
    next_seq: u64,
}

impl<K: Eq + Hash + Clone> Default for EvictionHeap<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> EvictionHeap<K> {
    /// Create an empty heap
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: FxHashMap::default(),
            next_seq: 0,
        }
    }

    /// Number of keys in the heap
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the heap is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if `key` is in the heap
    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    /// Current priority of `key`
    pub fn priority_of(&self, key: &K) -> Option<u64> {
        self.positions.get(key).map(|&pos| self.entries[pos].priority)
    }

    /// The least recently used key, without removing it
    pub fn peek_min(&self) -> Option<&K> {
        self.entries.first().map(|entry| &entry.key)
    }

    /// Insert `key` with `priority`
    ///
    /// Returns `false` if the key was already present; its priority is then
    /// updated in place instead, so a key never appears twice.
    pub fn insert(&mut self, key: K, priority: u64) -> bool {
        if self.contains(&key) {
            self.touch(&key, priority);
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        let pos = self.entries.len();
        self.positions.insert(key.clone(), pos);
        self.entries.push(HeapEntry { key, priority, seq });
        self.sift_up(pos);
        true
    }

    /// Remove and return the least recently used key
    pub fn extract_min(&mut self) -> Option<K> {
        self.remove_at(0).map(|entry| entry.key)
    }

    /// Remove `key` wherever it sits in the heap
    ///
    /// Returns `None` if the key is not present.
    pub fn remove(&mut self, key: &K) -> Option<K> {
        let pos = *self.positions.get(key)?;
        self.remove_at(pos).map(|entry| entry.key)
    }

    /// Change the priority of `key` and restore heap order
    ///
    /// Returns `false` if the key is not present.
    pub fn touch(&mut self, key: &K, priority: u64) -> bool {
        let Some(&pos) = self.positions.get(key) else {
            return false;
        };
        let old = self.entries[pos].priority;
        self.entries[pos].priority = priority;
        if priority < old {
            self.sift_up(pos);
        } else if priority > old {
            self.sift_down(pos);
        }
        true
    }

    /// Keys in array order (heap order, not sorted order)
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|entry| &entry.key)
    }

    /// Remove every key
    pub fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
    }

    fn remove_at(&mut self, pos: usize) -> Option<HeapEntry<K>> {
        let last = self.entries.len().checked_sub(1)?;
        self.swap(pos, last);
        let entry = self.entries.pop()?;
        self.positions.remove(&entry.key);
        if pos < self.entries.len() {
            // The element moved into `pos` may belong above or below it.
            self.sift_up(pos);
            self.sift_down(pos);
        }
        Some(entry)
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.entries[pos].rank() >= self.entries[parent].rank() {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;
            if left < len && self.entries[left].rank() < self.entries[smallest].rank() {
                smallest = left;
            }
            if right < len && self.entries[right].rank() < self.entries[smallest].rank() {
                smallest = right;
            }
            if smallest == pos {
                break;
            }
            self.swap(pos, smallest);
            pos = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.entries.swap(a, b);
        self.positions.insert(self.entries[a].key.clone(), a);
        self.positions.insert(self.entries[b].key.clone(), b);
    }
}
