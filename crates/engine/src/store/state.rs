//! Lockstep state behind `DocumentStore`
//!
//! `StoreState` owns the paged index, the search trie, the eviction heap and
//! the residency counters, and is the only code that mutates them. Each
//! method moves a single key between residency states and updates all four
//! together:
//!
//! | Transition | Method |
//! |------------|--------|
//! | absent/spilled → resident (new content) | `admit` |
//! | spilled → resident (same content) | `fetch` |
//! | resident → spilled | `spill` / `enforce_limits` |
//! | resident/spilled → absent | `remove` |
//!
//! Persistence I/O always happens before any in-memory change, so an I/O
//! error leaves the state exactly as it was.
//!
//! Spilled documents keep their trie entries; a search hit on a spilled key
//! reloads it.
//!
//! The undo log lives outside this struct. Reverting a command calls these
//! same methods and never records new commands.

use super::config::StoreLimits;
use crate::undo::Revert;
use docstore_core::tokenizer::metadata_term;
use docstore_core::{Document, DocumentKey, StoreError, StoreResult};
use docstore_storage::{Displaced, EvictionHeap, PagedIndex, Persistence, Residency, Trie};
use tracing::{debug, warn};

/// Inverse of one single-document mutation
#[derive(Debug, Clone)]
pub enum Inverse {
    /// Undo a put: reinstate `previous`, or remove the key if there was none
    Put {
        /// The document the put replaced
        previous: Option<Document>,
    },
    /// Undo a delete: reinstate the deleted document
    Delete {
        /// The deleted document
        document: Document,
    },
    /// Undo a metadata write: restore one field
    Metadata {
        /// The field that was written
        field: String,
        /// Its value before the write (`None` = field was unset)
        previous: Option<String>,
    },
}

/// Index, trie, heap and accounting, mutated only together
#[derive(Debug)]
pub struct StoreState<P> {
    pub(crate) index: PagedIndex<P>,
    pub(crate) trie: Trie<DocumentKey>,
    pub(crate) heap: EvictionHeap<DocumentKey>,
    pub(crate) limits: StoreLimits,
    pub(crate) document_count: usize,
    pub(crate) document_bytes: usize,
    clock: u64,
}

impl<P: Persistence> StoreState<P> {
    pub(crate) fn new(persistence: P, limits: StoreLimits) -> Self {
        StoreState {
            index: PagedIndex::new(persistence),
            trie: Trie::new(),
            heap: EvictionHeap::new(),
            limits,
            document_count: 0,
            document_bytes: 0,
            clock: 0,
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Make `document` the resident document for its key, replacing and
    /// un-indexing whatever was there (resident or spilled).
    pub(crate) fn admit(&mut self, mut document: Document) -> StoreResult<Option<Displaced>> {
        let key = document.key().clone();
        let now = self.tick();
        document.set_last_use_time(now);
        let terms = document.index_terms();
        let size = document.size_in_bytes();

        let displaced = self.index.insert(document)?;
        if let Some(previous) = &displaced {
            self.forget(&previous.document, previous.was_resident);
        }
        for term in &terms {
            self.trie.put(term, key.clone());
        }
        self.heap.insert(key, now);
        self.document_count += 1;
        self.document_bytes += size;
        Ok(displaced)
    }

    /// Remove `key` from memory, disk, trie and heap
    pub(crate) fn remove(&mut self, key: &DocumentKey) -> StoreResult<Option<Displaced>> {
        let was_spilled = self.index.is_spilled(key);
        let displaced = self.index.remove(key)?;
        match &displaced {
            Some(previous) => self.forget(&previous.document, previous.was_resident),
            None if was_spilled => self.forget_lost(key),
            None => {}
        }
        Ok(displaced)
    }

    /// Ensure `key` is resident, reloading it from persistence if needed
    pub(crate) fn fetch(&mut self, key: &DocumentKey) -> StoreResult<Option<Residency>> {
        let was_spilled = self.index.is_spilled(key);
        let residency = self.index.load(key)?;
        if residency.is_none() && was_spilled {
            self.forget_lost(key);
        }
        if residency == Some(Residency::Reloaded) {
            let now = self.tick();
            if let Some(document) = self.index.resident_mut(key) {
                document.set_last_use_time(now);
                let terms = document.index_terms();
                let size = document.size_in_bytes();
                for term in &terms {
                    self.trie.put(term, key.clone());
                }
                self.heap.insert(key.clone(), now);
                self.document_count += 1;
                self.document_bytes += size;
            }
        }
        Ok(residency)
    }

    /// Record a use of resident `key`: new last-use time, re-heapified
    pub(crate) fn touch(&mut self, key: &DocumentKey) {
        let now = self.tick();
        if let Some(document) = self.index.resident_mut(key) {
            document.set_last_use_time(now);
            self.heap.touch(key, now);
        }
    }

    /// Write resident `key` to persistence and release its memory
    pub(crate) fn spill(&mut self, key: &DocumentKey) -> StoreResult<bool> {
        let spilled = match self.index.spill(key) {
            Ok(spilled) => spilled,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to spill document");
                return Err(e);
            }
        };
        self.heap.remove(key);
        match spilled {
            Some(document) => {
                self.document_count -= 1;
                self.document_bytes -= document.size_in_bytes();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Spill least recently used documents until both ceilings hold
    ///
    /// Returns the number of documents spilled.
    pub(crate) fn enforce_limits(&mut self) -> StoreResult<usize> {
        let mut spilled = 0;
        while self
            .limits
            .is_exceeded(self.document_count, self.document_bytes)
        {
            let Some(key) = self.heap.peek_min().cloned() else {
                break;
            };
            if self.spill(&key)? {
                spilled += 1;
                debug!(
                    key = %key,
                    document_count = self.document_count,
                    document_bytes = self.document_bytes,
                    "evicted least recently used document"
                );
            }
        }
        Ok(spilled)
    }

    /// Set or clear one metadata field on resident `key`, keeping the
    /// `field:value` trie term in step. Returns the previous value.
    pub(crate) fn write_metadata(
        &mut self,
        key: &DocumentKey,
        field: &str,
        value: Option<String>,
    ) -> StoreResult<Option<String>> {
        let document = self
            .index
            .resident_mut(key)
            .ok_or_else(|| StoreError::not_found(key.as_str()))?;
        let new_term = value.as_deref().map(|v| metadata_term(field, v));
        let previous = match value {
            Some(value) => document.set_metadata_value(field, value),
            None => document.remove_metadata_value(field),
        };
        if let Some(old) = &previous {
            let old_term = metadata_term(field, old);
            // Fields differing only in case share a term.
            let still_used = document
                .metadata()
                .iter()
                .any(|(f, v)| metadata_term(f, v) == old_term);
            if !still_used {
                self.trie.delete(&old_term, key);
            }
        }
        if let Some(term) = new_term {
            self.trie.put(&term, key.clone());
        }
        Ok(previous)
    }

    /// Drop `document`'s trie entries and, if it was resident, its heap
    /// entry and accounting
    fn forget(&mut self, document: &Document, was_resident: bool) {
        let key = document.key();
        for term in document.index_terms() {
            self.trie.delete(&term, key);
        }
        if was_resident {
            self.heap.remove(key);
            self.document_count -= 1;
            self.document_bytes -= document.size_in_bytes();
        }
    }

    /// Drop the trie entries of a spilled key whose disk copy is gone. Its
    /// terms are unknown without the document, so every node is searched.
    fn forget_lost(&mut self, key: &DocumentKey) {
        let terms = self.trie.delete_value(key);
        debug!(key = %key, terms, "dropped index entries of lost document");
    }

    /// Lockstep violations, empty when consistent
    pub(crate) fn consistency_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let mut count = 0;
        let mut bytes = 0;
        for key in self.index.resident_keys() {
            let Some(document) = self.index.resident(key) else {
                continue;
            };
            count += 1;
            bytes += document.size_in_bytes();
            match self.heap.priority_of(key) {
                Some(priority) if priority == document.last_use_time() => {}
                Some(priority) => violations.push(format!(
                    "{}: heap priority {} but last use {}",
                    key,
                    priority,
                    document.last_use_time()
                )),
                None => violations.push(format!("{}: resident but not in heap", key)),
            }
            for term in document.index_terms() {
                if !self.trie.contains(&term, key) {
                    violations.push(format!("{}: term '{}' missing from trie", key, term));
                }
            }
        }
        for key in self.trie.get_all_with_prefix("") {
            if !self.index.contains_key(&key) {
                violations.push(format!("{}: in trie but not indexed", key));
            }
        }
        for key in self.heap.keys() {
            if !self.index.is_resident(key) {
                violations.push(format!("{}: in heap but not resident", key));
            }
        }
        if count != self.document_count {
            violations.push(format!(
                "document count {} but {} resident",
                self.document_count, count
            ));
        }
        if bytes != self.document_bytes {
            violations.push(format!(
                "document bytes {} but {} resident",
                self.document_bytes, bytes
            ));
        }
        violations
    }
}

impl<P: Persistence> Revert<DocumentKey, StoreState<P>> for Inverse {
    fn revert(&self, key: &DocumentKey, state: &mut StoreState<P>) -> StoreResult<()> {
        match self {
            Inverse::Put {
                previous: Some(document),
            }
            | Inverse::Delete { document } => {
                state.admit(document.clone())?;
            }
            Inverse::Put { previous: None } => {
                state.remove(key)?;
            }
            Inverse::Metadata { field, previous } => {
                if state.fetch(key)?.is_none() {
                    return Err(StoreError::not_found(key.as_str()));
                }
                state.write_metadata(key, field, previous.clone())?;
                state.touch(key);
            }
        }
        Ok(())
    }
}
