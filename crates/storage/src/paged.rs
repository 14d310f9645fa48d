//! Paged key-value index
//!
//! `PagedIndex` maps document keys to slots that are either resident (the
//! document is in memory) or spilled (the only copy lives in persistence).
//! A key missing from the map may still have a copy in persistence, left by
//! an earlier session; lookups fall through to persistence for those too.
//!
//! # Single authoritative copy
//!
//! A key's document is resident xor on disk, never both:
//! - `spill` writes the document out, then marks the slot spilled
//! - `load` reads it back, deletes the disk copy, then marks it resident
//! - `insert` and `remove` delete any disk copy of the key they replace
//!
//! Every persistence call happens before the map is touched, so a failed
//! call leaves the index exactly as it was.

use crate::persistence::Persistence;
use docstore_core::{Document, DocumentKey, StoreResult};
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[derive(Debug)]
enum Slot {
    Resident(Document),
    Spilled,
}

/// How `load` found a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residency {
    /// It was already in memory
    Resident,
    /// It was read back from persistence and is now in memory
    Reloaded,
}

/// A document displaced by `insert` or `remove`
#[derive(Debug, Clone)]
pub struct Displaced {
    /// The displaced document
    pub document: Document,
    /// Whether it was in memory (and so counted against the limits)
    pub was_resident: bool,
}

/// Key → document map that pages values through a `Persistence`
#[derive(Debug)]
pub struct PagedIndex<P> {
    slots: BTreeMap<DocumentKey, Slot>,
    persistence: P,
}

impl<P: Persistence> PagedIndex<P> {
    /// Create an empty index over `persistence`
    pub fn new(persistence: P) -> Self {
        PagedIndex {
            slots: BTreeMap::new(),
            persistence,
        }
    }

    /// The persistence collaborator
    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Number of known keys, resident or spilled
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if no key is known
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All known keys, sorted
    pub fn keys(&self) -> impl Iterator<Item = &DocumentKey> {
        self.slots.keys()
    }

    /// Keys whose documents are in memory, sorted
    pub fn resident_keys(&self) -> impl Iterator<Item = &DocumentKey> {
        self.slots
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Resident(_)))
            .map(|(key, _)| key)
    }

    /// Check if `key` is known (resident or spilled)
    pub fn contains_key(&self, key: &DocumentKey) -> bool {
        self.slots.contains_key(key)
    }

    /// Check if `key` is in memory
    pub fn is_resident(&self, key: &DocumentKey) -> bool {
        matches!(self.slots.get(key), Some(Slot::Resident(_)))
    }

    /// Check if `key` is known and spilled
    pub fn is_spilled(&self, key: &DocumentKey) -> bool {
        matches!(self.slots.get(key), Some(Slot::Spilled))
    }

    /// The in-memory document for `key`, without touching persistence
    pub fn resident(&self, key: &DocumentKey) -> Option<&Document> {
        match self.slots.get(key) {
            Some(Slot::Resident(doc)) => Some(doc),
            _ => None,
        }
    }

    /// Mutable access to the in-memory document for `key`
    pub fn resident_mut(&mut self, key: &DocumentKey) -> Option<&mut Document> {
        match self.slots.get_mut(key) {
            Some(Slot::Resident(doc)) => Some(doc),
            _ => None,
        }
    }

    /// Get the document for `key`, reading it back from persistence if needed
    pub fn get(&mut self, key: &DocumentKey) -> StoreResult<Option<&Document>> {
        match self.load(key)? {
            Some(_) => Ok(self.resident(key)),
            None => Ok(None),
        }
    }

    /// Make `key`'s document resident
    ///
    /// Returns `None` if neither memory nor persistence has it.
    pub fn load(&mut self, key: &DocumentKey) -> StoreResult<Option<Residency>> {
        if self.is_resident(key) {
            return Ok(Some(Residency::Resident));
        }
        let Some(document) = self.persistence.deserialize(key)? else {
            if self.slots.remove(key).is_some() {
                warn!(key = %key, "spilled document missing from persistence");
            }
            return Ok(None);
        };
        self.persistence.delete(key)?;
        self.slots.insert(key.clone(), Slot::Resident(document));
        debug!(key = %key, "reloaded document");
        Ok(Some(Residency::Reloaded))
    }

    /// Store `document` as resident under its key
    ///
    /// Returns the document it replaced, read back from persistence if it
    /// had been spilled (the disk copy is deleted).
    pub fn insert(&mut self, document: Document) -> StoreResult<Option<Displaced>> {
        let key = document.key().clone();
        let previous = self.take_previous(&key)?;
        self.slots.insert(key, Slot::Resident(document));
        Ok(previous)
    }

    /// Forget `key` entirely, in memory and on disk
    ///
    /// Returns the removed document, or `None` if the key was unknown.
    pub fn remove(&mut self, key: &DocumentKey) -> StoreResult<Option<Displaced>> {
        if !self.slots.contains_key(key) {
            return Ok(None);
        }
        let previous = self.take_previous(key)?;
        self.slots.remove(key);
        Ok(previous)
    }

    /// Write `key`'s resident document to persistence and drop it from memory
    ///
    /// Returns the spilled document, or `None` if it was not resident.
    pub fn spill(&mut self, key: &DocumentKey) -> StoreResult<Option<Document>> {
        let document = match self.slots.get(key) {
            Some(Slot::Resident(doc)) => doc,
            _ => return Ok(None),
        };
        self.persistence.serialize(key, document)?;
        match self.slots.insert(key.clone(), Slot::Spilled) {
            Some(Slot::Resident(document)) => {
                debug!(key = %key, "spilled document");
                Ok(Some(document))
            }
            _ => Ok(None),
        }
    }

    /// Delete `key` from persistence only, for keys this index never saw
    pub fn delete_from_disk(&mut self, key: &DocumentKey) -> StoreResult<bool> {
        self.persistence.delete(key)
    }

    /// The current document for `key` before it is replaced or removed.
    /// Performs all I/O up front and leaves the map untouched.
    fn take_previous(&mut self, key: &DocumentKey) -> StoreResult<Option<Displaced>> {
        if let Some(Slot::Resident(doc)) = self.slots.get(key) {
            return Ok(Some(Displaced {
                document: doc.clone(),
                was_resident: true,
            }));
        }
        let Some(document) = self.persistence.deserialize(key)? else {
            return Ok(None);
        };
        self.persistence.delete(key)?;
        Ok(Some(Displaced {
            document,
            was_resident: false,
        }))
    }
}
