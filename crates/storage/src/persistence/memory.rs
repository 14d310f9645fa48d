//! In-memory persistence with fault injection
//!
//! Documents are kept as JSON strings so that every spill/reload goes through
//! the same codec as `FilePersistence`. Handles are cheap clones sharing one
//! map, which lets a test keep a handle after moving another into a store and
//! then inspect the "disk" or make the next I/O call fail.

use super::Persistence;
use docstore_core::{Document, DocumentKey, StoreResult};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;

#[derive(Debug, Default)]
struct MemoryInner {
    documents: BTreeMap<DocumentKey, String>,
    fail_serialize: bool,
    fail_deserialize: bool,
    fail_delete: bool,
    serialize_calls: usize,
    deserialize_calls: usize,
    delete_calls: usize,
}

/// Shared in-memory backing store
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    inner: Arc<Mutex<MemoryInner>>,
}

fn injected(op: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("injected {} failure", op))
}

impl MemoryPersistence {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a document is stored under `key`
    pub fn contains(&self, key: &DocumentKey) -> bool {
        self.inner.lock().documents.contains_key(key)
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.inner.lock().documents.len()
    }

    /// Check if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.inner.lock().documents.is_empty()
    }

    /// Keys of all stored documents, sorted
    pub fn keys(&self) -> Vec<DocumentKey> {
        self.inner.lock().documents.keys().cloned().collect()
    }

    /// Make the next `serialize` call fail with an I/O error
    pub fn fail_next_serialize(&self) {
        self.inner.lock().fail_serialize = true;
    }

    /// Make the next `deserialize` call fail with an I/O error
    pub fn fail_next_deserialize(&self) {
        self.inner.lock().fail_deserialize = true;
    }

    /// Make the next `delete` call fail with an I/O error
    pub fn fail_next_delete(&self) {
        self.inner.lock().fail_delete = true;
    }

    /// Number of `serialize` calls so far (including failed ones)
    pub fn serialize_calls(&self) -> usize {
        self.inner.lock().serialize_calls
    }

    /// Number of `deserialize` calls so far (including failed ones)
    pub fn deserialize_calls(&self) -> usize {
        self.inner.lock().deserialize_calls
    }

    /// Number of `delete` calls so far (including failed ones)
    pub fn delete_calls(&self) -> usize {
        self.inner.lock().delete_calls
    }
}

impl Persistence for MemoryPersistence {
    fn serialize(&mut self, key: &DocumentKey, document: &Document) -> StoreResult<()> {
        let mut inner = self.inner.lock();
        inner.serialize_calls += 1;
        if std::mem::take(&mut inner.fail_serialize) {
            return Err(injected("serialize").into());
        }
        let json = serde_json::to_string(document)?;
        inner.documents.insert(key.clone(), json);
        Ok(())
    }

    fn deserialize(&mut self, key: &DocumentKey) -> StoreResult<Option<Document>> {
        let mut inner = self.inner.lock();
        inner.deserialize_calls += 1;
        if std::mem::take(&mut inner.fail_deserialize) {
            return Err(injected("deserialize").into());
        }
        match inner.documents.get(key) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn delete(&mut self, key: &DocumentKey) -> StoreResult<bool> {
        let mut inner = self.inner.lock();
        inner.delete_calls += 1;
        if std::mem::take(&mut inner.fail_delete) {
            return Err(injected("delete").into());
        }
        Ok(inner.documents.remove(key).is_some())
    }
}
