//! Thread-shareable store handle
//!
//! The store's subsystems move in lockstep, so concurrent access goes
//! through one mutex around the whole store, never per-subsystem locks.

use std::sync::Arc;

use docstore_storage::{FilePersistence, Persistence};
use parking_lot::{Mutex, MutexGuard};

use crate::store::DocumentStore;

/// Cloneable handle to a `DocumentStore` behind a single lock
#[derive(Debug)]
pub struct SharedDocumentStore<P: Persistence = FilePersistence> {
    inner: Arc<Mutex<DocumentStore<P>>>,
}

impl<P: Persistence> Clone for SharedDocumentStore<P> {
    fn clone(&self) -> Self {
        SharedDocumentStore {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Persistence> SharedDocumentStore<P> {
    /// Wrap `store` for shared use
    pub fn new(store: DocumentStore<P>) -> Self {
        SharedDocumentStore {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Lock the store for a sequence of calls
    pub fn lock(&self) -> MutexGuard<'_, DocumentStore<P>> {
        self.inner.lock()
    }

    /// Run `f` with the store locked
    pub fn with<R>(&self, f: impl FnOnce(&mut DocumentStore<P>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl<P: Persistence> From<DocumentStore<P>> for SharedDocumentStore<P> {
    fn from(store: DocumentStore<P>) -> Self {
        Self::new(store)
    }
}
