//! The document store
//!
//! `DocumentStore` is the public entry point. It owns the lockstep state
//! (paged index, trie, eviction heap, accounting) and the undo log, and
//! runs every operation as: validate, mutate state, record the inverse
//! command, enforce limits.
//!
//! ## Residency
//!
//! A key is absent, resident or spilled. `put` makes it resident, eviction
//! spills it, any read (`get`, search, metadata access) reloads it, and
//! `delete` makes it absent again. Reads count as uses: they bump the
//! document's last-use time and so push it to the back of the eviction
//! order.
//!
//! ## Failure
//!
//! A persistence error is returned to the caller with the store unchanged by
//! the failing step. When a limit-enforcement spill fails after a mutation
//! has already been applied and recorded, the mutation stays (and stays
//! undoable); only the spill is abandoned.

mod builder;
mod config;
mod search;
mod state;

pub use builder::DocumentStoreBuilder;
pub use config::{StoreConfig, StoreLimits, CONFIG_FILE_NAME};
pub use search::MetadataFilter;
pub use state::Inverse;

use crate::undo::UndoLog;
use docstore_core::tokenizer::normalize;
use docstore_core::{Document, DocumentFormat, DocumentKey, StoreError, StoreResult};
use docstore_storage::{FilePersistence, MemoryPersistence, Persistence, Residency};
use state::StoreState;
use tracing::info;

/// Undo log specialised to the store's inverse actions
pub type StoreUndoLog = UndoLog<DocumentKey, Inverse>;

/// Embeddable document store with search, LRU spill and undo
///
/// # Example
///
/// ```
/// use docstore_engine::DocumentStore;
/// use docstore_core::DocumentKey;
///
/// let mut store = DocumentStore::ephemeral();
/// let key = DocumentKey::new("doc://notes/1").unwrap();
/// store.put_text(&key, "the cat sat on the mat").unwrap();
///
/// let hits = store.search("cat").unwrap();
/// assert_eq!(hits.len(), 1);
///
/// store.undo().unwrap();
/// assert!(store.get(&key).unwrap().is_none());
/// ```
#[derive(Debug)]
pub struct DocumentStore<P: Persistence = FilePersistence> {
    state: StoreState<P>,
    undo: StoreUndoLog,
}

impl DocumentStore<FilePersistence> {
    /// Open a file-backed store in `path` with limits from its `docstore.toml`
    pub fn open(path: impl Into<std::path::PathBuf>) -> StoreResult<Self> {
        DocumentStoreBuilder::new().path(path).open()
    }

    /// Start configuring a file-backed store
    pub fn builder() -> DocumentStoreBuilder {
        DocumentStoreBuilder::new()
    }
}

impl DocumentStore<MemoryPersistence> {
    /// Unbounded store whose spilled documents live in memory
    pub fn ephemeral() -> Self {
        Self::with_persistence(MemoryPersistence::new())
    }
}

impl<P: Persistence> DocumentStore<P> {
    /// Unbounded store over `persistence`
    pub fn with_persistence(persistence: P) -> Self {
        Self::with_persistence_and_limits(persistence, StoreLimits::unbounded())
    }

    /// Store over `persistence` with starting `limits`
    pub fn with_persistence_and_limits(persistence: P, limits: StoreLimits) -> Self {
        DocumentStore {
            state: StoreState::new(persistence, limits),
            undo: UndoLog::new(),
        }
    }

    // ========================================================================
    // Documents
    // ========================================================================

    /// Store `content` under `key`, replacing any previous document
    ///
    /// `None` or empty content deletes the key instead. Returns the content
    /// hash of the document that was replaced, if any.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `format` is text and the bytes are not UTF-8,
    /// or a persistence error.
    pub fn put(
        &mut self,
        key: &DocumentKey,
        content: Option<Vec<u8>>,
        format: DocumentFormat,
    ) -> StoreResult<Option<u64>> {
        let bytes = match content {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => {
                if !self.state.index.contains_key(key) {
                    self.state.index.delete_from_disk(key)?;
                    return Ok(None);
                }
                let removed = self.remove_recorded(key)?;
                return Ok(removed.as_ref().map(Document::content_hash));
            }
        };
        let document = Document::from_bytes(key.clone(), bytes, format)?;
        self.install(document)
    }

    /// Store text content under `key`
    pub fn put_text(&mut self, key: &DocumentKey, text: &str) -> StoreResult<Option<u64>> {
        self.put(key, Some(text.as_bytes().to_vec()), DocumentFormat::Text)
    }

    /// Store binary content under `key`
    pub fn put_binary(&mut self, key: &DocumentKey, bytes: Vec<u8>) -> StoreResult<Option<u64>> {
        self.put(key, Some(bytes), DocumentFormat::Binary)
    }

    fn install(&mut self, document: Document) -> StoreResult<Option<u64>> {
        let key = document.key().clone();
        let displaced = self.state.admit(document)?;
        let previous = displaced.map(|d| d.document);
        let previous_hash = previous.as_ref().map(Document::content_hash);
        self.undo.push_atomic(key, Inverse::Put { previous });
        self.state.enforce_limits()?;
        Ok(previous_hash)
    }

    /// The document under `key`, reloading it from persistence if spilled
    ///
    /// Counts as a use of the document.
    pub fn get(&mut self, key: &DocumentKey) -> StoreResult<Option<Document>> {
        let Some(residency) = self.state.fetch(key)? else {
            return Ok(None);
        };
        self.state.touch(key);
        let document = self.state.index.resident(key).cloned();
        if residency == Residency::Reloaded {
            self.state.enforce_limits()?;
        }
        Ok(document)
    }

    /// Delete the document under `key`
    ///
    /// Returns `false` if nothing was stored under the key. Keys this store
    /// has never seen are still deleted from persistence.
    pub fn delete(&mut self, key: &DocumentKey) -> StoreResult<bool> {
        if !self.state.index.contains_key(key) {
            return self.state.index.delete_from_disk(key);
        }
        Ok(self.remove_recorded(key)?.is_some())
    }

    /// Remove a known key and record the inverse
    fn remove_recorded(&mut self, key: &DocumentKey) -> StoreResult<Option<Document>> {
        let Some(displaced) = self.state.remove(key)? else {
            return Ok(None);
        };
        self.undo.push_atomic(
            key.clone(),
            Inverse::Delete {
                document: displaced.document.clone(),
            },
        );
        Ok(Some(displaced.document))
    }

    /// Set one metadata field on the document under `key`
    ///
    /// Returns the field's previous value.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a blank field, `DocumentNotFound` if nothing
    /// is stored under `key`.
    pub fn set_metadata(
        &mut self,
        key: &DocumentKey,
        field: &str,
        value: impl Into<String>,
    ) -> StoreResult<Option<String>> {
        if field.trim().is_empty() {
            return Err(StoreError::invalid_argument("metadata field must not be blank"));
        }
        let residency = self.require(key)?;
        let previous = self
            .state
            .write_metadata(key, field, Some(value.into()))?;
        self.state.touch(key);
        self.undo.push_atomic(
            key.clone(),
            Inverse::Metadata {
                field: field.to_string(),
                previous: previous.clone(),
            },
        );
        if residency == Residency::Reloaded {
            self.state.enforce_limits()?;
        }
        Ok(previous)
    }

    /// One metadata field of the document under `key`
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for a blank field, `DocumentNotFound` if nothing
    /// is stored under `key`.
    pub fn get_metadata(&mut self, key: &DocumentKey, field: &str) -> StoreResult<Option<String>> {
        if field.trim().is_empty() {
            return Err(StoreError::invalid_argument("metadata field must not be blank"));
        }
        let residency = self.require(key)?;
        self.state.touch(key);
        let value = self
            .state
            .index
            .resident(key)
            .and_then(|doc| doc.metadata_value(field))
            .map(str::to_string);
        if residency == Residency::Reloaded {
            self.state.enforce_limits()?;
        }
        Ok(value)
    }

    fn require(&mut self, key: &DocumentKey) -> StoreResult<Residency> {
        self.state
            .fetch(key)?
            .ok_or_else(|| StoreError::not_found(key.as_str()))
    }

    /// Spill the document under `key` to persistence now
    ///
    /// Returns `false` if it was not resident.
    pub fn move_to_disk(&mut self, key: &DocumentKey) -> StoreResult<bool> {
        self.state.spill(key)
    }

    // ========================================================================
    // Undo
    // ========================================================================

    /// Undo the most recent mutation (a batch counts as one)
    ///
    /// # Errors
    ///
    /// `NothingToUndo` if no mutation is recorded, or a persistence error.
    pub fn undo(&mut self) -> StoreResult<()> {
        self.undo.undo_last(&mut self.state)?;
        self.state.enforce_limits()?;
        Ok(())
    }

    /// Undo the most recent mutation of `key`, leaving newer mutations of
    /// other keys in place
    ///
    /// # Errors
    ///
    /// `NothingToUndo` if no mutation is recorded, `NoUndoForKey` if none
    /// touches `key`, or a persistence error.
    pub fn undo_for(&mut self, key: &DocumentKey) -> StoreResult<()> {
        self.undo.undo_last_for(key, &mut self.state)?;
        self.state.enforce_limits()?;
        Ok(())
    }

    /// Number of commands on the undo log
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    // ========================================================================
    // Limits
    // ========================================================================

    /// Set the resident document ceiling (0 = unbounded) and enforce it
    pub fn set_max_document_count(&mut self, limit: usize) -> StoreResult<()> {
        info!(limit, "setting max document count");
        self.state.limits.max_document_count = limit;
        self.state.enforce_limits()?;
        Ok(())
    }

    /// Set the resident byte ceiling (0 = unbounded) and enforce it
    pub fn set_max_document_bytes(&mut self, limit: usize) -> StoreResult<()> {
        info!(limit, "setting max document bytes");
        self.state.limits.max_document_bytes = limit;
        self.state.enforce_limits()?;
        Ok(())
    }

    /// Current ceilings
    pub fn limits(&self) -> StoreLimits {
        self.state.limits
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Number of resident documents
    pub fn document_count(&self) -> usize {
        self.state.document_count
    }

    /// Total size of resident documents
    pub fn document_bytes(&self) -> usize {
        self.state.document_bytes
    }

    /// Check if `key` is known to this store, resident or spilled
    pub fn contains(&self, key: &DocumentKey) -> bool {
        self.state.index.contains_key(key)
    }

    /// Check if `key`'s document is in memory
    pub fn is_resident(&self, key: &DocumentKey) -> bool {
        self.state.index.is_resident(key)
    }

    /// Keys of resident documents, sorted
    pub fn resident_keys(&self) -> Vec<DocumentKey> {
        self.state.index.resident_keys().cloned().collect()
    }

    /// Every known key, resident or spilled, sorted
    pub fn keys(&self) -> Vec<DocumentKey> {
        self.state.index.keys().cloned().collect()
    }

    /// The persistence collaborator
    pub fn persistence(&self) -> &P {
        self.state.index.persistence()
    }

    /// Violations of the index/trie/heap/accounting lockstep, empty when
    /// the store is consistent
    pub fn check_consistency(&self) -> Vec<String> {
        self.state.consistency_violations()
    }
}

/// Validate and case-fold a search term
fn search_term(term: &str, what: &str) -> StoreResult<String> {
    let normalized = normalize(term);
    if normalized.is_empty() {
        return Err(StoreError::invalid_argument(format!("{} must not be blank", what)));
    }
    Ok(normalized)
}
