//! docstore - embeddable document store
//!
//! Keyed text and binary documents with keyword, prefix and metadata
//! search, least-recently-used spilling to disk under configurable memory
//! ceilings, and an undo log that can reverse single mutations, whole batch
//! deletes, or the latest mutation of one key.
//!
//! # Quick Start
//!
//! ```
//! use docstore::{DocumentKey, DocumentStore};
//!
//! let mut store = DocumentStore::ephemeral();
//! let key = DocumentKey::new("doc://notes/1").unwrap();
//! store.put_text(&key, "the cat sat on the mat").unwrap();
//!
//! assert_eq!(store.search_by_prefix("ma").unwrap().len(), 1);
//! store.set_max_document_bytes(1).unwrap();
//! assert!(!store.is_resident(&key));
//! assert_eq!(
//!     store.get(&key).unwrap().unwrap().text_content(),
//!     Some("the cat sat on the mat")
//! );
//! ```
//!
//! # Architecture
//!
//! - `docstore-core`: documents, keys, tokenizer, errors
//! - `docstore-storage`: paged index, search trie, eviction heap, persistence
//! - `docstore-engine`: the store, its undo log and configuration
//!
//! Everything a caller needs is re-exported here.

pub use docstore_core::{Content, Document, DocumentFormat, DocumentKey, StoreError, StoreResult};
pub use docstore_engine::{
    DocumentStore, DocumentStoreBuilder, MetadataFilter, SharedDocumentStore, StoreConfig,
    StoreLimits, CONFIG_FILE_NAME,
};
pub use docstore_storage::{FilePersistence, MemoryPersistence, Persistence};
