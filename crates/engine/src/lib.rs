//! Document store engine
//!
//! This crate orchestrates the storage layer:
//! - DocumentStore: put/get/delete, metadata, search, batch delete
//! - Undo log: atomic and composite commands, targeted undo
//! - Limit enforcement: LRU spill of resident documents
//! - Configuration: `docstore.toml` and the store builder
//!
//! The engine is the only component that knows how the paged index, the
//! search trie and the eviction heap must move together.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod shared;
pub mod store;
pub mod undo;

pub use shared::SharedDocumentStore;
pub use store::{
    DocumentStore, DocumentStoreBuilder, Inverse, MetadataFilter, StoreConfig, StoreLimits,
    StoreUndoLog, CONFIG_FILE_NAME,
};
pub use undo::{AtomicCommand, CommandSet, Revert, UndoCommand, UndoLog};
