//! Persistence collaborator for spilled documents
//!
//! The paged index hands documents to a `Persistence` implementation when it
//! spills them and asks for them back on a miss. Implementations only need a
//! deterministic key → storage mapping and an idempotent `delete`.
//!
//! - `FilePersistence`: one JSON file per document under a base directory
//! - `MemoryPersistence`: in-process map with fault injection, for tests and
//!   ephemeral stores

mod file;
mod memory;

pub use file::FilePersistence;
pub use memory::MemoryPersistence;

use docstore_core::{Document, DocumentKey, StoreResult};

/// Backing store for documents that are not resident in memory
///
/// Every method is synchronous. Errors are surfaced to the caller of the
/// store operation that triggered the I/O; nothing is retried.
pub trait Persistence {
    /// Write `document` under `key`, replacing any existing copy
    fn serialize(&mut self, key: &DocumentKey, document: &Document) -> StoreResult<()>;

    /// Read the document stored under `key`, `None` if there is none
    fn deserialize(&mut self, key: &DocumentKey) -> StoreResult<Option<Document>>;

    /// Delete the copy stored under `key`
    ///
    /// Returns `false` (not an error) if nothing was stored.
    fn delete(&mut self, key: &DocumentKey) -> StoreResult<bool>;
}
