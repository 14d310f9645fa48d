//! Storage layer for docstore
//!
//! This crate implements the data structures the document store coordinates:
//! - EvictionHeap: indexed min-heap ordering resident documents by last use
//! - Trie: arena byte trie backing keyword, prefix and metadata search
//! - PagedIndex: key → document map that spills to and reloads from persistence
//! - Persistence: the backing-store trait, with file and in-memory implementations
//!
//! None of these types know about each other; `docstore-engine` keeps them
//! consistent.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod heap;
pub mod paged;
pub mod persistence;
pub mod trie;

pub use heap::EvictionHeap;
pub use paged::{Displaced, PagedIndex, Residency};
pub use persistence::{FilePersistence, MemoryPersistence, Persistence};
pub use trie::Trie;
