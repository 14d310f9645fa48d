//! Core types for docstore
//!
//! This crate defines the foundational types used throughout the system:
//! - DocumentKey: URI-like document identity
//! - Document / Content / DocumentFormat: the stored value object
//! - Tokenizer: word splitting and metadata index terms
//! - StoreError: error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod key;
pub mod tokenizer;

pub use document::{Content, Document, DocumentFormat};
pub use error::{StoreError, StoreResult};
pub use key::DocumentKey;
