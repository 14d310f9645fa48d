//! Document keys
//!
//! A `DocumentKey` is an opaque, URI-like identifier (`doc://host/path`).
//! The only structural rule enforced here is that it is not blank; the
//! persistence layer decides how a key maps onto storage.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a stored document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Create a key, rejecting blank strings
    pub fn new(key: impl Into<String>) -> StoreResult<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(StoreError::invalid_argument("document key must not be blank"));
        }
        Ok(DocumentKey(key))
    }

    /// The key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The text before the first `://`, if the key has one
    pub fn scheme(&self) -> Option<&str> {
        self.0.find("://").map(|idx| &self.0[..idx])
    }

    /// The key with any `scheme://` prefix removed
    ///
    /// `doc://host/a/b` becomes `host/a/b`; keys without a scheme are
    /// returned unchanged.
    pub fn without_scheme(&self) -> &str {
        match self.0.find("://") {
            Some(idx) => &self.0[idx + 3..],
            None => &self.0,
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for DocumentKey {
    type Error = StoreError;

    fn try_from(value: &str) -> StoreResult<Self> {
        DocumentKey::new(value)
    }
}

impl TryFrom<String> for DocumentKey {
    type Error = StoreError;

    fn try_from(value: String) -> StoreResult<Self> {
        DocumentKey::new(value)
    }
}
