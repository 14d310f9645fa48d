//! JSON-file persistence
//!
//! Key `scheme://host/a/b` is stored at `<base_dir>/scheme/host/a/b.json`.
//! Keys without a scheme live under a `%%` directory instead. Every path
//! segment is percent-escaped: bytes other than ASCII alphanumerics, `-` and
//! `_` become `%XX`, and an empty segment becomes `%`. The only literal `.`
//! in a path is the one before the extension, so distinct keys always land in
//! distinct files and no segment can climb out of the base directory.
//!
//! Parent directories are created on demand. Writes go to a `.tmp` sibling
//! first and are renamed into place, so a crash never leaves a half-written
//! document.

use super::Persistence;
use docstore_core::{Document, DocumentKey, StoreError, StoreResult};
use serde::Deserialize;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

const EXTENSION: &str = "json";

/// Directory for keys that have no `scheme://` prefix
const NO_SCHEME_DIR: &str = "%%";

/// File name stem for an empty segment
const EMPTY_SEGMENT: &str = "%";

/// Stores each document as a pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct FilePersistence {
    base_dir: PathBuf,
}

/// Just enough of a stored document to tell whose file it is
#[derive(Deserialize)]
struct StoredKey {
    key: DocumentKey,
}

fn escape_segment(segment: &str) -> String {
    if segment.is_empty() {
        return EMPTY_SEGMENT.to_string();
    }
    let mut escaped = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            escaped.push(byte as char);
        } else {
            // Writing to a String cannot fail.
            let _ = write!(escaped, "%{:02X}", byte);
        }
    }
    escaped
}

impl FilePersistence {
    /// Create a persistence rooted at `base_dir` (created lazily)
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        FilePersistence {
            base_dir: base_dir.into(),
        }
    }

    /// Root directory of the stored files
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// File path for `key`
    ///
    /// The mapping is one-to-one: two different keys never share a path.
    pub fn path_for(&self, key: &DocumentKey) -> PathBuf {
        let mut path = self.base_dir.clone();
        match key.scheme() {
            Some(scheme) => path.push(escape_segment(scheme)),
            None => path.push(NO_SCHEME_DIR),
        }
        let mut segments = key.without_scheme().split('/').peekable();
        while let Some(segment) = segments.next() {
            let name = escape_segment(segment);
            if segments.peek().is_some() {
                path.push(name);
            } else {
                path.push(format!("{}.{}", name, EXTENSION));
            }
        }
        path
    }

    /// Key recorded in the file at `path`, if the file exists
    fn stored_key(path: &Path) -> StoreResult<Option<DocumentKey>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredKey = serde_json::from_slice(&bytes)?;
        Ok(Some(stored.key))
    }
}

impl Persistence for FilePersistence {
    fn serialize(&mut self, key: &DocumentKey, document: &Document) -> StoreResult<()> {
        let path = self.path_for(key);
        if let Some(owner) = Self::stored_key(&path)? {
            if &owner != key {
                return Err(StoreError::Serialization(format!(
                    "file {} already holds document '{}', refusing to overwrite it with '{}'",
                    path.display(),
                    owner,
                    key
                )));
            }
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(document)?;
        let tmp = path.with_extension(format!("{}.tmp", EXTENSION));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        debug!(key = %key, path = %path.display(), "serialized document");
        Ok(())
    }

    fn deserialize(&mut self, key: &DocumentKey) -> StoreResult<Option<Document>> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(key = %key, path = %path.display(), "no serialized document");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let document: Document = serde_json::from_slice(&bytes)?;
        if document.key() != key {
            return Err(StoreError::Serialization(format!(
                "file {} holds document '{}', expected '{}'",
                path.display(),
                document.key(),
                key
            )));
        }
        debug!(key = %key, path = %path.display(), "deserialized document");
        Ok(Some(document))
    }

    fn delete(&mut self, key: &DocumentKey) -> StoreResult<bool> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(key = %key, path = %path.display(), "deleted serialized document");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
