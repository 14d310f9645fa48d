//! Store configuration via `docstore.toml`
//!
//! On first open, a default `docstore.toml` is created in the data
//! directory. Values in the file are the starting limits; builder settings
//! override them, and both can be changed at runtime through the store's
//! setters.

use docstore_core::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name placed in the store's data directory.
pub const CONFIG_FILE_NAME: &str = "docstore.toml";

/// Residency ceilings. Zero means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreLimits {
    /// Maximum number of resident documents (0 = unbounded)
    pub max_document_count: usize,
    /// Maximum total bytes of resident documents (0 = unbounded)
    pub max_document_bytes: usize,
}

impl StoreLimits {
    /// No ceilings at all
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Check if `count` documents totalling `bytes` break either ceiling
    pub fn is_exceeded(&self, count: usize, bytes: usize) -> bool {
        (self.max_document_count > 0 && count > self.max_document_count)
            || (self.max_document_bytes > 0 && bytes > self.max_document_bytes)
    }
}

/// Store configuration loaded from `docstore.toml`.
///
/// # Example
///
/// ```toml
/// # Resident document ceiling; 0 = unbounded
/// max_document_count = 1000
///
/// # Resident byte ceiling; 0 = unbounded
/// max_document_bytes = 0
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum number of resident documents (0 = unbounded)
    #[serde(default)]
    pub max_document_count: usize,
    /// Maximum total bytes of resident documents (0 = unbounded)
    #[serde(default)]
    pub max_document_bytes: usize,
}

impl StoreConfig {
    /// The configured ceilings
    pub fn limits(&self) -> StoreLimits {
        StoreLimits {
            max_document_count: self.max_document_count,
            max_document_bytes: self.max_document_bytes,
        }
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# docstore configuration
#
# Documents beyond these ceilings are spilled to disk, least recently used
# first, and read back transparently on the next access.

# Maximum number of documents kept in memory (0 = unbounded)
max_document_count = 0

# Maximum total size in bytes of documents kept in memory (0 = unbounded)
max_document_bytes = 0
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            StoreError::invalid_argument(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> StoreResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> StoreResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            StoreError::Serialization(format!("failed to serialize config: {}", e))
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
