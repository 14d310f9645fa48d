//! Store builder for fluent configuration

use std::path::PathBuf;

use docstore_core::{StoreError, StoreResult};
use docstore_storage::FilePersistence;
use tracing::info;

use super::config::{StoreConfig, CONFIG_FILE_NAME};
use super::DocumentStore;

/// Directory under the data directory holding spilled documents
pub const DOCUMENTS_DIR: &str = "documents";

// ============================================================================
// Store Builder Pattern
// ============================================================================

/// Builder for a file-backed `DocumentStore`
///
/// Limits come from `docstore.toml` in the data directory (created with
/// defaults on first open). Values set on the builder override the file.
///
/// ```ignore
/// use docstore_engine::DocumentStore;
///
/// // 1. Limits from docstore.toml
/// let store = DocumentStore::open("/data/docs")?;
///
/// // 2. Builder overrides
/// let store = DocumentStore::builder()
///     .path("/data/docs")
///     .max_document_count(10_000)
///     .open()?;
///
/// // 3. Ephemeral (spills stay in memory, testing)
/// let store = DocumentStore::ephemeral();
/// ```
#[derive(Debug, Clone, Default)]
pub struct DocumentStoreBuilder {
    /// Data directory (required for open())
    path: Option<PathBuf>,
    /// Replaces the file config entirely when set
    config: Option<StoreConfig>,
    max_document_count: Option<usize>,
    max_document_bytes: Option<usize>,
}

impl DocumentStoreBuilder {
    /// Create a builder with no path and no overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the data directory
    pub fn path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Use `config` instead of reading `docstore.toml`
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Override the resident document ceiling (0 = unbounded)
    pub fn max_document_count(mut self, limit: usize) -> Self {
        self.max_document_count = Some(limit);
        self
    }

    /// Override the resident byte ceiling (0 = unbounded)
    pub fn max_document_bytes(mut self, limit: usize) -> Self {
        self.max_document_bytes = Some(limit);
        self
    }

    /// Open the store
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - No path was configured (use `.path()` or `DocumentStore::ephemeral()`)
    /// - The data directory or config file cannot be created or read
    pub fn open(self) -> StoreResult<DocumentStore<FilePersistence>> {
        let path = self.path.ok_or_else(|| {
            StoreError::invalid_argument(
                "DocumentStoreBuilder::open() requires a path. Use DocumentStore::ephemeral() for testing.",
            )
        })?;
        std::fs::create_dir_all(&path)?;

        let mut config = match self.config {
            Some(config) => config,
            None => {
                let config_path = path.join(CONFIG_FILE_NAME);
                StoreConfig::write_default_if_missing(&config_path)?;
                StoreConfig::from_file(&config_path)?
            }
        };
        if let Some(limit) = self.max_document_count {
            config.max_document_count = limit;
        }
        if let Some(limit) = self.max_document_bytes {
            config.max_document_bytes = limit;
        }

        let limits = config.limits();
        info!(
            path = %path.display(),
            max_document_count = limits.max_document_count,
            max_document_bytes = limits.max_document_bytes,
            "opened document store"
        );
        let persistence = FilePersistence::new(path.join(DOCUMENTS_DIR));
        Ok(DocumentStore::with_persistence_and_limits(persistence, limits))
    }
}
