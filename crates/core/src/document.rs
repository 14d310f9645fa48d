//! Document value object
//!
//! A document is a key plus exactly one kind of content (text or binary),
//! a mutable metadata map, the word-frequency map derived from its text, and
//! the logical time it was last used.
//!
//! Equality is key + content; hashing is content only, so the two stay
//! consistent. Metadata and last-use time never participate.

use crate::error::{StoreError, StoreResult};
use crate::key::DocumentKey;
use crate::tokenizer::{self, metadata_term};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use xxhash_rust::xxh3::xxh3_64;

// ============================================================================
// Content
// ============================================================================

/// Input format accepted by `put`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    /// UTF-8 text, indexed word by word
    Text,
    /// Opaque bytes, never indexed
    Binary,
}

/// Document body: text xor binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Content {
    /// Text content
    Text(String),
    /// Binary content, base64 in serialized form
    Binary(#[serde(with = "base64_bytes")] Vec<u8>),
}

impl Content {
    /// Raw bytes of the content
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Content::Text(text) => text.as_bytes(),
            Content::Binary(bytes) => bytes,
        }
    }

    /// Format of this content
    pub fn format(&self) -> DocumentFormat {
        match self {
            Content::Text(_) => DocumentFormat::Text,
            Content::Binary(_) => DocumentFormat::Binary,
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Document
// ============================================================================

/// A stored document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    key: DocumentKey,
    content: Content,
    #[serde(default)]
    metadata: BTreeMap<String, String>,
    #[serde(default)]
    word_frequency: HashMap<String, u32>,
    #[serde(default)]
    last_use_time: u64,
}

impl Document {
    /// Create a text document; the word map is derived from `text`
    pub fn text(key: DocumentKey, text: impl Into<String>) -> Self {
        let text = text.into();
        let word_frequency = tokenizer::word_frequencies(&text);
        Document {
            key,
            content: Content::Text(text),
            metadata: BTreeMap::new(),
            word_frequency,
            last_use_time: 0,
        }
    }

    /// Create a binary document; binary documents have no words
    pub fn binary(key: DocumentKey, bytes: impl Into<Vec<u8>>) -> Self {
        Document {
            key,
            content: Content::Binary(bytes.into()),
            metadata: BTreeMap::new(),
            word_frequency: HashMap::new(),
            last_use_time: 0,
        }
    }

    /// Create a document from raw input bytes
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `format` is `Text` and the bytes are not UTF-8.
    pub fn from_bytes(key: DocumentKey, bytes: Vec<u8>, format: DocumentFormat) -> StoreResult<Self> {
        match format {
            DocumentFormat::Text => {
                let text = String::from_utf8(bytes).map_err(|e| {
                    StoreError::invalid_argument(format!("text document is not valid UTF-8: {}", e))
                })?;
                Ok(Document::text(key, text))
            }
            DocumentFormat::Binary => Ok(Document::binary(key, bytes)),
        }
    }

    /// Document key
    pub fn key(&self) -> &DocumentKey {
        &self.key
    }

    /// Document body
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Text body, `None` for binary documents
    pub fn text_content(&self) -> Option<&str> {
        match &self.content {
            Content::Text(text) => Some(text),
            Content::Binary(_) => None,
        }
    }

    /// Binary body, `None` for text documents
    pub fn binary_content(&self) -> Option<&[u8]> {
        match &self.content {
            Content::Text(_) => None,
            Content::Binary(bytes) => Some(bytes),
        }
    }

    /// Bytes charged against the store's memory ceiling
    pub fn size_in_bytes(&self) -> usize {
        self.content.as_bytes().len()
    }

    /// xxh3 hash of the content bytes
    pub fn content_hash(&self) -> u64 {
        xxh3_64(self.content.as_bytes())
    }

    // ========== Metadata ==========

    /// All metadata pairs
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Value of one metadata field
    pub fn metadata_value(&self, field: &str) -> Option<&str> {
        self.metadata.get(field).map(String::as_str)
    }

    /// Set one metadata field, returning the previous value
    pub fn set_metadata_value(&mut self, field: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.metadata.insert(field.into(), value.into())
    }

    /// Remove one metadata field, returning the previous value
    pub fn remove_metadata_value(&mut self, field: &str) -> Option<String> {
        self.metadata.remove(field)
    }

    /// Replace the whole metadata map
    pub fn set_metadata(&mut self, metadata: BTreeMap<String, String>) {
        self.metadata = metadata;
    }

    /// True if every `(field, value)` pair matches exactly
    pub fn matches_metadata(&self, filter: &BTreeMap<String, String>) -> bool {
        filter
            .iter()
            .all(|(field, value)| self.metadata_value(field) == Some(value.as_str()))
    }

    // ========== Words ==========

    /// Word → occurrence count
    pub fn word_frequency(&self) -> &HashMap<String, u32> {
        &self.word_frequency
    }

    /// Replace the word map (used when restoring a serialized document)
    pub fn set_word_frequency(&mut self, word_frequency: HashMap<String, u32>) {
        self.word_frequency = word_frequency;
    }

    /// Occurrences of `word`, case-folded; always 0 for binary documents
    pub fn word_count(&self, word: &str) -> u32 {
        self.word_frequency
            .get(&word.to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    /// Occurrences of every word starting with `prefix`, case-folded
    pub fn prefix_count(&self, prefix: &str) -> u32 {
        let prefix = prefix.to_lowercase();
        self.word_frequency
            .iter()
            .filter(|(word, _)| word.starts_with(&prefix))
            .map(|(_, count)| *count)
            .sum()
    }

    /// Distinct words of the document
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.word_frequency.keys().map(String::as_str)
    }

    /// Every term this document contributes to the search index:
    /// its distinct words followed by one `field:value` term per metadata pair
    pub fn index_terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = self.word_frequency.keys().cloned().collect();
        terms.extend(
            self.metadata
                .iter()
                .map(|(field, value)| metadata_term(field, value)),
        );
        terms
    }

    // ========== Recency ==========

    /// Logical time of the last read or write
    pub fn last_use_time(&self) -> u64 {
        self.last_use_time
    }

    /// Record a read or write at logical time `time`
    pub fn set_last_use_time(&mut self, time: u64) {
        self.last_use_time = time;
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.content == other.content
    }
}

impl Eq for Document {}

impl Hash for Document {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.content.as_bytes().hash(state);
    }
}
