//! Keyword, prefix and metadata search, and the batch deletes built on them
//!
//! Keyword hits are ranked by how often the keyword occurs in each
//! document, highest first. Prefix hits are ranked by the total occurrences
//! of words under the prefix, lowest first. Metadata matching is exact
//! equality on every field of the filter.
//!
//! Searching is a use: every returned document has its last-use time bumped.
//! Spilled hits are reloaded one at a time, and limits are enforced after each
//! reload, so a search never holds more than one document over the ceilings.

use super::{search_term, DocumentStore, Inverse};
use crate::undo::CommandSet;
use docstore_core::{Document, DocumentKey, StoreError, StoreResult};
use docstore_storage::{Persistence, Residency};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Exact-field metadata filter
pub type MetadataFilter = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy)]
enum TermQuery<'a> {
    Keyword(&'a str),
    Prefix(&'a str),
}

impl TermQuery<'_> {
    fn score(&self, document: &Document) -> u32 {
        match self {
            TermQuery::Keyword(word) => document.word_count(word),
            TermQuery::Prefix(prefix) => document.prefix_count(prefix),
        }
    }
}

fn validate_filter(filter: &MetadataFilter) -> StoreResult<()> {
    if filter.is_empty() {
        return Err(StoreError::invalid_argument("metadata filter must not be empty"));
    }
    if filter.keys().any(|field| field.trim().is_empty()) {
        return Err(StoreError::invalid_argument("metadata field must not be blank"));
    }
    Ok(())
}

impl<P: Persistence> DocumentStore<P> {
    // ========================================================================
    // Search
    // ========================================================================

    /// Documents containing `keyword`, most occurrences first
    pub fn search(&mut self, keyword: &str) -> StoreResult<Vec<Document>> {
        let term = search_term(keyword, "keyword")?;
        self.ranked_search(TermQuery::Keyword(&term), None)
    }

    /// Documents containing a word that starts with `prefix`, fewest
    /// occurrences first
    pub fn search_by_prefix(&mut self, prefix: &str) -> StoreResult<Vec<Document>> {
        let term = search_term(prefix, "prefix")?;
        self.ranked_search(TermQuery::Prefix(&term), None)
    }

    /// Documents whose metadata has every field of `filter` with an equal value
    pub fn search_by_metadata(&mut self, filter: &MetadataFilter) -> StoreResult<Vec<Document>> {
        validate_filter(filter)?;
        let keys: Vec<DocumentKey> = self.state.index.keys().cloned().collect();
        let mut hits = Vec::new();
        for key in keys {
            let residency = match self.state.fetch(&key) {
                Ok(Some(residency)) => residency,
                Ok(None) => continue,
                Err(e) => return Err(self.settle(e)),
            };
            let matches = self
                .state
                .index
                .resident(&key)
                .map_or(false, |doc| doc.matches_metadata(filter));
            if matches {
                self.state.touch(&key);
                if let Some(document) = self.state.index.resident(&key) {
                    hits.push(document.clone());
                }
            }
            if residency == Residency::Reloaded {
                self.state.enforce_limits()?;
            }
        }
        Ok(hits)
    }

    /// Keyword search restricted to documents matching `filter`
    pub fn search_by_keyword_and_metadata(
        &mut self,
        keyword: &str,
        filter: &MetadataFilter,
    ) -> StoreResult<Vec<Document>> {
        let term = search_term(keyword, "keyword")?;
        validate_filter(filter)?;
        self.ranked_search(TermQuery::Keyword(&term), Some(filter))
    }

    /// Prefix search restricted to documents matching `filter`
    pub fn search_by_prefix_and_metadata(
        &mut self,
        prefix: &str,
        filter: &MetadataFilter,
    ) -> StoreResult<Vec<Document>> {
        let term = search_term(prefix, "prefix")?;
        validate_filter(filter)?;
        self.ranked_search(TermQuery::Prefix(&term), Some(filter))
    }

    fn ranked_search(
        &mut self,
        query: TermQuery<'_>,
        filter: Option<&MetadataFilter>,
    ) -> StoreResult<Vec<Document>> {
        let candidates = self.candidates(query);
        let mut scored = self.score(query, candidates, filter)?;

        let trie = &self.state.trie;
        let compare = |a: &DocumentKey, b: &DocumentKey| {
            let score = |key: &DocumentKey| scored.get(key).map(|(score, _)| *score);
            score(a).cmp(&score(b))
        };
        let mut ranked = match query {
            TermQuery::Keyword(word) => trie.get_sorted(word, compare),
            TermQuery::Prefix(prefix) => trie.get_all_with_prefix_sorted(prefix, compare),
        };
        ranked.retain(|key| scored.contains_key(key));

        let mut hits = Vec::with_capacity(ranked.len());
        for key in &ranked {
            self.state.touch(key);
            let Some((_, loaded)) = scored.remove(key) else {
                continue;
            };
            // A hit spilled again while later hits were reloading is
            // returned as it was read.
            let document = self.state.index.resident(key).cloned().unwrap_or(loaded);
            hits.push(document);
        }
        self.state.enforce_limits()?;
        Ok(hits)
    }

    fn candidates(&self, query: TermQuery<'_>) -> BTreeSet<DocumentKey> {
        match query {
            TermQuery::Keyword(word) => self.state.trie.get(word),
            TermQuery::Prefix(prefix) => self.state.trie.get_all_with_prefix(prefix),
        }
    }

    /// Load every candidate and score the ones passing `filter`, keeping a
    /// copy of each scored document. Candidates with no document behind them
    /// are dropped.
    fn score(
        &mut self,
        query: TermQuery<'_>,
        candidates: BTreeSet<DocumentKey>,
        filter: Option<&MetadataFilter>,
    ) -> StoreResult<HashMap<DocumentKey, (u32, Document)>> {
        let mut scored = HashMap::with_capacity(candidates.len());
        for key in candidates {
            let residency = match self.state.fetch(&key) {
                Ok(Some(residency)) => residency,
                Ok(None) => continue,
                Err(e) => return Err(self.settle(e)),
            };
            if let Some(document) = self.state.index.resident(&key) {
                if filter.map_or(true, |f| document.matches_metadata(f)) {
                    let score = query.score(document);
                    scored.insert(key, (score, document.clone()));
                }
            }
            if residency == Residency::Reloaded {
                self.state.enforce_limits()?;
            }
        }
        Ok(scored)
    }

    /// Bring residency back under the limits after a read failed part way,
    /// then hand back the read's error
    fn settle(&mut self, error: StoreError) -> StoreError {
        if let Err(spill_error) = self.state.enforce_limits() {
            debug!(error = %spill_error, "could not enforce limits after failed read");
        }
        error
    }

    // ========================================================================
    // Batch delete
    // ========================================================================

    /// Delete every document containing `keyword`; undone as one unit
    pub fn delete_all(&mut self, keyword: &str) -> StoreResult<BTreeSet<DocumentKey>> {
        let term = search_term(keyword, "keyword")?;
        let keys = self.candidates(TermQuery::Keyword(&term));
        self.delete_batch(keys)
    }

    /// Delete every document with a word starting with `prefix`; undone as
    /// one unit
    pub fn delete_all_with_prefix(&mut self, prefix: &str) -> StoreResult<BTreeSet<DocumentKey>> {
        let term = search_term(prefix, "prefix")?;
        let keys = self.candidates(TermQuery::Prefix(&term));
        self.delete_batch(keys)
    }

    /// Delete every document matching `filter`; undone as one unit
    pub fn delete_all_with_metadata(
        &mut self,
        filter: &MetadataFilter,
    ) -> StoreResult<BTreeSet<DocumentKey>> {
        validate_filter(filter)?;
        let keys: BTreeSet<DocumentKey> = self.state.index.keys().cloned().collect();
        let matching = self.filter_keys(keys, filter)?;
        let deleted = self.delete_batch(matching)?;
        self.state.enforce_limits()?;
        Ok(deleted)
    }

    /// Delete every document containing `keyword` and matching `filter`,
    /// each undone separately
    pub fn delete_all_with_keyword_and_metadata(
        &mut self,
        keyword: &str,
        filter: &MetadataFilter,
    ) -> StoreResult<BTreeSet<DocumentKey>> {
        let term = search_term(keyword, "keyword")?;
        validate_filter(filter)?;
        let keys = self.candidates(TermQuery::Keyword(&term));
        let matching = self.filter_keys(keys, filter)?;
        self.delete_each(matching)
    }

    /// Delete every document with a word starting with `prefix` and
    /// matching `filter`, each undone separately
    pub fn delete_all_with_prefix_and_metadata(
        &mut self,
        prefix: &str,
        filter: &MetadataFilter,
    ) -> StoreResult<BTreeSet<DocumentKey>> {
        let term = search_term(prefix, "prefix")?;
        validate_filter(filter)?;
        let keys = self.candidates(TermQuery::Prefix(&term));
        let matching = self.filter_keys(keys, filter)?;
        self.delete_each(matching)
    }

    fn filter_keys(
        &mut self,
        keys: BTreeSet<DocumentKey>,
        filter: &MetadataFilter,
    ) -> StoreResult<BTreeSet<DocumentKey>> {
        let mut matching = BTreeSet::new();
        for key in keys {
            let residency = match self.state.fetch(&key) {
                Ok(Some(residency)) => residency,
                Ok(None) => continue,
                Err(e) => return Err(self.settle(e)),
            };
            let matches = self
                .state
                .index
                .resident(&key)
                .map_or(false, |doc| doc.matches_metadata(filter));
            if residency == Residency::Reloaded {
                self.state.enforce_limits()?;
            }
            if matches {
                matching.insert(key);
            }
        }
        Ok(matching)
    }

    /// Remove `keys` and record one composite command. A failure part way
    /// still records the members already removed.
    fn delete_batch(&mut self, keys: BTreeSet<DocumentKey>) -> StoreResult<BTreeSet<DocumentKey>> {
        let mut set = CommandSet::new();
        let mut deleted = BTreeSet::new();
        let mut result = Ok(());
        for key in keys {
            match self.state.remove(&key) {
                Ok(Some(displaced)) => {
                    set.add(
                        key.clone(),
                        Inverse::Delete {
                            document: displaced.document,
                        },
                    );
                    deleted.insert(key);
                }
                Ok(None) => {}
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        debug!(count = deleted.len(), "batch delete");
        self.undo.push_set(set);
        result.map(|()| deleted)
    }

    fn delete_each(&mut self, keys: BTreeSet<DocumentKey>) -> StoreResult<BTreeSet<DocumentKey>> {
        let mut deleted = BTreeSet::new();
        for key in keys {
            if self.delete(&key)? {
                deleted.insert(key);
            }
        }
        self.state.enforce_limits()?;
        Ok(deleted)
    }
}
