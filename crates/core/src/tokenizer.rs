//! Word splitting for the search index
//!
//! Text is case-folded and split on runs of non-word characters. A word
//! character is alphanumeric or `_`. Empty fragments are dropped, so leading
//! or trailing punctuation never produces an empty term.

use std::collections::HashMap;

/// Separator between a metadata field and its value in an index term
pub const METADATA_SEPARATOR: char = ':';

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Tokenize text into lowercase words, in order, duplicates kept
///
/// # Example
///
/// ```
/// use docstore_core::tokenizer::tokenize;
///
/// let tokens = tokenize("The cat, the HAT!");
/// assert_eq!(tokens, vec!["the", "cat", "the", "hat"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !is_word_char(c))
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Count occurrences of each lowercase word
pub fn word_frequencies(text: &str) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for word in tokenize(text) {
        *counts.entry(word).or_insert(0) += 1;
    }
    counts
}

/// Case-fold a search keyword or prefix
pub fn normalize(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Index term for a metadata pair: `field:value`, lowercased
pub fn metadata_term(field: &str, value: &str) -> String {
    format!(
        "{}{}{}",
        field.to_lowercase(),
        METADATA_SEPARATOR,
        value.to_lowercase()
    )
}
