//! Query and chunk tokenization for the retrieval engine.
//!
//! Normalizes arbitrary text into comparable terms: lower-case, strip
//! everything that is not alphanumeric or whitespace, split on whitespace
//! runs, then drop short tokens and stop words. Duplicates and order are
//! retained because term-frequency counting depends on both.

/// Closed stop-word list: articles, conjunctions, common prepositions,
/// and copulas. These carry no discriminative relevance signal.
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by", "is",
    "are", "was", "were",
];

/// Minimum token length (in chars) to survive filtering.
const MIN_TOKEN_CHARS: usize = 3;

/// Tokenize text into normalized terms.
///
/// Pure and total: empty or symbol-only input yields an empty vector,
/// never an error.
///
/// # Example
///
/// ```rust
/// use cognivault::tokenize::tokenize;
///
/// let tokens = tokenize("The solar-powered CELLS, at 24% efficiency!");
/// assert_eq!(tokens, vec!["solarpowered", "cells", "efficiency"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS && !STOP_WORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}
