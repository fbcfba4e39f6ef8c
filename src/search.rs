//! TF-IDF relevance ranking over the in-memory chunk corpus.
//!
//! The ranker is synchronous, stateless, and recomputed from scratch on
//! every call: the corpus is whatever document collection the caller
//! supplies, flattened to chunks. Callers debounce their own query
//! triggers; a superseding call simply produces a fresher result.
//!
//! # Scoring
//!
//! For each query token `t` and chunk `c`:
//!
//! ```text
//! tf(t, c)  = count of t among c's tokens / total tokens in c
//! idf(t)    = ln(corpus_size / df(t)),  0 when df(t) == 0
//! score(c)  = Σ tf(t, c) × idf(t)  over all query tokens
//! ```
//!
//! `df(t)` counts chunks whose **raw lowercased content contains `t` as a
//! substring**. This is deliberately not a tokenized-membership check: it
//! can match inside larger words ("nevada" inside "nevadan"). The behavior
//! is observable and documented, so it is preserved rather than fixed.
//! Document frequencies are computed once per distinct query token, which
//! avoids rescanning the corpus per chunk without changing the semantics.
//!
//! Duplicate query tokens are scored independently, amplifying their
//! contribution additively.

use std::collections::HashMap;

use crate::models::{Chapter, Chunk, Document, SearchResult};
use crate::tokenize::tokenize;

/// Maximum results returned by [`search_documents`].
pub const DEFAULT_RESULT_LIMIT: usize = 5;

/// Title substituted when a chunk's owning document is not in the
/// supplied collection. A defined fallback, not a failure.
pub const UNKNOWN_DOCUMENT_TITLE: &str = "Unknown Document";

/// Tail of chapter content (in chars) folded into the synthesized query.
const QUERY_CONTENT_TAIL_CHARS: usize = 200;

/// Rank every chunk in the supplied documents against a query.
///
/// Returns at most [`DEFAULT_RESULT_LIMIT`] results, highest score first.
pub fn search_documents(query: &str, documents: &[Document]) -> Vec<SearchResult> {
    rank_chunks(query, documents, DEFAULT_RESULT_LIMIT)
}

/// Rank chunks with an explicit result limit.
///
/// Degenerate inputs short-circuit: a query that tokenizes to nothing
/// (empty, or all stop words / short tokens) returns an empty list with
/// no scoring work, as does an empty corpus. Chunks with a score of
/// exactly zero are excluded. The sort is stable, so ties keep corpus
/// traversal order: documents in supplied order, chunks in ordinal order.
pub fn rank_chunks(query: &str, documents: &[Document], limit: usize) -> Vec<SearchResult> {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return Vec::new();
    }

    let corpus: Vec<&Chunk> = documents.iter().flat_map(|d| d.chunks.iter()).collect();
    if corpus.is_empty() {
        return Vec::new();
    }

    let titles: HashMap<&str, &str> = documents
        .iter()
        .map(|d| (d.id.as_str(), d.title.as_str()))
        .collect();

    // df per distinct query token, substring containment on raw
    // lowercased chunk content.
    let mut document_frequency: HashMap<&str, usize> = HashMap::new();
    for token in &query_tokens {
        document_frequency.entry(token.as_str()).or_insert_with(|| {
            corpus
                .iter()
                .filter(|c| c.content.to_lowercase().contains(token.as_str()))
                .count()
        });
    }

    let corpus_size = corpus.len() as f64;
    let mut results: Vec<SearchResult> = Vec::new();

    for chunk in &corpus {
        let chunk_tokens = tokenize(&chunk.content);
        if chunk_tokens.is_empty() {
            continue;
        }
        let total = chunk_tokens.len() as f64;

        let mut score = 0.0;
        for token in &query_tokens {
            let count = chunk_tokens.iter().filter(|t| *t == token).count();
            if count == 0 {
                continue;
            }
            let tf = count as f64 / total;
            let df = document_frequency[token.as_str()];
            if df == 0 {
                // Guards ln of a zero denominator; the token appears in
                // this chunk's token stream but in no raw content string.
                continue;
            }
            score += tf * (corpus_size / df as f64).ln();
        }

        if score > 0.0 {
            let doc_title = titles
                .get(chunk.document_id.as_str())
                .copied()
                .unwrap_or(UNKNOWN_DOCUMENT_TITLE)
                .to_string();
            results.push(SearchResult {
                chunk: (*chunk).clone(),
                score,
                doc_title,
            });
        }
    }

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    results.truncate(limit);
    results
}

/// Synthesize the retrieval query for a chapter being drafted.
///
/// Combines the chapter title, the user's summary instruction, and the
/// trailing ~200 chars of content (what the user is writing right now).
pub fn chapter_query(chapter: &Chapter) -> String {
    let tail_start = chapter
        .content
        .char_indices()
        .rev()
        .nth(QUERY_CONTENT_TAIL_CHARS - 1)
        .map(|(i, _)| i)
        .unwrap_or(0);
    format!(
        "{} {} {}",
        chapter.title,
        chapter.summary,
        &chapter.content[tail_start..]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::chunk_text;
    use crate::models::DocumentKind;
    use chrono::Utc;

    fn make_doc(id: &str, title: &str, text: &str) -> Document {
        Document {
            id: id.to_string(),
            title: title.to_string(),
            kind: DocumentKind::Text,
            content: text.to_string(),
            chunks: chunk_text(id, text),
            uploaded_at: Utc::now(),
            dedup_hash: String::new(),
        }
    }

    #[test]
    fn empty_query_returns_nothing() {
        let docs = vec![make_doc("d1", "Doc", "solar efficiency nevada desert")];
        assert!(search_documents("", &docs).is_empty());
        assert!(search_documents("   ", &docs).is_empty());
    }

    #[test]
    fn stop_word_only_query_returns_nothing() {
        let docs = vec![make_doc("d1", "Doc", "solar efficiency nevada desert")];
        assert!(search_documents("the and of", &docs).is_empty());
    }

    #[test]
    fn empty_corpus_returns_nothing() {
        assert!(search_documents("solar", &[]).is_empty());
        let docs = vec![make_doc("d1", "Doc", "")];
        assert!(search_documents("solar", &docs).is_empty());
    }

    #[test]
    fn matching_chunk_scores_positive_and_resolves_title() {
        let docs = vec![
            make_doc("d1", "Energy Notes", "solar efficiency nevada desert"),
            make_doc("d2", "Unrelated", "battery thermal throttling"),
        ];
        let results = search_documents("solar efficiency", &docs);
        assert_eq!(results.len(), 1);
        assert!(results[0].score > 0.0);
        assert_eq!(results[0].doc_title, "Energy Notes");
        assert_eq!(results[0].chunk.document_id, "d1");
    }

    #[test]
    fn term_present_in_every_chunk_carries_no_weight() {
        // With a one-chunk corpus every matching term has df == corpus
        // size, so idf = ln(1) = 0 and the zero-score chunk is excluded.
        // Matches the reference behavior exactly.
        let docs = vec![make_doc("d1", "Only", "solar efficiency nevada desert")];
        assert!(search_documents("solar efficiency", &docs).is_empty());
    }

    #[test]
    fn non_matching_corpus_returns_nothing() {
        let docs = vec![
            make_doc("d1", "A", "battery thermal throttling"),
            make_doc("d2", "B", "kubernetes deployment pipeline"),
        ];
        assert!(search_documents("solar efficiency", &docs).is_empty());
    }

    #[test]
    fn results_are_sorted_descending_and_capped() {
        // "solar" in every chunk gets a low idf; chunks with more matching
        // terms or denser matches score higher.
        let text = (0..8)
            .map(|i| format!("solar reading number {}", i))
            .collect::<Vec<_>>()
            .join("\n\n");
        let mut docs = vec![make_doc("d1", "Logs", &text)];
        docs.push(make_doc("d2", "Dense", "solar solar solar"));
        // A chunk without the term keeps df below the corpus size.
        docs.push(make_doc("d3", "Other", "wind turbines offshore"));

        let results = rank_chunks("solar", &docs, DEFAULT_RESULT_LIMIT);
        assert!(results.len() <= DEFAULT_RESULT_LIMIT);
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        // The all-"solar" chunk has tf = 1.0, the highest possible.
        assert_eq!(results[0].chunk.document_id, "d2");
    }

    #[test]
    fn higher_term_frequency_ranks_first() {
        let docs = vec![
            make_doc("d1", "Sparse", "nevada mentioned once among many other words here"),
            make_doc("d2", "Dense", "nevada nevada nevada"),
            make_doc("d3", "Other", "completely different subject matter"),
        ];
        let results = search_documents("nevada", &docs);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].doc_title, "Dense");
    }

    #[test]
    fn rarer_terms_weigh_more_than_common_ones() {
        let docs = vec![
            make_doc("d1", "A", "solar panels everywhere"),
            make_doc("d2", "B", "solar output rising"),
            make_doc("d3", "C", "solar and geothermal mixed"),
            make_doc("d4", "D", "geothermal vents"),
        ];
        // "geothermal" (df 2) is rarer than "solar" (df 3); the chunk
        // matching only geothermal should outrank one matching only solar
        // at comparable term frequency.
        let results = search_documents("solar geothermal", &docs);
        assert!(!results.is_empty());
        let top = &results[0];
        assert!(top.chunk.content.contains("geothermal"));
    }

    #[test]
    fn duplicate_query_tokens_amplify_additively() {
        let docs = vec![
            make_doc("d1", "A", "solar panels on the roof"),
            make_doc("d2", "B", "wind turbines offshore spinning"),
        ];
        let single = search_documents("solar wind", &docs);
        let doubled = search_documents("solar solar wind", &docs);
        let score_of = |rs: &[SearchResult], id: &str| {
            rs.iter()
                .find(|r| r.chunk.document_id == id)
                .map(|r| r.score)
                .unwrap()
        };
        assert!(
            score_of(&doubled, "d1") > score_of(&single, "d1") * 1.5,
            "doubled token should roughly double the solar chunk's score"
        );
        assert!((score_of(&doubled, "d2") - score_of(&single, "d2")).abs() < 1e-12);
    }

    #[test]
    fn idf_uses_substring_containment_on_raw_content() {
        // "nevada" tokenizes out of neither chunk below, but appears as a
        // substring of "nevadan", lowering its rarity weight.
        let docs = vec![
            make_doc("d1", "A", "nevada desert site"),
            make_doc("d2", "B", "a nevadan landmark"),
            make_doc("d3", "C", "unrelated text entirely"),
        ];
        let results = search_documents("nevada", &docs);
        assert_eq!(results.len(), 1);
        // df = 2 of 3 chunks (substring match in d2), so idf = ln(3/2).
        let expected = (1.0 / 3.0) * (3.0f64 / 2.0).ln();
        assert!((results[0].score - expected).abs() < 1e-12);
    }

    #[test]
    fn unknown_document_title_fallback() {
        let mut doc = make_doc("d1", "Known", "solar panels");
        // Re-home the chunks under an id absent from the collection.
        for c in &mut doc.chunks {
            c.document_id = "missing".to_string();
        }
        let other = make_doc("d2", "Other", "wind turbines offshore");
        let results = search_documents("solar", &[doc, other]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].doc_title, UNKNOWN_DOCUMENT_TITLE);
    }

    #[test]
    fn ties_keep_corpus_traversal_order() {
        let docs = vec![
            make_doc("d1", "First", "solar alpha"),
            make_doc("d2", "Second", "solar beta"),
            make_doc("d3", "Third", "gamma delta epsilon"),
        ];
        let results = search_documents("solar", &docs);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.document_id, "d1");
        assert_eq!(results[1].chunk.document_id, "d2");
    }

    #[test]
    fn chapter_query_combines_title_summary_and_tail() {
        let mut ch = Chapter::new("Desert Dawn", "Introduce the solar array");
        ch.set_content("x".repeat(300));
        let q = chapter_query(&ch);
        assert!(q.starts_with("Desert Dawn Introduce the solar array "));
        assert!(q.ends_with(&"x".repeat(200)));
        assert!(!q.contains(&"x".repeat(201)));
    }

    #[test]
    fn chapter_query_handles_short_and_multibyte_content() {
        let mut ch = Chapter::new("T", "S");
        ch.set_content("héllo wörld".to_string());
        let q = chapter_query(&ch);
        assert!(q.ends_with("héllo wörld"));
    }
}
