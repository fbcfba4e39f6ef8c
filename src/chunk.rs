//! Paragraph-boundary text chunker.
//!
//! Splits an uploaded document's text into [`Chunk`]s on blank-line
//! boundaries so each paragraph can be scored independently by the
//! retrieval engine.
//!
//! # Algorithm
//!
//! 1. Split the text wherever one or more blank lines separate paragraphs
//!    (a line containing only whitespace counts as blank).
//! 2. Trim each paragraph; discard paragraphs that trim to empty.
//! 3. Number the survivors contiguously from 0 — discarded paragraphs
//!    leave no gaps.
//! 4. Derive each chunk id as `"{doc_id}-chunk-{index}"`.
//!
//! # Example
//!
//! ```rust
//! use cognivault::chunk::chunk_text;
//!
//! let chunks = chunk_text("doc-123", "Hello world.\n\nSecond paragraph.");
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[1].index, 1);
//! ```

use crate::models::Chunk;

/// Split text into paragraph chunks for one document.
///
/// Pure function of its inputs, no error conditions: degenerate input
/// (empty string, all whitespace) yields an empty vector, and text with
/// no blank-line separators yields exactly one chunk of the whole
/// trimmed text.
pub fn chunk_text(document_id: &str, text: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut paragraph = String::new();

    let mut flush = |buf: &mut String, chunks: &mut Vec<Chunk>| {
        let trimmed = buf.trim();
        if !trimmed.is_empty() {
            chunks.push(make_chunk(document_id, chunks.len(), trimmed));
        }
        buf.clear();
    };

    for line in text.lines() {
        if line.trim().is_empty() {
            flush(&mut paragraph, &mut chunks);
        } else {
            if !paragraph.is_empty() {
                paragraph.push('\n');
            }
            paragraph.push_str(line);
        }
    }
    flush(&mut paragraph, &mut chunks);

    chunks
}

fn make_chunk(document_id: &str, index: usize, content: &str) -> Chunk {
    Chunk {
        id: format!("{}-chunk-{}", document_id, index),
        document_id: document_id.to_string(),
        index,
        content: content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_whitespace_input_yield_no_chunks() {
        assert!(chunk_text("doc1", "").is_empty());
        assert!(chunk_text("doc1", "   \n \t \n\n  ").is_empty());
    }

    #[test]
    fn text_without_separators_is_a_single_chunk() {
        let chunks = chunk_text("doc1", "  One paragraph.\nStill the same paragraph.  ");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(
            chunks[0].content,
            "One paragraph.\nStill the same paragraph."
        );
    }

    #[test]
    fn splits_on_blank_lines_and_trims() {
        let text = "Solar cells reach 24% efficiency.\n\nDeployment begins in Nevada.";
        let chunks = chunk_text("doc1", text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "Solar cells reach 24% efficiency.");
        assert_eq!(chunks[1].content, "Deployment begins in Nevada.");
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[1].index, 1);
    }

    #[test]
    fn whitespace_only_lines_separate_paragraphs() {
        let chunks = chunk_text("doc1", "Alpha\n   \nBeta\n\t\nGamma");
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn discarded_paragraphs_leave_no_ordinal_gaps() {
        let text = "First.\n\n\n\n   \n\nSecond.\n\n\n\nThird.";
        let chunks = chunk_text("doc1", text);
        assert_eq!(chunks.len(), 3);
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.index, i, "ordinal mismatch at position {}", i);
        }
    }

    #[test]
    fn chunk_ids_are_deterministic() {
        let chunks = chunk_text("abc", "One.\n\nTwo.");
        assert_eq!(chunks[0].id, "abc-chunk-0");
        assert_eq!(chunks[1].id, "abc-chunk-1");
        assert_eq!(chunks[0].document_id, "abc");
    }

    #[test]
    fn no_chunk_has_empty_content() {
        let text = "  \n\nA\n\n \n\nB\n\n";
        for c in chunk_text("doc1", text) {
            assert!(!c.content.trim().is_empty());
        }
    }
}
