//! Core data models used throughout CogniVault.
//!
//! These types represent the knowledge base (documents and their chunks),
//! the transient search results produced by the retrieval engine, and the
//! manuscript side of a project (book configuration and chapters).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Broad classification of an uploaded reference file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Text,
    Markdown,
    Code,
}

/// An uploaded reference document in the knowledge base.
///
/// A document exclusively owns its chunks; removing the document removes
/// them with it. `id` must be unique for the lifetime of the corpus
/// (ingestion assigns a fresh UUID v4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub kind: DocumentKind,
    /// Full decoded text as parsed from the uploaded file.
    pub content: String,
    /// Paragraph chunks in document order, ordinals contiguous from 0.
    pub chunks: Vec<Chunk>,
    pub uploaded_at: DateTime<Utc>,
    /// SHA-256 of `content`, used to skip re-ingesting identical uploads.
    pub dedup_hash: String,
}

/// A contiguous, non-empty paragraph-level fragment of a document.
///
/// `id` is derived deterministically from the owning document id and the
/// ordinal (`"{doc_id}-chunk-{index}"`), which keeps it unique across the
/// corpus as long as document ids are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub index: usize,
    pub content: String,
}

/// A scored chunk returned from the retrieval engine.
///
/// Pure view data: produced fresh per query, never persisted. The score is
/// an unbounded non-negative TF-IDF sum, not normalized to `[0, 1]`.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk: Chunk,
    pub score: f64,
    /// Title of the owning document, or `"Unknown Document"` when the
    /// document cannot be found in the supplied collection.
    pub doc_title: String,
}

/// Drafting state of a chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterStatus {
    Empty,
    Draft,
    Complete,
}

/// One chapter of the manuscript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    pub id: String,
    pub title: String,
    /// User instruction for this chapter; drives retrieval and generation.
    pub summary: String,
    pub content: String,
    pub word_count: usize,
    pub status: ChapterStatus,
}

impl Chapter {
    /// Create an empty chapter from an outline entry.
    pub fn new(title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            summary: summary.into(),
            content: String::new(),
            word_count: 0,
            status: ChapterStatus::Empty,
        }
    }

    /// Replace the chapter body, recomputing the word count.
    pub fn set_content(&mut self, text: String) {
        self.word_count = text.split_whitespace().count();
        self.status = if self.word_count == 0 {
            ChapterStatus::Empty
        } else {
            ChapterStatus::Draft
        };
        self.content = text;
    }
}

/// Global book/project settings supplied by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookConfig {
    pub title: String,
    pub genre: String,
    pub target_audience: String,
    /// e.g. "Dark, Gritty" or "Optimistic".
    pub tone: String,
    /// World building, character backstories.
    pub background: String,
    /// e.g. "First Person (Protagonist)" or "Third Person Omniscient".
    pub perspective: String,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            title: "New Project".to_string(),
            genre: "Sci-Fi".to_string(),
            target_audience: "Adult".to_string(),
            tone: "Serious, Analytical".to_string(),
            background: String::new(),
            perspective: "Third Person Limited".to_string(),
        }
    }
}

/// Everything persisted for one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectData {
    pub id: String,
    pub last_modified: i64,
    pub book: BookConfig,
    pub chapters: Vec<Chapter>,
    pub documents: Vec<Document>,
}

impl ProjectData {
    /// A fresh project with default book settings and an empty corpus.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            last_modified: Utc::now().timestamp(),
            book: BookConfig::default(),
            chapters: Vec::new(),
            documents: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_content_updates_word_count_and_status() {
        let mut ch = Chapter::new("One", "Opening");
        assert_eq!(ch.status, ChapterStatus::Empty);

        ch.set_content("Three word draft".to_string());
        assert_eq!(ch.word_count, 3);
        assert_eq!(ch.status, ChapterStatus::Draft);

        ch.set_content(String::new());
        assert_eq!(ch.word_count, 0);
        assert_eq!(ch.status, ChapterStatus::Empty);
    }
}
