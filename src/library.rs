//! In-memory knowledge-base collection for one editing session.
//!
//! The [`Library`] owns the session's documents (and through them their
//! chunks) in insertion order. The retrieval engine takes the collection
//! by reference on every query; there is no index to maintain, so removal
//! is just deletion — the next query sees a smaller corpus.

use crate::models::Document;

/// Ordered, owned collection of uploaded documents.
#[derive(Debug, Default)]
pub struct Library {
    documents: Vec<Document>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of an existing document list (e.g. a loaded project).
    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Add a document. Returns false (and leaves the collection unchanged)
    /// if a document with the same id is already present.
    pub fn add(&mut self, doc: Document) -> bool {
        if self.documents.iter().any(|d| d.id == doc.id) {
            return false;
        }
        self.documents.push(doc);
        true
    }

    /// Remove a document and its chunks. Returns the removed document.
    pub fn remove(&mut self, id: &str) -> Option<Document> {
        let pos = self.documents.iter().position(|d| d.id == id)?;
        Some(self.documents.remove(pos))
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Look up a document by content hash (used for upload dedup).
    pub fn find_by_hash(&self, hash: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.dedup_hash == hash)
    }

    /// Documents in insertion order. This is the corpus traversal order
    /// the ranker's tie-break preserves.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Total chunks across all documents (the scoring corpus size).
    pub fn chunk_count(&self) -> usize {
        self.documents.iter().map(|d| d.chunks.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::chunk_text;
    use crate::models::DocumentKind;
    use chrono::Utc;

    fn make_doc(id: &str, text: &str) -> Document {
        Document {
            id: id.to_string(),
            title: id.to_string(),
            kind: DocumentKind::Text,
            content: text.to_string(),
            chunks: chunk_text(id, text),
            uploaded_at: Utc::now(),
            dedup_hash: format!("hash-{}", id),
        }
    }

    #[test]
    fn add_rejects_duplicate_ids() {
        let mut lib = Library::new();
        assert!(lib.add(make_doc("d1", "alpha")));
        assert!(!lib.add(make_doc("d1", "beta")));
        assert_eq!(lib.len(), 1);
        assert_eq!(lib.get("d1").unwrap().content, "alpha");
    }

    #[test]
    fn remove_deletes_document_and_chunks() {
        let mut lib = Library::new();
        lib.add(make_doc("d1", "one\n\ntwo"));
        lib.add(make_doc("d2", "three"));
        assert_eq!(lib.chunk_count(), 3);

        let removed = lib.remove("d1").unwrap();
        assert_eq!(removed.chunks.len(), 2);
        assert_eq!(lib.chunk_count(), 1);
        assert!(lib.get("d1").is_none());
        assert!(lib.remove("d1").is_none());
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut lib = Library::new();
        for id in ["b", "a", "c"] {
            lib.add(make_doc(id, "text"));
        }
        let ids: Vec<&str> = lib.documents().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn find_by_hash_matches_dedup_hash() {
        let mut lib = Library::new();
        lib.add(make_doc("d1", "alpha"));
        assert!(lib.find_by_hash("hash-d1").is_some());
        assert!(lib.find_by_hash("hash-d2").is_none());
    }
}
