//! Knowledge-base ingestion: files and directories into [`Document`]s.
//!
//! Coordinates the upload flow: parse → chunk → dedup-hash → add to the
//! session [`Library`]. Directory ingestion walks the tree with the
//! configured include/exclude globs (deterministic path order); per-file
//! parse failures are non-fatal there and reported in the summary.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use globset::{Glob, GlobSet, GlobSetBuilder};
use sha2::{Digest, Sha256};
use std::path::Path;
use uuid::Uuid;
use walkdir::WalkDir;

use crate::chunk::chunk_text;
use crate::config::IngestConfig;
use crate::library::Library;
use crate::models::Document;
use crate::parse::parse_file;

/// Outcome of one ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Ids of documents added, in ingestion order.
    pub added: Vec<String>,
    /// Paths skipped because an identical document already exists.
    pub duplicates: Vec<String>,
    /// Paths that failed to parse, with the reason.
    pub failures: Vec<(String, String)>,
}

/// Ingest a single file or a directory tree into the library.
pub fn ingest_path(config: &IngestConfig, path: &Path, library: &mut Library) -> Result<IngestReport> {
    if !path.exists() {
        bail!("No such file or directory: {}", path.display());
    }
    let mut report = IngestReport::default();
    if path.is_dir() {
        ingest_directory(config, path, library, &mut report)?;
    } else {
        // An explicitly named file is parsed unconditionally; failure is fatal.
        let doc = document_from_file(path)
            .with_context(|| format!("Failed to ingest {}", path.display()))?;
        add_document(doc, path, library, &mut report);
    }
    Ok(report)
}

fn ingest_directory(
    config: &IngestConfig,
    root: &Path,
    library: &mut Library,
    report: &mut IngestReport,
) -> Result<()> {
    let include = build_globset(&config.include_globs)?;
    let exclude = build_globset(&config.exclude_globs)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(config.follow_symlinks) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();
        if exclude.is_match(&rel_str) || !include.is_match(&rel_str) {
            continue;
        }
        files.push(path.to_path_buf());
    }
    // Deterministic ingestion (and thus corpus traversal) order.
    files.sort();

    for path in files {
        match document_from_file(&path) {
            Ok(doc) => add_document(doc, &path, library, report),
            Err(e) => report
                .failures
                .push((path.display().to_string(), e.to_string())),
        }
    }
    Ok(())
}

fn add_document(doc: Document, path: &Path, library: &mut Library, report: &mut IngestReport) {
    if library.find_by_hash(&doc.dedup_hash).is_some() {
        report.duplicates.push(path.display().to_string());
        return;
    }
    report.added.push(doc.id.clone());
    library.add(doc);
}

/// Build a [`Document`] from one file: parse, assign a fresh id, chunk.
pub fn document_from_file(path: &Path) -> Result<Document> {
    let parsed = parse_file(path)?;
    let id = Uuid::new_v4().to_string();
    let chunks = chunk_text(&id, &parsed.content);

    let mut hasher = Sha256::new();
    hasher.update(parsed.content.as_bytes());
    let dedup_hash = format!("{:x}", hasher.finalize());

    let title = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    Ok(Document {
        id,
        title,
        kind: parsed.kind,
        content: parsed.content,
        chunks,
        uploaded_at: Utc::now(),
        dedup_hash,
    })
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
