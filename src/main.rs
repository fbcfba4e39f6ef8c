//! # CogniVault CLI (`cv`)
//!
//! The `cv` binary is the primary interface for CogniVault. It provides
//! commands for store initialization, project management, knowledge-base
//! ingestion, retrieval, and AI-assisted drafting.
//!
//! ## Usage
//!
//! ```bash
//! cv --config ./config/cv.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `cv init` | Create the SQLite project store and run schema migrations |
//! | `cv projects list` | List all projects, most recently modified first |
//! | `cv projects new "<title>"` | Create a new project |
//! | `cv projects rm <id>` | Delete a project |
//! | `cv add <path>` | Ingest a file or directory into a project's knowledge base |
//! | `cv rm <doc-id>` | Remove a document from the knowledge base |
//! | `cv docs` | List a project's documents |
//! | `cv get <doc-id>` | Print a document's content and chunks |
//! | `cv search "<query>"` | Rank knowledge-base chunks against a query |
//! | `cv outline` | Generate a chapter outline from the source material |
//! | `cv write <chapter-id>` | Draft one chapter, grounded in retrieved facts |

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cognivault::config::{self, Config};
use cognivault::ingest;
use cognivault::library::Library;
use cognivault::models::{Chapter, ProjectData};
use cognivault::project::ProjectStore;
use cognivault::provider::{self, GenerateMode};
use cognivault::search;

/// CogniVault CLI — a local-first writing studio with lexical retrieval
/// over uploaded source material.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/cv.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "cv",
    about = "CogniVault — a local-first writing studio with TF-IDF retrieval over source material",
    version,
    long_about = "CogniVault keeps writing projects (book settings, chapters, uploaded reference \
    documents) in a local SQLite store. Uploaded files are split into paragraph chunks and ranked \
    against chapter context with TF-IDF, grounding AI-assisted drafting in the user's own sources."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/cv.toml`. Store, retrieval, ingestion, and AI
    /// provider settings are read from this file.
    #[arg(long, global = true, default_value = "./config/cv.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the project store.
    ///
    /// Creates the SQLite database file and the projects table. This
    /// command is idempotent — running it multiple times is safe.
    Init,

    /// Manage projects.
    Projects {
        #[command(subcommand)]
        action: ProjectsAction,
    },

    /// Ingest a file or directory into a project's knowledge base.
    ///
    /// Files are parsed by extension (txt, md, code, pdf, docx, xlsx),
    /// split into paragraph chunks, and deduplicated by content hash.
    /// Directory ingestion applies the configured include/exclude globs;
    /// per-file parse failures there are reported but non-fatal.
    Add {
        /// File or directory to ingest.
        path: PathBuf,

        /// Project id.
        #[arg(long)]
        project: String,
    },

    /// Remove a document (and its chunks) from the knowledge base.
    Rm {
        /// Document id.
        doc_id: String,

        /// Project id.
        #[arg(long)]
        project: String,
    },

    /// List a project's knowledge-base documents.
    Docs {
        /// Project id.
        #[arg(long)]
        project: String,
    },

    /// Print one document's content and chunks.
    Get {
        /// Document id.
        doc_id: String,

        /// Project id.
        #[arg(long)]
        project: String,
    },

    /// Rank knowledge-base chunks against a free-text query.
    ///
    /// Uses the same TF-IDF scoring the drafting flow uses: chunks that
    /// score zero are omitted, results are sorted by descending score.
    Search {
        /// The search query string.
        query: String,

        /// Project id.
        #[arg(long)]
        project: String,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Generate a chapter outline from the book settings and source material.
    ///
    /// Replaces the project's current chapter list with freshly planned
    /// chapters (titles and summaries; no prose).
    Outline {
        /// Project id.
        #[arg(long)]
        project: String,

        /// Number of chapters to plan.
        #[arg(long, default_value_t = 8)]
        chapters: usize,
    },

    /// Draft one chapter with the configured AI provider.
    ///
    /// Retrieves the most relevant source chunks for the chapter (title,
    /// summary, and the tail of any existing content), folds in the end of
    /// the previous chapter for continuity, and writes the result back to
    /// the project.
    Write {
        /// Chapter id.
        chapter_id: String,

        /// Project id.
        #[arg(long)]
        project: String,

        /// Generation mode: `full` (prose) or `outline` (beat sheet).
        #[arg(long, default_value = "full")]
        mode: String,
    },
}

/// Project management subcommands.
#[derive(Subcommand)]
enum ProjectsAction {
    /// List all projects, most recently modified first.
    List,
    /// Create a new project with default book settings.
    New {
        /// Book title for the new project.
        title: String,
    },
    /// Delete a project and everything it contains.
    Rm {
        /// Project id.
        id: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    let store = ProjectStore::open(&cfg.store.path)?;

    match cli.command {
        Commands::Init => {
            // Opening the store already ran the migrations.
            println!("Project store initialized at {}", cfg.store.path.display());
        }
        Commands::Projects { action } => match action {
            ProjectsAction::List => run_projects_list(&store)?,
            ProjectsAction::New { title } => run_projects_new(&store, &title)?,
            ProjectsAction::Rm { id } => {
                if store.delete(&id)? {
                    println!("Deleted project {}", id);
                } else {
                    bail!("No such project: {}", id);
                }
            }
        },
        Commands::Add { path, project } => run_add(&cfg, &store, &project, &path)?,
        Commands::Rm { doc_id, project } => run_rm(&store, &project, &doc_id)?,
        Commands::Docs { project } => run_docs(&store, &project)?,
        Commands::Get { doc_id, project } => run_get(&store, &project, &doc_id)?,
        Commands::Search {
            query,
            project,
            limit,
        } => run_search(&cfg, &store, &project, &query, limit)?,
        Commands::Outline { project, chapters } => run_outline(&cfg, &store, &project, chapters)?,
        Commands::Write {
            chapter_id,
            project,
            mode,
        } => run_write(&cfg, &store, &project, &chapter_id, &mode)?,
    }

    Ok(())
}

fn require_project(store: &ProjectStore, id: &str) -> Result<ProjectData> {
    store
        .load(id)?
        .with_context(|| format!("No such project: {}", id))
}

fn run_projects_list(store: &ProjectStore) -> Result<()> {
    let projects = store.list()?;
    if projects.is_empty() {
        println!("No projects. Create one with: cv projects new \"<title>\"");
        return Ok(());
    }
    println!("Projects ({}):", projects.len());
    for p in projects {
        println!("  {}  {}  {}", p.id, format_ts(p.last_modified), p.title);
    }
    Ok(())
}

fn run_projects_new(store: &ProjectStore, title: &str) -> Result<()> {
    let mut project = ProjectData::new(uuid::Uuid::new_v4().to_string());
    project.book.title = title.to_string();
    store.save(&project)?;
    println!("Created project {}", project.id);
    println!("  title: {}", project.book.title);
    Ok(())
}

fn run_add(cfg: &Config, store: &ProjectStore, project_id: &str, path: &PathBuf) -> Result<()> {
    let mut project = require_project(store, project_id)?;
    let mut library = Library::from_documents(std::mem::take(&mut project.documents));

    let report = ingest::ingest_path(&cfg.ingest, path, &mut library)?;
    project.documents = library.into_documents();
    store.save(&project)?;

    println!(
        "Ingested {} document(s) ({} duplicate(s) skipped, {} failure(s)).",
        report.added.len(),
        report.duplicates.len(),
        report.failures.len()
    );
    for id in &report.added {
        if let Some(doc) = project.documents.iter().find(|d| &d.id == id) {
            println!("  + {}  {} ({} chunks)", doc.id, doc.title, doc.chunks.len());
        }
    }
    for dup in &report.duplicates {
        println!("  = {} (already in knowledge base)", dup);
    }
    for (path, reason) in &report.failures {
        eprintln!("  ! {}: {}", path, reason);
    }
    Ok(())
}

fn run_rm(store: &ProjectStore, project_id: &str, doc_id: &str) -> Result<()> {
    let mut project = require_project(store, project_id)?;
    let mut library = Library::from_documents(std::mem::take(&mut project.documents));
    if library.remove(doc_id).is_none() {
        bail!("No such document: {}", doc_id);
    }
    project.documents = library.into_documents();
    store.save(&project)?;
    println!("Removed document {}", doc_id);
    Ok(())
}

fn run_docs(store: &ProjectStore, project_id: &str) -> Result<()> {
    let project = require_project(store, project_id)?;
    if project.documents.is_empty() {
        println!("Knowledge base is empty. Add sources with: cv add <path>");
        return Ok(());
    }
    println!("Documents ({}):", project.documents.len());
    for doc in &project.documents {
        println!(
            "  {}  {}  {:?}  {} chunks  {}",
            doc.id,
            doc.uploaded_at.format("%Y-%m-%d %H:%M"),
            doc.kind,
            doc.chunks.len(),
            doc.title
        );
    }
    Ok(())
}

fn run_get(store: &ProjectStore, project_id: &str, doc_id: &str) -> Result<()> {
    let project = require_project(store, project_id)?;
    let doc = project
        .documents
        .iter()
        .find(|d| d.id == doc_id)
        .with_context(|| format!("No such document: {}", doc_id))?;

    println!("--- Document ---");
    println!("id:          {}", doc.id);
    println!("title:       {}", doc.title);
    println!("kind:        {:?}", doc.kind);
    println!("uploaded_at: {}", doc.uploaded_at.format("%Y-%m-%dT%H:%M:%SZ"));
    println!();

    println!("--- Content ---");
    println!("{}", doc.content);
    println!();

    println!("--- Chunks ({}) ---", doc.chunks.len());
    for chunk in &doc.chunks {
        println!("[chunk {}]", chunk.index);
        println!("{}", chunk.content);
        println!();
    }
    Ok(())
}

fn run_search(
    cfg: &Config,
    store: &ProjectStore,
    project_id: &str,
    query: &str,
    limit: Option<usize>,
) -> Result<()> {
    let project = require_project(store, project_id)?;
    let limit = limit.unwrap_or(cfg.retrieval.result_limit);
    let results = search::rank_chunks(query, &project.documents, limit);

    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }
    println!("Results ({}):", results.len());
    for (i, r) in results.iter().enumerate() {
        println!(
            "{}. [{:.4}] {} ({})",
            i + 1,
            r.score,
            r.doc_title,
            r.chunk.id
        );
        println!("   {}", snippet(&r.chunk.content, 200));
    }
    Ok(())
}

fn run_outline(cfg: &Config, store: &ProjectStore, project_id: &str, chapters: usize) -> Result<()> {
    if chapters == 0 {
        bail!("--chapters must be >= 1");
    }
    let mut project = require_project(store, project_id)?;
    let provider = provider::create_provider(&cfg.ai)?;

    // Summarize the corpus for the planner: title plus the head of each
    // document's content.
    let source_context = if project.documents.is_empty() {
        "No source material uploaded.".to_string()
    } else {
        project
            .documents
            .iter()
            .map(|d| format!("Document: {}\n{}", d.title, snippet(&d.content, 500)))
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    println!(
        "Planning {} chapters with {}...",
        chapters,
        provider.name()
    );
    let plans = provider.generate_outline(&project.book, &source_context, chapters)?;
    if !project.chapters.is_empty() {
        println!(
            "Replacing existing outline ({} chapter(s)).",
            project.chapters.len()
        );
    }
    project.chapters = plans
        .into_iter()
        .map(|p| Chapter::new(p.title, p.summary))
        .collect();
    store.save(&project)?;

    println!("Outline ({} chapters):", project.chapters.len());
    for (i, ch) in project.chapters.iter().enumerate() {
        println!("{}. {} ({})", i + 1, ch.title, ch.id);
        println!("   {}", ch.summary);
    }
    Ok(())
}

fn run_write(
    cfg: &Config,
    store: &ProjectStore,
    project_id: &str,
    chapter_id: &str,
    mode: &str,
) -> Result<()> {
    let mode: GenerateMode = mode.parse()?;
    let mut project = require_project(store, project_id)?;
    let position = project
        .chapters
        .iter()
        .position(|c| c.id == chapter_id)
        .with_context(|| format!("No such chapter: {}", chapter_id))?;

    // Retrieval query: chapter title, summary, and the tail of any
    // existing draft.
    let query = search::chapter_query(&project.chapters[position]);
    let relevant = search::rank_chunks(&query, &project.documents, cfg.retrieval.result_limit);

    // Continuity: the end of the previous chapter's draft.
    let previous_context = if position == 0 {
        "This is the first chapter.".to_string()
    } else {
        let prev = &project.chapters[position - 1];
        if prev.content.is_empty() {
            format!("The previous chapter ({}) has not been drafted yet.", prev.title)
        } else {
            tail_chars(&prev.content, 2000).to_string()
        }
    };

    let provider = provider::create_provider(&cfg.ai)?;
    println!(
        "Drafting \"{}\" with {} ({} source fact(s))...",
        project.chapters[position].title,
        provider.name(),
        relevant.len()
    );
    let text = provider.write_chapter(
        &project.chapters[position],
        &project.book,
        &relevant,
        &previous_context,
        mode,
    )?;

    project.chapters[position].set_content(text);
    store.save(&project)?;

    let chapter = &project.chapters[position];
    println!();
    println!("--- {} ({} words) ---", chapter.title, chapter.word_count);
    println!("{}", chapter.content);
    Ok(())
}

/// First `max_chars` characters, with an ellipsis when truncated.
/// Newlines are flattened so list output stays one entry per line.
fn snippet(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

/// Last `max_chars` characters of `text`, on a char boundary.
fn tail_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().rev().nth(max_chars - 1) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
