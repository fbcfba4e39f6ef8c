//! # CogniVault
//!
//! A local-first writing studio core: project persistence, a knowledge-base
//! ingestion pipeline, lexical retrieval over uploaded source material, and
//! AI-assisted chapter drafting.
//!
//! CogniVault keeps every project (book settings, chapters, uploaded
//! documents) in a single SQLite store. Uploaded files are split into
//! paragraph chunks and ranked against chapter context with TF-IDF, so
//! drafting a chapter grounds the generator in the most relevant source
//! facts without any external index.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌─────────────┐
//! │  Files      │──▶│   Ingest     │──▶│   Library   │
//! │ txt/md/pdf/ │   │ parse+chunk  │   │  Documents  │
//! │ docx/xlsx   │   │  +dedup      │   │  + Chunks   │
//! └────────────┘   └──────────────┘   └──────┬──────┘
//!                                            │
//!                        ┌───────────────────┤
//!                        ▼                   ▼
//!                  ┌───────────┐      ┌────────────┐
//!                  │  Search    │      │  Project    │
//!                  │  TF-IDF    │      │  SQLite     │
//!                  └─────┬─────┘      └────────────┘
//!                        ▼
//!                  ┌───────────┐
//!                  │ Provider   │
//!                  │ Gemini/OR  │
//!                  └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cv init                              # create the project store
//! cv projects new "Orbital Dawn"       # create a project
//! cv add ./research --project <id>     # ingest source material
//! cv search "solar efficiency" --project <id>
//! cv outline --project <id>            # generate a chapter outline
//! cv write <chapter-id> --project <id> # draft a chapter
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`tokenize`] | Query/chunk tokenization |
//! | [`chunk`] | Paragraph chunking |
//! | [`search`] | TF-IDF relevance ranking |
//! | [`library`] | In-session document collection |
//! | [`parse`] | File content extraction (text, pdf, docx, xlsx) |
//! | [`ingest`] | File and directory ingestion |
//! | [`history`] | Generic undo/redo stack |
//! | [`db`] | SQLite connection and migrations |
//! | [`project`] | Project persistence |
//! | [`provider`] | AI generation backends |

pub mod chunk;
pub mod config;
pub mod db;
pub mod history;
pub mod ingest;
pub mod library;
pub mod models;
pub mod parse;
pub mod project;
pub mod provider;
pub mod search;
pub mod tokenize;
