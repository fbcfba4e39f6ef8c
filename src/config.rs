use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Path to the SQLite project store.
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Maximum results per query. The editor surface shows 5.
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            result_limit: default_result_limit(),
        }
    }
}

fn default_result_limit() -> usize {
    crate::search::DEFAULT_RESULT_LIMIT
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec![
        "**/*.md".to_string(),
        "**/*.txt".to_string(),
        "**/*.pdf".to_string(),
        "**/*.docx".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    /// `"gemini"` or `"openrouter"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model override; each provider has its own default.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_max_retries() -> u32 {
    5
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.retrieval.result_limit == 0 {
        anyhow::bail!("retrieval.result_limit must be >= 1");
    }

    match config.ai.provider.as_str() {
        "gemini" | "openrouter" => {}
        other => anyhow::bail!(
            "Unknown AI provider: '{}'. Must be gemini or openrouter.",
            other
        ),
    }

    Ok(config)
}
