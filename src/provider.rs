//! AI provider abstraction and implementations.
//!
//! Defines the [`AiProvider`] trait and two concrete strategies selected
//! by configuration at construction time:
//! - **[`GeminiProvider`]** — Google Generative Language REST API.
//! - **[`OpenRouterProvider`]** — OpenAI-compatible `/chat/completions`.
//!
//! Both compose the same prompts (book settings, retrieved source facts,
//! chapter instructions) and differ only in wire format and auth.
//!
//! # Retry Strategy
//!
//! Transient failures use exponential backoff:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - Other 4xx (client error) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AiConfig;
use crate::models::{BookConfig, Chapter, SearchResult};

/// System prompt shared by every provider call.
pub const SYSTEM_PROMPT: &str = "You are the Neural Link for CogniVault.\n\
    Your goal is to assist the user in writing by strictly using the provided context.\n\
    - If context is provided, prioritize it over your internal knowledge.\n\
    - Maintain the user's tone and style.\n\
    - Be concise and professional.";

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_OPENROUTER_MODEL: &str = "mistralai/mistral-7b-instruct:free";

/// Cap on source-material context folded into the outline prompt.
const SOURCE_CONTEXT_MAX_CHARS: usize = 10_000;

/// Whether a chapter call drafts full prose or a beat-sheet outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateMode {
    Full,
    Outline,
}

impl std::str::FromStr for GenerateMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "full" => Ok(GenerateMode::Full),
            "outline" => Ok(GenerateMode::Outline),
            other => bail!("Unknown generate mode: {}. Use full or outline.", other),
        }
    }
}

/// One entry of a generated book outline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterPlan {
    pub title: String,
    pub summary: String,
}

/// Strategy interface for text generation backends.
pub trait AiProvider {
    /// Human-readable provider name for reporting.
    fn name(&self) -> &str;

    /// Produce a chapter outline from the book settings and a summary of
    /// the uploaded source material.
    fn generate_outline(
        &self,
        book: &BookConfig,
        source_context: &str,
        chapter_count: usize,
    ) -> Result<Vec<ChapterPlan>>;

    /// Draft one chapter, weaving in the retrieved source facts.
    fn write_chapter(
        &self,
        chapter: &Chapter,
        book: &BookConfig,
        relevant_sources: &[SearchResult],
        previous_context: &str,
        mode: GenerateMode,
    ) -> Result<String>;
}

/// Create the provider selected by `[ai].provider` in the config.
pub fn create_provider(config: &AiConfig) -> Result<Box<dyn AiProvider>> {
    match config.provider.as_str() {
        "gemini" => Ok(Box::new(GeminiProvider::new(config))),
        "openrouter" => Ok(Box::new(OpenRouterProvider::new(config))),
        other => bail!("Unknown AI provider: {}", other),
    }
}

// ============ Prompt composition ============

fn outline_prompt(book: &BookConfig, source_context: &str, chapter_count: usize) -> String {
    let truncated: String = source_context
        .chars()
        .take(SOURCE_CONTEXT_MAX_CHARS)
        .collect();
    format!(
        "You are an expert book architect.\n\n\
        BOOK DETAILS:\n\
        Title: {}\n\
        Genre: {}\n\
        Tone: {}\n\
        Perspective: {}\n\
        Background Info: {}\n\n\
        SOURCE MATERIAL SUMMARY:\n{}\n\n\
        TASK:\n\
        Create a detailed chapter outline with exactly {} chapters.\n\
        Return ONLY a JSON array of objects under the key \"chapters\". Each object must have:\n\
        - \"title\": string (Creative chapter title)\n\
        - \"summary\": string (Instruction for what happens in this chapter, referencing the source material where relevant)\n\n\
        Example JSON format:\n\
        {{\"chapters\": [{{\"title\": \"Chapter 1\", \"summary\": \"...\"}}]}}",
        book.title, book.genre, book.tone, book.perspective, book.background, truncated, chapter_count
    )
}

fn chapter_prompt(
    chapter: &Chapter,
    book: &BookConfig,
    relevant_sources: &[SearchResult],
    previous_context: &str,
    mode: GenerateMode,
) -> String {
    let source_text = relevant_sources
        .iter()
        .enumerate()
        .map(|(i, r)| format!("[Fact {} from {}]: {}", i + 1, r.doc_title, r.chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n");

    let task = match mode {
        GenerateMode::Outline => {
            "Create a detailed beat-sheet or scene outline for this chapter.\n\
            - Break down the chapter into 3-5 distinct scenes.\n\
            - Highlight key emotional beats, character decisions, and plot progressions.\n\
            - Explicitly note where specific SOURCE MATERIAL facts should be integrated.\n\
            - Suggest specific dialogue lines or sensory details to include later.\n\
            - Do not write the full prose yet. Format as a structured list."
                .to_string()
        }
        GenerateMode::Full => format!(
            "Write the FULL PROSE content for this chapter.\n\
            - Target Word Count: Approximately 1000 words (do not exceed 1200).\n\
            - Focus deeply on the emotions and perspective defined in the config.\n\
            - Seamlessly weave in the provided Source Material facts.\n\
            - Adopt the requested tone ({}).\n\
            - Do not output the title, just the story text.",
            book.tone
        ),
    };

    format!(
        "You are an expert ghostwriter and editor.\n\n\
        GLOBAL BOOK CONFIGURATION:\n\
        Title: {}\n\
        Genre: {}\n\
        Tone/Atmosphere: {}\n\
        Perspective: {}\n\
        Background Context: {}\n\n\
        PREVIOUS CHAPTER CONTEXT (The story so far):\n{}\n\n\
        SOURCE MATERIAL TO INCORPORATE (Strictly adhere to these facts):\n{}\n\n\
        CURRENT CHAPTER INSTRUCTIONS:\n\
        Title: {}\n\
        Plot/Requirements: {}\n\n\
        TASK:\n{}",
        book.title,
        book.genre,
        book.tone,
        book.perspective,
        book.background,
        previous_context,
        source_text,
        chapter.title,
        chapter.summary,
        task
    )
}

/// Parse an outline response leniently: a bare JSON array, an object with
/// a `chapters` key, or an array embedded somewhere in prose.
fn parse_outline(text: &str) -> Result<Vec<ChapterPlan>> {
    if let Ok(plans) = serde_json::from_str::<Vec<ChapterPlan>>(text) {
        return Ok(plans);
    }
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(text) {
        if let Some(chapters) = value.get("chapters") {
            return serde_json::from_value(chapters.clone())
                .context("Malformed 'chapters' array in outline response");
        }
    }
    // Model wrapped the JSON in prose or code fences; take the outermost
    // bracketed span.
    if let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) {
        if start < end {
            return serde_json::from_str(&text[start..=end])
                .context("Malformed JSON array in outline response");
        }
    }
    bail!("No JSON outline found in provider response")
}

// ============ Shared HTTP plumbing ============

fn http_client(config: &AiConfig) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to build HTTP client")
}

/// POST JSON with the retry discipline described in the module docs,
/// returning the response body parsed as JSON.
fn post_json_with_retry(
    client: &reqwest::blocking::Client,
    url: &str,
    headers: &[(&str, String)],
    body: &serde_json::Value,
    max_retries: u32,
) -> Result<serde_json::Value> {
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            std::thread::sleep(delay);
        }

        let mut req = client.post(url).json(body);
        for (name, value) in headers {
            req = req.header(*name, value.as_str());
        }

        match req.send() {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return response.json().context("Invalid JSON in provider response");
                }
                if status.as_u16() == 429 || status.is_server_error() {
                    let text = response.text().unwrap_or_default();
                    last_err = Some(anyhow::anyhow!("Provider error {}: {}", status, text));
                    continue;
                }
                let text = response.text().unwrap_or_default();
                bail!("Provider error {}: {}", status, text);
            }
            Err(e) => {
                last_err = Some(e.into());
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Provider request failed after retries")))
}

// ============ Gemini ============

/// Google Gemini via the Generative Language REST API.
///
/// Requires `GEMINI_API_KEY` (or the legacy `API_KEY`) in the environment.
pub struct GeminiProvider {
    model: String,
    config: AiConfig,
}

impl GeminiProvider {
    pub fn new(config: &AiConfig) -> Self {
        Self {
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            config: config.clone(),
        }
    }

    fn api_key(&self) -> Result<String> {
        std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("API_KEY"))
            .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY environment variable not set"))
    }

    fn call(&self, prompt: &str, json_mode: bool, temperature: f64) -> Result<String> {
        let key = self.api_key()?;
        let client = http_client(&self.config)?;
        let url = format!("{}/{}:generateContent", GEMINI_BASE_URL, self.model);

        let mut generation_config = serde_json::json!({
            "temperature": temperature,
            "maxOutputTokens": 8192,
        });
        if json_mode {
            generation_config["responseMimeType"] = serde_json::json!("application/json");
        }
        let body = serde_json::json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_PROMPT }] },
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": generation_config,
        });

        let json = post_json_with_retry(
            &client,
            &url,
            &[("x-goog-api-key", key)],
            &body,
            self.config.max_retries,
        )?;

        json.pointer("/candidates/0/content/parts/0/text")
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Empty Gemini response"))
    }
}

impl AiProvider for GeminiProvider {
    fn name(&self) -> &str {
        "Google Gemini"
    }

    fn generate_outline(
        &self,
        book: &BookConfig,
        source_context: &str,
        chapter_count: usize,
    ) -> Result<Vec<ChapterPlan>> {
        let prompt = outline_prompt(book, source_context, chapter_count);
        let text = self.call(&prompt, true, 0.7)?;
        parse_outline(&text)
    }

    fn write_chapter(
        &self,
        chapter: &Chapter,
        book: &BookConfig,
        relevant_sources: &[SearchResult],
        previous_context: &str,
        mode: GenerateMode,
    ) -> Result<String> {
        let prompt = chapter_prompt(chapter, book, relevant_sources, previous_context, mode);
        let temperature = match mode {
            GenerateMode::Outline => 0.7,
            GenerateMode::Full => 0.85,
        };
        self.call(&prompt, false, temperature)
    }
}

// ============ OpenRouter ============

/// OpenRouter via the OpenAI-compatible chat completions endpoint.
///
/// Requires `OPENROUTER_API_KEY` in the environment.
pub struct OpenRouterProvider {
    model: String,
    config: AiConfig,
}

impl OpenRouterProvider {
    pub fn new(config: &AiConfig) -> Self {
        Self {
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
            config: config.clone(),
        }
    }

    fn call(&self, prompt: &str, json_mode: bool) -> Result<String> {
        let key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENROUTER_API_KEY environment variable not set"))?;
        let client = http_client(&self.config)?;

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "temperature": 0.7,
        });
        if json_mode {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        let json = post_json_with_retry(
            &client,
            &format!("{}/chat/completions", OPENROUTER_BASE_URL),
            &[
                ("Authorization", format!("Bearer {}", key)),
                ("X-Title", "CogniVault".to_string()),
            ],
            &body,
            self.config.max_retries,
        )?;

        json.pointer("/choices/0/message/content")
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Empty OpenRouter response"))
    }
}

impl AiProvider for OpenRouterProvider {
    fn name(&self) -> &str {
        "OpenRouter"
    }

    fn generate_outline(
        &self,
        book: &BookConfig,
        source_context: &str,
        chapter_count: usize,
    ) -> Result<Vec<ChapterPlan>> {
        let prompt = outline_prompt(book, source_context, chapter_count);
        let text = self.call(&prompt, true)?;
        parse_outline(&text)
    }

    fn write_chapter(
        &self,
        chapter: &Chapter,
        book: &BookConfig,
        relevant_sources: &[SearchResult],
        previous_context: &str,
        mode: GenerateMode,
    ) -> Result<String> {
        let prompt = chapter_prompt(chapter, book, relevant_sources, previous_context, mode);
        self.call(&prompt, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Chunk;

    #[test]
    fn factory_selects_by_config() {
        let mut cfg = AiConfig::default();
        assert_eq!(create_provider(&cfg).unwrap().name(), "Google Gemini");

        cfg.provider = "openrouter".to_string();
        assert_eq!(create_provider(&cfg).unwrap().name(), "OpenRouter");

        cfg.provider = "mystery".to_string();
        assert!(create_provider(&cfg).is_err());
    }

    #[test]
    fn parse_outline_accepts_bare_array() {
        let plans =
            parse_outline(r#"[{"title": "One", "summary": "Start"}, {"title": "Two", "summary": "End"}]"#)
                .unwrap();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].title, "One");
    }

    #[test]
    fn parse_outline_unwraps_chapters_key() {
        let plans =
            parse_outline(r#"{"chapters": [{"title": "One", "summary": "Start"}]}"#).unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].summary, "Start");
    }

    #[test]
    fn parse_outline_scans_prose_for_array() {
        let text = "Here is your outline:\n```json\n[{\"title\": \"One\", \"summary\": \"S\"}]\n```\nEnjoy!";
        let plans = parse_outline(text).unwrap();
        assert_eq!(plans.len(), 1);
    }

    #[test]
    fn parse_outline_rejects_garbage() {
        assert!(parse_outline("no json here").is_err());
        assert!(parse_outline("").is_err());
    }

    #[test]
    fn chapter_prompt_numbers_source_facts() {
        let chapter = Chapter::new("Dawn", "Introduce the array");
        let book = BookConfig::default();
        let sources = vec![SearchResult {
            chunk: Chunk {
                id: "d1-chunk-0".to_string(),
                document_id: "d1".to_string(),
                index: 0,
                content: "Solar cells reach 24% efficiency.".to_string(),
            },
            score: 1.0,
            doc_title: "Specs".to_string(),
        }];
        let prompt = chapter_prompt(&chapter, &book, &sources, "", GenerateMode::Full);
        assert!(prompt.contains("[Fact 1 from Specs]: Solar cells reach 24% efficiency."));
        assert!(prompt.contains("Plot/Requirements: Introduce the array"));
        assert!(prompt.contains("FULL PROSE"));

        let beats = chapter_prompt(&chapter, &book, &sources, "", GenerateMode::Outline);
        assert!(beats.contains("beat-sheet"));
    }

    #[test]
    fn outline_prompt_truncates_source_context() {
        let book = BookConfig::default();
        let long = "x".repeat(20_000);
        let prompt = outline_prompt(&book, &long, 3);
        assert!(prompt.len() < 12_000 + 1_000);
        assert!(prompt.contains("exactly 3 chapters"));
    }
}
