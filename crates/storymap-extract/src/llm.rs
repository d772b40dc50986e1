//! LLM extraction backend.
//!
//! Talks to a Gemini-style `generateContent` endpoint and asks for a JSON
//! array of place objects. Model output is tolerated in both bare and
//! markdown-fenced form; anything else is malformed output, not a crash.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storymap_core::{MentionSource, RawMention, Sentiment};
use tracing::{debug, info};

use crate::{ExtractionError, Extractor};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const PROMPT_HEADER: &str = "\
Extract every place name or location mentioned in the text below.
Respond with ONLY a JSON array of objects, each with these fields:
  \"name\": the place name exactly as it appears in the text
  \"context\": the sentence or snippet it appears in
  \"sentiment\": \"positive\", \"negative\" or \"neutral\" if the text conveys one, else omit
If no locations are found, return an empty array: []

Text:

";

/// Extraction backend backed by a remote generative model.
pub struct LlmExtractor {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// One place object as the model emits it.
#[derive(Deserialize)]
struct LlmPlace {
    name: String,
    #[serde(default)]
    context: String,
    #[serde(default)]
    sentiment: Option<String>,
}

impl LlmExtractor {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the extractor at a non-default endpoint (tests, proxies).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn generate(&self, prompt: &str) -> Result<String, ExtractionError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let resp = self
            .client
            .post(&url)
            .timeout(REQUEST_TIMEOUT)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ExtractionError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| ExtractionError::Malformed(e.to_string()))?;
        let text = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default();
        if text.is_empty() {
            return Err(ExtractionError::Malformed("empty model response".into()));
        }
        Ok(text)
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract(&self, text: &str) -> Result<Vec<RawMention>, ExtractionError> {
        let prompt = format!("{PROMPT_HEADER}{text}");
        let raw = self.generate(&prompt).await?;
        debug!(chars = raw.len(), "model responded");

        let mentions = parse_model_output(&raw)?;
        info!(count = mentions.len(), "llm extraction finished");
        Ok(mentions)
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

/// Parse the model's reply into mentions.
///
/// Accepts a bare JSON array or one wrapped in ``` / ```json fences.
fn parse_model_output(raw: &str) -> Result<Vec<RawMention>, ExtractionError> {
    let json = strip_code_fence(raw);
    if !json.starts_with('[') {
        let preview: String = json.chars().take(80).collect();
        return Err(ExtractionError::Malformed(format!(
            "expected a JSON array, got: {preview}"
        )));
    }

    let places: Vec<LlmPlace> =
        serde_json::from_str(json).map_err(|e| ExtractionError::Malformed(e.to_string()))?;

    Ok(places
        .into_iter()
        .map(|p| RawMention {
            text: p.name,
            context: p.context,
            sentiment: parse_sentiment(p.sentiment.as_deref()),
            source: MentionSource::Llm,
        })
        .collect())
}

fn parse_sentiment(s: Option<&str>) -> Sentiment {
    match s.map(|v| v.trim().to_lowercase()).as_deref() {
        Some("positive") => Sentiment::Positive,
        Some("negative") => Sentiment::Negative,
        Some("neutral") => Sentiment::Neutral,
        _ => Sentiment::Unknown,
    }
}

/// Unwrap a markdown code fence if the model added one.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    for marker in ["```json", "```"] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            let inner = rest.trim_start();
            if let Some(end) = inner.find("```") {
                return inner[..end].trim();
            }
            return inner.trim();
        }
    }
    trimmed
}
