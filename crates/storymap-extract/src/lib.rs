//! Extraction backends: turning raw text into place mentions.
//!
//! Two interchangeable backends implement [`Extractor`]: the offline
//! [`RuleBasedExtractor`] and the remote [`LlmExtractor`]. Each surfaces its
//! own success or failure; callers decide whether to combine or fall back.
//! Mentions are not deduplicated here — identity is coordinate-based and
//! established downstream, after geocoding.

mod fetch;
mod llm;
mod rules;

pub use fetch::fetch_text;
pub use llm::LlmExtractor;
pub use rules::RuleBasedExtractor;

use async_trait::async_trait;
use storymap_core::RawMention;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("backend request failed: {0}")]
    Backend(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("malformed backend output: {0}")]
    Malformed(String),
    #[error("fetching {url} failed: {reason}")]
    Fetch { url: String, reason: String },
}

/// A place-mention extraction backend.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Extract all place mentions from `text`.
    ///
    /// An empty result is a valid outcome; errors mean the backend itself
    /// was unreachable or produced output that could not be understood.
    async fn extract(&self, text: &str) -> Result<Vec<RawMention>, ExtractionError>;

    /// Short backend name for logs and summaries.
    fn name(&self) -> &'static str;
}
