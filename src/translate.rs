//! Translation adapter.
//!
//! The pipeline only sees the [`Translator`] trait: text in, full translation
//! or an explicit error out.  A translator may be slow (it is a network call)
//! and may fail; callers time-box each call and fall back to the source text.
//!
//! [`GoogleTranslator`] talks to the public `translate_a/single` endpoint used
//! by the browser widget.  Its response is a nested JSON array:
//!
//! ```text
//! [[["Hello ", "こんにちは", null, null, 10], ["world", "世界", ...]], null, "ja", ...]
//! ```
//!
//! The translation is the concatenation of the first string of every segment.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;

pub const DEFAULT_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

#[derive(Debug, thiserror::Error)]
pub enum TranslationError {
    #[error("translation request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("translation service returned HTTP {0}")]
    Status(u16),
    #[error("unexpected translation response: {0}")]
    Decode(String),
    #[error("translation timed out after {0:?}")]
    Timeout(Duration),
}

/// Opaque text → text translation into one configured target language.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str) -> Result<String, TranslationError>;
}

pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
    target: String,
}

impl GoogleTranslator {
    pub fn new(endpoint: &str, target_language: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
            target: target_language.to_string(),
        }
    }

    pub fn target_language(&self) -> &str {
        &self.target
    }

    /// Pull the translated text out of a `translate_a/single` response.
    ///
    /// Any segment that is not a string is an error; a half-decoded
    /// translation is never returned.
    pub fn parse_response(body: &Value) -> Result<String, TranslationError> {
        let segments = body
            .get(0)
            .and_then(Value::as_array)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TranslationError::Decode("missing segment list".into()))?;

        let mut out = String::new();
        for (i, segment) in segments.iter().enumerate() {
            let piece = segment
                .get(0)
                .and_then(Value::as_str)
                .ok_or_else(|| TranslationError::Decode(format!("segment {i} has no text")))?;
            out.push_str(piece);
        }
        Ok(out)
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str) -> Result<String, TranslationError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", "auto"),
                ("tl", self.target.as_str()),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::Status(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| TranslationError::Decode(e.to_string()))?;
        let translated = Self::parse_response(&body)?;
        trace!(len = text.len(), "translated");
        Ok(translated)
    }
}
