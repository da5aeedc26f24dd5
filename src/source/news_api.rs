//! JSON headline feed implementation.
//!
//! This is the one concrete [`HeadlineSource`].  It issues
//! `GET <base_url>/<country code>` and expects a body shaped like
//!
//! ```text
//! { "articles": [ { "title": "...", "description": "...", ... }, ... ] }
//! ```
//!
//! Extra fields are ignored.  A missing, `null`, or empty `articles` key is a
//! feed with zero headlines, not an error.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::{Country, FeedError, HeadlineSource, RawArticle};

#[derive(Debug, Deserialize)]
struct FeedBody {
    #[serde(default)]
    articles: Option<Vec<FeedArticle>>,
}

#[derive(Debug, Deserialize)]
struct FeedArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// A headline feed served over HTTP as JSON.
pub struct NewsApiSource {
    client: reqwest::Client,
    /// Base URL; the country code is appended as the last path segment.
    base_url: String,
}

impl NewsApiSource {
    /// Create a new source.
    ///
    /// # Arguments
    ///
    /// * `base_url` — feed root, e.g. `https://news.internal/top-headlines`.
    ///   A trailing `/` is tolerated.
    /// * `timeout` — per-request timeout applied by the HTTP client.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("worldnews/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedError::network(None, e))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, country: Country) -> String {
        format!("{}/{}", self.base_url, country.code())
    }

    /// Parse an already-fetched response body into [`RawArticle`]s.
    ///
    /// This is a pure function (no I/O) so that tests can exercise the
    /// parsing logic without hitting the network.
    pub fn parse_body(body: &[u8]) -> Result<Vec<RawArticle>, FeedError> {
        let parsed: FeedBody = serde_json::from_slice(body)?;
        let articles = parsed
            .articles
            .unwrap_or_default()
            .into_iter()
            .map(|a| {
                RawArticle::new(a.title.unwrap_or_default(), a.description.unwrap_or_default())
            })
            .collect();
        Ok(articles)
    }
}

#[async_trait]
impl HeadlineSource for NewsApiSource {
    async fn fetch(&self, country: Country) -> Result<Vec<RawArticle>, FeedError> {
        let url = self.url_for(country);
        debug!(%url, "fetching headlines");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FeedError::network(e.status().map(|s| s.as_u16()), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Network {
                status: Some(status.as_u16()),
                message: format!("unexpected status {status} from {url}"),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FeedError::network(Some(status.as_u16()), e))?;
        Self::parse_body(&body)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
