//! Headline source abstraction layer.
//!
//! This module defines the [`HeadlineSource`] trait, the article types, and
//! the fixed [`Country`] set.  The concrete HTTP implementation lives in
//! [`news_api`].
//!
//! ## For contributors — adding a new source
//!
//! 1. Create a new file in this directory (e.g. `rss.rs`).
//! 2. Define a struct and implement [`HeadlineSource`] for it.
//! 3. Add `mod rss;` below and re-export your struct in the `pub use` block.
//! 4. Construct it in `main.rs` instead of (or next to) `NewsApiSource`.
//!
//! Sources never retry; the controller owns retry policy.

mod article;
mod country;
mod news_api;

pub use article::{EnrichedArticle, RawArticle};
pub use country::Country;
pub use news_api::NewsApiSource;

use async_trait::async_trait;

/// Why a headline fetch failed.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Transport failure or a non-2xx response.
    #[error("network error{}: {message}", status_suffix(.status))]
    Network {
        status: Option<u16>,
        message: String,
    },
    /// The response body was not the expected JSON shape.
    #[error("malformed feed payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FeedError {
    pub(crate) fn network(status: Option<u16>, err: impl std::fmt::Display) -> Self {
        FeedError::Network {
            status,
            message: err.to_string(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Trait that every headline source must implement.
///
/// The controller calls [`fetch()`](HeadlineSource::fetch) from tokio tasks,
/// so implementations must be `Send + Sync`.
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    /// Fetch the current headlines for one country, in provider order.
    async fn fetch(&self, country: Country) -> Result<Vec<RawArticle>, FeedError>;
}
