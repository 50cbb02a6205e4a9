// ============================================================================
// DOMAIN MODELS
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// A raw article as a news provider hands it over, before normalization.
#[derive(Debug, Clone)]
pub struct FetchedItem {
    pub source_name: String,
    pub source_domain: String,
    pub url: String,
    pub title: String,
    pub body_text: String,
    /// Publication time when the provider reports one
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Unexpected response: {0}")]
    BadResponse(String),
}

// ============================================================================
// PROVIDER TRAIT (PORT)
// ============================================================================

/// An upstream news source the ingest loop can pull articles from.
#[async_trait]
pub trait NewsProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Articles published within the last `window_days`, newest first.
    async fn fetch_recent(
        &self,
        window_days: u32,
        page: u32,
    ) -> Result<Vec<FetchedItem>, ConnectorError>;

    /// Articles matching a free-text query, most relevant first.
    async fn search(&self, query: &str, page: u32) -> Result<Vec<FetchedItem>, ConnectorError>;

    /// Direct lookup of a single article by URL. Providers without a lookup
    /// endpoint return `Ok(None)` and callers fall back to `search`.
    async fn fetch_by_url(&self, url: &str) -> Result<Option<FetchedItem>, ConnectorError>;
}
