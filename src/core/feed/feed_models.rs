// ============================================================================
// DOMAIN MODELS
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::verify::CredibilityLabel;

/// An ingested news article with its current credibility verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    /// First part of the body, used for feed cards
    pub summary: String,
    pub body: String,
    pub url: String,
    pub source_name: String,
    pub source_domain: String,
    /// Trust of the publishing source in 0.0..=1.0
    pub source_trust: f64,
    pub category: String,
    /// Credibility in 0..=100, 0 until verification has run
    pub confidence: u8,
    pub label: CredibilityLabel,
    pub published_at: DateTime<Utc>,
    pub ingested_at: DateTime<Utc>,
}

/// Filters for one feed page.
#[derive(Debug, Clone)]
pub struct FeedQuery {
    /// Case-insensitive category match, `None` for all topics
    pub topic: Option<String>,
    /// Lowest confidence still shown, in 0..=100
    pub min_confidence: u8,
    /// Page size, clamped to 1..=100
    pub limit: usize,
    /// RFC 3339 timestamp of the last item of the previous page
    pub cursor: Option<String>,
}

impl Default for FeedQuery {
    fn default() -> Self {
        Self {
            topic: None,
            min_confidence: 70,
            limit: 20,
            cursor: None,
        }
    }
}

/// One page of the feed, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct FeedPage {
    pub items: Vec<Article>,
    /// Cursor for the next page, absent on the last page
    pub cursor: Option<String>,
    /// Articles matching the filters across all pages
    pub total: usize,
}
