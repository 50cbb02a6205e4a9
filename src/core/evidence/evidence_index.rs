// Sentence-level evidence and where to find it. Verification and chat both
// pull evidence through the EvidenceIndex port; the source registry supplies
// the trust score attached to each snippet at ingest time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Trust assumed for publishers the registry does not know.
pub const DEFAULT_SOURCE_TRUST: f64 = 0.5;

/// One sentence of evidence lifted from an ingested article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceSnippet {
    pub id: String,
    /// Article the sentence came from
    pub article_id: String,
    /// Title of that article
    pub title: String,
    pub url: String,
    pub source_name: String,
    pub source_domain: String,
    /// Trust score of the publishing source in 0.0..=1.0
    pub trust: f64,
    pub sentence: String,
}

#[derive(Debug, Error)]
pub enum EvidenceError {
    #[error("Index error: {0}")]
    IndexError(String),
}

// ============================================================================
// RETRIEVAL TRAIT (PORT)
// ============================================================================

/// Retrieval port over the evidence corpus.
#[async_trait]
pub trait EvidenceIndex: Send + Sync {
    /// Best-matching snippets for a query, strongest match first.
    async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<EvidenceSnippet>, EvidenceError>;

    /// Add snippets to the corpus.
    async fn add(&self, snippets: Vec<EvidenceSnippet>) -> Result<(), EvidenceError>;

    /// Number of snippets currently indexed.
    async fn len(&self) -> Result<usize, EvidenceError>;
}

// Let several services share one index without caring that it's shared.
#[async_trait]
impl<T: EvidenceIndex + ?Sized> EvidenceIndex for Arc<T> {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<EvidenceSnippet>, EvidenceError> {
        (**self).search(query, top_k).await
    }

    async fn add(&self, snippets: Vec<EvidenceSnippet>) -> Result<(), EvidenceError> {
        (**self).add(snippets).await
    }

    async fn len(&self) -> Result<usize, EvidenceError> {
        (**self).len().await
    }
}

// ============================================================================
// SOURCE REGISTRY
// ============================================================================

/// A publisher the product has vetted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustedSource {
    pub name: String,
    pub domain: String,
    pub trust: f64,
}

/// Known publishers and how much weight their reporting carries.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<TrustedSource>,
}

impl SourceRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry preloaded with the vetted publisher list.
    pub fn with_known_sources() -> Self {
        let seed = [
            ("Reuters", "reuters.com", 0.95),
            ("Associated Press", "ap.org", 0.95),
            ("BBC News", "bbc.com", 0.90),
            ("The Guardian", "theguardian.com", 0.85),
            ("Nature Medicine", "nature.com", 0.98),
            ("WHO", "who.int", 0.97),
            ("PolitiFact", "politifact.com", 0.90),
            ("FactCheck.org", "factcheck.org", 0.90),
        ];

        Self {
            sources: seed
                .iter()
                .map(|(name, domain, trust)| TrustedSource {
                    name: name.to_string(),
                    domain: domain.to_string(),
                    trust: *trust,
                })
                .collect(),
        }
    }

    pub fn add(&mut self, source: TrustedSource) {
        self.sources.push(source);
    }

    pub fn all(&self) -> &[TrustedSource] {
        &self.sources
    }

    /// Trust score for a publisher, matched by domain first and display name
    /// second. Unknown publishers get `DEFAULT_SOURCE_TRUST`.
    pub fn trust_for(&self, name: &str, domain: &str) -> f64 {
        let domain = normalize_domain(domain);
        if let Some(source) = self.sources.iter().find(|s| s.domain == domain) {
            return source.trust;
        }
        self.sources
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .map(|s| s.trust)
            .unwrap_or(DEFAULT_SOURCE_TRUST)
    }
}

/// Lowercase and strip the `www.` prefix so feed URLs and registry entries
/// compare equal.
fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim().to_lowercase();
    domain
        .strip_prefix("www.")
        .map(str::to_string)
        .unwrap_or(domain)
}
