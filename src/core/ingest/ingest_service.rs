// ============================================================================
// ERRORS
// ============================================================================

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::core::evidence::{EvidenceIndex, EvidenceSnippet, SourceRegistry};
use crate::core::feed::{Article, ArticleStore};
use crate::core::ingest::ingest_models::{FetchedItem, NewsProvider};
use crate::core::verify::{split_sentences, CredibilityLabel};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Index error: {0}")]
    IndexError(String),
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// How far back a regular poll asks providers to look.
const FETCH_WINDOW_DAYS: u32 = 1;

/// Characters of body text kept as the feed summary.
const SUMMARY_CHARS: usize = 200;

/// Sentences shorter than this are not worth indexing as evidence.
const MIN_EVIDENCE_SENTENCE_CHARS: usize = 20;

/// Outcome of one ingest pass.
#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    /// Items providers handed over, new or not
    pub fetched: usize,
    /// Articles actually added this pass
    pub new_article_ids: Vec<String>,
    /// Evidence sentences indexed this pass
    pub new_snippets: usize,
}

/// Pulls articles from the configured providers, normalizes them into the
/// article store and splits their bodies into indexed evidence sentences.
///
/// Each provider has a high-water mark, the newest `published_at` seen from
/// it, so regular polls skip what earlier polls already brought in. URLs are
/// deduplicated against the store as a second line.
pub struct IngestService<A: ArticleStore, E: EvidenceIndex> {
    providers: Vec<Box<dyn NewsProvider>>,
    articles: A,
    index: E,
    registry: SourceRegistry,
    watermarks: DashMap<String, DateTime<Utc>>,
}

impl<A: ArticleStore, E: EvidenceIndex> IngestService<A, E> {
    pub fn new(
        providers: Vec<Box<dyn NewsProvider>>,
        articles: A,
        index: E,
        registry: SourceRegistry,
    ) -> Self {
        Self {
            providers,
            articles,
            index,
            registry,
            watermarks: DashMap::new(),
        }
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// One regular poll across all providers. A provider that fails is
    /// logged and skipped, the others still run.
    pub async fn poll_once(&self) -> Result<IngestStats, IngestError> {
        let mut stats = IngestStats::default();

        for provider in &self.providers {
            let items = match provider.fetch_recent(FETCH_WINDOW_DAYS, 1).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!("Provider {} fetch failed: {}", provider.name(), e);
                    continue;
                }
            };

            let watermark = self.watermarks.get(provider.name()).map(|w| *w);
            let newest = items.iter().filter_map(|i| i.published_at).max();

            for item in items {
                stats.fetched += 1;
                let already_polled = match (item.published_at, watermark) {
                    (Some(published), Some(mark)) => published <= mark,
                    _ => false,
                };
                if already_polled {
                    continue;
                }
                self.ingest_item(item, &mut stats).await?;
            }

            if let Some(newest) = newest {
                self.watermarks.insert(provider.name().to_string(), newest);
            }
        }

        if !stats.new_article_ids.is_empty() {
            tracing::info!(
                "Ingested {} new articles ({} evidence sentences)",
                stats.new_article_ids.len(),
                stats.new_snippets
            );
        }
        Ok(stats)
    }

    /// Make sure the article behind `url` is in the store, pulling it from
    /// the providers when it is not. Tries a direct lookup first and falls
    /// back to searching for the URL. Returns whether the article is
    /// available afterwards.
    pub async fn ensure_url(&self, url: &str) -> Result<bool, IngestError> {
        let existing = self
            .articles
            .get_by_url(url)
            .await
            .map_err(|e| IngestError::StorageError(e.to_string()))?;
        if existing.is_some() {
            return Ok(true);
        }

        for provider in &self.providers {
            let direct = match provider.fetch_by_url(url).await {
                Ok(direct) => direct,
                Err(e) => {
                    tracing::warn!("Provider {} lookup failed: {}", provider.name(), e);
                    continue;
                }
            };

            let item = match direct {
                Some(item) => Some(item),
                None => match provider.search(url, 1).await {
                    Ok(results) => results.into_iter().next(),
                    Err(e) => {
                        tracing::warn!("Provider {} search failed: {}", provider.name(), e);
                        continue;
                    }
                },
            };

            if let Some(item) = item {
                let mut stats = IngestStats::default();
                self.ingest_item(item, &mut stats).await?;
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// On-demand ingest of provider search results. Does not move the
    /// regular polling watermarks.
    pub async fn poll_query(&self, query: &str) -> Result<IngestStats, IngestError> {
        let mut stats = IngestStats::default();

        for provider in &self.providers {
            let items = match provider.search(query, 1).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!("Provider {} search failed: {}", provider.name(), e);
                    continue;
                }
            };

            for item in items {
                stats.fetched += 1;
                self.ingest_item(item, &mut stats).await?;
            }
        }

        Ok(stats)
    }

    async fn ingest_item(
        &self,
        item: FetchedItem,
        stats: &mut IngestStats,
    ) -> Result<(), IngestError> {
        let existing = self
            .articles
            .get_by_url(&item.url)
            .await
            .map_err(|e| IngestError::StorageError(e.to_string()))?;
        if existing.is_some() {
            return Ok(());
        }

        let trust = self.registry.trust_for(&item.source_name, &item.source_domain);
        let article = normalize(item, trust);

        let snippets = snippets_of(&article);
        stats.new_snippets += snippets.len();
        if !snippets.is_empty() {
            self.index
                .add(snippets)
                .await
                .map_err(|e| IngestError::IndexError(e.to_string()))?;
        }

        stats.new_article_ids.push(article.id.clone());
        self.articles
            .upsert(article)
            .await
            .map_err(|e| IngestError::StorageError(e.to_string()))?;
        Ok(())
    }
}

/// Fetched item to stored article. Credibility starts at zero until the
/// verification pass has looked at it.
fn normalize(item: FetchedItem, trust: f64) -> Article {
    let summary: String = item.body_text.chars().take(SUMMARY_CHARS).collect();
    Article {
        id: Uuid::new_v4().to_string(),
        title: item.title,
        summary,
        body: item.body_text,
        url: item.url,
        source_name: item.source_name,
        source_domain: item.source_domain,
        source_trust: trust,
        category: "General".to_string(),
        confidence: 0,
        label: CredibilityLabel::NeedsReview,
        published_at: item.published_at.unwrap_or_else(Utc::now),
        ingested_at: Utc::now(),
    }
}

fn snippets_of(article: &Article) -> Vec<EvidenceSnippet> {
    split_sentences(&article.body, MIN_EVIDENCE_SENTENCE_CHARS)
        .into_iter()
        .map(|sentence| EvidenceSnippet {
            id: Uuid::new_v4().to_string(),
            article_id: article.id.clone(),
            title: article.title.clone(),
            url: article.url.clone(),
            source_name: article.source_name.clone(),
            source_domain: article.source_domain.clone(),
            trust: article.source_trust,
            sentence,
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use tokio::sync::Mutex;

    use crate::core::evidence::EvidenceError;
    use crate::core::feed::FeedError;
    use crate::core::ingest::ingest_models::ConnectorError;

    struct MockProvider {
        name: String,
        items: Vec<FetchedItem>,
        lookup: Option<FetchedItem>,
        fail: bool,
    }

    impl MockProvider {
        fn with(name: &str, items: Vec<FetchedItem>) -> Box<Self> {
            Box::new(Self {
                name: name.to_string(),
                items,
                lookup: None,
                fail: false,
            })
        }

        fn with_lookup(name: &str, lookup: FetchedItem) -> Box<Self> {
            Box::new(Self {
                name: name.to_string(),
                items: Vec::new(),
                lookup: Some(lookup),
                fail: false,
            })
        }

        fn failing(name: &str) -> Box<Self> {
            Box::new(Self {
                name: name.to_string(),
                items: Vec::new(),
                lookup: None,
                fail: true,
            })
        }
    }

    #[async_trait]
    impl NewsProvider for MockProvider {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch_recent(
            &self,
            _window_days: u32,
            _page: u32,
        ) -> Result<Vec<FetchedItem>, ConnectorError> {
            if self.fail {
                return Err(ConnectorError::Http("boom".to_string()));
            }
            Ok(self.items.clone())
        }

        async fn search(&self, _query: &str, _page: u32) -> Result<Vec<FetchedItem>, ConnectorError> {
            self.fetch_recent(1, 1).await
        }

        async fn fetch_by_url(&self, _url: &str) -> Result<Option<FetchedItem>, ConnectorError> {
            if self.fail {
                return Err(ConnectorError::Http("boom".to_string()));
            }
            Ok(self.lookup.clone())
        }
    }

    #[derive(Default)]
    struct MemArticles {
        articles: Mutex<Vec<Article>>,
    }

    #[async_trait]
    impl ArticleStore for MemArticles {
        async fn upsert(&self, article: Article) -> Result<(), FeedError> {
            let mut articles = self.articles.lock().await;
            articles.retain(|a| a.id != article.id);
            articles.push(article);
            Ok(())
        }

        async fn get(&self, id: &str) -> Result<Option<Article>, FeedError> {
            Ok(self.articles.lock().await.iter().find(|a| a.id == id).cloned())
        }

        async fn get_by_url(&self, url: &str) -> Result<Option<Article>, FeedError> {
            Ok(self
                .articles
                .lock()
                .await
                .iter()
                .find(|a| a.url == url)
                .cloned())
        }

        async fn list_recent(&self) -> Result<Vec<Article>, FeedError> {
            Ok(self.articles.lock().await.clone())
        }

        async fn count(&self) -> Result<usize, FeedError> {
            Ok(self.articles.lock().await.len())
        }

        async fn set_confidence(
            &self,
            _id: &str,
            _confidence: u8,
            _label: CredibilityLabel,
        ) -> Result<(), FeedError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingIndex {
        snippets: Mutex<Vec<EvidenceSnippet>>,
    }

    #[async_trait]
    impl EvidenceIndex for RecordingIndex {
        async fn search(
            &self,
            _query: &str,
            _top_k: usize,
        ) -> Result<Vec<EvidenceSnippet>, EvidenceError> {
            Ok(Vec::new())
        }

        async fn add(&self, snippets: Vec<EvidenceSnippet>) -> Result<(), EvidenceError> {
            self.snippets.lock().await.extend(snippets);
            Ok(())
        }

        async fn len(&self) -> Result<usize, EvidenceError> {
            Ok(self.snippets.lock().await.len())
        }
    }

    fn item(url: &str, age_hours: i64) -> FetchedItem {
        FetchedItem {
            source_name: "Reuters".to_string(),
            source_domain: "reuters.com".to_string(),
            url: url.to_string(),
            title: "Some headline".to_string(),
            body_text: "The first finding was clear and well documented. \
                        The second finding was confirmed by independent reviewers."
                .to_string(),
            published_at: Some(Utc::now() - Duration::hours(age_hours)),
        }
    }

    fn ingest(
        providers: Vec<Box<dyn NewsProvider>>,
    ) -> IngestService<MemArticles, RecordingIndex> {
        IngestService::new(
            providers,
            MemArticles::default(),
            RecordingIndex::default(),
            SourceRegistry::with_known_sources(),
        )
    }

    #[tokio::test]
    async fn first_poll_ingests_and_indexes_everything() {
        let service = ingest(vec![MockProvider::with(
            "newsapi",
            vec![item("https://example.com/a", 2), item("https://example.com/b", 1)],
        )]);

        let stats = service.poll_once().await.unwrap();

        assert_eq!(stats.fetched, 2);
        assert_eq!(stats.new_article_ids.len(), 2);
        assert_eq!(stats.new_snippets, 4);
        assert_eq!(service.articles.count().await.unwrap(), 2);
        assert_eq!(service.index.len().await.unwrap(), 4);

        let stored = service.articles.get(&stats.new_article_ids[0]).await.unwrap().unwrap();
        assert_eq!(stored.source_trust, 0.95);
        assert_eq!(stored.confidence, 0);
        assert_eq!(stored.label, CredibilityLabel::NeedsReview);
        assert_eq!(stored.category, "General");
    }

    #[tokio::test]
    async fn second_poll_stops_at_the_watermark() {
        let service = ingest(vec![MockProvider::with(
            "newsapi",
            vec![item("https://example.com/a", 2), item("https://example.com/b", 1)],
        )]);

        service.poll_once().await.unwrap();
        let again = service.poll_once().await.unwrap();

        assert_eq!(again.fetched, 2);
        assert!(again.new_article_ids.is_empty());
        assert_eq!(service.articles.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn known_urls_are_not_ingested_twice() {
        let fresh = FetchedItem {
            published_at: Some(Utc::now()),
            ..item("https://example.com/a", 0)
        };
        let service = ingest(vec![
            MockProvider::with("first", vec![item("https://example.com/a", 2)]),
            MockProvider::with("second", vec![fresh]),
        ]);

        let stats = service.poll_once().await.unwrap();

        assert_eq!(stats.fetched, 2);
        assert_eq!(stats.new_article_ids.len(), 1);
    }

    #[tokio::test]
    async fn one_broken_provider_does_not_stop_the_rest() {
        let service = ingest(vec![
            MockProvider::failing("broken"),
            MockProvider::with("healthy", vec![item("https://example.com/a", 1)]),
        ]);

        let stats = service.poll_once().await.unwrap();

        assert_eq!(stats.new_article_ids.len(), 1);
    }

    #[tokio::test]
    async fn missing_publication_time_falls_back_to_now() {
        let undated = FetchedItem {
            published_at: None,
            ..item("https://example.com/undated", 0)
        };
        let service = ingest(vec![MockProvider::with("newsapi", vec![undated])]);

        let stats = service.poll_once().await.unwrap();

        let stored = service.articles.get(&stats.new_article_ids[0]).await.unwrap().unwrap();
        assert!(Utc::now().signed_duration_since(stored.published_at) < Duration::seconds(5));
    }

    #[tokio::test]
    async fn summaries_are_truncated_bodies() {
        let long_body = FetchedItem {
            body_text: "x".repeat(300),
            ..item("https://example.com/long", 1)
        };
        let service = ingest(vec![MockProvider::with("newsapi", vec![long_body])]);

        let stats = service.poll_once().await.unwrap();

        let stored = service.articles.get(&stats.new_article_ids[0]).await.unwrap().unwrap();
        assert_eq!(stored.summary.len(), 200);
        assert_eq!(stored.body.len(), 300);
    }

    #[tokio::test]
    async fn ensure_url_skips_providers_for_known_urls() {
        let service = ingest(vec![MockProvider::failing("broken")]);
        service
            .articles
            .upsert(normalize(item("https://example.com/known", 1), 0.95))
            .await
            .unwrap();

        // A store hit short-circuits; the broken provider would return false.
        assert!(service.ensure_url("https://example.com/known").await.unwrap());
        assert_eq!(service.articles.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn ensure_url_ingests_via_direct_lookup() {
        let service = ingest(vec![MockProvider::with_lookup(
            "newsapi",
            item("https://example.com/direct", 1),
        )]);

        assert!(service.ensure_url("https://example.com/direct").await.unwrap());
        let stored = service
            .articles
            .get_by_url("https://example.com/direct")
            .await
            .unwrap();
        assert!(stored.is_some());
        assert_eq!(service.index.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn ensure_url_falls_back_to_search() {
        let service = ingest(vec![MockProvider::with(
            "newsapi",
            vec![item("https://example.com/found", 1)],
        )]);

        assert!(service.ensure_url("https://example.com/found").await.unwrap());
        assert_eq!(service.articles.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn ensure_url_reports_a_miss() {
        let service = ingest(vec![
            MockProvider::failing("broken"),
            MockProvider::with("empty", Vec::new()),
        ]);

        assert!(!service.ensure_url("https://example.com/nowhere").await.unwrap());
        assert_eq!(service.articles.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn query_ingest_leaves_the_watermark_alone() {
        let service = ingest(vec![MockProvider::with(
            "newsapi",
            vec![item("https://example.com/found", 1)],
        )]);

        let searched = service.poll_query("vaccines").await.unwrap();
        assert_eq!(searched.new_article_ids.len(), 1);

        // The same items come back from a regular poll; only the URL dedup
        // should stop them, proving no watermark was recorded.
        let polled = service.poll_once().await.unwrap();
        assert_eq!(polled.fetched, 1);
        assert!(polled.new_article_ids.is_empty());
    }
}
