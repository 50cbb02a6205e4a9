// ============================================================================
// ERRORS
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

use crate::core::feed::feed_models::{Article, FeedPage, FeedQuery};
use crate::core::verify::CredibilityLabel;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Invalid cursor: {0}")]
    BadCursor(String),
    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Storage port for ingested articles.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert or replace by id.
    async fn upsert(&self, article: Article) -> Result<(), FeedError>;

    async fn get(&self, id: &str) -> Result<Option<Article>, FeedError>;

    async fn get_by_url(&self, url: &str) -> Result<Option<Article>, FeedError>;

    /// All articles ordered by `published_at` descending.
    async fn list_recent(&self) -> Result<Vec<Article>, FeedError>;

    async fn count(&self) -> Result<usize, FeedError>;

    /// Record the verdict verification produced for an article.
    async fn set_confidence(
        &self,
        id: &str,
        confidence: u8,
        label: CredibilityLabel,
    ) -> Result<(), FeedError>;
}

#[async_trait]
impl<T: ArticleStore + ?Sized> ArticleStore for Arc<T> {
    async fn upsert(&self, article: Article) -> Result<(), FeedError> {
        (**self).upsert(article).await
    }

    async fn get(&self, id: &str) -> Result<Option<Article>, FeedError> {
        (**self).get(id).await
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<Article>, FeedError> {
        (**self).get_by_url(url).await
    }

    async fn list_recent(&self) -> Result<Vec<Article>, FeedError> {
        (**self).list_recent().await
    }

    async fn count(&self) -> Result<usize, FeedError> {
        (**self).count().await
    }

    async fn set_confidence(
        &self,
        id: &str,
        confidence: u8,
        label: CredibilityLabel,
    ) -> Result<(), FeedError> {
        (**self).set_confidence(id, confidence, label).await
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

const MAX_PAGE_SIZE: usize = 100;

/// Read side of the article corpus: filtered, cursor-paginated pages of
/// verified news, newest first.
pub struct FeedService<A: ArticleStore> {
    store: A,
}

impl<A: ArticleStore> FeedService<A> {
    pub fn new(store: A) -> Self {
        Self { store }
    }

    /// One page of the feed. The cursor names the last item of the previous
    /// page as `published_at` plus article id, so articles sharing a publish
    /// timestamp (common at second granularity) still paginate without gaps.
    pub async fn page(&self, query: &FeedQuery) -> Result<FeedPage, FeedError> {
        let limit = query.limit.clamp(1, MAX_PAGE_SIZE);
        let after = match &query.cursor {
            Some(raw) => Some(parse_cursor(raw)?),
            None => None,
        };

        // Ties on publish time get a fixed id order so the cursor always
        // resumes at the same spot regardless of store iteration order.
        let mut articles = self.store.list_recent().await?;
        articles.sort_by(|a, b| {
            b.published_at
                .cmp(&a.published_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        let matching: Vec<&Article> = articles
            .iter()
            .filter(|a| matches_filters(a, query))
            .collect();
        let total = matching.len();

        let mut items: Vec<Article> = matching
            .into_iter()
            .filter(|a| match &after {
                Some((cut, id)) => {
                    a.published_at < *cut || (a.published_at == *cut && a.id > *id)
                }
                None => true,
            })
            .take(limit + 1)
            .cloned()
            .collect();

        let cursor = if items.len() > limit {
            items.truncate(limit);
            items
                .last()
                .map(|a| format!("{}|{}", a.published_at.to_rfc3339(), a.id))
        } else {
            None
        };

        Ok(FeedPage {
            items,
            cursor,
            total,
        })
    }

    pub async fn article(&self, id: &str) -> Result<Option<Article>, FeedError> {
        self.store.get(id).await
    }
}

fn matches_filters(article: &Article, query: &FeedQuery) -> bool {
    if article.confidence < query.min_confidence {
        return false;
    }
    match &query.topic {
        Some(topic) => article.category.eq_ignore_ascii_case(topic),
        None => true,
    }
}

fn parse_cursor(raw: &str) -> Result<(DateTime<Utc>, String), FeedError> {
    let (timestamp, id) = raw
        .split_once('|')
        .ok_or_else(|| FeedError::BadCursor("expected <timestamp>|<id>".to_string()))?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| FeedError::BadCursor(e.to_string()))?;
    Ok((timestamp, id.to_string()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tokio::sync::Mutex;

    struct VecArticleStore {
        articles: Mutex<Vec<Article>>,
    }

    impl VecArticleStore {
        fn new(articles: Vec<Article>) -> Self {
            Self {
                articles: Mutex::new(articles),
            }
        }
    }

    #[async_trait]
    impl ArticleStore for VecArticleStore {
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
            let mut articles = self.articles.lock().await.clone();
            articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
            Ok(articles)
        }

        async fn count(&self) -> Result<usize, FeedError> {
            Ok(self.articles.lock().await.len())
        }

        async fn set_confidence(
            &self,
            id: &str,
            confidence: u8,
            label: CredibilityLabel,
        ) -> Result<(), FeedError> {
            let mut articles = self.articles.lock().await;
            if let Some(article) = articles.iter_mut().find(|a| a.id == id) {
                article.confidence = confidence;
                article.label = label;
            }
            Ok(())
        }
    }

    fn article(id: &str, category: &str, confidence: u8, age_hours: i64) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Article {id}"),
            summary: "summary".to_string(),
            body: "body".to_string(),
            url: format!("https://example.com/{id}"),
            source_name: "Reuters".to_string(),
            source_domain: "reuters.com".to_string(),
            source_trust: 0.95,
            category: category.to_string(),
            confidence,
            label: CredibilityLabel::Verified,
            published_at: Utc::now() - Duration::hours(age_hours),
            ingested_at: Utc::now(),
        }
    }

    fn ids(page: &FeedPage) -> Vec<&str> {
        page.items.iter().map(|a| a.id.as_str()).collect()
    }

    #[tokio::test]
    async fn feed_is_newest_first_and_confidence_filtered() {
        let store = VecArticleStore::new(vec![
            article("old", "Science", 90, 48),
            article("new", "Science", 85, 1),
            article("shaky", "Science", 40, 2),
        ]);
        let feed = FeedService::new(store);

        let page = feed.page(&FeedQuery::default()).await.unwrap();

        assert_eq!(ids(&page), vec!["new", "old"]);
        assert_eq!(page.total, 2);
        assert!(page.cursor.is_none());
    }

    #[tokio::test]
    async fn topic_filter_is_case_insensitive() {
        let store = VecArticleStore::new(vec![
            article("a", "Science", 90, 1),
            article("b", "Technology", 90, 2),
        ]);
        let feed = FeedService::new(store);

        let query = FeedQuery {
            topic: Some("science".to_string()),
            ..FeedQuery::default()
        };
        let page = feed.page(&query).await.unwrap();

        assert_eq!(ids(&page), vec!["a"]);
    }

    #[tokio::test]
    async fn cursor_walks_the_feed_without_gaps_or_repeats() {
        let store = VecArticleStore::new(
            (0..5).map(|i| article(&format!("a{i}"), "Science", 90, i)).collect(),
        );
        let feed = FeedService::new(store);

        let first = feed
            .page(&FeedQuery {
                limit: 2,
                ..FeedQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&first), vec!["a0", "a1"]);
        let cursor = first.cursor.clone().unwrap();

        let second = feed
            .page(&FeedQuery {
                limit: 2,
                cursor: Some(cursor),
                ..FeedQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&second), vec!["a2", "a3"]);

        let third = feed
            .page(&FeedQuery {
                limit: 2,
                cursor: second.cursor.clone(),
                ..FeedQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&third), vec!["a4"]);
        assert!(third.cursor.is_none());
    }

    #[tokio::test]
    async fn cursor_splits_articles_sharing_a_publish_time() {
        let shared = Utc::now() - Duration::hours(1);
        let store = VecArticleStore::new(
            ["a", "b", "c"]
                .iter()
                .map(|id| Article {
                    published_at: shared,
                    ..article(id, "Science", 90, 0)
                })
                .collect(),
        );
        let feed = FeedService::new(store);

        let first = feed
            .page(&FeedQuery {
                limit: 2,
                ..FeedQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&first), vec!["a", "b"]);

        let second = feed
            .page(&FeedQuery {
                limit: 2,
                cursor: first.cursor.clone(),
                ..FeedQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(ids(&second), vec!["c"]);
        assert!(second.cursor.is_none());
    }

    #[tokio::test]
    async fn limit_is_clamped_to_the_page_cap() {
        let store = VecArticleStore::new(vec![article("a", "Science", 90, 1)]);
        let feed = FeedService::new(store);

        let page = feed
            .page(&FeedQuery {
                limit: 0,
                ..FeedQuery::default()
            })
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn garbage_cursor_is_rejected() {
        let feed = FeedService::new(VecArticleStore::new(vec![]));

        let result = feed
            .page(&FeedQuery {
                cursor: Some("yesterday-ish".to_string()),
                ..FeedQuery::default()
            })
            .await;
        assert!(matches!(result, Err(FeedError::BadCursor(_))));

        // A bare timestamp without the id part is not a valid cursor either.
        let result = feed
            .page(&FeedQuery {
                cursor: Some(Utc::now().to_rfc3339()),
                ..FeedQuery::default()
            })
            .await;
        assert!(matches!(result, Err(FeedError::BadCursor(_))));
    }

    #[tokio::test]
    async fn total_counts_all_matches_not_just_the_page() {
        let store = VecArticleStore::new(
            (0..7).map(|i| article(&format!("a{i}"), "Science", 90, i)).collect(),
        );
        let feed = FeedService::new(store);

        let page = feed
            .page(&FeedQuery {
                limit: 3,
                ..FeedQuery::default()
            })
            .await
            .unwrap();

        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total, 7);
        assert!(page.cursor.is_some());
    }
}
