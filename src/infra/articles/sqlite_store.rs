use crate::core::feed::{Article, ArticleStore, FeedError};
use crate::core::verify::CredibilityLabel;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Row, Sqlite};
use std::path::Path;

/// Article store on SQLite.
pub struct SqliteArticleStore {
    pool: Pool<Sqlite>,
}

impl SqliteArticleStore {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure the file exists if it's a file path
        let path_str = database_url.trim_start_matches("sqlite://");
        if !database_url.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let pool = SqlitePoolOptions::new().connect(&conn_str).await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                summary TEXT NOT NULL,
                body TEXT NOT NULL,
                url TEXT NOT NULL,
                source_name TEXT NOT NULL,
                source_domain TEXT NOT NULL,
                source_trust REAL NOT NULL DEFAULT 0.5,
                category TEXT NOT NULL DEFAULT 'General',
                confidence INTEGER NOT NULL DEFAULT 0,
                label TEXT NOT NULL DEFAULT 'needs_review',
                published_at TEXT NOT NULL,
                ingested_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_articles_url ON articles (url)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl ArticleStore for SqliteArticleStore {
    async fn upsert(&self, article: Article) -> Result<(), FeedError> {
        sqlx::query(
            r#"
            INSERT INTO articles (
                id, title, summary, body, url, source_name, source_domain,
                source_trust, category, confidence, label, published_at, ingested_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                summary = excluded.summary,
                body = excluded.body,
                url = excluded.url,
                source_name = excluded.source_name,
                source_domain = excluded.source_domain,
                source_trust = excluded.source_trust,
                category = excluded.category,
                confidence = excluded.confidence,
                label = excluded.label,
                published_at = excluded.published_at,
                ingested_at = excluded.ingested_at
            "#,
        )
        .bind(&article.id)
        .bind(&article.title)
        .bind(&article.summary)
        .bind(&article.body)
        .bind(&article.url)
        .bind(&article.source_name)
        .bind(&article.source_domain)
        .bind(article.source_trust)
        .bind(&article.category)
        .bind(article.confidence as i64)
        .bind(article.label.as_str())
        .bind(article.published_at)
        .bind(article.ingested_at)
        .execute(&self.pool)
        .await
        .map_err(|e| FeedError::StorageError(e.to_string()))?;

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Article>, FeedError> {
        let row = sqlx::query("SELECT * FROM articles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| FeedError::StorageError(e.to_string()))?;

        if let Some(row) = row {
            Ok(Some(row_to_article(&row)?))
        } else {
            Ok(None)
        }
    }

    async fn get_by_url(&self, url: &str) -> Result<Option<Article>, FeedError> {
        let row = sqlx::query("SELECT * FROM articles WHERE url = ? LIMIT 1")
            .bind(url)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| FeedError::StorageError(e.to_string()))?;

        if let Some(row) = row {
            Ok(Some(row_to_article(&row)?))
        } else {
            Ok(None)
        }
    }

    async fn list_recent(&self) -> Result<Vec<Article>, FeedError> {
        let rows = sqlx::query("SELECT * FROM articles ORDER BY published_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| FeedError::StorageError(e.to_string()))?;

        let mut articles = Vec::new();
        for row in rows {
            articles.push(row_to_article(&row)?);
        }
        Ok(articles)
    }

    async fn count(&self) -> Result<usize, FeedError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM articles")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| FeedError::StorageError(e.to_string()))?;

        Ok(row.get::<i64, _>("n") as usize)
    }

    async fn set_confidence(
        &self,
        id: &str,
        confidence: u8,
        label: CredibilityLabel,
    ) -> Result<(), FeedError> {
        sqlx::query("UPDATE articles SET confidence = ?, label = ? WHERE id = ?")
            .bind(confidence as i64)
            .bind(label.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| FeedError::StorageError(e.to_string()))?;

        Ok(())
    }
}

fn row_to_article(row: &sqlx::sqlite::SqliteRow) -> Result<Article, FeedError> {
    let label_text: String = row.get("label");
    let label = CredibilityLabel::parse(&label_text)
        .ok_or_else(|| FeedError::StorageError(format!("unknown label '{label_text}'")))?;

    Ok(Article {
        id: row.get("id"),
        title: row.get("title"),
        summary: row.get("summary"),
        body: row.get("body"),
        url: row.get("url"),
        source_name: row.get("source_name"),
        source_domain: row.get("source_domain"),
        source_trust: row.get("source_trust"),
        category: row.get("category"),
        confidence: row.get::<i64, _>("confidence") as u8,
        label,
        published_at: row.get::<DateTime<Utc>, _>("published_at"),
        ingested_at: row.get::<DateTime<Utc>, _>("ingested_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn store_in(dir: &tempfile::TempDir) -> SqliteArticleStore {
        let path = dir.path().join("articles.db");
        SqliteArticleStore::new(path.to_str().unwrap()).await.unwrap()
    }

    fn article(id: &str, age_hours: i64) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Article {id}"),
            summary: "short".to_string(),
            body: "long".to_string(),
            url: format!("https://example.com/{id}"),
            source_name: "Reuters".to_string(),
            source_domain: "reuters.com".to_string(),
            source_trust: 0.95,
            category: "Science".to_string(),
            confidence: 0,
            label: CredibilityLabel::NeedsReview,
            published_at: Utc::now() - Duration::hours(age_hours),
            ingested_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn articles_round_trip_by_id_and_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        store.upsert(article("a1", 1)).await.unwrap();

        let by_id = store.get("a1").await.unwrap().unwrap();
        assert_eq!(by_id.title, "Article a1");
        assert_eq!(by_id.source_trust, 0.95);
        assert_eq!(by_id.label, CredibilityLabel::NeedsReview);

        let by_url = store
            .get_by_url("https://example.com/a1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_url.id, "a1");

        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        store.upsert(article("old", 48)).await.unwrap();
        store.upsert(article("new", 1)).await.unwrap();
        store.upsert(article("middle", 12)).await.unwrap();

        let all = store.list_recent().await.unwrap();
        let ids: Vec<&str> = all.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "middle", "old"]);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn upsert_replaces_an_existing_article() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        store.upsert(article("a1", 1)).await.unwrap();
        let mut changed = article("a1", 1);
        changed.title = "Updated headline".to_string();
        store.upsert(changed).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let fetched = store.get("a1").await.unwrap().unwrap();
        assert_eq!(fetched.title, "Updated headline");
    }

    #[tokio::test]
    async fn verification_verdicts_are_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).await;

        store.upsert(article("a1", 1)).await.unwrap();
        store
            .set_confidence("a1", 82, CredibilityLabel::Verified)
            .await
            .unwrap();

        let fetched = store.get("a1").await.unwrap().unwrap();
        assert_eq!(fetched.confidence, 82);
        assert_eq!(fetched.label, CredibilityLabel::Verified);
    }
}
