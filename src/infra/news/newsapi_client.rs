use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::core::ingest::{ConnectorError, FetchedItem, NewsProvider};

/// Minimal NewsAPI client. It deliberately exposes only the calls the
/// ingest layer needs.
pub struct NewsApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

const PAGE_SIZE: u32 = 100;

impl NewsApiClient {
    pub fn new(api_key: String) -> Result<Self, ConnectorError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ConnectorError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: "https://newsapi.org/v2".to_string(),
            api_key,
        })
    }

    async fn everything(
        &self,
        params: Vec<(&str, String)>,
    ) -> Result<Vec<FetchedItem>, ConnectorError> {
        let url = format!("{}/everything", self.base_url);
        let resp = self
            .client
            .get(url)
            .query(&params)
            .send()
            .await
            .map_err(|e| ConnectorError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ConnectorError::BadResponse(format!(
                "NewsAPI returned {}",
                resp.status()
            )));
        }

        let data: ApiResponse = resp
            .json()
            .await
            .map_err(|e| ConnectorError::BadResponse(e.to_string()))?;

        Ok(data
            .articles
            .unwrap_or_default()
            .into_iter()
            .filter_map(map_article)
            .collect())
    }
}

#[async_trait]
impl NewsProvider for NewsApiClient {
    fn name(&self) -> &str {
        "newsapi"
    }

    async fn fetch_recent(
        &self,
        window_days: u32,
        page: u32,
    ) -> Result<Vec<FetchedItem>, ConnectorError> {
        let from_date = (Utc::now() - chrono::Duration::days(window_days as i64))
            .format("%Y-%m-%d")
            .to_string();
        self.everything(vec![
            ("apiKey", self.api_key.clone()),
            ("from", from_date),
            ("sortBy", "publishedAt".to_string()),
            ("pageSize", PAGE_SIZE.to_string()),
            ("page", page.to_string()),
            ("language", "en".to_string()),
        ])
        .await
    }

    async fn search(&self, query: &str, page: u32) -> Result<Vec<FetchedItem>, ConnectorError> {
        self.everything(vec![
            ("apiKey", self.api_key.clone()),
            ("q", query.to_string()),
            ("sortBy", "relevancy".to_string()),
            ("pageSize", PAGE_SIZE.to_string()),
            ("page", page.to_string()),
            ("language", "en".to_string()),
        ])
        .await
    }

    // NewsAPI has no single-article endpoint.
    async fn fetch_by_url(&self, _url: &str) -> Result<Option<FetchedItem>, ConnectorError> {
        Ok(None)
    }
}

fn map_article(api: ApiArticle) -> Option<FetchedItem> {
    let url = api.url.filter(|u| !u.is_empty())?;
    let title = api.title.filter(|t| !t.is_empty())?;

    let published_at = api
        .published_at
        .as_deref()
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|dt| dt.with_timezone(&Utc));

    let body_text = api
        .description
        .filter(|d| !d.is_empty())
        .or(api.content.filter(|c| !c.is_empty()))
        .unwrap_or_default();

    Some(FetchedItem {
        source_name: api
            .source
            .and_then(|s| s.name)
            .unwrap_or_else(|| "Unknown".to_string()),
        source_domain: extract_domain(&url),
        url,
        title,
        body_text,
        published_at,
    })
}

fn extract_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    articles: Option<Vec<ApiArticle>>,
}

#[derive(Debug, Deserialize)]
struct ApiArticle {
    source: Option<ApiSource>,
    url: Option<String>,
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    name: Option<String>,
}
