// Endpoint logic for the HTTP API. Everything here is transport-free: the
// server loop in `http_server.rs` hands `route` a parsed method, path, query
// and body, and gets back a status code and JSON value. Tests drive the same
// function directly.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::chat::{ChatError, ChatService};
use crate::core::demo::DemoService;
use crate::core::evidence::EvidenceIndex;
use crate::core::feed::{Article, ArticleStore, FeedError, FeedQuery, FeedService};
use crate::core::ingest::IngestService;
use crate::core::profile::{Plan, Preferences, ProfileError, ProfileService};
use crate::core::reports::{Report, ReportError, ReportService, ReportStatus};
use crate::core::tasks::DeferredError;
use crate::core::verify::{LexicalStanceDetector, VerificationService};
use crate::infra::articles::SqliteArticleStore;
use crate::infra::evidence::InMemoryEvidenceIndex;
use crate::infra::profile::JsonUserStore;
use crate::infra::reports::SqliteReportStore;

/// Session key used when a request does not carry one.
const DEFAULT_SESSION: &str = "default";

// ============================================================================
// SHARED STATE
// ============================================================================

/// Every service the endpoints reach for, wired once at startup and cloned
/// into each request's worker thread.
#[derive(Clone)]
pub struct AppState {
    pub reports: Arc<ReportService<SqliteReportStore>>,
    pub feed: Arc<FeedService<Arc<SqliteArticleStore>>>,
    pub verify: Arc<
        VerificationService<Arc<InMemoryEvidenceIndex>, Arc<SqliteArticleStore>, LexicalStanceDetector>,
    >,
    pub chat: Arc<ChatService<Arc<InMemoryEvidenceIndex>, JsonUserStore>>,
    pub profiles: Arc<ProfileService<JsonUserStore>>,
    pub ingest: Arc<IngestService<Arc<SqliteArticleStore>, Arc<InMemoryEvidenceIndex>>>,
    pub articles: Arc<SqliteArticleStore>,
    pub index: Arc<InMemoryEvidenceIndex>,
    /// Canned delayed replies; `Some` only in demo mode.
    pub demo: Option<Arc<DemoService>>,
}

// ============================================================================
// REQUEST SHAPES
// ============================================================================

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    url: Option<String>,
    text: Option<String>,
    session_id: Option<String>,
    /// Present when the caller wants the request metered against their quota.
    user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    user_id: String,
    /// Defaults to the user id, giving each user one rolling session.
    session_id: Option<String>,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct CancelRequest {
    session_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusChangeRequest {
    status: String,
    confidence: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct SubmitReportRequest {
    title: String,
    url: String,
    reported_by: String,
    reason: String,
}

#[derive(Debug, Default, Deserialize)]
struct IngestRequest {
    query: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    user_id: String,
    display_name: String,
    email: String,
    plan: Option<Plan>,
}

#[derive(Debug, Deserialize)]
struct SavedArticleRequest {
    article_id: String,
    saved: bool,
}

// ============================================================================
// ROUTING
// ============================================================================

/// Dispatch one request to its endpoint.
pub async fn route(
    state: &AppState,
    method: &str,
    path: &str,
    query: &str,
    body: &str,
) -> (u16, serde_json::Value) {
    match (method, path) {
        ("GET", "/health") => health(state).await,
        ("GET", "/feed") => feed_page(state, query).await,
        ("GET", p) if p.starts_with("/feed/") => feed_article(state, p).await,
        ("POST", "/verify") => verify(state, body).await,
        ("POST", "/chat") => chat(state, body).await,
        ("POST", "/chat/cancel") => chat_cancel(state, body).await,
        ("GET", "/chat/history") => chat_history(state, query).await,
        ("GET", "/admin/reports") => admin_reports(state).await,
        ("POST", "/admin/reports") => admin_submit_report(state, body).await,
        ("POST", p) if p.starts_with("/admin/reports/") && p.ends_with("/status") => {
            admin_report_status(state, p, body).await
        }
        ("POST", "/admin/ingest") => admin_ingest(state, body).await,
        ("POST", "/profile") => register_profile(state, body).await,
        ("POST", p) if p.starts_with("/profile/") && p.ends_with("/preferences") => {
            profile_preferences(state, p, body).await
        }
        ("POST", p) if p.starts_with("/profile/") && p.ends_with("/saved") => {
            profile_saved(state, p, body).await
        }
        ("GET", p) if p.starts_with("/profile/") => profile(state, p).await,
        _ => (404, json!({ "error": "not_found" })),
    }
}

// ============================================================================
// ENDPOINTS
// ============================================================================

async fn health(state: &AppState) -> (u16, serde_json::Value) {
    let database = match state.articles.count().await {
        Ok(_) => "ok".to_string(),
        Err(e) => format!("error: {e}"),
    };
    let index = match state.index.len().await {
        Ok(_) => "ok".to_string(),
        Err(e) => format!("error: {e}"),
    };

    let status = if database == "ok" && index == "ok" {
        "healthy"
    } else {
        "degraded"
    };

    (
        200,
        json!({
            "status": status,
            "timestamp": Utc::now(),
            "version": env!("CARGO_PKG_VERSION"),
            "demo_mode": state.demo.is_some(),
            "database": database,
            "index": index,
        }),
    )
}

async fn feed_page(state: &AppState, query: &str) -> (u16, serde_json::Value) {
    let params = query_params(query);
    let defaults = FeedQuery::default();

    let min_confidence = match params.get("min_confidence").map(|v| v.parse::<u8>()) {
        None => defaults.min_confidence,
        Some(Ok(v)) if v <= 100 => v,
        Some(_) => {
            return (400, json!({ "error": "min_confidence must be a number in 0..=100" }))
        }
    };
    let limit = match params.get("limit").map(|v| v.parse()) {
        None => defaults.limit,
        Some(Ok(v)) => v,
        Some(Err(_)) => return (400, json!({ "error": "limit must be a positive number" })),
    };

    let feed_query = FeedQuery {
        topic: params.get("topic").cloned(),
        min_confidence,
        limit,
        cursor: params.get("cursor").cloned(),
    };

    match state.feed.page(&feed_query).await {
        Ok(page) => (
            200,
            json!({
                "items": page.items.iter().map(feed_item).collect::<Vec<_>>(),
                "cursor": page.cursor,
                "total": page.total,
            }),
        ),
        Err(e) => feed_error(e),
    }
}

/// Feed card shape: the summary instead of the full body, with the verdict
/// present as both the numeric score and its label.
fn feed_item(article: &Article) -> serde_json::Value {
    json!({
        "id": article.id,
        "title": article.title,
        "summary": article.summary,
        "url": article.url,
        "source": article.source_name,
        "cred_score": article.confidence as f64,
        "label": article.label,
        "category": article.category,
        "confidence": article.confidence,
        "published_at": article.published_at,
    })
}

async fn feed_article(state: &AppState, path: &str) -> (u16, serde_json::Value) {
    let Some(id) = path_param(path, "/feed/", None) else {
        return (404, json!({ "error": "not_found" }));
    };

    match state.feed.article(id).await {
        Ok(Some(article)) => (200, json!({ "article": article })),
        Ok(None) => (404, json!({ "error": format!("no article with id {id}") })),
        Err(e) => feed_error(e),
    }
}

async fn verify(state: &AppState, body: &str) -> (u16, serde_json::Value) {
    let req: VerifyRequest = match parse_body(body) {
        Ok(req) => req,
        Err(resp) => return resp,
    };

    let target = match req.url.as_deref().or(req.text.as_deref()) {
        Some(target) => target.to_string(),
        None => {
            return (400, json!({ "error": "Either 'url' or 'text' must be provided" }));
        }
    };

    if let Some(demo) = &state.demo {
        let session = req.session_id.as_deref().unwrap_or(DEFAULT_SESSION);
        return match demo.verification(session, &target).wait().await {
            Ok(report) => (200, to_json(&report)),
            Err(DeferredError::Cancelled) => (409, json!({ "error": "cancelled" })),
        };
    }

    let mut verifies_remaining = None;
    if let Some(user_id) = &req.user_id {
        match state.profiles.spend_verify(user_id).await {
            Ok(left) => verifies_remaining = left,
            Err(e) => return profile_error(e),
        }
    }

    let report = match &req.url {
        Some(url) => {
            match state.ingest.ensure_url(url).await {
                Ok(true) => {}
                Ok(false) => tracing::info!("No provider could supply {}", url),
                Err(e) => tracing::warn!("On-demand ingest of {} failed: {}", url, e),
            }
            match state.verify.verify_url(url).await {
                Ok(report) => report,
                Err(e) => return (500, json!({ "error": e.to_string() })),
            }
        }
        // Without a url the target is the submitted text.
        None => state.verify.verify_text(&target).await,
    };

    let mut response = to_json(&report);
    if let Some(left) = verifies_remaining {
        response["verifies_remaining"] = json!(left);
    }
    (200, response)
}

async fn chat(state: &AppState, body: &str) -> (u16, serde_json::Value) {
    let req: ChatRequest = match parse_body(body) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    if req.prompt.trim().is_empty() {
        return (400, json!({ "error": "Prompt must not be empty" }));
    }
    let session = req.session_id.as_deref().unwrap_or(&req.user_id);

    if let Some(demo) = &state.demo {
        return match demo.chat_reply(session, &req.prompt).wait().await {
            Ok(reply) => (200, to_json(&reply)),
            Err(DeferredError::Cancelled) => (409, json!({ "error": "cancelled" })),
        };
    }

    match state.chat.ask(&req.user_id, session, &req.prompt).await {
        Ok(reply) => (200, to_json(&reply)),
        Err(e) => chat_error(e),
    }
}

async fn chat_cancel(state: &AppState, body: &str) -> (u16, serde_json::Value) {
    let req: CancelRequest = match parse_body(body) {
        Ok(req) => req,
        Err(resp) => return resp,
    };

    // Live replies are synchronous, so outside demo mode there is never a
    // pending reply to cancel.
    let cancelled = match &state.demo {
        Some(demo) => demo.cancel_pending(&req.session_id),
        None => false,
    };
    (200, json!({ "cancelled": cancelled }))
}

async fn chat_history(state: &AppState, query: &str) -> (u16, serde_json::Value) {
    let params = query_params(query);
    let Some(session) = params.get("session_id") else {
        return (400, json!({ "error": "session_id query parameter is required" }));
    };

    (200, json!({ "messages": state.chat.history(session) }))
}

async fn admin_reports(state: &AppState) -> (u16, serde_json::Value) {
    match state.reports.partition().await {
        Ok(board) => {
            let stats = board.stats();
            (200, json!({ "board": board, "stats": stats, "total": stats.total() }))
        }
        Err(e) => report_error(e),
    }
}

async fn admin_submit_report(state: &AppState, body: &str) -> (u16, serde_json::Value) {
    let req: SubmitReportRequest = match parse_body(body) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    if req.title.trim().is_empty() || req.url.trim().is_empty() {
        return (400, json!({ "error": "title and url must not be empty" }));
    }

    let report = Report::new(req.title, req.url, req.reported_by, req.reason);
    match state.reports.submit(report).await {
        Ok(report) => (200, json!({ "report": report })),
        Err(e) => report_error(e),
    }
}

async fn admin_report_status(state: &AppState, path: &str, body: &str) -> (u16, serde_json::Value) {
    let Some(id) = path_param(path, "/admin/reports/", Some("/status")) else {
        return (404, json!({ "error": "not_found" }));
    };
    let req: StatusChangeRequest = match parse_body(body) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    let Some(status) = ReportStatus::parse(&req.status) else {
        return (400, json!({ "error": format!("unknown status '{}'", req.status) }));
    };

    let result = match req.confidence {
        Some(confidence) => {
            state
                .reports
                .transition_with_confidence(id, status, confidence)
                .await
        }
        None => state.reports.transition(id, status).await,
    };
    match result {
        Ok(report) => (200, json!({ "report": report })),
        Err(e) => report_error(e),
    }
}

async fn admin_ingest(state: &AppState, body: &str) -> (u16, serde_json::Value) {
    let req: IngestRequest = if body.trim().is_empty() {
        IngestRequest::default()
    } else {
        match parse_body(body) {
            Ok(req) => req,
            Err(resp) => return resp,
        }
    };

    let result = match req.query.as_deref().filter(|q| !q.trim().is_empty()) {
        Some(query) => state.ingest.poll_query(query).await,
        None => state.ingest.poll_once().await,
    };
    let stats = match result {
        Ok(stats) => stats,
        Err(e) => return (500, json!({ "error": e.to_string() })),
    };

    for article_id in &stats.new_article_ids {
        if let Err(e) = state.verify.score_article(article_id).await {
            tracing::warn!("Scoring ingested article {} failed: {}", article_id, e);
        }
    }

    (
        200,
        json!({
            "fetched": stats.fetched,
            "new_articles": stats.new_article_ids.len(),
            "new_snippets": stats.new_snippets,
        }),
    )
}

async fn register_profile(state: &AppState, body: &str) -> (u16, serde_json::Value) {
    let req: RegisterRequest = match parse_body(body) {
        Ok(req) => req,
        Err(resp) => return resp,
    };
    if req.user_id.trim().is_empty() {
        return (400, json!({ "error": "user_id must not be empty" }));
    }

    let plan = req.plan.unwrap_or(Plan::Free);
    match state
        .profiles
        .register(&req.user_id, &req.display_name, &req.email, plan)
        .await
    {
        Ok(profile) => (200, json!({ "profile": profile })),
        Err(e) => profile_error(e),
    }
}

async fn profile(state: &AppState, path: &str) -> (u16, serde_json::Value) {
    let Some(user_id) = path_param(path, "/profile/", None) else {
        return (404, json!({ "error": "not_found" }));
    };

    match state.profiles.get_profile(user_id).await {
        Ok(profile) => (200, json!({ "profile": profile })),
        Err(e) => profile_error(e),
    }
}

async fn profile_preferences(state: &AppState, path: &str, body: &str) -> (u16, serde_json::Value) {
    let Some(user_id) = path_param(path, "/profile/", Some("/preferences")) else {
        return (404, json!({ "error": "not_found" }));
    };
    let preferences: Preferences = match parse_body(body) {
        Ok(preferences) => preferences,
        Err(resp) => return resp,
    };

    match state.profiles.set_preferences(user_id, preferences).await {
        Ok(profile) => (200, json!({ "profile": profile })),
        Err(e) => profile_error(e),
    }
}

async fn profile_saved(state: &AppState, path: &str, body: &str) -> (u16, serde_json::Value) {
    let Some(user_id) = path_param(path, "/profile/", Some("/saved")) else {
        return (404, json!({ "error": "not_found" }));
    };
    let req: SavedArticleRequest = match parse_body(body) {
        Ok(req) => req,
        Err(resp) => return resp,
    };

    match state
        .profiles
        .save_article(user_id, &req.article_id, req.saved)
        .await
    {
        Ok(profile) => (200, json!({ "profile": profile })),
        Err(e) => profile_error(e),
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, (u16, serde_json::Value)> {
    serde_json::from_str(body)
        .map_err(|e| (400, json!({ "error": "invalid_json", "details": e.to_string() })))
}

fn to_json<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_else(|e| json!({ "error": e.to_string() }))
}

/// Decoded query string pairs. Repeated keys keep the last value.
fn query_params(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .collect()
}

/// The path segment between `prefix` and `suffix`. `None` when the segment is
/// empty or spans further slashes.
fn path_param<'a>(path: &'a str, prefix: &str, suffix: Option<&str>) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    let param = match suffix {
        Some(suffix) => rest.strip_suffix(suffix)?,
        None => rest,
    };
    (!param.is_empty() && !param.contains('/')).then_some(param)
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

fn report_error(e: ReportError) -> (u16, serde_json::Value) {
    let status = match &e {
        ReportError::NotFound(_) => 404,
        ReportError::Duplicate(_) | ReportError::IllegalTransition { .. } => 409,
        ReportError::ConfidenceOutsideVerified(_) | ReportError::ConfidenceOutOfRange(_) => 400,
        ReportError::StorageError(_) => 500,
    };
    (status, json!({ "error": e.to_string() }))
}

fn profile_error(e: ProfileError) -> (u16, serde_json::Value) {
    let status = match &e {
        ProfileError::UnknownUser(_) => 404,
        ProfileError::Duplicate(_) => 409,
        ProfileError::QuotaExhausted => 429,
        ProfileError::StorageError(_) => 500,
    };
    (status, json!({ "error": e.to_string() }))
}

fn chat_error(e: ChatError) -> (u16, serde_json::Value) {
    let status = match &e {
        ChatError::UnknownUser(_) => 404,
        ChatError::RetrievalError(_) | ChatError::StorageError(_) => 500,
    };
    (status, json!({ "error": e.to_string() }))
}

fn feed_error(e: FeedError) -> (u16, serde_json::Value) {
    let status = match &e {
        FeedError::BadCursor(_) => 400,
        FeedError::StorageError(_) => 500,
    };
    (status, json!({ "error": e.to_string() }))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    use crate::core::chat::ChatConfig;
    use crate::core::evidence::{EvidenceSnippet, SourceRegistry};
    use crate::core::profile::QuotaConfig;
    use crate::core::verify::{CredibilityLabel, VerifyConfig};

    async fn app_state(dir: &TempDir, demo: bool) -> AppState {
        let articles = Arc::new(
            SqliteArticleStore::new(dir.path().join("articles.db").to_str().unwrap())
                .await
                .unwrap(),
        );
        let index = Arc::new(InMemoryEvidenceIndex::new());
        let reports = Arc::new(ReportService::new(
            SqliteReportStore::new(dir.path().join("reports.db").to_str().unwrap())
                .await
                .unwrap(),
        ));
        let profiles = Arc::new(ProfileService::new(
            JsonUserStore::new(dir.path().join("users.json")),
            QuotaConfig::default(),
        ));
        profiles
            .register("u1", "Alex", "alex@example.com", Plan::Free)
            .await
            .unwrap();

        AppState {
            reports,
            feed: Arc::new(FeedService::new(articles.clone())),
            verify: Arc::new(VerificationService::new(
                index.clone(),
                articles.clone(),
                LexicalStanceDetector,
                VerifyConfig::default(),
            )),
            chat: Arc::new(ChatService::new(
                index.clone(),
                profiles.clone(),
                ChatConfig::default(),
            )),
            profiles,
            ingest: Arc::new(IngestService::new(
                Vec::new(),
                articles.clone(),
                index.clone(),
                SourceRegistry::with_known_sources(),
            )),
            articles,
            index,
            demo: demo.then(|| {
                Arc::new(DemoService::new(
                    std::time::Duration::from_millis(20),
                    std::time::Duration::from_millis(20),
                ))
            }),
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

    fn snippet(id: &str, source: &str, trust: f64, sentence: &str) -> EvidenceSnippet {
        EvidenceSnippet {
            id: id.to_string(),
            article_id: format!("article-{id}"),
            title: format!("Title {id}"),
            url: format!("https://example.com/{id}"),
            source_name: source.to_string(),
            source_domain: "example.com".to_string(),
            trust,
            sentence: sentence.to_string(),
        }
    }

    const CLAIM: &str = "New research shows vaccines reduce severe illness in adults";

    fn supporting_sentence() -> String {
        "Research shows vaccines reduce severe illness in many adults across trials".to_string()
    }

    async fn seed_supporting_evidence(state: &AppState) {
        state
            .index
            .add(vec![
                snippet("s1", "Reuters", 0.95, &supporting_sentence()),
                snippet("s2", "BBC News", 0.90, &supporting_sentence()),
                snippet("s3", "Nature Medicine", 0.98, &supporting_sentence()),
            ])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unknown_routes_are_404() {
        let dir = TempDir::new().unwrap();
        let state = app_state(&dir, false).await;

        let (status, body) = route(&state, "GET", "/nope", "", "").await;

        assert_eq!(status, 404);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn health_reports_probes_and_mode() {
        let dir = TempDir::new().unwrap();
        let state = app_state(&dir, false).await;

        let (status, body) = route(&state, "GET", "/health", "", "").await;

        assert_eq!(status, 200);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "ok");
        assert_eq!(body["index"], "ok");
        assert_eq!(body["demo_mode"], false);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn feed_filters_and_pages_through_the_api() {
        let dir = TempDir::new().unwrap();
        let state = app_state(&dir, false).await;
        for a in [
            article("a0", "Science", 90, 0),
            article("a1", "Science", 90, 1),
            article("a2", "Science", 90, 2),
            article("shaky", "Science", 40, 3),
        ] {
            state.articles.upsert(a).await.unwrap();
        }

        let (status, body) = route(&state, "GET", "/feed", "limit=2", "").await;
        assert_eq!(status, 200);
        assert_eq!(body["total"], 3);
        assert_eq!(body["items"].as_array().unwrap().len(), 2);
        assert_eq!(body["items"][0]["id"], "a0");
        assert_eq!(body["items"][0]["label"], "verified");
        assert_eq!(body["items"][0]["cred_score"], 90.0);

        let cursor = body["cursor"].as_str().unwrap().to_string();
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("limit", "2")
            .append_pair("cursor", &cursor)
            .finish();
        let (status, second) = route(&state, "GET", "/feed", &query, "").await;
        assert_eq!(status, 200);
        assert_eq!(second["items"].as_array().unwrap().len(), 1);
        assert_eq!(second["items"][0]["id"], "a2");
        assert!(second["cursor"].is_null());

        let (status, all) = route(&state, "GET", "/feed", "min_confidence=30", "").await;
        assert_eq!(status, 200);
        assert_eq!(all["total"], 4);

        let (status, _) = route(&state, "GET", "/feed", "limit=lots", "").await;
        assert_eq!(status, 400);

        // Out-of-range confidence is an error, not an empty feed.
        let (status, body) = route(&state, "GET", "/feed", "min_confidence=101", "").await;
        assert_eq!(status, 400);
        assert!(body["error"].as_str().unwrap().contains("0..=100"));
        let (status, _) = route(&state, "GET", "/feed", "min_confidence=-1", "").await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn feed_detail_returns_the_full_article_or_404() {
        let dir = TempDir::new().unwrap();
        let state = app_state(&dir, false).await;
        state
            .articles
            .upsert(article("a1", "Science", 90, 1))
            .await
            .unwrap();

        let (status, body) = route(&state, "GET", "/feed/a1", "", "").await;
        assert_eq!(status, 200);
        assert_eq!(body["article"]["id"], "a1");
        assert_eq!(body["article"]["body"], "body");

        let (status, _) = route(&state, "GET", "/feed/ghost", "", "").await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn verify_requires_a_url_or_text() {
        let dir = TempDir::new().unwrap();
        let state = app_state(&dir, false).await;

        let (status, body) = route(&state, "POST", "/verify", "", "{}").await;

        assert_eq!(status, 400);
        assert_eq!(body["error"], "Either 'url' or 'text' must be provided");
    }

    #[tokio::test]
    async fn verify_scores_submitted_text() {
        let dir = TempDir::new().unwrap();
        let state = app_state(&dir, false).await;
        seed_supporting_evidence(&state).await;

        let body = json!({ "text": format!("{CLAIM}.") }).to_string();
        let (status, reply) = route(&state, "POST", "/verify", "", &body).await;

        assert_eq!(status, 200);
        let claims = reply["claims"].as_array().unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0]["label"], "verified");
        assert_eq!(reply["checked_sources"], 3);
        assert!(reply.get("verifies_remaining").is_none());
    }

    #[tokio::test]
    async fn verify_meters_quota_when_a_user_is_named() {
        let dir = TempDir::new().unwrap();
        let state = app_state(&dir, false).await;

        let body = json!({ "text": format!("{CLAIM}."), "user_id": "u1" }).to_string();
        let (status, reply) = route(&state, "POST", "/verify", "", &body).await;

        assert_eq!(status, 200);
        assert_eq!(reply["verifies_remaining"], 9);
    }

    #[tokio::test]
    async fn verify_of_an_unknown_url_yields_an_empty_report() {
        let dir = TempDir::new().unwrap();
        let state = app_state(&dir, false).await;

        let body = json!({ "url": "https://example.com/never-seen" }).to_string();
        let (status, reply) = route(&state, "POST", "/verify", "", &body).await;

        assert_eq!(status, 200);
        assert!(reply["claims"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn chat_answers_and_defaults_the_session_to_the_user() {
        let dir = TempDir::new().unwrap();
        let state = app_state(&dir, false).await;
        seed_supporting_evidence(&state).await;

        let body = json!({ "user_id": "u1", "prompt": "Do vaccines reduce severe illness?" })
            .to_string();
        let (status, reply) = route(&state, "POST", "/chat", "", &body).await;

        assert_eq!(status, 200);
        assert!(reply["answer"]
            .as_str()
            .unwrap()
            .starts_with("Based on verified sources:"));
        assert_eq!(reply["chats_remaining"], 4);

        let (status, history) = route(&state, "GET", "/chat/history", "session_id=u1", "").await;
        assert_eq!(status, 200);
        assert_eq!(history["messages"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn chat_rejects_unknown_users_and_blank_prompts() {
        let dir = TempDir::new().unwrap();
        let state = app_state(&dir, false).await;

        let body = json!({ "user_id": "ghost", "prompt": "hello?" }).to_string();
        let (status, _) = route(&state, "POST", "/chat", "", &body).await;
        assert_eq!(status, 404);

        let body = json!({ "user_id": "u1", "prompt": "  " }).to_string();
        let (status, _) = route(&state, "POST", "/chat", "", &body).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn report_lifecycle_runs_through_the_admin_routes() {
        let dir = TempDir::new().unwrap();
        let state = app_state(&dir, false).await;

        let body = json!({
            "title": "Miracle cure spreading online",
            "url": "https://suspect.example.com/cure",
            "reported_by": "Alex",
            "reason": "Too good to be true",
        })
        .to_string();
        let (status, created) = route(&state, "POST", "/admin/reports", "", &body).await;
        assert_eq!(status, 200);
        let id = created["report"]["id"].as_str().unwrap().to_string();
        assert_eq!(created["report"]["status"], "reported");

        let path = format!("/admin/reports/{id}/status");
        let body = json!({ "status": "reviewing" }).to_string();
        let (status, moved) = route(&state, "POST", &path, "", &body).await;
        assert_eq!(status, 200);
        assert_eq!(moved["report"]["status"], "reviewing");

        let body = json!({ "status": "verified", "confidence": 88 }).to_string();
        let (status, verified) = route(&state, "POST", &path, "", &body).await;
        assert_eq!(status, 200);
        assert_eq!(verified["report"]["confidence"], 88);

        let (status, board) = route(&state, "GET", "/admin/reports", "", "").await;
        assert_eq!(status, 200);
        assert_eq!(board["stats"]["verified"], 1);
        assert_eq!(board["total"], 1);
        assert_eq!(board["board"]["verified"][0]["id"], id.as_str());
    }

    #[tokio::test]
    async fn bad_status_changes_map_to_the_right_codes() {
        let dir = TempDir::new().unwrap();
        let state = app_state(&dir, false).await;

        let path = "/admin/reports/ghost/status";
        let body = json!({ "status": "reviewing" }).to_string();
        let (status, _) = route(&state, "POST", path, "", &body).await;
        assert_eq!(status, 404);

        let body = json!({ "status": "archived" }).to_string();
        let (status, reply) = route(&state, "POST", path, "", &body).await;
        assert_eq!(status, 400);
        assert_eq!(reply["error"], "unknown status 'archived'");

        // Confidence outside a verified transition is refused before the id
        // is even looked up.
        let body = json!({ "status": "rejected", "confidence": 10 }).to_string();
        let (status, _) = route(&state, "POST", path, "", &body).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn ingest_without_providers_reports_an_empty_pass() {
        let dir = TempDir::new().unwrap();
        let state = app_state(&dir, false).await;

        let (status, body) = route(&state, "POST", "/admin/ingest", "", "").await;

        assert_eq!(status, 200);
        assert_eq!(body["fetched"], 0);
        assert_eq!(body["new_articles"], 0);
    }

    #[tokio::test]
    async fn profile_routes_cover_the_account_surface() {
        let dir = TempDir::new().unwrap();
        let state = app_state(&dir, false).await;

        let (status, body) = route(&state, "GET", "/profile/u1", "", "").await;
        assert_eq!(status, 200);
        assert_eq!(body["profile"]["plan"], "free");

        let (status, _) = route(&state, "GET", "/profile/ghost", "", "").await;
        assert_eq!(status, 404);

        let prefs = json!({ "email_notifications": false, "auto_save_articles": true })
            .to_string();
        let (status, body) =
            route(&state, "POST", "/profile/u1/preferences", "", &prefs).await;
        assert_eq!(status, 200);
        assert_eq!(body["profile"]["preferences"]["auto_save_articles"], true);

        let save = json!({ "article_id": "a1", "saved": true }).to_string();
        let (status, body) = route(&state, "POST", "/profile/u1/saved", "", &save).await;
        assert_eq!(status, 200);
        assert_eq!(body["profile"]["saved_articles"][0], "a1");

        let register = json!({
            "user_id": "u2",
            "display_name": "Sam",
            "email": "sam@example.com",
            "plan": "pro",
        })
        .to_string();
        let (status, body) = route(&state, "POST", "/profile", "", &register).await;
        assert_eq!(status, 200);
        assert_eq!(body["profile"]["plan"], "pro");

        let (status, _) = route(&state, "POST", "/profile", "", &register).await;
        assert_eq!(status, 409);
    }

    #[tokio::test]
    async fn demo_mode_serves_the_canned_verification() {
        let dir = TempDir::new().unwrap();
        let state = app_state(&dir, true).await;

        let body = json!({ "url": "https://example.com/article" }).to_string();
        let (status, reply) = route(&state, "POST", "/verify", "", &body).await;

        assert_eq!(status, 200);
        assert_eq!(reply["claims"][0]["cred_score"], 94.0);
        assert_eq!(reply["claims"][0]["label"], "verified");
    }

    #[tokio::test]
    async fn demo_chat_can_be_cancelled_mid_flight() {
        let dir = TempDir::new().unwrap();
        let state = app_state(&dir, true).await;

        let chat_state = state.clone();
        let pending = tokio::spawn(async move {
            let body = json!({
                "user_id": "u1",
                "session_id": "s1",
                "prompt": "is this real?",
            })
            .to_string();
            route(&chat_state, "POST", "/chat", "", &body).await
        });

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let cancel = json!({ "session_id": "s1" }).to_string();
        let (status, body) = route(&state, "POST", "/chat/cancel", "", &cancel).await;
        assert_eq!(status, 200);
        assert_eq!(body["cancelled"], true);

        let (status, body) = pending.await.unwrap();
        assert_eq!(status, 409);
        assert_eq!(body["error"], "cancelled");

        // Nothing left to cancel afterwards.
        let (_, body) = route(&state, "POST", "/chat/cancel", "", &cancel).await;
        assert_eq!(body["cancelled"], false);
    }
}
