// This is the entry point of the fact-checking service.
//
// **Architecture Overview:**
// - `core/` = Business logic (transport-agnostic)
// - `infra/` = Implementations of core traits (databases, APIs)
// - `api/` = HTTP-specific adapters (routes, handlers)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Seed demo content when demo mode is on
// 4. Start the background loops and the HTTP server

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "api/http_layer.rs"]
mod api;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

use std::sync::Arc;
use std::time::Duration;

use crate::api::handlers::AppState;
use crate::api::http_server::start_http_server;
use crate::core::chat::{ChatConfig, ChatService};
use crate::core::demo::{demo_articles, demo_reports, demo_snippets, DemoService};
use crate::core::demo::{DEMO_USER_EMAIL, DEMO_USER_ID, DEMO_USER_NAME};
use crate::core::evidence::{EvidenceIndex, SourceRegistry};
use crate::core::feed::{ArticleStore, FeedService};
use crate::core::ingest::{IngestService, NewsProvider};
use crate::core::profile::{Plan, ProfileError, ProfileService, QuotaConfig};
use crate::core::reports::{ReportError, ReportService, TransitionPolicy};
use crate::core::verify::{LexicalStanceDetector, VerificationService, VerifyConfig};
use crate::infra::articles::SqliteArticleStore;
use crate::infra::evidence::InMemoryEvidenceIndex;
use crate::infra::news::{FactCheckClient, GuardedProvider, NewsApiClient};
use crate::infra::profile::JsonUserStore;
use crate::infra::reports::SqliteReportStore;

/// Everything read from the environment, with defaults suitable for a local
/// run. Only values that cannot be defaulted are fatal when missing.
struct AppConfig {
    bind_addr: String,
    admin_token: Option<String>,
    demo_mode: bool,
    transition_policy: TransitionPolicy,
    quotas: QuotaConfig,
    newsapi_key: Option<String>,
    factcheck_key: Option<String>,
    news_cache_ttl: Duration,
    ingest_poll_interval: Duration,
    demo_chat_delay: Duration,
    demo_verify_delay: Duration,
}

impl AppConfig {
    fn from_env() -> Self {
        let transition_policy = match std::env::var("REPORT_TRANSITION_POLICY") {
            Ok(raw) => TransitionPolicy::parse(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    "Unknown REPORT_TRANSITION_POLICY '{}', using unrestricted",
                    raw
                );
                TransitionPolicy::default()
            }),
            Err(_) => TransitionPolicy::default(),
        };

        Self {
            bind_addr: std::env::var("BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            admin_token: std::env::var("ADMIN_TOKEN").ok(),
            demo_mode: env_parsed("DEMO_MODE", false),
            transition_policy,
            quotas: QuotaConfig {
                free_chats_per_day: env_parsed("FREE_CHATS_PER_DAY", 5),
                free_verifies_per_day: env_parsed("FREE_VERIFIES_PER_DAY", 10),
            },
            newsapi_key: std::env::var("NEWSAPI_KEY").ok().filter(|k| !k.is_empty()),
            factcheck_key: std::env::var("GOOGLE_FACTCHECK_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            news_cache_ttl: Duration::from_secs(env_parsed("NEWS_CACHE_TTL_SECS", 3600)),
            ingest_poll_interval: Duration::from_secs(env_parsed("INGEST_POLL_SECS", 900)),
            demo_chat_delay: Duration::from_millis(env_parsed("DEMO_CHAT_DELAY_MS", 2000)),
            demo_verify_delay: Duration::from_millis(env_parsed("DEMO_VERIFY_DELAY_MS", 3000)),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = AppConfig::from_env();

    // Keep runtime databases in a dedicated folder so the repo root stays tidy.
    let data_dir = "data";
    std::fs::create_dir_all(data_dir).expect("Failed to create data directory for SQLite files");
    let articles_db_path = format!("{}/articles.db", data_dir);
    let reports_db_path = format!("{}/reports.db", data_dir);
    let users_path = format!("{}/users.json", data_dir);

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let articles = Arc::new(
        SqliteArticleStore::new(&articles_db_path)
            .await
            .expect("Failed to initialize article store"),
    );

    let report_store = SqliteReportStore::new(&reports_db_path)
        .await
        .expect("Failed to initialize report store");
    let reports = Arc::new(ReportService::with_policy(
        report_store,
        config.transition_policy,
    ));

    let index = Arc::new(InMemoryEvidenceIndex::new());

    let profiles = Arc::new(ProfileService::new(
        JsonUserStore::new(&users_path),
        config.quotas,
    ));

    // News providers. Without any API keys there is nothing to poll; the
    // rest of the service still works off whatever the stores already hold.
    let mut providers: Vec<Box<dyn NewsProvider>> = Vec::new();
    if let Some(key) = config.newsapi_key.clone() {
        let client = NewsApiClient::new(key).expect("Failed to create NewsAPI client");
        providers.push(Box::new(GuardedProvider::new(client, config.news_cache_ttl)));
    }
    if let Some(key) = config.factcheck_key.clone() {
        let client = FactCheckClient::new(key).expect("Failed to create Fact Check client");
        providers.push(Box::new(GuardedProvider::new(client, config.news_cache_ttl)));
    }
    if providers.is_empty() {
        tracing::warn!("No provider API keys set, running without news providers");
    }

    let ingest = Arc::new(IngestService::new(
        providers,
        articles.clone(),
        index.clone(),
        SourceRegistry::with_known_sources(),
    ));

    let verify = Arc::new(VerificationService::new(
        index.clone(),
        articles.clone(),
        LexicalStanceDetector,
        VerifyConfig::default(),
    ));

    let chat = Arc::new(ChatService::new(
        index.clone(),
        profiles.clone(),
        ChatConfig::default(),
    ));

    let feed = Arc::new(FeedService::new(articles.clone()));

    // ========================================================================
    // DEMO SEEDING
    // ========================================================================

    let demo = if config.demo_mode {
        seed_demo_content(&articles, &index, &reports, &profiles).await;
        tracing::info!("Demo mode on: seeded content, replies are canned and delayed");
        Some(Arc::new(DemoService::new(
            config.demo_chat_delay,
            config.demo_verify_delay,
        )))
    } else {
        None
    };

    let state = AppState {
        reports,
        feed,
        verify: verify.clone(),
        chat,
        profiles: profiles.clone(),
        ingest: ingest.clone(),
        articles,
        index,
        demo,
    };

    // ========================================================================
    // BACKGROUND LOOPS AND SERVER
    // ========================================================================

    // Background news poller. New articles get a verification pass right
    // away so the feed never shows unscored items for long.
    if ingest.provider_count() > 0 {
        let ingest = Arc::clone(&ingest);
        let verify = Arc::clone(&verify);
        let interval = config.ingest_poll_interval;
        tokio::spawn(async move {
            loop {
                tracing::debug!("Starting background ingest poll...");
                match ingest.poll_once().await {
                    Ok(stats) => {
                        for article_id in &stats.new_article_ids {
                            if let Err(err) = verify.score_article(article_id).await {
                                tracing::warn!(
                                    "Scoring ingested article {} failed: {}",
                                    article_id,
                                    err
                                );
                            }
                        }
                    }
                    Err(err) => tracing::warn!("Ingest poll failed: {}", err),
                }

                tokio::time::sleep(interval).await;
            }
        });
    }

    start_http_server(
        state,
        tokio::runtime::Handle::current(),
        config.bind_addr,
        config.admin_token,
    );

    // Daily quota reset doubles as the foreground loop keeping main alive.
    loop {
        tokio::time::sleep(Duration::from_secs(60 * 60 * 24)).await;

        match profiles.reset_daily_quotas().await {
            Ok(count) => tracing::info!("Daily quota reset for {} accounts", count),
            Err(err) => tracing::error!("Daily quota reset failed: {}", err),
        }
    }
}

/// Load the demo data set. Safe to run on every start: articles upsert by
/// fixed id, and already-present reports and users are left alone.
async fn seed_demo_content(
    articles: &Arc<SqliteArticleStore>,
    index: &Arc<InMemoryEvidenceIndex>,
    reports: &Arc<ReportService<SqliteReportStore>>,
    profiles: &Arc<ProfileService<JsonUserStore>>,
) {
    let seeded_articles = demo_articles();

    if let Err(err) = index.add(demo_snippets(&seeded_articles)).await {
        tracing::error!("Failed to seed evidence index: {}", err);
    }

    for article in seeded_articles {
        if let Err(err) = articles.upsert(article).await {
            tracing::error!("Failed to seed demo article: {}", err);
        }
    }

    for report in demo_reports() {
        match reports.submit(report).await {
            Ok(_) | Err(ReportError::Duplicate(_)) => {}
            Err(err) => tracing::error!("Failed to seed demo report: {}", err),
        }
    }

    match profiles
        .register(DEMO_USER_ID, DEMO_USER_NAME, DEMO_USER_EMAIL, Plan::Free)
        .await
    {
        Ok(_) | Err(ProfileError::Duplicate(_)) => {}
        Err(err) => tracing::error!("Failed to seed demo user: {}", err),
    }
}
