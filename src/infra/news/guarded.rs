use crate::core::ingest::{ConnectorError, FetchedItem, NewsProvider};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// Consecutive failures before a provider stops being called.
const MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// Cap on cached result sets per provider.
const MAX_CACHED_RESULTS: usize = 256;

/// Wraps a provider with a failure breaker and a TTL response cache.
///
/// After `MAX_CONSECUTIVE_FAILURES` consecutive errors the inner provider
/// stops being called and fetches return empty until the process restarts.
/// Cached result sets are served only while fresh and non-empty.
pub struct GuardedProvider<P: NewsProvider> {
    inner: P,
    ttl: Duration,
    failures: AtomicU32,
    cache: DashMap<String, (Instant, Vec<FetchedItem>)>,
}

impl<P: NewsProvider> GuardedProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            failures: AtomicU32::new(0),
            cache: DashMap::new(),
        }
    }

    fn is_open(&self) -> bool {
        self.failures.load(Ordering::Relaxed) >= MAX_CONSECUTIVE_FAILURES
    }

    fn record_success(&self) {
        self.failures.store(0, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        let failures = self.failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures == MAX_CONSECUTIVE_FAILURES {
            tracing::error!(
                "Provider {} disabled after {} consecutive failures",
                self.inner.name(),
                failures
            );
        }
    }

    fn cached(&self, key: &str) -> Option<Vec<FetchedItem>> {
        let entry = self.cache.get(key)?;
        let (stored_at, items) = entry.value();
        (stored_at.elapsed() < self.ttl && !items.is_empty()).then(|| items.clone())
    }

    fn store(&self, key: String, items: &[FetchedItem]) {
        if items.is_empty() {
            return;
        }
        if self.cache.len() >= MAX_CACHED_RESULTS {
            // Simple eviction: drop an arbitrary entry once we cross the cap
            if let Some(entry) = self.cache.iter().next() {
                let stale = entry.key().clone();
                drop(entry);
                self.cache.remove(&stale);
            }
        }
        self.cache.insert(key, (Instant::now(), items.to_vec()));
    }
}

#[async_trait]
impl<P: NewsProvider> NewsProvider for GuardedProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch_recent(
        &self,
        window_days: u32,
        page: u32,
    ) -> Result<Vec<FetchedItem>, ConnectorError> {
        if self.is_open() {
            return Ok(Vec::new());
        }

        let key = format!("fetch_recent:{window_days}:{page}");
        if let Some(hit) = self.cached(&key) {
            return Ok(hit);
        }

        match self.inner.fetch_recent(window_days, page).await {
            Ok(items) => {
                self.record_success();
                self.store(key, &items);
                Ok(items)
            }
            Err(e) => {
                self.record_failure();
                Err(e)
            }
        }
    }

    async fn search(&self, query: &str, page: u32) -> Result<Vec<FetchedItem>, ConnectorError> {
        if self.is_open() {
            return Ok(Vec::new());
        }

        let key = format!("search:{query}:{page}");
        if let Some(hit) = self.cached(&key) {
            return Ok(hit);
        }

        match self.inner.search(query, page).await {
            Ok(items) => {
                self.record_success();
                self.store(key, &items);
                Ok(items)
            }
            Err(e) => {
                self.record_failure();
                Err(e)
            }
        }
    }

    async fn fetch_by_url(&self, url: &str) -> Result<Option<FetchedItem>, ConnectorError> {
        if self.is_open() {
            return Ok(None);
        }

        match self.inner.fetch_by_url(url).await {
            Ok(item) => {
                self.record_success();
                Ok(item)
            }
            Err(e) => {
                self.record_failure();
                Err(e)
            }
        }
    }
}
