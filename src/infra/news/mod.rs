// News provider infra layer.
// - `newsapi_client.rs` talks to the NewsAPI HTTP API.
// - `factcheck_client.rs` talks to the Google Fact Check Tools API.
// - `guarded.rs` wraps any provider with a failure breaker and TTL cache.

#[path = "newsapi_client.rs"]
pub mod newsapi_client;

#[path = "factcheck_client.rs"]
pub mod factcheck_client;

#[path = "guarded.rs"]
pub mod guarded;

pub use factcheck_client::FactCheckClient;
pub use guarded::GuardedProvider;
pub use newsapi_client::NewsApiClient;
