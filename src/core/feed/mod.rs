// The verified news feed: article model, storage port, and the paginated
// read service.

pub mod feed_models;
pub mod feed_service;

pub use feed_models::{Article, FeedPage, FeedQuery};
pub use feed_service::{ArticleStore, FeedError, FeedService};
