// News ingestion: provider port, normalization, watermarked polling.

pub mod ingest_models;
pub mod ingest_service;

pub use ingest_models::{ConnectorError, FetchedItem, NewsProvider};
pub use ingest_service::{IngestError, IngestService, IngestStats};
