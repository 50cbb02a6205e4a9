// Report board module - the moderation lifecycle and its four-bucket view.

pub mod report_models;
pub mod report_service;

pub use report_models::{BoardStats, Report, ReportBoard, ReportStatus, TransitionPolicy};
pub use report_service::{ReportError, ReportService, ReportStore};
