// Report board business logic. The board owns the authoritative report set:
// `transition` is its single mutation entry point and `partition` its pure
// derived view, so the whole lifecycle is testable without any HTTP layer.

use super::report_models::{Report, ReportBoard, ReportStatus, TransitionPolicy};
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("No report with id {0}")]
    NotFound(String),

    #[error("Report {0} already exists")]
    Duplicate(String),

    #[error("Cannot move a report from {from} to {to}")]
    IllegalTransition {
        from: ReportStatus,
        to: ReportStatus,
    },

    #[error("Confidence only applies when verifying, not when moving to {0}")]
    ConfidenceOutsideVerified(ReportStatus),

    #[error("Confidence {0} is outside 0..=100")]
    ConfidenceOutOfRange(u8),

    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================
// The board defines what it needs from storage; the infra layer decides how
// that is kept (in memory for tests and demo mode, SQLite in production).

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Every report in board order. Board order is submission order and is
    /// stable across status changes.
    async fn load_all(&self) -> Result<Vec<Report>, ReportError>;

    async fn get(&self, id: &str) -> Result<Option<Report>, ReportError>;

    /// Append a new report. The id must not already exist.
    async fn insert(&self, report: Report) -> Result<(), ReportError>;

    /// Overwrite the status of an existing report, and the confidence score
    /// when one is given. Returns the updated report, or `None` when the id
    /// is unknown (in which case nothing was written).
    async fn update_status(
        &self,
        id: &str,
        status: ReportStatus,
        confidence: Option<u8>,
    ) -> Result<Option<Report>, ReportError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// The moderation report board.
///
/// Generic over the storage port so production and tests can inject
/// different backends without touching the lifecycle rules.
pub struct ReportService<S: ReportStore> {
    store: S,
    policy: TransitionPolicy,
}

impl<S: ReportStore> ReportService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            policy: TransitionPolicy::default(),
        }
    }

    /// Like `new`, but with an explicit transition legality policy.
    pub fn with_policy(store: S, policy: TransitionPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Put a new report on the board.
    pub async fn submit(&self, report: Report) -> Result<Report, ReportError> {
        if let Some(score) = report.confidence {
            if score > 100 {
                return Err(ReportError::ConfidenceOutOfRange(score));
            }
        }
        if self.store.get(&report.id).await?.is_some() {
            return Err(ReportError::Duplicate(report.id));
        }

        self.store.insert(report.clone()).await?;
        tracing::info!(report_id = %report.id, status = %report.status, "Report submitted");
        Ok(report)
    }

    /// Move a report to a new status.
    ///
    /// This is the only mutation the board supports. Every field other than
    /// `status` is left untouched, and every other report is unaffected. An
    /// unknown id returns `NotFound` with the guarantee that nothing changed.
    pub async fn transition(
        &self,
        report_id: &str,
        new_status: ReportStatus,
    ) -> Result<Report, ReportError> {
        self.apply_transition(report_id, new_status, None).await
    }

    /// Verify a report and record the credibility score backing the verdict.
    pub async fn transition_with_confidence(
        &self,
        report_id: &str,
        new_status: ReportStatus,
        confidence: u8,
    ) -> Result<Report, ReportError> {
        if new_status != ReportStatus::Verified {
            return Err(ReportError::ConfidenceOutsideVerified(new_status));
        }
        if confidence > 100 {
            return Err(ReportError::ConfidenceOutOfRange(confidence));
        }
        self.apply_transition(report_id, new_status, Some(confidence))
            .await
    }

    async fn apply_transition(
        &self,
        report_id: &str,
        new_status: ReportStatus,
        confidence: Option<u8>,
    ) -> Result<Report, ReportError> {
        let current = self
            .store
            .get(report_id)
            .await?
            .ok_or_else(|| ReportError::NotFound(report_id.to_string()))?;

        if !self.policy.allows(current.status, new_status) {
            return Err(ReportError::IllegalTransition {
                from: current.status,
                to: new_status,
            });
        }

        // Re-asserting the current status succeeds without a write, which
        // also makes transition idempotent.
        if current.status == new_status && confidence.is_none() {
            return Ok(current);
        }

        let updated = self
            .store
            .update_status(report_id, new_status, confidence)
            .await?
            .ok_or_else(|| ReportError::NotFound(report_id.to_string()))?;

        tracing::info!(
            report_id = %updated.id,
            from = %current.status,
            to = %updated.status,
            "Report transitioned"
        );
        Ok(updated)
    }

    /// Group every report into its status bucket.
    ///
    /// Pure derived view: each bucket holds the reports with that status in
    /// board order (the original collection order restricted to matching
    /// status, not the order in which transitions happened). Calling this
    /// twice without an intervening `transition` yields identical output.
    pub async fn partition(&self) -> Result<ReportBoard, ReportError> {
        let mut board = ReportBoard::default();
        for report in self.store.load_all().await? {
            board.push(report);
        }
        Ok(board)
    }

    pub async fn get(&self, report_id: &str) -> Result<Report, ReportError> {
        self.store
            .get(report_id)
            .await?
            .ok_or_else(|| ReportError::NotFound(report_id.to_string()))
    }

    /// The full collection in board order.
    pub async fn all(&self) -> Result<Vec<Report>, ReportError> {
        self.store.load_all().await
    }
}

// ============================================================================
// TESTS
// ============================================================================
