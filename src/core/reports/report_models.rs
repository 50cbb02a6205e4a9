// Report board domain models - data structures for the moderation board.
//
// These are pure domain types with no transport dependencies.
// The API layer converts these to JSON responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Review state of a submitted report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    /// Newly submitted, nobody has looked at it yet
    Reported,
    /// A moderator is actively working on it
    Reviewing,
    /// Review confirmed the reported content checks out
    Verified,
    /// Review dismissed the report or debunked the content
    Rejected,
}

impl ReportStatus {
    /// Every status, in board column order.
    pub const ALL: [ReportStatus; 4] = [
        ReportStatus::Reported,
        ReportStatus::Reviewing,
        ReportStatus::Verified,
        ReportStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Reported => "reported",
            ReportStatus::Reviewing => "reviewing",
            ReportStatus::Verified => "verified",
            ReportStatus::Rejected => "rejected",
        }
    }

    /// Parse the lowercase wire/storage form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "reported" => Some(ReportStatus::Reported),
            "reviewing" => Some(ReportStatus::Reviewing),
            "verified" => Some(ReportStatus::Verified),
            "rejected" => Some(ReportStatus::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-submitted report of suspect content.
///
/// Only `status` (and, on verification, `confidence`) ever changes after
/// submission; everything else is immutable once the report is on the board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Display name of the submitting user
    pub reported_by: String,
    /// Why the submitter flagged the content
    pub reason: String,
    pub status: ReportStatus,
    /// Credibility score in 0..=100, recorded when review verifies the content
    pub confidence: Option<u8>,
    /// How many users have flagged the same content
    pub report_count: u32,
    pub submitted_at: DateTime<Utc>,
}

impl Report {
    /// Create a fresh report entering the board in `Reported`.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        reported_by: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            url: url.into(),
            reported_by: reported_by.into(),
            reason: reason.into(),
            status: ReportStatus::Reported,
            confidence: None,
            report_count: 1,
            submitted_at: Utc::now(),
        }
    }
}

/// The four status buckets of the board.
///
/// Buckets are derived from report `status` on demand, never stored. Within
/// each bucket reports keep the board's submission order, so two partitions
/// without an intervening transition are identical.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportBoard {
    pub reported: Vec<Report>,
    pub reviewing: Vec<Report>,
    pub verified: Vec<Report>,
    pub rejected: Vec<Report>,
}

impl ReportBoard {
    /// Append a report to the bucket matching its status.
    pub fn push(&mut self, report: Report) {
        match report.status {
            ReportStatus::Reported => self.reported.push(report),
            ReportStatus::Reviewing => self.reviewing.push(report),
            ReportStatus::Verified => self.verified.push(report),
            ReportStatus::Rejected => self.rejected.push(report),
        }
    }

    pub fn bucket(&self, status: ReportStatus) -> &[Report] {
        match status {
            ReportStatus::Reported => &self.reported,
            ReportStatus::Reviewing => &self.reviewing,
            ReportStatus::Verified => &self.verified,
            ReportStatus::Rejected => &self.rejected,
        }
    }

    /// Total number of reports across all buckets.
    pub fn len(&self) -> usize {
        self.reported.len() + self.reviewing.len() + self.verified.len() + self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> BoardStats {
        BoardStats {
            reported: self.reported.len(),
            reviewing: self.reviewing.len(),
            verified: self.verified.len(),
            rejected: self.rejected.len(),
        }
    }
}

/// Per-status counts, for the admin dashboard tiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BoardStats {
    pub reported: usize,
    pub reviewing: usize,
    pub verified: usize,
    pub rejected: usize,
}

impl BoardStats {
    pub fn total(&self) -> usize {
        self.reported + self.reviewing + self.verified + self.rejected
    }
}

/// Which status changes the board accepts.
///
/// The product never decided whether moderators may move reports freely or
/// only forward, so the legality check is configurable rather than baked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// Any status may be set from any status
    Unrestricted,
    /// Reports only move forward: reported -> reviewing -> verified/rejected
    ForwardOnly,
}

impl TransitionPolicy {
    /// Whether a report may move from `from` to `to`.
    /// Re-asserting the current status is always allowed.
    pub fn allows(&self, from: ReportStatus, to: ReportStatus) -> bool {
        if from == to {
            return true;
        }
        match self {
            TransitionPolicy::Unrestricted => true,
            TransitionPolicy::ForwardOnly => matches!(
                (from, to),
                (ReportStatus::Reported, ReportStatus::Reviewing)
                    | (ReportStatus::Reviewing, ReportStatus::Verified)
                    | (ReportStatus::Reviewing, ReportStatus::Rejected)
            ),
        }
    }

    /// Parse the configuration form (`unrestricted` / `forward_only`).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unrestricted" => Some(TransitionPolicy::Unrestricted),
            "forward_only" => Some(TransitionPolicy::ForwardOnly),
            _ => None,
        }
    }
}

impl Default for TransitionPolicy {
    fn default() -> Self {
        TransitionPolicy::Unrestricted
    }
}
