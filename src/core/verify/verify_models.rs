// ============================================================================
// DOMAIN MODELS
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::core::evidence::EvidenceSnippet;

/// How a piece of evidence relates to a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Support,
    Contradict,
    Neutral,
}

impl Stance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stance::Support => "support",
            Stance::Contradict => "contradict",
            Stance::Neutral => "neutral",
        }
    }
}

/// Stance plus the detector's confidence in it.
#[derive(Debug, Clone)]
pub struct StanceJudgement {
    pub stance: Stance,
    /// Detector confidence in 0.0..=1.0
    pub score: f64,
    pub explanation: String,
}

/// Verdict attached to a scored claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredibilityLabel {
    Verified,
    Fake,
    NeedsReview,
}

impl CredibilityLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredibilityLabel::Verified => "verified",
            CredibilityLabel::Fake => "fake",
            CredibilityLabel::NeedsReview => "needs_review",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "verified" => Some(CredibilityLabel::Verified),
            "fake" => Some(CredibilityLabel::Fake),
            "needs_review" => Some(CredibilityLabel::NeedsReview),
            _ => None,
        }
    }
}

/// One snippet of evidence as reported to the caller, with its stance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub snippet: String,
    pub source: String,
    pub stance: Stance,
    /// Stance detector confidence in 0.0..=1.0
    pub nli_conf: f64,
    pub url: Option<String>,
}

impl EvidenceItem {
    pub fn from_snippet(snippet: &EvidenceSnippet, judgement: &StanceJudgement) -> Self {
        Self {
            snippet: snippet.sentence.clone(),
            source: snippet.source_name.clone(),
            stance: judgement.stance,
            nli_conf: judgement.score,
            url: Some(snippet.url.clone()),
        }
    }
}

/// Scored verdict for a single extracted claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimResult {
    /// Canonical hash of the claim text
    pub id: String,
    pub claim_text: String,
    /// Credibility in 0.0..=100.0
    pub cred_score: f64,
    pub label: CredibilityLabel,
    pub explain_text: String,
    pub evidence: Vec<EvidenceItem>,
}

/// Full result of verifying one article or text block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub claims: Vec<ClaimResult>,
    /// Wall-clock seconds spent verifying
    pub processing_time: f64,
    /// Distinct sources consulted across all claims
    pub checked_sources: usize,
}

impl VerificationReport {
    pub fn empty(processing_time: f64) -> Self {
        Self {
            claims: Vec::new(),
            processing_time,
            checked_sources: 0,
        }
    }
}

/// Knobs for the verification pipeline.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Claims verified per request (extraction may find more)
    pub max_claims: usize,
    /// Snippets retrieved per claim
    pub retrieve_top_k: usize,
    /// Retrieved snippets run through stance detection
    pub scored_per_claim: usize,
    /// Evidence items included in the claim result
    pub reported_per_claim: usize,
    /// Score at or above which a claim is labelled verified
    pub verified_min: f64,
    /// Score at or below which a claim is labelled fake
    pub fake_max: f64,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            max_claims: 5,
            retrieve_top_k: 20,
            scored_per_claim: 10,
            reported_per_claim: 5,
            verified_min: 70.0,
            fake_max: 40.0,
        }
    }
}
