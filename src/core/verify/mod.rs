// Claim verification pipeline: extraction, stance detection, scoring, and
// the service tying them to the evidence index.

pub mod claim_extraction;
pub mod scoring;
pub mod stance;
pub mod verify_models;
pub mod verify_service;

pub use claim_extraction::{canonicalize, split_sentences, ClaimExtractor};
pub use scoring::{ScoreBreakdown, ScoreResult, Scorer, WeightedStance};
pub use stance::{LexicalStanceDetector, StanceDetector};
pub use verify_models::{
    ClaimResult, CredibilityLabel, EvidenceItem, Stance, StanceJudgement, VerificationReport,
    VerifyConfig,
};
pub use verify_service::{VerificationService, VerifyError};
