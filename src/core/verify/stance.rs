// ============================================================================
// STANCE DETECTION TRAIT (PORT)
// ============================================================================

use async_trait::async_trait;
use std::collections::HashSet;

use crate::core::verify::verify_models::{Stance, StanceJudgement};

/// Judges whether a piece of evidence supports or contradicts a claim.
///
/// Implementations never fail outward: anything they cannot judge comes back
/// as a neutral stance.
#[async_trait]
pub trait StanceDetector: Send + Sync {
    async fn judge(&self, claim: &str, evidence: &str) -> StanceJudgement;
}

#[async_trait]
impl<T: StanceDetector + ?Sized> StanceDetector for Box<T> {
    async fn judge(&self, claim: &str, evidence: &str) -> StanceJudgement {
        (**self).judge(claim, evidence).await
    }
}

// ============================================================================
// LEXICAL DETECTOR
// ============================================================================

/// Evidence tokens that flip a lexical match from agreement to denial.
const NEGATION_CUES: [&str; 7] = ["not", "no", "false", "denies", "debunked", "refuted", "myth"];

/// Word-overlap stance detector. When more than half of the claim's words
/// appear in the evidence the two are about the same thing; negation cues in
/// the evidence then decide which way it points.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalStanceDetector;

#[async_trait]
impl StanceDetector for LexicalStanceDetector {
    async fn judge(&self, claim: &str, evidence: &str) -> StanceJudgement {
        let claim_words = words(claim);
        let evidence_words = words(evidence);

        if claim_words.is_empty() {
            return neutral();
        }

        let overlap = claim_words.intersection(&evidence_words).count();
        if overlap * 2 <= claim_words.len() {
            return neutral();
        }

        let denies = NEGATION_CUES.iter().any(|cue| evidence_words.contains(*cue));
        let (stance, verb) = if denies {
            (Stance::Contradict, "contradicts")
        } else {
            (Stance::Support, "supports")
        };

        let score = 0.6;
        StanceJudgement {
            stance,
            score,
            explanation: format!(
                "Evidence {} the claim with {:.1}% confidence",
                verb,
                score * 100.0
            ),
        }
    }
}

fn neutral() -> StanceJudgement {
    StanceJudgement {
        stance: Stance::Neutral,
        score: 0.5,
        explanation: "Evidence is neutral to the claim".to_string(),
    }
}

/// Lowercased word set with surrounding punctuation stripped.
fn words(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|w| !w.is_empty())
        .collect()
}
