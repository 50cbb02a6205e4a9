// ============================================================================
// CREDIBILITY SCORING
// ============================================================================
//
// raw      = sum over stance-bearing evidence of
//            stance_sign * nli_conf * (0.7 + 0.3 * source_trust)
// norm     = raw / sqrt(total evidence, neutral included)
// score    = sigmoid(norm) * 100
//
// Neutral evidence contributes nothing to the sum but still dilutes the
// normalization, so a claim with one weak supporter among many bystanders
// stays near 50.

use crate::core::verify::verify_models::CredibilityLabel;

/// Evidence weight inputs for one stance-bearing snippet.
#[derive(Debug, Clone, Copy)]
pub struct WeightedStance {
    /// Stance detector confidence in 0.0..=1.0
    pub nli_conf: f64,
    /// Trust of the publishing source in 0.0..=1.0
    pub source_trust: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub supporting: usize,
    pub contradicting: usize,
    pub neutral: usize,
}

#[derive(Debug, Clone)]
pub struct ScoreResult {
    /// Credibility in 0.0..=100.0, rounded to one decimal
    pub cred_score: f64,
    pub label: CredibilityLabel,
    pub explanation: String,
    pub breakdown: ScoreBreakdown,
}

/// Turns weighed evidence into a labelled credibility score.
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    verified_min: f64,
    fake_max: f64,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(70.0, 40.0)
    }
}

impl Scorer {
    pub fn new(verified_min: f64, fake_max: f64) -> Self {
        Self {
            verified_min,
            fake_max,
        }
    }

    /// Score a claim from its evidence. Labels and explanation text compare
    /// the unrounded score against the thresholds; the reported score is then
    /// rounded to one decimal.
    pub fn compute(
        &self,
        supporting: &[WeightedStance],
        contradicting: &[WeightedStance],
        neutral_count: usize,
    ) -> ScoreResult {
        let total = supporting.len() + contradicting.len() + neutral_count;
        if total == 0 {
            return ScoreResult {
                cred_score: 50.0,
                label: CredibilityLabel::NeedsReview,
                explanation: "No evidence found to verify claim".to_string(),
                breakdown: ScoreBreakdown {
                    supporting: 0,
                    contradicting: 0,
                    neutral: 0,
                },
            };
        }

        let mut raw = 0.0;
        for evidence in supporting {
            raw += evidence.nli_conf * (0.7 + 0.3 * evidence.source_trust);
        }
        for evidence in contradicting {
            raw -= evidence.nli_conf * (0.7 + 0.3 * evidence.source_trust);
        }

        let normalized = raw / (total as f64).sqrt();
        let cred = sigmoid(normalized) * 100.0;

        let label = if cred >= self.verified_min {
            CredibilityLabel::Verified
        } else if cred <= self.fake_max {
            CredibilityLabel::Fake
        } else {
            CredibilityLabel::NeedsReview
        };

        let breakdown = ScoreBreakdown {
            supporting: supporting.len(),
            contradicting: contradicting.len(),
            neutral: neutral_count,
        };

        ScoreResult {
            cred_score: (cred * 10.0).round() / 10.0,
            label,
            explanation: self.explain(cred, &breakdown),
            breakdown,
        }
    }

    fn explain(&self, cred: f64, breakdown: &ScoreBreakdown) -> String {
        let total = breakdown.supporting + breakdown.contradicting + breakdown.neutral;

        if cred >= self.verified_min {
            format!(
                "This claim is VERIFIED with {:.0}% confidence. \
                 Found {} supporting evidence from {} sources analyzed. \
                 The claim is backed by credible sources with high agreement.",
                cred, breakdown.supporting, total
            )
        } else if cred <= self.fake_max {
            format!(
                "This claim is likely FALSE with {:.0}% confidence. \
                 Found {} contradicting evidence from {} sources analyzed. \
                 Multiple credible sources dispute this claim.",
                100.0 - cred,
                breakdown.contradicting,
                total
            )
        } else {
            format!(
                "This claim NEEDS REVIEW (confidence: {:.0}%). \
                 Evidence is mixed: {} supporting, {} contradicting from {} sources. \
                 Further verification recommended.",
                cred, breakdown.supporting, breakdown.contradicting, total
            )
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
