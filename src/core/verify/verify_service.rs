// ============================================================================
// ERRORS
// ============================================================================

use std::collections::HashSet;
use std::time::Instant;
use thiserror::Error;

use crate::core::evidence::EvidenceIndex;
use crate::core::feed::ArticleStore;
use crate::core::verify::claim_extraction::ClaimExtractor;
use crate::core::verify::scoring::{Scorer, WeightedStance};
use crate::core::verify::stance::StanceDetector;
use crate::core::verify::verify_models::{
    ClaimResult, EvidenceItem, Stance, VerificationReport, VerifyConfig,
};

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// The verification pipeline: extract claims, retrieve evidence for each,
/// judge stances, and score. Works the same whether the input arrived as raw
/// text or as a URL of an ingested article.
pub struct VerificationService<E, A, D>
where
    E: EvidenceIndex,
    A: ArticleStore,
    D: StanceDetector,
{
    index: E,
    articles: A,
    detector: D,
    extractor: ClaimExtractor,
    scorer: Scorer,
    config: VerifyConfig,
}

impl<E, A, D> VerificationService<E, A, D>
where
    E: EvidenceIndex,
    A: ArticleStore,
    D: StanceDetector,
{
    pub fn new(index: E, articles: A, detector: D, config: VerifyConfig) -> Self {
        let scorer = Scorer::new(config.verified_min, config.fake_max);
        Self {
            index,
            articles,
            detector,
            extractor: ClaimExtractor::new(),
            scorer,
            config,
        }
    }

    /// Verify the article behind a URL. A URL nothing has been ingested for
    /// yields an empty report rather than an error.
    pub async fn verify_url(&self, url: &str) -> Result<VerificationReport, VerifyError> {
        let started = Instant::now();

        let article = self
            .articles
            .get_by_url(url)
            .await
            .map_err(|e| VerifyError::StorageError(e.to_string()))?;

        let Some(article) = article else {
            tracing::info!("No ingested article for {}, returning empty report", url);
            return Ok(VerificationReport::empty(started.elapsed().as_secs_f64()));
        };

        let text = format!("{} {}", article.title, article.body);
        Ok(self.verify_text(&text).await)
    }

    /// Verify the claims in a block of text. Claims whose evidence retrieval
    /// fails are logged and skipped, they never sink the whole report.
    pub async fn verify_text(&self, text: &str) -> VerificationReport {
        let started = Instant::now();
        let mut checked_sources: HashSet<String> = HashSet::new();

        let claims = self.extractor.extract_claims(text);

        let mut results = Vec::new();
        for claim_text in claims.into_iter().take(self.config.max_claims) {
            let snippets = match self
                .index
                .search(&claim_text, self.config.retrieve_top_k)
                .await
            {
                Ok(snippets) => snippets,
                Err(e) => {
                    tracing::error!("Evidence retrieval failed for claim: {}", e);
                    continue;
                }
            };

            for snippet in &snippets {
                checked_sources.insert(snippet.source_name.clone());
            }

            let mut evidence_items = Vec::new();
            let mut supporting = Vec::new();
            let mut contradicting = Vec::new();
            let mut neutral_count = 0;

            for snippet in snippets.iter().take(self.config.scored_per_claim) {
                let judgement = self.detector.judge(&claim_text, &snippet.sentence).await;
                evidence_items.push(EvidenceItem::from_snippet(snippet, &judgement));

                let weighted = WeightedStance {
                    nli_conf: judgement.score,
                    source_trust: snippet.trust,
                };
                match judgement.stance {
                    Stance::Support => supporting.push(weighted),
                    Stance::Contradict => contradicting.push(weighted),
                    Stance::Neutral => neutral_count += 1,
                }
            }

            let score = self
                .scorer
                .compute(&supporting, &contradicting, neutral_count);

            evidence_items.truncate(self.config.reported_per_claim);
            results.push(ClaimResult {
                id: self.extractor.canonical_hash(&claim_text),
                claim_text,
                cred_score: score.cred_score,
                label: score.label,
                explain_text: score.explanation,
                evidence: evidence_items,
            });
        }

        VerificationReport {
            claims: results,
            processing_time: started.elapsed().as_secs_f64(),
            checked_sources: checked_sources.len(),
        }
    }

    /// Verify a stored article and stamp the verdict back onto it. The stored
    /// rating follows the article's worst-scoring claim. Articles whose text
    /// yields no checkable claims are left untouched.
    pub async fn score_article(&self, article_id: &str) -> Result<Option<u8>, VerifyError> {
        let article = self
            .articles
            .get(article_id)
            .await
            .map_err(|e| VerifyError::StorageError(e.to_string()))?;

        let Some(article) = article else {
            return Ok(None);
        };

        let text = format!("{} {}", article.title, article.body);
        let report = self.verify_text(&text).await;

        let Some(worst) = report
            .claims
            .iter()
            .min_by(|a, b| a.cred_score.total_cmp(&b.cred_score))
        else {
            return Ok(None);
        };

        let confidence = worst.cred_score.round() as u8;
        self.articles
            .set_confidence(article_id, confidence, worst.label)
            .await
            .map_err(|e| VerifyError::StorageError(e.to_string()))?;

        Ok(Some(confidence))
    }
}

// ============================================================================
// TESTS
// ============================================================================
