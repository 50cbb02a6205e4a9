// ============================================================================
// CLAIM EXTRACTION
// ============================================================================
//
// Pulls checkable factual claims out of free text. A sentence counts as a
// claim when it carries a statistical figure, an evidential or causal verb,
// or mentions a tracked entity. Claims are deduplicated across submissions
// by a canonical hash that ignores case, punctuation and exact numerals.

use regex::Regex;
use sha2::{Digest, Sha256};

/// Sentences at or below this length are discarded as fragments.
pub const MIN_SENTENCE_CHARS: usize = 20;

/// At most this many claims are extracted from one text.
pub const MAX_CLAIMS_PER_TEXT: usize = 10;

/// Matched against the lowercased sentence.
const CLAIM_PATTERNS: [&str; 5] = [
    r"\b\d+%",
    r"\b\d+\s+(percent|million|billion|thousand)",
    r"\b(proven|shows|demonstrates|reveals|indicates|suggests|found)\b",
    r"\b(increases|decreases|reduces|improves|causes|prevents)\b",
    r"\b(according to|study|research|report|data)\b",
];

/// Matched against the sentence as written, case intact.
const TRACKED_ENTITIES: [&str; 4] = ["COVID", "WHO", "FDA", "UN"];

pub struct ClaimExtractor {
    patterns: Vec<Regex>,
    digits: Regex,
    punct: Regex,
}

impl ClaimExtractor {
    pub fn new() -> Self {
        Self {
            patterns: CLAIM_PATTERNS
                .iter()
                .map(|p| Regex::new(p).expect("claim pattern is valid"))
                .collect(),
            digits: Regex::new(r"\d+").expect("digit pattern is valid"),
            punct: Regex::new(r"[^\w\s]").expect("punctuation pattern is valid"),
        }
    }

    /// Checkable claims in `text`, in reading order, capped at
    /// `MAX_CLAIMS_PER_TEXT`.
    pub fn extract_claims(&self, text: &str) -> Vec<String> {
        let mut claims = Vec::new();
        for sentence in split_sentences(text, MIN_SENTENCE_CHARS) {
            if claims.len() >= MAX_CLAIMS_PER_TEXT {
                break;
            }
            let lowered = sentence.to_lowercase();
            let pattern_hit = self.patterns.iter().any(|p| p.is_match(&lowered));
            let entity_hit = TRACKED_ENTITIES.iter().any(|e| sentence.contains(e));
            if pattern_hit || entity_hit {
                claims.push(sentence);
            }
        }
        claims
    }

    /// Stable identifier for a claim. Numerals collapse to a placeholder
    /// before hashing, so "rose 40%" and "rose 45%" count as the same claim.
    pub fn canonical_hash(&self, text: &str) -> String {
        let canonical = canonicalize(text);
        let masked = self.digits.replace_all(&canonical, "#NUM#");
        let stripped = self.punct.replace_all(&masked, "");

        let mut hasher = Sha256::new();
        hasher.update(stripped.as_bytes());
        format!("{:02x}", hasher.finalize())
    }
}

impl Default for ClaimExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercased, trimmed, inner whitespace collapsed to single spaces.
pub fn canonicalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split on sentence punctuation, dropping fragments of `min_chars` or fewer.
/// Newlines are treated as spaces, not sentence breaks.
pub fn split_sentences(text: &str, min_chars: usize) -> Vec<String> {
    text.replace('\n', " ")
        .split(|c: char| matches!(c, '.' | '!' | '?'))
        .map(str::trim)
        .filter(|s| s.len() > min_chars)
        .map(str::to_string)
        .collect()
}
