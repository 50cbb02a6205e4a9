// Seed content for demo mode: a small verified feed, a report queue in
// every state, and one account to click around with. Inserted once at
// startup when demo mode is on.

use chrono::{Duration, Utc};

use crate::core::chat::{ChatReply, ChatSource};
use crate::core::evidence::EvidenceSnippet;
use crate::core::feed::Article;
use crate::core::reports::{Report, ReportStatus};
use crate::core::verify::{
    ClaimExtractor, ClaimResult, CredibilityLabel, EvidenceItem, Stance, VerificationReport,
};

pub const DEMO_USER_ID: &str = "demo";
pub const DEMO_USER_NAME: &str = "Demo User";
pub const DEMO_USER_EMAIL: &str = "demo@example.com";

pub const DEMO_CLAIM_TEXT: &str = "AI improves healthcare diagnostics by 95%";

pub const DEMO_CHAT_ANSWER: &str =
    "I'm analyzing your question across multiple verified sources. \
     This is a demo response showing how the AI would verify information.";

/// The demo feed: three already-verified articles from trusted publishers.
pub fn demo_articles() -> Vec<Article> {
    let now = Utc::now();
    vec![
        Article {
            id: "demo-article-1".to_string(),
            title: "AI Breakthrough in Healthcare Diagnostics".to_string(),
            summary: "Scientists develop new AI system that can detect diseases 95% faster \
                      than traditional methods."
                .to_string(),
            body: "Scientists develop new AI system that can detect diseases 95% faster than \
                   traditional methods. The system has been tested across 15 countries with \
                   over 10,000 patient cases."
                .to_string(),
            url: "https://reuters.com/article/ai-healthcare-breakthrough".to_string(),
            source_name: "Reuters".to_string(),
            source_domain: "reuters.com".to_string(),
            source_trust: 0.95,
            category: "Technology".to_string(),
            confidence: 94,
            label: CredibilityLabel::Verified,
            published_at: now - Duration::hours(2),
            ingested_at: now,
        },
        Article {
            id: "demo-article-2".to_string(),
            title: "Clinical Trials Show AI Diagnostic Accuracy".to_string(),
            summary: "Clinical trials demonstrate 94.7% improvement in diagnostic speed."
                .to_string(),
            body: "Clinical trials demonstrate 94.7% improvement in diagnostic speed with \
                   98.2% accuracy rate across diverse patient populations."
                .to_string(),
            url: "https://nature.com/article/ai-diagnosis-study".to_string(),
            source_name: "Nature Medicine".to_string(),
            source_domain: "nature.com".to_string(),
            source_trust: 0.98,
            category: "Science".to_string(),
            confidence: 97,
            label: CredibilityLabel::Verified,
            published_at: now - Duration::hours(5),
            ingested_at: now,
        },
        Article {
            id: "demo-article-3".to_string(),
            title: "Global Climate Agreement Reaches Historic Milestone".to_string(),
            summary: "195 nations commit to unprecedented emissions reductions.".to_string(),
            body: "195 nations commit to unprecedented emissions reductions, marking the \
                   most significant climate action in history."
                .to_string(),
            url: "https://bbc.com/news/climate-agreement".to_string(),
            source_name: "BBC News".to_string(),
            source_domain: "bbc.com".to_string(),
            source_trust: 0.90,
            category: "Environment".to_string(),
            confidence: 88,
            label: CredibilityLabel::Verified,
            published_at: now - Duration::hours(4),
            ingested_at: now,
        },
    ]
}

/// Evidence sentences for the seeded articles. Split on sentence boundaries
/// followed by a space so figures like "94.7%" stay intact.
pub fn demo_snippets(articles: &[Article]) -> Vec<EvidenceSnippet> {
    let mut snippets = Vec::new();
    for article in articles {
        for (idx, sentence) in article.body.split(". ").enumerate() {
            let sentence = sentence.trim();
            if sentence.is_empty() {
                continue;
            }
            snippets.push(EvidenceSnippet {
                id: format!("{}-s{}", article.id, idx),
                article_id: article.id.clone(),
                title: article.title.clone(),
                url: article.url.clone(),
                source_name: article.source_name.clone(),
                source_domain: article.source_domain.clone(),
                trust: article.source_trust,
                sentence: sentence.to_string(),
            });
        }
    }
    snippets
}

/// The moderation queue as it looks mid-shift: one fresh report, one being
/// reviewed, one already verified.
pub fn demo_reports() -> Vec<Report> {
    let now = Utc::now();
    vec![
        Report {
            id: "1".to_string(),
            title: "Misleading Claims About Vaccine Effectiveness".to_string(),
            url: "https://example.com/article1".to_string(),
            reported_by: "user123".to_string(),
            reason: "Contains false statistics".to_string(),
            status: ReportStatus::Reported,
            confidence: None,
            report_count: 15,
            submitted_at: now - Duration::hours(6),
        },
        Report {
            id: "2".to_string(),
            title: "Unverified Election Fraud Allegations".to_string(),
            url: "https://example.com/article2".to_string(),
            reported_by: "user456".to_string(),
            reason: "No credible sources cited".to_string(),
            status: ReportStatus::Reviewing,
            confidence: None,
            report_count: 8,
            submitted_at: now - Duration::hours(3),
        },
        Report {
            id: "3".to_string(),
            title: "Climate Data Misrepresentation".to_string(),
            url: "https://example.com/article3".to_string(),
            reported_by: "user789".to_string(),
            reason: "Cherry-picked data points".to_string(),
            status: ReportStatus::Verified,
            confidence: Some(88),
            report_count: 12,
            submitted_at: now - Duration::hours(1),
        },
    ]
}

/// Canned chat turn, cited from the seeded publishers.
pub fn demo_chat_reply() -> ChatReply {
    ChatReply {
        answer: DEMO_CHAT_ANSWER.to_string(),
        confidence: 0.92,
        sources: demo_articles()
            .iter()
            .map(|a| ChatSource {
                title: a.title.clone(),
                source: a.source_name.clone(),
                confidence: a.source_trust,
            })
            .collect(),
        chats_remaining: Some(4),
    }
}

/// Canned verification outcome for the seeded claim.
pub fn demo_verification_report(processing_time: f64) -> VerificationReport {
    let article = &demo_articles()[0];
    VerificationReport {
        claims: vec![ClaimResult {
            id: ClaimExtractor::new().canonical_hash(DEMO_CLAIM_TEXT),
            claim_text: DEMO_CLAIM_TEXT.to_string(),
            cred_score: 94.0,
            label: CredibilityLabel::Verified,
            explain_text: "This claim is VERIFIED with 94% confidence. Found strong \
                           supporting evidence from multiple trusted sources."
                .to_string(),
            evidence: vec![EvidenceItem {
                snippet: "Scientists develop new AI system that can detect diseases 95% \
                          faster than traditional methods"
                    .to_string(),
                source: article.source_name.clone(),
                stance: Stance::Support,
                nli_conf: 0.9,
                url: Some(article.url.clone()),
            }],
        }],
        processing_time,
        checked_sources: 3,
    }
}
