use crate::core::evidence::{EvidenceError, EvidenceIndex, EvidenceSnippet};
use async_trait::async_trait;
use std::collections::HashSet;
use tokio::sync::RwLock;

/// Keyword index over the evidence corpus. Snippets are ranked by how many
/// distinct query terms their sentence contains, with source trust breaking
/// ties.
#[derive(Default)]
pub struct InMemoryEvidenceIndex {
    snippets: RwLock<Vec<EvidenceSnippet>>,
}

impl InMemoryEvidenceIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EvidenceIndex for InMemoryEvidenceIndex {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<EvidenceSnippet>, EvidenceError> {
        let query_terms = terms(query);
        if query_terms.is_empty() {
            return Ok(Vec::new());
        }

        let snippets = self.snippets.read().await;
        let mut scored: Vec<(usize, EvidenceSnippet)> = snippets
            .iter()
            .filter_map(|snippet| {
                let sentence_terms = terms(&snippet.sentence);
                let overlap = query_terms.intersection(&sentence_terms).count();
                (overlap > 0).then(|| (overlap, snippet.clone()))
            })
            .collect();

        scored.sort_by(|(overlap_a, a), (overlap_b, b)| {
            overlap_b
                .cmp(overlap_a)
                .then(b.trust.total_cmp(&a.trust))
        });

        Ok(scored
            .into_iter()
            .take(top_k)
            .map(|(_, snippet)| snippet)
            .collect())
    }

    async fn add(&self, new: Vec<EvidenceSnippet>) -> Result<(), EvidenceError> {
        let mut snippets = self.snippets.write().await;
        snippets.extend(new);
        Ok(())
    }

    async fn len(&self) -> Result<usize, EvidenceError> {
        Ok(self.snippets.read().await.len())
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|w| !w.is_empty())
        .collect()
}
