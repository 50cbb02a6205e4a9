// ============================================================================
// ERRORS
// ============================================================================

use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::core::chat::chat_models::{ChatConfig, ChatMessage, ChatReply, ChatSource};
use crate::core::evidence::EvidenceIndex;
use crate::core::profile::{ProfileError, ProfileService, UserStore};

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Unknown user: {0}")]
    UnknownUser(String),
    #[error("Retrieval error: {0}")]
    RetrievalError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
}

fn profile_error(e: ProfileError) -> ChatError {
    match e {
        ProfileError::UnknownUser(id) => ChatError::UnknownUser(id),
        other => ChatError::StorageError(other.to_string()),
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Sessions tracked at once. Kept bounded so an unattended instance cannot
/// grow without limit.
const MAX_TRACKED_SESSIONS: usize = 1_000;

const QUOTA_REFUSAL: &str =
    "You have reached your free chat limit. Please upgrade to continue.";

const NO_EVIDENCE_ANSWER: &str =
    "I don't have enough verified information to answer this question confidently. \
     The claim may be too recent or not yet verified by trusted sources.";

/// Chat that answers only from verified evidence. Every reply cites the
/// trusted snippets it was composed from; when there are none it says so
/// instead of improvising.
pub struct ChatService<E: EvidenceIndex, U: UserStore> {
    index: E,
    profiles: Arc<ProfileService<U>>,
    config: ChatConfig,
    history: DashMap<String, Vec<ChatMessage>>,
}

impl<E: EvidenceIndex, U: UserStore> ChatService<E, U> {
    pub fn new(index: E, profiles: Arc<ProfileService<U>>, config: ChatConfig) -> Self {
        Self {
            index,
            profiles,
            config,
            history: DashMap::new(),
        }
    }

    /// Answer one question. The daily quota is checked up front and spent
    /// once an answer is composed, whether or not evidence was found; the
    /// over-limit refusal itself costs nothing.
    pub async fn ask(
        &self,
        user_id: &str,
        session_id: &str,
        prompt: &str,
    ) -> Result<ChatReply, ChatError> {
        let remaining = self
            .profiles
            .chats_remaining(user_id)
            .await
            .map_err(profile_error)?;

        self.record(session_id, ChatMessage::user(prompt));

        if remaining == Some(0) {
            let reply = ChatReply {
                answer: QUOTA_REFUSAL.to_string(),
                confidence: 0.0,
                sources: Vec::new(),
                chats_remaining: Some(0),
            };
            self.record(
                session_id,
                ChatMessage::assistant(&reply.answer, 0.0, Vec::new()),
            );
            return Ok(reply);
        }

        let snippets = self
            .index
            .search(prompt, self.config.retrieve_top_k)
            .await
            .map_err(|e| ChatError::RetrievalError(e.to_string()))?;

        let trusted: Vec<_> = snippets
            .into_iter()
            .filter(|s| s.trust >= self.config.trusted_source_min)
            .take(self.config.max_sources)
            .collect();

        let (answer, confidence, sources) = if trusted.is_empty() {
            (NO_EVIDENCE_ANSWER.to_string(), 0.0, Vec::new())
        } else {
            let context = trusted
                .iter()
                .map(|s| s.sentence.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let confidence =
                trusted.iter().map(|s| s.trust).sum::<f64>() / trusted.len() as f64;
            let sources = trusted
                .iter()
                .map(|s| ChatSource {
                    title: s.title.clone(),
                    source: s.source_name.clone(),
                    confidence: s.trust,
                })
                .collect();
            (self.compose_answer(&context), confidence, sources)
        };

        let chats_remaining = match remaining {
            None => None,
            Some(_) => match self.profiles.spend_chat(user_id).await {
                Ok(left) => left,
                // Lost a race with another request from the same user.
                Err(ProfileError::QuotaExhausted) => Some(0),
                Err(e) => return Err(profile_error(e)),
            },
        };

        self.record(
            session_id,
            ChatMessage::assistant(&answer, confidence, sources.clone()),
        );

        Ok(ChatReply {
            answer,
            confidence,
            sources,
            chats_remaining,
        })
    }

    /// Messages of one session, oldest first.
    pub fn history(&self, session_id: &str) -> Vec<ChatMessage> {
        self.history
            .get(session_id)
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    fn compose_answer(&self, context: &str) -> String {
        let quoted: String = context.chars().take(self.config.context_chars).collect();
        format!(
            "Based on verified sources: {}... \
             This information comes from trusted sources and has been fact-checked.",
            quoted
        )
    }

    fn record(&self, session_id: &str, message: ChatMessage) {
        if !self.history.contains_key(session_id) && self.history.len() >= MAX_TRACKED_SESSIONS {
            // Simple eviction: drop an arbitrary session once we cross the cap.
            let stale = self.history.iter().next().map(|e| e.key().clone());
            if let Some(stale) = stale {
                self.history.remove(&stale);
            }
        }
        self.history
            .entry(session_id.to_string())
            .or_default()
            .push(message);
    }
}

// ============================================================================
// TESTS
// ============================================================================
