// ============================================================================
// DOMAIN MODELS
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A source cited alongside an assistant reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSource {
    pub title: String,
    pub source: String,
    /// Trust of the publishing source in 0.0..=1.0
    pub confidence: f64,
}

/// One turn of a chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    /// Confidence of an assistant reply, absent on user turns
    pub confidence: Option<f64>,
    pub sources: Vec<ChatSource>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: ChatRole::User,
            content: content.to_string(),
            confidence: None,
            sources: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: &str, confidence: f64, sources: Vec<ChatSource>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: ChatRole::Assistant,
            content: content.to_string(),
            confidence: Some(confidence),
            sources,
            timestamp: Utc::now(),
        }
    }
}

/// What the caller gets back from one chat turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub answer: String,
    /// Mean trust of the cited sources, 0.0 when nothing could be cited
    pub confidence: f64,
    pub sources: Vec<ChatSource>,
    /// Chats left today, absent for unmetered plans
    pub chats_remaining: Option<u32>,
}

/// Knobs for answer composition.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Snippets retrieved per question
    pub retrieve_top_k: usize,
    /// Sources cited per answer
    pub max_sources: usize,
    /// Sources below this trust are never cited
    pub trusted_source_min: f64,
    /// Characters of evidence context quoted in the answer
    pub context_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            retrieve_top_k: 10,
            max_sources: 5,
            trusted_source_min: 0.7,
            context_chars: 500,
        }
    }
}
