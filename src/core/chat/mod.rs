// Evidence-grounded chat with per-session history.

pub mod chat_models;
pub mod chat_service;

pub use chat_models::{ChatConfig, ChatMessage, ChatReply, ChatRole, ChatSource};
pub use chat_service::{ChatError, ChatService};
