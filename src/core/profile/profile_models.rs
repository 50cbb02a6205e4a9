// ============================================================================
// DOMAIN MODELS
// ============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Pro,
}

impl Plan {
    /// Free accounts run against daily quotas, paid ones do not.
    pub fn is_metered(&self) -> bool {
        matches!(self, Plan::Free)
    }
}

/// Per-user toggles surfaced on the profile page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    pub email_notifications: bool,
    pub auto_save_articles: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            email_notifications: true,
            auto_save_articles: false,
        }
    }
}

/// Daily allowances for free accounts.
#[derive(Debug, Clone, Copy)]
pub struct QuotaConfig {
    pub free_chats_per_day: u32,
    pub free_verifies_per_day: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            free_chats_per_day: 5,
            free_verifies_per_day: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub plan: Plan,
    /// Chats left today, meaningful for metered plans only
    pub chats_remaining: u32,
    /// Verifications left today, meaningful for metered plans only
    pub verifies_remaining: u32,
    /// Ids of articles the user bookmarked
    pub saved_articles: Vec<String>,
    pub preferences: Preferences,
    pub joined_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(id: &str, display_name: &str, email: &str, plan: Plan, quotas: &QuotaConfig) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            plan,
            chats_remaining: quotas.free_chats_per_day,
            verifies_remaining: quotas.free_verifies_per_day,
            saved_articles: Vec::new(),
            preferences: Preferences::default(),
            joined_at: Utc::now(),
        }
    }
}
