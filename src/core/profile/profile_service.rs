// ============================================================================
// ERRORS
// ============================================================================

use async_trait::async_trait;
use thiserror::Error;

use crate::core::profile::profile_models::{Plan, Preferences, QuotaConfig, UserProfile};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Unknown user: {0}")]
    UnknownUser(String),
    #[error("User already registered: {0}")]
    Duplicate(String),
    #[error("Daily quota exhausted")]
    QuotaExhausted,
    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Storage port for user profiles. `save` is an upsert keyed by user id.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, ProfileError>;

    async fn save(&self, profile: UserProfile) -> Result<(), ProfileError>;

    async fn all(&self) -> Result<Vec<UserProfile>, ProfileError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Accounts, preferences, bookmarks and the daily quota ledger.
pub struct ProfileService<U: UserStore> {
    store: U,
    quotas: QuotaConfig,
}

impl<U: UserStore> ProfileService<U> {
    pub fn new(store: U, quotas: QuotaConfig) -> Self {
        Self { store, quotas }
    }

    pub async fn register(
        &self,
        user_id: &str,
        display_name: &str,
        email: &str,
        plan: Plan,
    ) -> Result<UserProfile, ProfileError> {
        if self.store.get(user_id).await?.is_some() {
            return Err(ProfileError::Duplicate(user_id.to_string()));
        }

        let profile = UserProfile::new(user_id, display_name, email, plan, &self.quotas);
        self.store.save(profile.clone()).await?;
        tracing::info!("Registered user {} on the {:?} plan", user_id, plan);
        Ok(profile)
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<UserProfile, ProfileError> {
        self.store
            .get(user_id)
            .await?
            .ok_or_else(|| ProfileError::UnknownUser(user_id.to_string()))
    }

    pub async fn set_preferences(
        &self,
        user_id: &str,
        preferences: Preferences,
    ) -> Result<UserProfile, ProfileError> {
        let mut profile = self.get_profile(user_id).await?;
        profile.preferences = preferences;
        self.store.save(profile.clone()).await?;
        Ok(profile)
    }

    /// Bookmark or un-bookmark an article. Both directions are idempotent.
    pub async fn save_article(
        &self,
        user_id: &str,
        article_id: &str,
        saved: bool,
    ) -> Result<UserProfile, ProfileError> {
        let mut profile = self.get_profile(user_id).await?;
        if saved {
            if !profile.saved_articles.iter().any(|id| id == article_id) {
                profile.saved_articles.push(article_id.to_string());
            }
        } else {
            profile.saved_articles.retain(|id| id != article_id);
        }
        self.store.save(profile.clone()).await?;
        Ok(profile)
    }

    /// Chats the user can still start today. `None` means unmetered.
    pub async fn chats_remaining(&self, user_id: &str) -> Result<Option<u32>, ProfileError> {
        let profile = self.get_profile(user_id).await?;
        Ok(if profile.plan.is_metered() {
            Some(profile.chats_remaining)
        } else {
            None
        })
    }

    /// Consume one chat from the daily quota. Returns what is left, or
    /// `None` for unmetered plans.
    pub async fn spend_chat(&self, user_id: &str) -> Result<Option<u32>, ProfileError> {
        let mut profile = self.get_profile(user_id).await?;
        if !profile.plan.is_metered() {
            return Ok(None);
        }
        if profile.chats_remaining == 0 {
            return Err(ProfileError::QuotaExhausted);
        }
        profile.chats_remaining -= 1;
        let remaining = profile.chats_remaining;
        self.store.save(profile).await?;
        Ok(Some(remaining))
    }

    /// Consume one verification from the daily quota. Same contract as
    /// `spend_chat`.
    pub async fn spend_verify(&self, user_id: &str) -> Result<Option<u32>, ProfileError> {
        let mut profile = self.get_profile(user_id).await?;
        if !profile.plan.is_metered() {
            return Ok(None);
        }
        if profile.verifies_remaining == 0 {
            return Err(ProfileError::QuotaExhausted);
        }
        profile.verifies_remaining -= 1;
        let remaining = profile.verifies_remaining;
        self.store.save(profile).await?;
        Ok(Some(remaining))
    }

    /// Refill the daily allowances of every metered account. Returns how
    /// many accounts were refilled.
    pub async fn reset_daily_quotas(&self) -> Result<usize, ProfileError> {
        let mut reset = 0;
        for mut profile in self.store.all().await? {
            if !profile.plan.is_metered() {
                continue;
            }
            profile.chats_remaining = self.quotas.free_chats_per_day;
            profile.verifies_remaining = self.quotas.free_verifies_per_day;
            self.store.save(profile).await?;
            reset += 1;
        }
        tracing::info!("Daily quotas reset for {} accounts", reset);
        Ok(reset)
    }
}

// ============================================================================
// TESTS
// ============================================================================
