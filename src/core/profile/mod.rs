// User accounts: plans, preferences, bookmarks, daily quotas.

pub mod profile_models;
pub mod profile_service;

pub use profile_models::{Plan, Preferences, QuotaConfig, UserProfile};
pub use profile_service::{ProfileError, ProfileService, UserStore};
