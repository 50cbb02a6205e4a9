// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "articles/sqlite_store.rs"]
pub mod articles;

#[path = "evidence/in_memory.rs"]
pub mod evidence;

#[path = "news/mod.rs"]
pub mod news;

#[path = "profile/json_store.rs"]
pub mod profile;

#[path = "reports/sqlite_store.rs"]
pub mod reports;
