// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "chat/mod.rs"]
pub mod chat;

#[path = "demo/mod.rs"]
pub mod demo;

#[path = "evidence/evidence_index.rs"]
pub mod evidence;

#[path = "feed/mod.rs"]
pub mod feed;

#[path = "ingest/mod.rs"]
pub mod ingest;

#[path = "profile/mod.rs"]
pub mod profile;

#[path = "reports/mod.rs"]
pub mod reports;

#[path = "tasks/deferred.rs"]
pub mod tasks;

#[path = "verify/mod.rs"]
pub mod verify;
