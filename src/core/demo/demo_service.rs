// ============================================================================
// CORE SERVICE
// ============================================================================

use dashmap::DashMap;
use rand::Rng;
use std::time::Duration;

use crate::core::chat::ChatReply;
use crate::core::demo::seed_data::{demo_chat_reply, demo_verification_report};
use crate::core::tasks::{Deferred, DeferredHandle};
use crate::core::verify::VerificationReport;

/// Sessions with a tracked pending reply at once.
const MAX_TRACKED_SESSIONS: usize = 1_000;

/// Spread added to the base delays so demo replies do not land in lockstep.
const JITTER_MS: u64 = 400;

/// Canned chat and verification replies behind realistic delays. Each
/// session has at most one pending reply; a newer request for the same
/// session cancels the older one, and a cancel endpoint can do the same
/// explicitly.
pub struct DemoService {
    chat_delay: Duration,
    verify_delay: Duration,
    pending: DashMap<String, DeferredHandle>,
}

impl DemoService {
    pub fn new(chat_delay: Duration, verify_delay: Duration) -> Self {
        Self {
            chat_delay,
            verify_delay,
            pending: DashMap::new(),
        }
    }

    /// The canned chat reply, resolving after the chat delay plus jitter.
    pub fn chat_reply(&self, session_id: &str, _prompt: &str) -> Deferred<ChatReply> {
        let deferred = Deferred::resolve_after(demo_chat_reply(), jittered(self.chat_delay));
        self.track(session_id, deferred.cancel_handle());
        deferred
    }

    /// The canned verification outcome, resolving after the verify delay
    /// plus jitter.
    pub fn verification(&self, session_id: &str, _target: &str) -> Deferred<VerificationReport> {
        let delay = jittered(self.verify_delay);
        let report = demo_verification_report(delay.as_secs_f64());
        let deferred = Deferred::resolve_after(report, delay);
        self.track(session_id, deferred.cancel_handle());
        deferred
    }

    /// Cancel whatever reply is pending for a session. Returns whether there
    /// was one to cancel.
    pub fn cancel_pending(&self, session_id: &str) -> bool {
        match self.pending.remove(session_id) {
            Some((_, handle)) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    fn track(&self, session_id: &str, handle: DeferredHandle) {
        if !self.pending.contains_key(session_id) && self.pending.len() >= MAX_TRACKED_SESSIONS {
            // Simple eviction: drop an arbitrary entry once we cross the cap.
            let stale = self.pending.iter().next().map(|e| e.key().clone());
            if let Some(stale) = stale {
                self.pending.remove(&stale);
            }
        }
        if let Some(previous) = self.pending.insert(session_id.to_string(), handle) {
            previous.cancel();
        }
    }
}

fn jittered(base: Duration) -> Duration {
    base + Duration::from_millis(rand::thread_rng().gen_range(0..JITTER_MS))
}

// ============================================================================
// TESTS
// ============================================================================
