use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Resource keys for the fetchable collections.
pub mod keys {
    use crate::model::{Email, EventId, SessionId};

    pub const EVENTS: &str = "events";
    pub const DIRECTORY: &str = "directory";
    pub const EXCUSES: &str = "excuses";
    pub const CANDIDATES: &str = "candidates";
    pub const SESSIONS: &str = "sessions";

    /// One member's attendance across all events.
    pub fn user_attendance(member: &Email) -> String {
        format!("user-{member}")
    }

    /// One event's attendance across all members.
    pub fn event_attendance(event: &EventId) -> String {
        format!("event-{event}")
    }

    /// Votes cast in one session.
    pub fn session_votes(session: &SessionId) -> String {
        format!("votes-{session}")
    }
}

/// When each remote resource was last fetched successfully.
///
/// Entries are set only after a fetch succeeds; a failed fetch leaves the
/// previous timestamp in place so the next [`should_load`](Self::should_load)
/// re-evaluates to true. Duplicate-fetch suppression is the caller's
/// in-flight flag, not this type's concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoadHistory {
    loaded_at: HashMap<String, DateTime<Utc>>,
}

impl LoadHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` has never been fetched, or its last successful fetch is
    /// older than `ttl`. Pure query; never mutates.
    pub fn should_load(&self, key: &str, now: DateTime<Utc>, ttl: Duration) -> bool {
        match self.loaded_at.get(key) {
            None => true,
            Some(at) => now - *at > ttl,
        }
    }

    /// Mark `key` as freshly fetched. Call only after the fetch succeeds.
    pub fn record(&mut self, key: impl Into<String>, now: DateTime<Utc>) {
        self.loaded_at.insert(key.into(), now);
    }

    pub fn loaded_at(&self, key: &str) -> Option<DateTime<Utc>> {
        self.loaded_at.get(key).copied()
    }
}
