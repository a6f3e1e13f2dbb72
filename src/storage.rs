//! Persistence of sync state across launches.
//!
//! A [`Snapshot`] captures the canonical mappings and the load history, but
//! never the derived views, in-flight flags or UI selection; those are
//! recomputed or reset on restore.

use std::collections::HashMap;

use chrono::Utc;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{AttendanceRecords, Candidate, Email, Event, EventId, Member, Session, SessionId};
use crate::sync::staleness::LoadHistory;
use crate::sync::state::SyncState;
use crate::sync::votes::VoteMap;

/// Storage slot for the serialized snapshot.
pub const SNAPSHOT_KEY: &str = "chapter-sync-snapshot";

/// A string-keyed blob store, e.g. a file per key or a platform preference
/// store supplied by the embedding application.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn delete(&mut self, key: &str) -> Result<()>;
}

/// In-memory store, for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// The persisted subset of [`SyncState`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub load_history: LoadHistory,
    pub events: HashMap<EventId, Event>,
    pub directory: HashMap<Email, Member>,
    pub records: AttendanceRecords,
    pub email_to_candidate: HashMap<Email, Candidate>,
    pub sessions: HashMap<SessionId, Session>,
    pub votes: VoteMap,
}

impl Snapshot {
    pub fn capture(state: &SyncState) -> Self {
        Self {
            load_history: state.load_history.clone(),
            events: state.events.clone(),
            directory: state.directory.clone(),
            records: state.records.clone(),
            email_to_candidate: state.email_to_candidate.clone(),
            sessions: state.sessions.clone(),
            votes: state.votes.clone(),
        }
    }

    /// Rebuild a full state from the snapshot. Derived views are recomputed
    /// here rather than persisted, so view logic changes take effect on the
    /// next launch without a migration.
    pub fn restore(self) -> SyncState {
        let mut state = SyncState::new();
        state.load_history = self.load_history;
        state.events = self.events;
        state.directory = self.directory;
        state.records = self.records;
        state.email_to_candidate = self.email_to_candidate;
        state.sessions = self.sessions;
        state.votes = self.votes;
        state.recompute_event_views(Utc::now());
        state.recompute_candidate_views();
        state.recompute_session_list();
        state
    }

    pub fn save(&self, store: &mut impl KeyValueStore) -> Result<()> {
        let json = serde_json::to_string(self)?;
        store.set(SNAPSHOT_KEY, &json)
    }

    /// Load the stored snapshot, or `None` when nothing has been saved yet.
    /// A snapshot that no longer deserializes is discarded with a warning;
    /// the caller starts cold and refetches everything.
    pub fn load(store: &mut impl KeyValueStore) -> Result<Option<Self>> {
        let Some(json) = store.get(SNAPSHOT_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str(&json) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(err) => {
                warn!("Discarding unreadable snapshot: {err}");
                store.delete(SNAPSHOT_KEY)?;
                Ok(None)
            }
        }
    }
}
