use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::model::{
    AttendanceRecords, Candidate, Email, Event, EventId, Member, Session, SessionId,
};
use crate::sync::staleness::LoadHistory;
use crate::sync::views::{
    event_sections, upcoming_sections, CandidateViews, EventSection,
};
use crate::sync::votes::VoteMap;

/// Edit lifecycle for a single candidate record.
///
/// `Viewing -> Editing -> Saving -> Viewing` on success, back to `Editing` on
/// a failed save, and `Editing -> Viewing` on cancel. Invalid transitions
/// leave the state unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    #[default]
    Viewing,
    Editing {
        /// `None` while composing a brand-new candidate.
        email: Option<Email>,
    },
    Saving {
        email: Option<Email>,
    },
}

impl EditState {
    pub fn begin(email: Option<Email>) -> Self {
        Self::Editing { email }
    }

    pub fn start_saving(self) -> Self {
        match self {
            Self::Editing { email } => Self::Saving { email },
            other => other,
        }
    }

    pub fn save_failed(self) -> Self {
        match self {
            Self::Saving { email } => Self::Editing { email },
            other => other,
        }
    }

    /// Save succeeded or the user cancelled.
    pub fn finish(self) -> Self {
        Self::Viewing
    }

    pub fn is_editing(&self) -> bool {
        !matches!(self, Self::Viewing)
    }
}

/// The canonical client-side cache: keyed mappings, their derived views, the
/// load history and the per-resource in-flight flags.
///
/// Mutation flows exclusively through the orchestrator's merge application;
/// presentation reads the views and never writes back.
#[derive(Debug, Clone, Default)]
pub struct SyncState {
    pub load_history: LoadHistory,

    pub events: HashMap<EventId, Event>,
    pub event_sections: Vec<EventSection>,
    pub upcoming_sections: Vec<EventSection>,

    pub directory: HashMap<Email, Member>,
    pub records: AttendanceRecords,

    pub email_to_candidate: HashMap<Email, Candidate>,
    pub candidate_views: CandidateViews,

    pub sessions: HashMap<SessionId, Session>,
    /// Sessions sorted ascending by start date.
    pub session_list: Vec<Session>,

    pub votes: VoteMap,

    pub selected_candidate: Option<Email>,
    pub selected_session: Option<SessionId>,
    pub edit: EditState,

    /// Resource keys with a fetch currently in flight. Plain shared state
    /// mutated only by the orchestrator, never by the pure merge functions.
    in_flight: HashSet<String>,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fetching(&self, key: &str) -> bool {
        self.in_flight.contains(key)
    }

    pub(crate) fn begin_fetch(&mut self, key: &str) {
        self.in_flight.insert(key.to_string());
    }

    pub(crate) fn finish_fetch(&mut self, key: &str) {
        self.in_flight.remove(key);
    }

    pub(crate) fn recompute_candidate_views(&mut self) {
        self.candidate_views = CandidateViews::recompute(&self.email_to_candidate);
    }

    pub(crate) fn recompute_session_list(&mut self) {
        self.session_list =
            crate::sync::views::sort_sessions(self.sessions.values().cloned().collect());
    }

    pub(crate) fn recompute_event_views(&mut self, now: DateTime<Utc>) {
        self.event_sections = event_sections(&self.events);
        self.upcoming_sections = upcoming_sections(&self.events, now);
    }
}
