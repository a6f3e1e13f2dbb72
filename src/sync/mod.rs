//! The synchronization core: staleness tracking, keyed merges, vote
//! aggregation, derived views and the orchestrator that ties them to a
//! [`Fetch`](crate::fetch::Fetch) backend.

pub mod merge;
pub mod orchestrator;
pub mod staleness;
pub mod state;
pub mod views;
pub mod votes;

pub use merge::{index_by_key, merge_by_key, remove_key};
pub use orchestrator::SyncOrchestrator;
pub use staleness::{keys, LoadHistory};
pub use state::{EditState, SyncState};
pub use views::{
    classify_attendance, event_attendance, event_sections, session_tally, sort_sessions,
    upcoming_sections, AttendanceStatus, CandidateTally, CandidateViews, EventAttendance,
    EventSection,
};
pub use votes::{merge_votes, VoteKey, VoteMap};
