use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{CandidateId, SessionId};

/// Whether voters pick one candidate or vote on several at once.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionType {
    #[serde(rename = "REGULAR")]
    SingleChoice,
    #[serde(rename = "MULTI")]
    MultiChoice,
}

/// A voting session over an ordered slate of candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "_id")]
    pub id: SessionId,
    pub name: String,
    pub start_date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: SessionType,
    /// Candidates in presentation order.
    pub candidate_order: Vec<CandidateId>,
    /// The candidate currently on the floor, if the session is running.
    #[serde(default)]
    pub current_candidate_id: Option<CandidateId>,
    pub active: bool,
}
