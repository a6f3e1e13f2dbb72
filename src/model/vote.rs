use serde::{Deserialize, Serialize};

use crate::model::{CandidateId, Email, Id, SessionId};

/// One voter's verdict on one candidate in one session.
///
/// Identity is the composite (session, candidate, voter email); the `id`
/// field is the server's storage key and plays no part in deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: Id,
    pub session_id: SessionId,
    pub candidate_id: CandidateId,
    pub user_email: Email,
    /// `true` to approve the candidate, `false` to reject.
    pub verdict: bool,
    /// Required justification when rejecting.
    #[serde(default)]
    pub reason: String,
}
