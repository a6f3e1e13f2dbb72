use serde::{Deserialize, Serialize};

use crate::model::{Email, Id};

/// A directory entry for an active member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(rename = "_id")]
    pub id: Id,
    pub email: Email,
    pub given_name: String,
    pub family_name: String,
    #[serde(default)]
    pub role: String,
    /// Privileged members can view per-event attendance for everyone.
    #[serde(default)]
    pub privileged: bool,
}
