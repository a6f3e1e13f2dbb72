use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{serde_string_map, Email, EventId, Id};

/// Key for attendance and excuse entries: one per (event, member) pair.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct AttendanceKey {
    pub event: EventId,
    pub member: Email,
}

impl AttendanceKey {
    pub fn new(event: EventId, member: Email) -> Self {
        Self { event, member }
    }
}

impl Display for AttendanceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // Event ids never contain ':', so the first colon is the separator.
        write!(f, "{}:{}", self.event, self.member)
    }
}

impl FromStr for AttendanceKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (event, member) = s
            .split_once(':')
            .ok_or_else(|| format!("Expected `<event>:<member>`, got {s}"))?;
        Ok(Self::new(event.into(), member.into()))
    }
}

/// A check-in record: the member was present at the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    #[serde(rename = "_id")]
    pub id: Id,
    pub event_id: EventId,
    pub user_email: Email,
}

impl Attendance {
    pub fn key(&self) -> AttendanceKey {
        AttendanceKey::new(self.event_id.clone(), self.user_email.clone())
    }
}

/// An excuse request for missing an event, pending or approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Excuse {
    #[serde(rename = "_id")]
    pub id: Id,
    pub event_id: EventId,
    pub user_email: Email,
    pub approved: bool,
    #[serde(default)]
    pub reason: String,
}

impl Excuse {
    pub fn key(&self) -> AttendanceKey {
        AttendanceKey::new(self.event_id.clone(), self.user_email.clone())
    }
}

/// Canonical attendance storage: check-ins and excuses keyed per
/// (event, member). Both maps are merged independently; classification
/// consults them together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecords {
    #[serde(with = "serde_string_map")]
    pub attended: HashMap<AttendanceKey, Attendance>,
    #[serde(with = "serde_string_map")]
    pub excused: HashMap<AttendanceKey, Excuse>,
}

impl AttendanceRecords {
    pub fn attendance(&self, member: &Email, event: &EventId) -> Option<&Attendance> {
        self.attended
            .get(&AttendanceKey::new(event.clone(), member.clone()))
    }

    pub fn excuse(&self, member: &Email, event: &EventId) -> Option<&Excuse> {
        self.excused
            .get(&AttendanceKey::new(event.clone(), member.clone()))
    }
}

/// A fetched slice of attendance data, either for one member across all
/// events or for one event across all members.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceBatch {
    #[serde(default)]
    pub attended: Vec<Attendance>,
    #[serde(default)]
    pub excused: Vec<Excuse>,
}

/// Example test data.
#[cfg(test)]
mod examples {
    use super::*;

    impl Attendance {
        pub fn example1() -> Self {
            Self {
                id: "a1".into(),
                event_id: "e1".into(),
                user_email: "alice@example.org".into(),
            }
        }
    }

    impl Excuse {
        pub fn example_approved() -> Self {
            Self {
                id: "x1".into(),
                event_id: "e1".into(),
                user_email: "bob@example.org".into(),
                approved: true,
                reason: "Out of town".to_string(),
            }
        }

        pub fn example_pending() -> Self {
            Self {
                id: "x2".into(),
                event_id: "e2".into(),
                user_email: "bob@example.org".into(),
                approved: false,
                reason: "Exam conflict".to_string(),
            }
        }
    }
}
