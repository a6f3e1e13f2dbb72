use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::EventId;

/// A chapter event members can attend or be excused from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: EventId,
    pub title: String,
    pub description: String,
    pub start: DateTime<Utc>,
    /// Duration in minutes.
    pub duration: u32,
    pub points: u32,
    /// Email of the member who created the event.
    #[serde(default)]
    pub creator: String,
    pub mandatory: bool,
    /// Whether members may request an excuse in advance.
    pub excusable: bool,
    #[serde(default)]
    pub link: Option<String>,
}

impl Event {
    pub fn end(&self) -> DateTime<Utc> {
        self.start + Duration::minutes(self.duration.into())
    }

    /// An event counts as past once it has finished, not once it has started,
    /// so members can still check in while it is running.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.end() < now
    }
}
