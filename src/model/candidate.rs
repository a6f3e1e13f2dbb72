use serde::{Deserialize, Serialize};

use crate::model::{CandidateId, Email, EventId};

/// Class year of a candidate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassYear {
    #[serde(rename = "FR")]
    Freshman,
    #[serde(rename = "SO")]
    Sophomore,
    #[serde(rename = "JR")]
    Junior,
    #[serde(rename = "SR")]
    Senior,
}

impl ClassYear {
    /// Human-readable label for pickers and summaries.
    pub fn title(self) -> &'static str {
        match self {
            Self::Freshman => "Freshman",
            Self::Sophomore => "Sophomore",
            Self::Junior => "Junior",
            Self::Senior => "Senior",
        }
    }
}

/// A membership candidate under consideration in voting sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Immutable secondary identifier; `email` is the primary identity.
    #[serde(rename = "_id")]
    pub id: CandidateId,
    pub email: Email,
    pub given_name: String,
    pub family_name: String,
    /// Whether the candidate has been approved to appear in sessions.
    pub approved: bool,
    pub class_year: ClassYear,
    pub major: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Events the candidate has attended.
    #[serde(default)]
    pub events: Vec<EventId>,
}


/// Example test data.
#[cfg(test)]
mod examples {
    use super::*;

    impl Candidate {
        pub fn example1() -> Self {
            Self {
                id: "c1".into(),
                email: "johnny@example.org".into(),
                given_name: "Johnny".to_string(),
                family_name: "Appleseed".to_string(),
                approved: true,
                class_year: ClassYear::Sophomore,
                major: "Computer Science".to_string(),
                phone: None,
                events: vec![],
            }
        }

        pub fn example2() -> Self {
            Self {
                id: "c2".into(),
                email: "mary@example.org".into(),
                given_name: "Mary".to_string(),
                family_name: "Bennett".to_string(),
                approved: false,
                class_year: ClassYear::Freshman,
                major: "Mathematics".to_string(),
                phone: Some("+441234567890".to_string()),
                events: vec!["e1".into()],
            }
        }
    }
}
