//! Pure recomputation of presentation views from the canonical mappings.
//! Views are rebuilt from scratch after every merge; collection sizes are in
//! the hundreds, so recomputation is cheaper than incremental patching is
//! worth.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::model::{
    AttendanceRecords, Candidate, CandidateId, Email, Event, EventId, Member, Session,
};
use crate::sync::votes::VoteMap;

/// Sorted and partitioned candidate views, recomputed from the canonical
/// email-to-candidate mapping.
///
/// `approved` and `unapproved` are disjoint and together equal `sorted`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateViews {
    /// All candidates, sorted by (family name, given name); ties broken by
    /// email so the order is deterministic.
    pub sorted: Vec<Candidate>,
    pub by_id: HashMap<CandidateId, Candidate>,
    pub approved: Vec<Candidate>,
    pub unapproved: Vec<Candidate>,
}

fn name_order(a: &Candidate, b: &Candidate) -> Ordering {
    (&a.family_name, &a.given_name, &a.email).cmp(&(&b.family_name, &b.given_name, &b.email))
}

impl CandidateViews {
    pub fn recompute(email_to_candidate: &HashMap<Email, Candidate>) -> Self {
        let mut sorted: Vec<Candidate> = email_to_candidate.values().cloned().collect();
        sorted.sort_by(name_order);

        let by_id = sorted
            .iter()
            .map(|candidate| (candidate.id.clone(), candidate.clone()))
            .collect();
        let (approved, unapproved): (Vec<_>, Vec<_>) = sorted
            .iter()
            .cloned()
            .partition(|candidate| candidate.approved);

        Self {
            sorted,
            by_id,
            approved,
            unapproved,
        }
    }
}

/// Sessions ordered ascending by start date; equal dates fall back to id so
/// the order is deterministic across recomputes.
pub fn sort_sessions(mut sessions: Vec<Session>) -> Vec<Session> {
    sessions.sort_by(|a, b| (a.start_date, &a.id).cmp(&(b.start_date, &b.id)));
    sessions
}

/// One member's standing for one event. Exactly one category applies.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AttendanceStatus {
    Attended,
    ExcusedApproved,
    ExcusedPending,
    /// No record yet, but the event has not finished.
    Pending,
    Absent,
}

/// Classify one (event, member) pair from the canonical records.
pub fn classify_attendance(
    event: &Event,
    member: &Email,
    records: &AttendanceRecords,
    now: DateTime<Utc>,
) -> AttendanceStatus {
    if records.attendance(member, &event.id).is_some() {
        return AttendanceStatus::Attended;
    }
    if let Some(excuse) = records.excuse(member, &event.id) {
        return if excuse.approved {
            AttendanceStatus::ExcusedApproved
        } else {
            AttendanceStatus::ExcusedPending
        };
    }
    if event.is_past(now) {
        AttendanceStatus::Absent
    } else {
        AttendanceStatus::Pending
    }
}

/// Every directory member bucketed into exactly one category for one event.
/// Buckets are sorted by (family name, given name) for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventAttendance {
    pub attended: Vec<Member>,
    pub excused_approved: Vec<Member>,
    pub excused_pending: Vec<Member>,
    pub pending: Vec<Member>,
    pub absent: Vec<Member>,
}

pub fn event_attendance(
    directory: &HashMap<Email, Member>,
    records: &AttendanceRecords,
    event: &Event,
    now: DateTime<Utc>,
) -> EventAttendance {
    let mut members: Vec<&Member> = directory.values().collect();
    members.sort_by_key(|member| (member.family_name.clone(), member.given_name.clone()));

    let mut buckets = EventAttendance::default();
    for member in members {
        let bucket = match classify_attendance(event, &member.email, records, now) {
            AttendanceStatus::Attended => &mut buckets.attended,
            AttendanceStatus::ExcusedApproved => &mut buckets.excused_approved,
            AttendanceStatus::ExcusedPending => &mut buckets.excused_pending,
            AttendanceStatus::Pending => &mut buckets.pending,
            AttendanceStatus::Absent => &mut buckets.absent,
        };
        bucket.push(member.clone());
    }
    buckets
}

/// Approve/reject counts for one candidate in one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTally {
    pub candidate: CandidateId,
    pub approve: usize,
    pub reject: usize,
}

/// Per-candidate tallies for one session, in the session's candidate order.
pub fn session_tally(votes: &VoteMap, session: &Session) -> Vec<CandidateTally> {
    session
        .candidate_order
        .iter()
        .map(|candidate| {
            let bucket = votes.session_candidate_votes(&session.id, candidate);
            let approve = bucket.iter().filter(|vote| vote.verdict).count();
            CandidateTally {
                candidate: candidate.clone(),
                approve,
                reject: bucket.len() - approve,
            }
        })
        .collect()
}

/// Events for one calendar day, used as a list section header.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSection {
    pub day: NaiveDate,
    pub events: Vec<Event>,
}

/// All events grouped by calendar day, days ascending, events within a day
/// ascending by start time.
pub fn event_sections(events: &HashMap<EventId, Event>) -> Vec<EventSection> {
    let mut sorted: Vec<&Event> = events.values().collect();
    sorted.sort_by_key(|event| (event.start, event.id.clone()));

    let mut sections: Vec<EventSection> = Vec::new();
    for event in sorted {
        let day = event.start.date_naive();
        match sections.last_mut() {
            Some(section) if section.day == day => section.events.push(event.clone()),
            _ => sections.push(EventSection {
                day,
                events: vec![event.clone()],
            }),
        }
    }
    sections
}

/// Like [`event_sections`], restricted to events that have not yet finished.
pub fn upcoming_sections(events: &HashMap<EventId, Event>, now: DateTime<Utc>) -> Vec<EventSection> {
    let upcoming = events
        .iter()
        .filter(|(_, event)| !event.is_past(now))
        .map(|(id, event)| (id.clone(), event.clone()))
        .collect();
    event_sections(&upcoming)
}
