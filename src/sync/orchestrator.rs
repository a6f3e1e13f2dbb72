use chrono::Utc;
use log::info;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::Fetch;
use crate::model::{Attendance, Candidate, Email, EventId, Excuse, SessionId};
use crate::sync::merge::{merge_by_key, remove_key};
use crate::sync::staleness::keys;
use crate::sync::state::{EditState, SyncState};
use crate::sync::votes::merge_votes;

/// Drives fetch -> merge -> derive for every resource.
///
/// Each `refresh_*` checks the in-flight flag, then staleness (unless
/// forced), runs the fetch, and on success merges the batch, records the
/// load history and recomputes the affected views. On failure the error is
/// returned and canonical state is left untouched, so the previously
/// displayed (possibly stale) views survive; the load history keeps its old
/// timestamp and the next refresh re-evaluates to stale.
///
/// Merges are applied in fetch-completion order. A stale fetch that
/// completes after a newer one simply merges again; merges are idempotent
/// per key, so this is last-applied-wins by design.
pub struct SyncOrchestrator<F> {
    config: Config,
    fetcher: F,
    state: SyncState,
}

impl<F: Fetch> SyncOrchestrator<F> {
    pub fn new(config: Config, fetcher: F) -> Self {
        Self::with_state(config, fetcher, SyncState::new())
    }

    /// Resume from a previously persisted state.
    pub fn with_state(config: Config, fetcher: F, state: SyncState) -> Self {
        Self {
            config,
            fetcher,
            state,
        }
    }

    /// Read-only view of the canonical state for presentation.
    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn into_state(self) -> SyncState {
        self.state
    }

    /// Whether `key` should be fetched now: no fetch already in flight, and
    /// either forced or stale.
    fn wants(&self, key: &str, force: bool) -> bool {
        !self.state.is_fetching(key)
            && (force
                || self
                    .state
                    .load_history
                    .should_load(key, Utc::now(), self.config.load_ttl()))
    }

    /// Returns `Ok(true)` if a fetch ran and its result was merged,
    /// `Ok(false)` if the refresh was skipped as fresh or already in flight.
    pub async fn refresh_events(&mut self, force: bool) -> Result<bool> {
        if !self.wants(keys::EVENTS, force) {
            return Ok(false);
        }
        self.state.begin_fetch(keys::EVENTS);
        let result = self.fetcher.events().await;
        self.state.finish_fetch(keys::EVENTS);
        let batch = result?;

        info!("Merging {} events", batch.len());
        let now = Utc::now();
        self.state.events = merge_by_key(&self.state.events, batch, |event| event.id.clone());
        self.state.load_history.record(keys::EVENTS, now);
        self.state.recompute_event_views(now);
        Ok(true)
    }

    pub async fn refresh_directory(&mut self, force: bool) -> Result<bool> {
        if !self.wants(keys::DIRECTORY, force) {
            return Ok(false);
        }
        self.state.begin_fetch(keys::DIRECTORY);
        let result = self.fetcher.directory().await;
        self.state.finish_fetch(keys::DIRECTORY);
        let batch = result?;

        info!("Merging {} directory members", batch.len());
        self.state.directory =
            merge_by_key(&self.state.directory, batch, |member| member.email.clone());
        self.state.load_history.record(keys::DIRECTORY, Utc::now());
        Ok(true)
    }

    pub async fn refresh_excuses(&mut self, force: bool) -> Result<bool> {
        if !self.wants(keys::EXCUSES, force) {
            return Ok(false);
        }
        self.state.begin_fetch(keys::EXCUSES);
        let result = self.fetcher.excuses().await;
        self.state.finish_fetch(keys::EXCUSES);
        let batch = result?;

        info!("Merging {} excuses", batch.len());
        self.state.records.excused =
            merge_by_key(&self.state.records.excused, batch, Excuse::key);
        self.state.load_history.record(keys::EXCUSES, Utc::now());
        Ok(true)
    }

    /// One member's attendance across all events.
    pub async fn refresh_user_attendance(&mut self, member: &Email, force: bool) -> Result<bool> {
        let key = keys::user_attendance(member);
        if !self.wants(&key, force) {
            return Ok(false);
        }
        self.state.begin_fetch(&key);
        let result = self.fetcher.user_attendance(member).await;
        self.state.finish_fetch(&key);
        let batch = result?;

        info!(
            "Merging {} check-ins and {} excuses for {member}",
            batch.attended.len(),
            batch.excused.len()
        );
        self.state.records.attended =
            merge_by_key(&self.state.records.attended, batch.attended, Attendance::key);
        self.state.records.excused =
            merge_by_key(&self.state.records.excused, batch.excused, Excuse::key);
        self.state.load_history.record(key, Utc::now());
        Ok(true)
    }

    /// One event's attendance across all members.
    pub async fn refresh_event_attendance(&mut self, event: &EventId, force: bool) -> Result<bool> {
        let key = keys::event_attendance(event);
        if !self.wants(&key, force) {
            return Ok(false);
        }
        self.state.begin_fetch(&key);
        let result = self.fetcher.event_attendance(event).await;
        self.state.finish_fetch(&key);
        let batch = result?;

        info!(
            "Merging {} check-ins and {} excuses for event {event}",
            batch.attended.len(),
            batch.excused.len()
        );
        self.state.records.attended =
            merge_by_key(&self.state.records.attended, batch.attended, Attendance::key);
        self.state.records.excused =
            merge_by_key(&self.state.records.excused, batch.excused, Excuse::key);
        self.state.load_history.record(key, Utc::now());
        Ok(true)
    }

    pub async fn refresh_candidates(&mut self, force: bool) -> Result<bool> {
        if !self.wants(keys::CANDIDATES, force) {
            return Ok(false);
        }
        self.state.begin_fetch(keys::CANDIDATES);
        let result = self.fetcher.candidates().await;
        self.state.finish_fetch(keys::CANDIDATES);
        let batch = result?;

        info!("Merging {} candidates", batch.len());
        self.state.email_to_candidate = merge_by_key(
            &self.state.email_to_candidate,
            batch,
            |candidate| candidate.email.clone(),
        );
        self.state.load_history.record(keys::CANDIDATES, Utc::now());
        self.state.recompute_candidate_views();
        Ok(true)
    }

    pub async fn refresh_sessions(&mut self, force: bool) -> Result<bool> {
        if !self.wants(keys::SESSIONS, force) {
            return Ok(false);
        }
        self.state.begin_fetch(keys::SESSIONS);
        let result = self.fetcher.sessions().await;
        self.state.finish_fetch(keys::SESSIONS);
        let batch = result?;

        info!("Merging {} sessions", batch.len());
        self.state.sessions =
            merge_by_key(&self.state.sessions, batch, |session| session.id.clone());
        self.state.load_history.record(keys::SESSIONS, Utc::now());
        self.state.recompute_session_list();
        Ok(true)
    }

    /// Votes for one session. `overwrite` requests a full resync: the entire
    /// vote map is rebuilt from the fetched batch.
    pub async fn refresh_session_votes(
        &mut self,
        session: &SessionId,
        force: bool,
        overwrite: bool,
    ) -> Result<bool> {
        let key = keys::session_votes(session);
        if !self.wants(&key, force || overwrite) {
            return Ok(false);
        }
        self.state.begin_fetch(&key);
        let result = self.fetcher.session_votes(session).await;
        self.state.finish_fetch(&key);
        let batch = result?;

        info!("Merging {} votes for session {session}", batch.len());
        self.state.votes = merge_votes(&self.state.votes, batch, overwrite);
        self.state.load_history.record(key, Utc::now());
        Ok(true)
    }

    // Selection and the candidate edit lifecycle.

    pub fn select_candidate(&mut self, email: Email) {
        self.state.selected_candidate = Some(email);
    }

    pub fn unselect_candidate(&mut self) {
        self.state.selected_candidate = None;
    }

    pub fn select_session(&mut self, session: SessionId) {
        self.state.selected_session = Some(session);
    }

    pub fn unselect_session(&mut self) {
        self.state.selected_session = None;
    }

    /// Begin editing an existing candidate, or a new one with `None`.
    pub fn edit_candidate(&mut self, email: Option<Email>) {
        self.state.edit = EditState::begin(email);
    }

    pub fn cancel_edit(&mut self) {
        self.state.edit = std::mem::take(&mut self.state.edit).finish();
    }

    /// Save the candidate being edited. Rejected outright when no edit is in
    /// progress. On success the server's copy is merged and the edit ends;
    /// on failure the edit survives for retry and the error is returned.
    pub async fn save_candidate(&mut self, candidate: Candidate) -> Result<()> {
        if !self.state.edit.is_editing() {
            return Err(Error::Precondition(
                "No candidate edit in progress".to_string(),
            ));
        }
        self.state.edit = std::mem::take(&mut self.state.edit).start_saving();
        match self.fetcher.save_candidate(&candidate).await {
            Ok(saved) => {
                self.apply_saved_candidate(saved);
                Ok(())
            }
            Err(err) => {
                self.state.edit = std::mem::take(&mut self.state.edit).save_failed();
                Err(err)
            }
        }
    }

    /// Merge a save result into canonical state. Applied unconditionally:
    /// a save completing after the user has navigated away still lands.
    pub fn apply_saved_candidate(&mut self, candidate: Candidate) {
        self.state.email_to_candidate = merge_by_key(
            &self.state.email_to_candidate,
            vec![candidate],
            |c| c.email.clone(),
        );
        self.state.recompute_candidate_views();
        self.state.edit = std::mem::take(&mut self.state.edit).finish();
    }

    pub async fn delete_candidate(&mut self, email: &Email) -> Result<()> {
        self.fetcher.delete_candidate(email).await?;
        self.state.email_to_candidate = remove_key(&self.state.email_to_candidate, email);
        self.state.recompute_candidate_views();
        if self.state.selected_candidate.as_ref() == Some(email) {
            self.state.selected_candidate = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::Error;
    use crate::model::{AttendanceBatch, Attendance, Event, Excuse, Member, Session, Vote};

    /// Scripted fetcher: returns canned batches and records every call.
    #[derive(Default)]
    struct StubFetch {
        events: Vec<Event>,
        members: Vec<Member>,
        excuse_list: Vec<Excuse>,
        attendance: AttendanceBatch,
        candidate_list: Vec<Candidate>,
        session_list: Vec<Session>,
        votes: Vec<Vote>,
        saved: Option<Candidate>,
        fail: bool,
        calls: RefCell<Vec<String>>,
    }

    impl StubFetch {
        fn call(&self, name: &str) -> Result<()> {
            self.calls.borrow_mut().push(name.to_string());
            if self.fail {
                Err(Error::fetch("service unavailable", 503))
            } else {
                Ok(())
            }
        }

        fn calls(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl Fetch for StubFetch {
        async fn events(&self) -> Result<Vec<Event>> {
            self.call("events")?;
            Ok(self.events.clone())
        }

        async fn directory(&self) -> Result<Vec<Member>> {
            self.call("directory")?;
            Ok(self.members.clone())
        }

        async fn excuses(&self) -> Result<Vec<Excuse>> {
            self.call("excuses")?;
            Ok(self.excuse_list.clone())
        }

        async fn user_attendance(&self, member: &Email) -> Result<AttendanceBatch> {
            self.call(&format!("user-{member}"))?;
            Ok(self.attendance.clone())
        }

        async fn event_attendance(&self, event: &EventId) -> Result<AttendanceBatch> {
            self.call(&format!("event-{event}"))?;
            Ok(self.attendance.clone())
        }

        async fn candidates(&self) -> Result<Vec<Candidate>> {
            self.call("candidates")?;
            Ok(self.candidate_list.clone())
        }

        async fn sessions(&self) -> Result<Vec<Session>> {
            self.call("sessions")?;
            Ok(self.session_list.clone())
        }

        async fn session_votes(&self, session: &SessionId) -> Result<Vec<Vote>> {
            self.call(&format!("votes-{session}"))?;
            Ok(self.votes.clone())
        }

        async fn save_candidate(&self, candidate: &Candidate) -> Result<Candidate> {
            self.call("save")?;
            Ok(self.saved.clone().unwrap_or_else(|| candidate.clone()))
        }

        async fn delete_candidate(&self, _email: &Email) -> Result<()> {
            self.call("delete")
        }
    }

    fn orchestrator(fetcher: StubFetch) -> SyncOrchestrator<StubFetch> {
        // These tests exercise the merge logging paths.
        log4rs_test_utils::test_logging::init_logging_once_for(["chapter_sync"], None, None);
        SyncOrchestrator::new(Config::example(), fetcher)
    }

    #[tokio::test]
    async fn refresh_merges_and_marks_fresh() {
        let mut orch = orchestrator(StubFetch {
            events: vec![Event::example1(), Event::example2()],
            ..Default::default()
        });

        assert!(orch.refresh_events(false).await.unwrap());
        assert_eq!(orch.state().events.len(), 2);
        assert_eq!(orch.state().event_sections.len(), 2);
        assert!(orch.state().load_history.loaded_at(keys::EVENTS).is_some());

        // Fresh now, so the second refresh is skipped entirely.
        assert!(!orch.refresh_events(false).await.unwrap());
        assert_eq!(orch.fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn in_flight_key_suppresses_refresh_even_when_forced() {
        let mut orch = orchestrator(StubFetch {
            events: vec![Event::example1()],
            ..Default::default()
        });
        orch.state.begin_fetch(keys::EVENTS);

        assert!(!orch.refresh_events(false).await.unwrap());
        assert!(!orch.refresh_events(true).await.unwrap());
        assert_eq!(orch.fetcher.calls(), 0);

        // Once the outstanding fetch clears, refresh proceeds again.
        orch.state.finish_fetch(keys::EVENTS);
        assert!(orch.refresh_events(false).await.unwrap());
        assert_eq!(orch.fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn force_bypasses_staleness() {
        let mut orch = orchestrator(StubFetch {
            events: vec![Event::example1()],
            ..Default::default()
        });
        assert!(orch.refresh_events(false).await.unwrap());
        assert!(orch.refresh_events(true).await.unwrap());
        assert_eq!(orch.fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn failed_fetch_leaves_state_and_history_untouched() {
        let mut orch = orchestrator(StubFetch {
            fail: true,
            ..Default::default()
        });

        assert!(orch.refresh_candidates(false).await.is_err());
        assert!(orch.state().email_to_candidate.is_empty());
        assert!(orch
            .state()
            .load_history
            .loaded_at(keys::CANDIDATES)
            .is_none());
        assert!(!orch.state().is_fetching(keys::CANDIDATES));

        // Still stale, so the next refresh retries.
        assert!(orch.refresh_candidates(false).await.is_err());
        assert_eq!(orch.fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn refresh_candidates_recomputes_views() {
        let mut orch = orchestrator(StubFetch {
            candidate_list: vec![Candidate::example1(), Candidate::example2()],
            ..Default::default()
        });
        orch.refresh_candidates(false).await.unwrap();

        let views = &orch.state().candidate_views;
        assert_eq!(views.sorted.len(), 2);
        assert_eq!(views.approved.len(), 1);
        assert_eq!(views.unapproved.len(), 1);
    }

    #[tokio::test]
    async fn refresh_sessions_keeps_list_sorted() {
        let mut orch = orchestrator(StubFetch {
            session_list: vec![Session::example2(), Session::example1()],
            ..Default::default()
        });
        orch.refresh_sessions(false).await.unwrap();

        let list = &orch.state().session_list;
        assert_eq!(list.len(), 2);
        assert!(list[0].start_date <= list[1].start_date);
    }

    #[tokio::test]
    async fn user_attendance_merges_both_record_kinds() {
        let member: Email = "alice@example.org".into();
        let mut orch = orchestrator(StubFetch {
            attendance: AttendanceBatch {
                attended: vec![Attendance::example1()],
                excused: vec![Excuse::example_approved()],
            },
            ..Default::default()
        });
        orch.refresh_user_attendance(&member, false).await.unwrap();

        assert_eq!(orch.state().records.attended.len(), 1);
        assert_eq!(orch.state().records.excused.len(), 1);

        // The per-member key is fresh; the shared excuses key is not affected.
        assert!(!orch.refresh_user_attendance(&member, false).await.unwrap());
        assert!(orch
            .state()
            .load_history
            .loaded_at(keys::EXCUSES)
            .is_none());
    }

    #[tokio::test]
    async fn session_votes_merge_and_overwrite() {
        let session: SessionId = "s1".into();
        let mut orch = orchestrator(StubFetch {
            votes: vec![Vote::example1(), Vote::example2()],
            ..Default::default()
        });
        orch.refresh_session_votes(&session, false, false)
            .await
            .unwrap();
        assert_eq!(orch.state().votes.len(), 2);

        // Overwrite bypasses staleness and rebuilds from the batch.
        orch.fetcher.votes = vec![Vote::example1()];
        assert!(orch
            .refresh_session_votes(&session, false, true)
            .await
            .unwrap());
        assert_eq!(orch.state().votes.len(), 1);
    }

    #[tokio::test]
    async fn save_candidate_merges_and_ends_edit() {
        let candidate = Candidate::example1();
        let mut orch = orchestrator(StubFetch::default());
        orch.edit_candidate(Some(candidate.email.clone()));

        orch.save_candidate(candidate.clone()).await.unwrap();
        assert_eq!(orch.state().edit, EditState::Viewing);
        assert_eq!(
            orch.state().email_to_candidate.get(&candidate.email),
            Some(&candidate)
        );
        assert_eq!(orch.state().candidate_views.sorted.len(), 1);
    }

    #[tokio::test]
    async fn failed_save_returns_to_editing() {
        let candidate = Candidate::example1();
        let mut orch = orchestrator(StubFetch {
            fail: true,
            ..Default::default()
        });
        orch.edit_candidate(Some(candidate.email.clone()));

        assert!(orch.save_candidate(candidate.clone()).await.is_err());
        assert_eq!(
            orch.state().edit,
            EditState::Editing {
                email: Some(candidate.email)
            }
        );
        assert!(orch.state().email_to_candidate.is_empty());
    }

    #[tokio::test]
    async fn save_without_edit_in_progress_is_rejected() {
        let mut orch = orchestrator(StubFetch::default());
        let err = orch.save_candidate(Candidate::example1()).await.unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
        assert_eq!(orch.fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn late_save_result_still_merges_after_navigation() {
        let candidate = Candidate::example1();
        let mut orch = orchestrator(StubFetch::default());
        orch.edit_candidate(Some(candidate.email.clone()));
        orch.cancel_edit();

        orch.apply_saved_candidate(candidate.clone());
        assert_eq!(orch.state().edit, EditState::Viewing);
        assert!(orch.state().email_to_candidate.contains_key(&candidate.email));
    }

    #[tokio::test]
    async fn delete_candidate_removes_record_and_selection() {
        let candidate = Candidate::example1();
        let mut orch = orchestrator(StubFetch {
            candidate_list: vec![candidate.clone(), Candidate::example2()],
            ..Default::default()
        });
        orch.refresh_candidates(false).await.unwrap();
        orch.select_candidate(candidate.email.clone());

        orch.delete_candidate(&candidate.email).await.unwrap();
        assert!(orch.state().selected_candidate.is_none());
        assert_eq!(orch.state().email_to_candidate.len(), 1);
        assert_eq!(orch.state().candidate_views.sorted.len(), 1);
    }
}
