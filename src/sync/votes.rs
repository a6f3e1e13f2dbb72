use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::model::{serde_string_map, CandidateId, Email, SessionId, Vote};

/// Composite identity of a vote. One flat key replaces the nested
/// session -> candidate -> voter dictionaries of the previous client, which
/// made it possible to drop sibling buckets during a rebuild.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct VoteKey {
    pub session: SessionId,
    pub candidate: CandidateId,
    pub voter: Email,
}

impl VoteKey {
    pub fn of(vote: &Vote) -> Self {
        Self {
            session: vote.session_id.clone(),
            candidate: vote.candidate_id.clone(),
            voter: vote.user_email.clone(),
        }
    }
}

impl Display for VoteKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.session, self.candidate, self.voter)
    }
}

impl FromStr for VoteKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(session), Some(candidate), Some(voter)) => Ok(Self {
                session: session.into(),
                candidate: candidate.into(),
                voter: voter.into(),
            }),
            _ => Err(format!("Expected `<session>:<candidate>:<voter>`, got {s}")),
        }
    }
}

/// Canonical vote storage. The composite key guarantees at most one vote per
/// voter per candidate per session; votes for different candidates by the
/// same voter co-exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoteMap {
    #[serde(with = "serde_string_map")]
    votes: HashMap<VoteKey, Vote>,
}

impl VoteMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.votes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.votes.is_empty()
    }

    pub fn get(&self, key: &VoteKey) -> Option<&Vote> {
        self.votes.get(key)
    }

    /// All votes in one (session, candidate) bucket, in no guaranteed order.
    pub fn session_candidate_votes(
        &self,
        session: &SessionId,
        candidate: &CandidateId,
    ) -> Vec<&Vote> {
        self.votes
            .values()
            .filter(|vote| &vote.session_id == session && &vote.candidate_id == candidate)
            .collect()
    }

    /// All votes cast in one session, in no guaranteed order.
    pub fn session_votes(&self, session: &SessionId) -> Vec<&Vote> {
        self.votes
            .values()
            .filter(|vote| &vote.session_id == session)
            .collect()
    }
}

fn is_well_formed(vote: &Vote) -> bool {
    !vote.session_id.is_empty() && !vote.candidate_id.is_empty() && !vote.user_email.is_empty()
}

/// Merge fetched votes into the canonical map.
///
/// With `overwrite` the existing map is discarded and rebuilt from the batch
/// (full resync); otherwise each incoming vote replaces any prior vote for
/// the same (session, candidate, voter) and everything else is preserved. An
/// empty batch without `overwrite` returns the existing map unchanged.
///
/// Votes missing any key component are a caller contract violation: they
/// panic in development builds and are skipped with a warning in release, so
/// one bad record cannot corrupt the whole map.
pub fn merge_votes(existing: &VoteMap, incoming: Vec<Vote>, overwrite: bool) -> VoteMap {
    if incoming.is_empty() && !overwrite {
        return existing.clone();
    }

    let mut merged = if overwrite {
        VoteMap::new()
    } else {
        existing.clone()
    };
    for vote in incoming {
        if !is_well_formed(&vote) {
            debug_assert!(false, "Malformed vote record: {vote:?}");
            warn!("Skipping malformed vote record {}", vote.id);
            continue;
        }
        merged.votes.insert(VoteKey::of(&vote), vote);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::Id;

    fn vote(session: &str, candidate: &str, voter: &str, verdict: bool) -> Vote {
        Vote {
            id: Id::new(format!("{session}-{candidate}-{voter}")),
            session_id: session.into(),
            candidate_id: candidate.into(),
            user_email: voter.into(),
            verdict,
            reason: String::new(),
        }
    }

    #[test]
    fn later_vote_replaces_earlier_for_same_voter() {
        let first = merge_votes(&VoteMap::new(), vec![vote("s1", "c1", "u1", true)], false);
        let second = merge_votes(&first, vec![vote("s1", "c1", "u1", false)], false);
        let bucket = second.session_candidate_votes(&"s1".into(), &"c1".into());
        assert_eq!(bucket.len(), 1);
        assert!(!bucket[0].verdict);
    }

    #[test]
    fn no_two_votes_share_a_voter_within_a_bucket() {
        let batch = vec![
            vote("s1", "c1", "u1", true),
            vote("s1", "c1", "u2", false),
            vote("s1", "c1", "u1", false),
        ];
        let merged = merge_votes(&VoteMap::new(), batch, false);
        let bucket = merged.session_candidate_votes(&"s1".into(), &"c1".into());
        assert_eq!(bucket.len(), 2);
        let mut voters: Vec<_> = bucket.iter().map(|v| v.user_email.clone()).collect();
        voters.sort();
        voters.dedup();
        assert_eq!(voters.len(), 2);
    }

    #[test]
    fn session_votes_span_candidates_but_not_sessions() {
        let batch = vec![
            vote("s1", "c1", "u1", true),
            vote("s1", "c2", "u2", false),
            vote("s2", "c1", "u1", true),
        ];
        let merged = merge_votes(&VoteMap::new(), batch, false);
        assert_eq!(merged.session_votes(&"s1".into()).len(), 2);
        assert_eq!(merged.session_votes(&"s2".into()).len(), 1);
        assert!(merged.session_votes(&"s3".into()).is_empty());
    }

    #[test]
    fn same_voter_may_vote_on_several_candidates() {
        let batch = vec![vote("s1", "c1", "u1", true), vote("s1", "c2", "u1", true)];
        let merged = merge_votes(&VoteMap::new(), batch, false);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn disjoint_batch_preserves_existing_buckets() {
        // A new batch for a different candidate in the same session must not
        // drop the buckets it never mentions.
        let existing = merge_votes(
            &VoteMap::new(),
            vec![vote("s1", "c1", "u1", true), vote("s1", "c1", "u2", false)],
            false,
        );
        let merged = merge_votes(&existing, vec![vote("s1", "c2", "u3", true)], false);
        assert_eq!(
            merged
                .session_candidate_votes(&"s1".into(), &"c1".into())
                .len(),
            2
        );
        assert_eq!(
            merged
                .session_candidate_votes(&"s1".into(), &"c2".into())
                .len(),
            1
        );
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let existing = merge_votes(&VoteMap::new(), vec![vote("s1", "c1", "u1", true)], false);
        let merged = merge_votes(&existing, vec![], false);
        assert_eq!(merged, existing);
    }

    #[test]
    fn overwrite_discards_existing_entirely() {
        let existing = merge_votes(&VoteMap::new(), vec![vote("s1", "c1", "u1", true)], false);
        let merged = merge_votes(&existing, vec![vote("s2", "c2", "u2", false)], true);
        assert_eq!(merged.len(), 1);
        assert!(merged
            .session_candidate_votes(&"s1".into(), &"c1".into())
            .is_empty());
    }

    #[test]
    fn overwrite_with_empty_batch_clears_the_map() {
        let existing = merge_votes(&VoteMap::new(), vec![vote("s1", "c1", "u1", true)], false);
        let merged = merge_votes(&existing, vec![], true);
        assert!(merged.is_empty());
    }

    #[test]
    fn merge_is_idempotent() {
        let batch = vec![vote("s1", "c1", "u1", true), vote("s1", "c2", "u2", false)];
        let once = merge_votes(&VoteMap::new(), batch.clone(), false);
        let twice = merge_votes(&once, batch, false);
        assert_eq!(once, twice);
    }

    #[test]
    #[should_panic(expected = "Malformed vote record")]
    fn malformed_vote_panics_in_development() {
        let mut bad = vote("s1", "c1", "u1", true);
        bad.user_email = "".into();
        let _ = merge_votes(&VoteMap::new(), vec![bad], false);
    }
}
