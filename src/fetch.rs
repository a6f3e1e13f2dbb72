use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::model::{
    AttendanceBatch, Candidate, Email, Event, EventId, Excuse, Member, Session, SessionId, Vote,
};

/// The remote fetch boundary, one method per resource kind.
///
/// Implementations complete each call exactly once; the orchestrator merges
/// the result synchronously on completion. Any error result means "do not
/// touch canonical state or the load history".
pub trait Fetch {
    async fn events(&self) -> Result<Vec<Event>>;
    async fn directory(&self) -> Result<Vec<Member>>;
    async fn excuses(&self) -> Result<Vec<Excuse>>;
    async fn user_attendance(&self, member: &Email) -> Result<AttendanceBatch>;
    async fn event_attendance(&self, event: &EventId) -> Result<AttendanceBatch>;
    async fn candidates(&self) -> Result<Vec<Candidate>>;
    async fn sessions(&self) -> Result<Vec<Session>>;
    async fn session_votes(&self, session: &SessionId) -> Result<Vec<Vote>>;
    async fn save_candidate(&self, candidate: &Candidate) -> Result<Candidate>;
    async fn delete_candidate(&self, email: &Email) -> Result<()>;
}

/// HTTP implementation of [`Fetch`] against the chapter service's REST API.
pub struct HttpFetch {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpFetch {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.api_url().trim_end_matches('/').to_string(),
            token: config.api_token().to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::fetch(message, status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

// Response envelopes as the service sends them.

#[derive(Deserialize)]
struct EventsResponse {
    events: Vec<Event>,
}

#[derive(Deserialize)]
struct DirectoryResponse {
    users: Vec<Member>,
}

#[derive(Deserialize)]
struct ExcusesResponse {
    excuses: Vec<Excuse>,
}

#[derive(Deserialize)]
struct CandidatesResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct SessionsResponse {
    sessions: Vec<Session>,
}

#[derive(Deserialize)]
struct VotesResponse {
    votes: Vec<Vote>,
}

#[derive(Deserialize)]
struct CandidateResponse {
    candidate: Candidate,
}

#[derive(Serialize)]
struct CandidateBody<'a> {
    candidate: &'a Candidate,
}

impl Fetch for HttpFetch {
    async fn events(&self) -> Result<Vec<Event>> {
        Ok(self.get_json::<EventsResponse>("events").await?.events)
    }

    async fn directory(&self) -> Result<Vec<Member>> {
        Ok(self.get_json::<DirectoryResponse>("users").await?.users)
    }

    async fn excuses(&self) -> Result<Vec<Excuse>> {
        Ok(self.get_json::<ExcusesResponse>("excuses").await?.excuses)
    }

    async fn user_attendance(&self, member: &Email) -> Result<AttendanceBatch> {
        self.get_json(&format!("attendance/user/{member}")).await
    }

    async fn event_attendance(&self, event: &EventId) -> Result<AttendanceBatch> {
        self.get_json(&format!("attendance/event/{event}")).await
    }

    async fn candidates(&self) -> Result<Vec<Candidate>> {
        Ok(self
            .get_json::<CandidatesResponse>("candidates")
            .await?
            .candidates)
    }

    async fn sessions(&self) -> Result<Vec<Session>> {
        Ok(self.get_json::<SessionsResponse>("sessions").await?.sessions)
    }

    async fn session_votes(&self, session: &SessionId) -> Result<Vec<Vote>> {
        Ok(self
            .get_json::<VotesResponse>(&format!("votes?sessionId={session}"))
            .await?
            .votes)
    }

    async fn save_candidate(&self, candidate: &Candidate) -> Result<Candidate> {
        let response = self
            .client
            .post(self.url("candidates"))
            .bearer_auth(&self.token)
            .json(&CandidateBody { candidate })
            .send()
            .await?;
        Ok(Self::parse::<CandidateResponse>(response).await?.candidate)
    }

    async fn delete_candidate(&self, email: &Email) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("candidates/{email}")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::fetch(message, status.as_u16()));
        }
        Ok(())
    }
}
