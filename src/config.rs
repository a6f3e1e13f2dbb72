use chrono::Duration;
use serde::Deserialize;

/// Application configuration, supplied by the embedding shell as JSON or
/// constructed directly. This struct is handed to the orchestrator and the
/// HTTP fetcher and can be inspected by any caller.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // non-secrets
    api_url: String,
    #[serde(default = "default_load_ttl")]
    load_ttl: u32,
    // secrets
    api_token: String,
}

fn default_load_ttl() -> u32 {
    // 20 minutes; one crate-wide TTL covers every resource.
    1200
}

impl Config {
    pub fn new(api_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            load_ttl: default_load_ttl(),
            api_token: api_token.into(),
        }
    }

    /// Base URL of the chapter service.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// How long a successful fetch stays fresh, in seconds.
    /// Configured via `load_ttl`.
    pub fn load_ttl(&self) -> Duration {
        Duration::seconds(self.load_ttl.into())
    }

    /// Bearer token sent with every request.
    pub fn api_token(&self) -> &str {
        &self.api_token
    }
}
