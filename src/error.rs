use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The remote service reported a failure for a fetch or save.
    /// Carries the server's message and status code for display.
    #[error("Fetch failed ({code}): {message}")]
    Fetch { message: String, code: u16 },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Storage(#[from] serde_json::Error),
    #[error("Precondition violated: {0}")]
    Precondition(String),
}

impl Error {
    pub fn fetch(message: impl Into<String>, code: u16) -> Self {
        Self::Fetch {
            message: message.into(),
            code,
        }
    }
}
