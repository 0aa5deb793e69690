//! Error taxonomy for Gameday.
//!
//! Only transport and file-I/O failures are errors. Heuristic check failures
//! are reported through [`ScoreReport`](super::ScoreReport) and
//! [`DependencyReport`](super::DependencyReport) instead.

/// Gameday errors.
#[derive(Debug, thiserror::Error)]
pub enum GamedayError {
    #[error("generation service unreachable: {0}")]
    Transport(String),

    #[error("generation service error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("generation service returned no text")]
    EmptyResponse,

    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for GamedayError {
    fn from(err: reqwest::Error) -> Self {
        GamedayError::Transport(err.to_string())
    }
}

/// Result type for Gameday operations.
pub type Result<T> = std::result::Result<T, GamedayError>;
