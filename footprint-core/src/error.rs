use thiserror::Error;

/// All errors produced by footprint-core and its collaborators.
#[derive(Debug, Error)]
pub enum FootprintError {
    #[error("no listening session is active")]
    NotListening,

    #[error("speech recognizer error: {0}")]
    Recognizer(String),

    #[error("speech synthesis error: {0}")]
    Synthesis(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("goal tracking error: {0}")]
    Goal(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FootprintError>;
