use thiserror::Error;

/// Failures of the import pipeline's collaborators.
///
/// Payloads that cannot be parsed are not errors; they resolve to a sentinel.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message store error: {0}")]
    Store(String),
    #[error("import job {0} is already running")]
    JobAlreadyRunning(String),
}

pub type Result<T> = std::result::Result<T, ImportError>;
