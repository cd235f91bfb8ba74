use thiserror::Error;

/// Failures reported to callers of a [`Session`](crate::Session).
///
/// Resolution itself never fails; these cover misuse of the mutation API
/// and loading scenes or settings.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Object with id '{0}' already exists")]
    DuplicateId(String),

    #[error("Object '{0}' not found")]
    ObjectNotFound(String),

    #[error("Invalid object spec: {0}")]
    InvalidSpec(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
