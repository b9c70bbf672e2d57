use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RestoreError {
    #[error("Malformed option string for '{option}': unparsed remainder '{remainder}'")]
    MalformedOptionString { option: String, remainder: String },

    #[error("Invalid value '{value}' for option '{option}'")]
    InvalidOptionValue { option: String, value: String },

    #[error("Option '{0}' not addressed post restore")]
    MissingHandler(String),

    #[error("Restore option handler table out of sync (missing: {missing:?}, duplicated: {duplicated:?})")]
    HandlerDrift {
        missing: Vec<String>,
        duplicated: Vec<String>,
    },

    #[error("Scratch allocation of {requested} bytes failed")]
    Allocation { requested: usize },

    #[error("Option '{0}' is not supported after restore")]
    Unsupported(String),

    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Lock error: {0}")]
    LockError(String),

    #[error("Restore phase panicked: {0}")]
    Panicked(String),
}

impl RestoreError {
    /// Catalog/handler drift is a programming defect; it halts the engine.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RestoreError::MissingHandler(_) | RestoreError::HandlerDrift { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, RestoreError>;

impl<T> From<std::sync::PoisonError<T>> for RestoreError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
