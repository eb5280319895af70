//! Error taxonomy for the topic store and the quiz session.
//!
//! Unknown topic ids are not errors for mutations; the store logs and no-ops.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Rejected input, e.g. a blank topic name.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The persisted blob exists but cannot be decoded. Recover with a reset.
    #[error("persisted topics are corrupt ({0}); reset to seed data to recover")]
    Corrupt(#[source] serde_json::Error),

    #[error("failed to encode topics: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no questions available for this topic")]
    EmptyQuestionSet,

    #[error("operation requires the {expected} phase, session is in {actual}")]
    WrongPhase {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("no current question")]
    NoCurrentQuestion,

    #[error("question '{0}' was already answered")]
    AlreadyAnswered(String),

    #[error("question '{0}' has not been answered yet")]
    NotAnswered(String),

    #[error("card '{0}' must be revealed before it is self-graded")]
    NotRevealed(String),

    #[error("self-grade must be \"correct\" or \"incorrect\", got {0:?}")]
    InvalidSelfGrade(String),

    #[error("topic has no concept '{0}'")]
    UnknownConcept(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    /// True when the caller should show the message to the user and carry on.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, SessionError::Store(_))
    }
}
