//! Shared error types for the services crate.

use thiserror::Error;

use storage::repository::StorageError;

/// Transitions the session state machine refused.
///
/// A rejected call never changes the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session has not been started")]
    NotStarted,
    #[error("session already started; reset it first")]
    AlreadyStarted,
    #[error("session already finished")]
    Finished,
    #[error("session is still in progress")]
    NotFinished,
    #[error("question {position} already has an answer")]
    AlreadyAnswered { position: usize },
    #[error("question {position} has not been answered yet")]
    NotAnswered { position: usize },
    #[error("already at the last question")]
    AtLastQuestion,
    #[error("alternative {index} does not exist (question has {len})")]
    InvalidSelection { index: usize, len: usize },
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
