#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;
pub mod timer;

pub use quiz_core::Clock;

pub use error::{QuizServiceError, SessionError};
pub use sessions::{QuizService, QuizSession, Randomness, SessionPhase, SessionProgress, SubmitOutcome};
pub use timer::{QuestionTimer, TimerEvent};
