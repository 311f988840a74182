mod answer;
mod ids;
mod question;
mod settings;
mod shuffled;

pub use answer::{Answer, Selection};
pub use ids::{ParseIdError, QuestionId, SessionId};
pub use question::{Question, QuestionBank, QuestionBankError, QuestionDraft, QuestionError, Topic};
pub use settings::{QuizSettings, SettingsError};
pub use shuffled::{AnswerFeedback, ShuffledQuestion};

#[cfg(test)]
pub(crate) use question::fixtures;
