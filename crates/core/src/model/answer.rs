use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::question::Topic;

/// What the user picked for a question, in shuffled-alternative space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selection {
    /// Position of the chosen alternative as it was presented.
    Alternative(usize),
    /// Reserved value for "nothing chosen before the time limit".
    NoAnswer,
}

impl Selection {
    #[must_use]
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Alternative(index) => Some(index),
            Self::NoAnswer => None,
        }
    }

    #[must_use]
    pub fn is_no_answer(self) -> bool {
        matches!(self, Self::NoAnswer)
    }
}

/// Recorded response to one question of a session.
///
/// Built once at submission time; `is_correct` is frozen then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: QuestionId,
    pub selection: Selection,
    pub is_correct: bool,
    pub topic: Topic,
    pub time_taken_secs: u32,
}

impl Answer {
    #[must_use]
    pub fn new(
        question_id: QuestionId,
        selection: Selection,
        is_correct: bool,
        topic: Topic,
        time_taken_secs: u32,
    ) -> Self {
        Self {
            question_id,
            selection,
            is_correct,
            topic,
            time_taken_secs,
        }
    }
}
