use std::collections::BTreeMap;

use crate::model::answer::Selection;
use crate::model::ids::QuestionId;
use crate::model::question::Topic;

/// A question as presented in one session, with its alternatives reordered.
///
/// `permutation_map[k]` is the original index of the alternative shown at
/// position `k`. Everything that has to be looked up in the original index
/// space (wrong-answer explanations) goes through that map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShuffledQuestion {
    pub(crate) id: QuestionId,
    pub(crate) topic: Topic,
    pub(crate) prompt: String,
    pub(crate) alternatives: Vec<String>,
    pub(crate) correct_index: usize,
    pub(crate) explanation: String,
    pub(crate) wrong_explanations: BTreeMap<usize, String>,
    pub(crate) position_in_session: usize,
    pub(crate) permutation_map: Vec<usize>,
}

/// What to show the user after a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub is_correct: bool,
    pub selection: Selection,
    /// Shuffled position of the correct alternative.
    pub correct_index: usize,
    pub correct_alternative: String,
    pub explanation: String,
    /// Present only when a wrong alternative was picked.
    pub wrong_explanation: Option<String>,
}

impl ShuffledQuestion {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Alternatives in presentation order.
    #[must_use]
    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    /// Position of the correct alternative in presentation order.
    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn correct_alternative(&self) -> &str {
        &self.alternatives[self.correct_index]
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Index of this question within the session's shuffled order.
    #[must_use]
    pub fn position_in_session(&self) -> usize {
        self.position_in_session
    }

    #[must_use]
    pub fn permutation_map(&self) -> &[usize] {
        &self.permutation_map
    }

    /// Original alternative index for a presented position.
    #[must_use]
    pub fn original_index(&self, shuffled_position: usize) -> Option<usize> {
        self.permutation_map.get(shuffled_position).copied()
    }

    /// `NoAnswer` is never correct; neither is a position past the end.
    #[must_use]
    pub fn is_correct(&self, selection: Selection) -> bool {
        selection.index() == Some(self.correct_index)
    }

    #[must_use]
    pub fn is_valid_selection(&self, selection: Selection) -> bool {
        match selection {
            Selection::Alternative(index) => index < self.alternatives.len(),
            Selection::NoAnswer => true,
        }
    }

    /// Explanation for picking the wrong alternative shown at `shuffled_position`.
    #[must_use]
    pub fn wrong_explanation(&self, shuffled_position: usize) -> Option<&str> {
        if shuffled_position == self.correct_index {
            return None;
        }
        let original = self.original_index(shuffled_position)?;
        self.wrong_explanations.get(&original).map(String::as_str)
    }

    #[must_use]
    pub fn feedback(&self, selection: Selection) -> AnswerFeedback {
        let wrong_explanation = selection
            .index()
            .and_then(|p| self.wrong_explanation(p))
            .map(str::to_owned);
        AnswerFeedback {
            is_correct: self.is_correct(selection),
            selection,
            correct_index: self.correct_index,
            correct_alternative: self.correct_alternative().to_owned(),
            explanation: self.explanation.clone(),
            wrong_explanation,
        }
    }
}
