use std::collections::{BTreeMap, HashSet};

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("topic cannot be empty")]
    EmptyTopic,

    #[error("question {id}: prompt cannot be empty")]
    EmptyPrompt { id: QuestionId },

    #[error("question {id}: alternative {index} is empty")]
    EmptyAlternative { id: QuestionId, index: usize },

    #[error("question {id}: needs at least 2 alternatives, got {len}")]
    TooFewAlternatives { id: QuestionId, len: usize },

    #[error("question {id}: correct index {index} is out of bounds for {len} alternatives")]
    CorrectIndexOutOfBounds {
        id: QuestionId,
        index: usize,
        len: usize,
    },

    #[error("question {id}: missing wrong-answer explanation for alternative {index}")]
    MissingWrongExplanation { id: QuestionId, index: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error("question bank is empty")]
    Empty,

    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),
}

//
// ─── TOPIC ─────────────────────────────────────────────────────────────────────
//

/// Validated topic label (trimmed, non-empty).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic(String);

impl Topic {
    /// Create a validated topic.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::EmptyTopic` if the label is empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, QuestionError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QuestionError::EmptyTopic);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Topic {
    type Error = QuestionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Topic> for String {
    fn from(value: Topic) -> Self {
        value.0
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Unvalidated question fields, as read from a bank file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub id: QuestionId,
    pub topic: String,
    pub prompt: String,
    pub alternatives: Vec<String>,
    pub correct_index: usize,
    pub explanation: String,
    pub wrong_explanations: BTreeMap<usize, String>,
}

/// A validated multiple-choice question.
///
/// Immutable once built: every non-correct alternative has a wrong-answer
/// explanation and `correct_index` always points inside `alternatives`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    topic: Topic,
    prompt: String,
    alternatives: Vec<String>,
    correct_index: usize,
    explanation: String,
    wrong_explanations: BTreeMap<usize, String>,
}

impl Question {
    /// Validate a draft into a question.
    ///
    /// # Errors
    ///
    /// Returns the first `QuestionError` found; the checks run in field order.
    pub fn new(draft: QuestionDraft) -> Result<Self, QuestionError> {
        let id = draft.id;
        let topic = Topic::new(draft.topic)?;

        if draft.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt { id });
        }

        let len = draft.alternatives.len();
        if len < 2 {
            return Err(QuestionError::TooFewAlternatives { id, len });
        }
        if let Some(index) = draft.alternatives.iter().position(|a| a.trim().is_empty()) {
            return Err(QuestionError::EmptyAlternative { id, index });
        }
        if draft.correct_index >= len {
            return Err(QuestionError::CorrectIndexOutOfBounds {
                id,
                index: draft.correct_index,
                len,
            });
        }

        for index in (0..len).filter(|i| *i != draft.correct_index) {
            if !draft.wrong_explanations.contains_key(&index) {
                return Err(QuestionError::MissingWrongExplanation { id, index });
            }
        }

        let correct_index = draft.correct_index;
        let mut wrong_explanations = draft.wrong_explanations;
        wrong_explanations.retain(|&index, _| {
            let used = index != correct_index && index < len;
            if !used {
                warn!("question {id}: ignoring wrong-answer explanation for alternative {index}");
            }
            used
        });

        Ok(Self {
            id,
            topic,
            prompt: draft.prompt,
            alternatives: draft.alternatives,
            correct_index,
            explanation: draft.explanation,
            wrong_explanations,
        })
    }

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

    #[must_use]
    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    /// Text of the correct alternative in the original order.
    #[must_use]
    pub fn correct_alternative(&self) -> &str {
        &self.alternatives[self.correct_index]
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    /// Wrong-answer explanations keyed by original alternative index.
    #[must_use]
    pub fn wrong_explanations(&self) -> &BTreeMap<usize, String> {
        &self.wrong_explanations
    }
}

//
// ─── QUESTION BANK ─────────────────────────────────────────────────────────────
//

/// The static, ordered set of questions a session is drawn from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// # Errors
    ///
    /// Returns `QuestionBankError::Empty` for an empty list and
    /// `QuestionBankError::DuplicateId` if two questions share an id.
    pub fn new(questions: Vec<Question>) -> Result<Self, QuestionBankError> {
        if questions.is_empty() {
            return Err(QuestionBankError::Empty);
        }
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(QuestionBankError::DuplicateId(question.id()));
            }
        }
        Ok(Self { questions })
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    /// Distinct topics in first-occurrence order.
    #[must_use]
    pub fn topics(&self) -> Vec<&Topic> {
        let mut topics: Vec<&Topic> = Vec::new();
        for question in &self.questions {
            if !topics.contains(&question.topic()) {
                topics.push(question.topic());
            }
        }
        topics
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{draft, question};
    use super::*;

    #[test]
    fn valid_draft_builds_question() {
        let q = question(1, "  Nutrition ", 2);
        assert_eq!(q.topic().as_str(), "Nutrition");
        assert_eq!(q.correct_alternative(), "Q1 option 2");
        assert_eq!(q.wrong_explanations().len(), 3);
    }

    #[test]
    fn rejects_out_of_bounds_correct_index() {
        let mut d = draft(7, "Sleep", 0);
        d.correct_index = 4;
        let err = Question::new(d).unwrap_err();
        assert_eq!(
            err,
            QuestionError::CorrectIndexOutOfBounds {
                id: QuestionId::new(7),
                index: 4,
                len: 4
            }
        );
    }

    #[test]
    fn rejects_missing_wrong_explanation() {
        let mut d = draft(3, "Sleep", 1);
        d.wrong_explanations.remove(&2);
        let err = Question::new(d).unwrap_err();
        assert_eq!(
            err,
            QuestionError::MissingWrongExplanation {
                id: QuestionId::new(3),
                index: 2
            }
        );
    }

    #[test]
    fn extra_explanations_for_correct_or_unknown_index_are_dropped() {
        let mut d = draft(3, "Sleep", 1);
        d.wrong_explanations.insert(1, "not actually wrong".into());
        d.wrong_explanations.insert(9, "ghost".into());
        let q = Question::new(d).unwrap();
        assert_eq!(q.wrong_explanations().keys().copied().collect::<Vec<_>>(), vec![0, 2, 3]);
    }

    #[test]
    fn rejects_single_alternative_and_blank_fields() {
        let mut d = draft(5, "Sleep", 0);
        d.alternatives.truncate(1);
        d.wrong_explanations.clear();
        assert!(matches!(
            Question::new(d).unwrap_err(),
            QuestionError::TooFewAlternatives { len: 1, .. }
        ));

        let mut d = draft(5, "Sleep", 0);
        d.prompt = "   ".into();
        assert!(matches!(
            Question::new(d).unwrap_err(),
            QuestionError::EmptyPrompt { .. }
        ));

        let mut d = draft(5, " ", 0);
        d.topic = " ".into();
        assert_eq!(Question::new(d).unwrap_err(), QuestionError::EmptyTopic);
    }

    #[test]
    fn bank_rejects_empty_and_duplicates() {
        assert_eq!(QuestionBank::new(Vec::new()).unwrap_err(), QuestionBankError::Empty);

        let err = QuestionBank::new(vec![question(1, "A", 0), question(1, "B", 1)]).unwrap_err();
        assert_eq!(err, QuestionBankError::DuplicateId(QuestionId::new(1)));
    }

    #[test]
    fn bank_lists_topics_in_first_seen_order() {
        let bank = QuestionBank::new(vec![
            question(1, "B", 0),
            question(2, "A", 0),
            question(3, "B", 0),
        ])
        .unwrap();
        let topics: Vec<&str> = bank.topics().into_iter().map(Topic::as_str).collect();
        assert_eq!(topics, vec!["B", "A"]);
        assert!(bank.get(QuestionId::new(2)).is_some());
        assert!(bank.get(QuestionId::new(9)).is_none());
    }
}
