//! Question bank file loading.
//!
//! The bank is a JSON array of question records. Every record is validated
//! up front, so a bad file refuses to load instead of failing mid-session.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::info;
use quiz_core::model::{
    Question, QuestionBank, QuestionBankError, QuestionDraft, QuestionError, QuestionId,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankLoadError {
    #[error("cannot read question bank {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed question bank: {0}")]
    Json(#[from] serde_json::Error),

    #[error("question {id}: wrong-answer explanation key {key:?} is not an alternative index")]
    InvalidExplanationKey { id: u64, key: String },

    #[error("question {id}: wrong-answer explanation key {key:?} repeats alternative {index}")]
    DuplicateExplanationKey { id: u64, key: String, index: usize },

    #[error(transparent)]
    Question(#[from] QuestionError),

    #[error(transparent)]
    Bank(#[from] QuestionBankError),
}

/// On-disk shape of one question.
///
/// Explanation keys are strings because JSON object keys have to be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct QuestionRecord {
    pub id: u64,
    pub topic: String,
    pub prompt: String,
    pub alternatives: Vec<String>,
    pub correct_index: usize,
    pub explanation: String,
    #[serde(default)]
    pub wrong_explanations: BTreeMap<String, String>,
}

impl QuestionRecord {
    /// Convert the record into a validated domain `Question`.
    ///
    /// # Errors
    ///
    /// Returns `BankLoadError::InvalidExplanationKey` for non-numeric keys,
    /// `BankLoadError::DuplicateExplanationKey` when two keys name the same
    /// index (`"1"` and `"01"`), and `BankLoadError::Question` when the
    /// question itself is inconsistent.
    pub fn into_question(self) -> Result<Question, BankLoadError> {
        let mut wrong_explanations = BTreeMap::new();
        for (key, text) in self.wrong_explanations {
            let index = key
                .trim()
                .parse::<usize>()
                .map_err(|_| BankLoadError::InvalidExplanationKey {
                    id: self.id,
                    key: key.clone(),
                })?;
            if wrong_explanations.insert(index, text).is_some() {
                return Err(BankLoadError::DuplicateExplanationKey {
                    id: self.id,
                    key,
                    index,
                });
            }
        }

        Ok(Question::new(QuestionDraft {
            id: QuestionId::new(self.id),
            topic: self.topic,
            prompt: self.prompt,
            alternatives: self.alternatives,
            correct_index: self.correct_index,
            explanation: self.explanation,
            wrong_explanations,
        })?)
    }
}

/// Parse and validate a bank from JSON text.
///
/// # Errors
///
/// Returns the first `BankLoadError` encountered; no partial bank is produced.
pub fn parse_question_bank(json: &str) -> Result<QuestionBank, BankLoadError> {
    let records: Vec<QuestionRecord> = serde_json::from_str(json)?;
    let questions = records
        .into_iter()
        .map(QuestionRecord::into_question)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(QuestionBank::new(questions)?)
}

/// Read, parse, and validate a bank file.
///
/// # Errors
///
/// Returns `BankLoadError::Io` if the file cannot be read, otherwise see
/// [`parse_question_bank`].
pub fn load_question_bank(path: impl AsRef<Path>) -> Result<QuestionBank, BankLoadError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| BankLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bank = parse_question_bank(&json)?;
    info!(
        "loaded {} questions across {} topics from {}",
        bank.len(),
        bank.topics().len(),
        path.display()
    );
    Ok(bank)
}
