use chrono::{DateTime, Utc};
use log::{debug, info};
use std::fmt;

use quiz_core::model::{Answer, QuestionBank, Selection, SessionId, ShuffledQuestion};
use quiz_core::scoring::calculate_percentage;
use quiz_core::shuffle::{RandomSource, shuffle_questions};
use quiz_core::time::elapsed_secs;

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NotStarted,
    InProgress,
    Finished,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory quiz run over a shuffled copy of the question bank.
///
/// `NotStarted → InProgress` on [`start`](Self::start), `InProgress → Finished`
/// when the last question is answered, and back to `NotStarted` on
/// [`reset`](Self::reset). At most one answer is ever recorded per position.
pub struct QuizSession {
    id: Option<SessionId>,
    questions: Vec<ShuffledQuestion>,
    current: usize,
    answers: Vec<Answer>,
    started_at: Option<DateTime<Utc>>,
    question_shown_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    /// A session in `NotStarted`: no questions, no answers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: None,
            questions: Vec::new(),
            current: 0,
            answers: Vec::new(),
            started_at: None,
            question_shown_at: None,
            completed_at: None,
        }
    }

    /// Shuffle the bank and begin at the first question.
    ///
    /// `now` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` unless the session is `NotStarted`.
    pub fn start(
        &mut self,
        bank: &QuestionBank,
        source: &mut dyn RandomSource,
        now: DateTime<Utc>,
    ) -> Result<SessionId, SessionError> {
        if self.phase() != SessionPhase::NotStarted {
            return Err(SessionError::AlreadyStarted);
        }

        let id = SessionId::random();
        *self = Self {
            id: Some(id),
            questions: shuffle_questions(bank, source),
            current: 0,
            answers: Vec::new(),
            started_at: Some(now),
            question_shown_at: Some(now),
            completed_at: None,
        };
        info!("session {id} started with {} questions", self.questions.len());
        Ok(id)
    }

    /// Record the answer for the current question.
    ///
    /// Answering the last question finishes the session in the same call.
    ///
    /// # Errors
    ///
    /// Returns `NotStarted`/`Finished` outside `InProgress`, `AlreadyAnswered`
    /// when the current position already has an answer, and `InvalidSelection`
    /// for an alternative index the question does not have.
    pub fn submit(
        &mut self,
        selection: Selection,
        now: DateTime<Utc>,
    ) -> Result<&Answer, SessionError> {
        match self.phase() {
            SessionPhase::NotStarted => return Err(SessionError::NotStarted),
            SessionPhase::Finished => return Err(SessionError::Finished),
            SessionPhase::InProgress => {}
        }
        if self.current_answer().is_some() {
            return Err(SessionError::AlreadyAnswered {
                position: self.current,
            });
        }
        let question = self
            .questions
            .get(self.current)
            .ok_or(SessionError::Finished)?;
        if !question.is_valid_selection(selection) {
            return Err(SessionError::InvalidSelection {
                index: selection.index().unwrap_or_default(),
                len: question.alternatives().len(),
            });
        }

        let time_taken_secs = self
            .question_shown_at
            .map_or(0, |shown| elapsed_secs(shown, now));
        let answer = Answer::new(
            question.id(),
            selection,
            question.is_correct(selection),
            question.topic().clone(),
            time_taken_secs,
        );
        debug!(
            "position {} answered {:?} (correct: {})",
            self.current, selection, answer.is_correct
        );
        self.answers.push(answer);

        if self.current + 1 >= self.questions.len() {
            self.completed_at = Some(now);
            if let Some(id) = self.id {
                info!(
                    "session {id} finished: {}/{} correct",
                    self.correct_count(),
                    self.answers.len()
                );
            }
        }

        self.answers.last().ok_or(SessionError::NotStarted)
    }

    /// Move to the next question once the current one is answered.
    ///
    /// # Errors
    ///
    /// Returns `NotStarted`/`Finished` outside `InProgress`, `NotAnswered` when
    /// the current position has no answer yet, and `AtLastQuestion` at the end.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<&ShuffledQuestion, SessionError> {
        match self.phase() {
            SessionPhase::NotStarted => return Err(SessionError::NotStarted),
            SessionPhase::Finished => return Err(SessionError::Finished),
            SessionPhase::InProgress => {}
        }
        if self.current_answer().is_none() {
            return Err(SessionError::NotAnswered {
                position: self.current,
            });
        }
        if self.current + 1 >= self.questions.len() {
            return Err(SessionError::AtLastQuestion);
        }

        self.current += 1;
        self.question_shown_at = Some(now);
        self.questions
            .get(self.current)
            .ok_or(SessionError::AtLastQuestion)
    }

    /// Drop everything and return to `NotStarted`. Valid from any phase.
    pub fn reset(&mut self) {
        if let Some(id) = self.id {
            debug!("session {id} reset");
        }
        *self = Self::new();
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        if self.id.is_none() {
            SessionPhase::NotStarted
        } else if self.completed_at.is_some() {
            SessionPhase::Finished
        } else {
            SessionPhase::InProgress
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase() == SessionPhase::Finished
    }

    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.id
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// The shuffled sequence, fixed for the lifetime of the session.
    #[must_use]
    pub fn questions(&self) -> &[ShuffledQuestion] {
        &self.questions
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    /// 0-based position of the question on screen.
    #[must_use]
    pub fn position(&self) -> usize {
        self.current
    }

    /// `None` before `start` or if the position is somehow past the end.
    #[must_use]
    pub fn current_question(&self) -> Option<&ShuffledQuestion> {
        if self.phase() == SessionPhase::NotStarted {
            return None;
        }
        self.questions.get(self.current)
    }

    /// The answer recorded for the current position, if any.
    #[must_use]
    pub fn current_answer(&self) -> Option<&Answer> {
        if self.phase() == SessionPhase::NotStarted {
            return None;
        }
        self.answers.get(self.current)
    }

    /// True when the current position is waiting for an answer.
    #[must_use]
    pub fn awaits_answer(&self, position: usize) -> bool {
        self.phase() == SessionPhase::InProgress
            && position == self.current
            && self.current_answer().is_none()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        let total = self.questions.len();
        let current = if self.phase() == SessionPhase::NotStarted {
            0
        } else {
            self.current + 1
        };
        SessionProgress {
            current,
            total,
            answered: self.answers.len(),
            remaining: total.saturating_sub(self.answers.len()),
            percentage: calculate_percentage(
                u32::try_from(current).unwrap_or(u32::MAX),
                u32::try_from(total).unwrap_or(u32::MAX),
            ),
            is_complete: self.is_finished(),
        }
    }

    fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_correct).count()
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::{Question, QuestionDraft, QuestionId};
    use quiz_core::shuffle::{IdentityOrder, RngSource};
    use quiz_core::time::fixed_now;

    fn build_question(id: u64, topic: &str) -> Question {
        Question::new(QuestionDraft {
            id: QuestionId::new(id),
            topic: topic.to_string(),
            prompt: format!("Question {id}?"),
            alternatives: vec!["right".into(), "wrong".into(), "also wrong".into()],
            correct_index: 0,
            explanation: "because".into(),
            wrong_explanations: [(1, "nope".to_string()), (2, "still no".to_string())]
                .into_iter()
                .collect(),
        })
        .unwrap()
    }

    fn build_bank(len: u64) -> QuestionBank {
        QuestionBank::new((1..=len).map(|id| build_question(id, "Health")).collect()).unwrap()
    }

    fn started(len: u64) -> QuizSession {
        let mut session = QuizSession::new();
        session
            .start(&build_bank(len), &mut RngSource::seeded(11), fixed_now())
            .unwrap();
        session
    }

    fn right(session: &QuizSession) -> Selection {
        Selection::Alternative(session.current_question().unwrap().correct_index())
    }

    #[test]
    fn new_session_is_empty_and_not_started() {
        let session = QuizSession::new();
        assert_eq!(session.phase(), SessionPhase::NotStarted);
        assert!(session.current_question().is_none());
        assert!(session.current_answer().is_none());
        assert!(session.answers().is_empty());
        assert_eq!(session.progress().current, 0);
    }

    #[test]
    fn start_shuffles_once_and_stamps_time() {
        let session = started(4);
        assert_eq!(session.phase(), SessionPhase::InProgress);
        assert_eq!(session.questions().len(), 4);
        assert_eq!(session.position(), 0);
        assert_eq!(session.started_at(), Some(fixed_now()));
        assert!(session.session_id().is_some());
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut session = started(3);
        let before: Vec<_> = session.questions().iter().map(ShuffledQuestion::id).collect();
        let err = session
            .start(&build_bank(3), &mut IdentityOrder, fixed_now())
            .unwrap_err();
        assert_eq!(err, SessionError::AlreadyStarted);
        let after: Vec<_> = session.questions().iter().map(ShuffledQuestion::id).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn submit_before_start_is_rejected() {
        let mut session = QuizSession::new();
        let err = session.submit(Selection::Alternative(0), fixed_now()).unwrap_err();
        assert_eq!(err, SessionError::NotStarted);
        assert!(session.answers().is_empty());
    }

    #[test]
    fn double_submit_is_a_no_op() {
        let mut session = started(3);
        let first = session.submit(right(&session), fixed_now()).unwrap().clone();

        let err = session
            .submit(Selection::Alternative(1), fixed_now())
            .unwrap_err();
        assert_eq!(err, SessionError::AlreadyAnswered { position: 0 });
        assert_eq!(session.answers(), &[first][..]);
    }

    #[test]
    fn out_of_range_selection_is_rejected_without_recording() {
        let mut session = started(2);
        let err = session
            .submit(Selection::Alternative(3), fixed_now())
            .unwrap_err();
        assert_eq!(err, SessionError::InvalidSelection { index: 3, len: 3 });
        assert!(session.answers().is_empty());
    }

    #[test]
    fn advance_requires_an_answer_and_stops_at_the_end() {
        let mut session = started(2);
        assert_eq!(
            session.advance(fixed_now()).unwrap_err(),
            SessionError::NotAnswered { position: 0 }
        );

        session.submit(right(&session), fixed_now()).unwrap();
        session.advance(fixed_now()).unwrap();
        assert_eq!(session.position(), 1);

        session.submit(right(&session), fixed_now()).unwrap();
        assert!(session.is_finished());
        assert_eq!(session.advance(fixed_now()).unwrap_err(), SessionError::Finished);
        assert_eq!(
            session.submit(Selection::NoAnswer, fixed_now()).unwrap_err(),
            SessionError::Finished
        );
        assert_eq!(session.answers().len(), 2);
    }

    #[test]
    fn last_submission_finishes_in_the_same_call() {
        let mut session = started(1);
        let done_at = fixed_now() + Duration::seconds(3);
        session.submit(right(&session), done_at).unwrap();
        assert_eq!(session.phase(), SessionPhase::Finished);
        assert_eq!(session.completed_at(), Some(done_at));
        assert!(session.current_question().is_some());
        assert!(session.progress().is_complete);
    }

    #[test]
    fn time_taken_counts_from_when_the_question_was_shown() {
        let mut session = started(2);
        let t0 = fixed_now();

        let answer = session
            .submit(right(&session), t0 + Duration::milliseconds(4_600))
            .unwrap();
        assert_eq!(answer.time_taken_secs, 5);

        session.advance(t0 + Duration::seconds(10)).unwrap();
        let answer = session
            .submit(Selection::NoAnswer, t0 + Duration::seconds(40))
            .unwrap();
        assert_eq!(answer.time_taken_secs, 30);
        assert!(!answer.is_correct);
    }

    #[test]
    fn no_answer_is_always_incorrect() {
        let mut session = started(2);
        let answer = session.submit(Selection::NoAnswer, fixed_now()).unwrap();
        assert!(!answer.is_correct);
        assert_eq!(answer.selection, Selection::NoAnswer);
        session.advance(fixed_now()).unwrap();
        assert_eq!(session.position(), 1);
    }

    #[test]
    fn reset_discards_everything() {
        let mut session = started(2);
        session.submit(right(&session), fixed_now()).unwrap();
        session.reset();
        assert_eq!(session.phase(), SessionPhase::NotStarted);
        assert!(session.questions().is_empty());
        assert!(session.answers().is_empty());
        assert!(session.session_id().is_none());

        session
            .start(&build_bank(2), &mut IdentityOrder, fixed_now())
            .unwrap();
        assert_eq!(session.phase(), SessionPhase::InProgress);
    }

    #[test]
    fn restarted_session_gets_a_new_id() {
        let mut session = started(2);
        let first = session.session_id().unwrap();
        session.reset();
        session
            .start(&build_bank(2), &mut IdentityOrder, fixed_now())
            .unwrap();
        assert_ne!(session.session_id().unwrap(), first);
    }

    #[test]
    fn awaits_answer_tracks_position_and_state() {
        let mut session = started(2);
        assert!(session.awaits_answer(0));
        assert!(!session.awaits_answer(1));
        session.submit(right(&session), fixed_now()).unwrap();
        assert!(!session.awaits_answer(0));
    }

    #[test]
    fn progress_reports_position() {
        let mut session = started(4);
        let progress = session.progress();
        assert_eq!(progress.current, 1);
        assert_eq!(progress.total, 4);
        assert_eq!(progress.percentage, 25);

        session.submit(right(&session), fixed_now()).unwrap();
        session.advance(fixed_now()).unwrap();
        let progress = session.progress();
        assert_eq!(progress.current, 2);
        assert_eq!(progress.answered, 1);
        assert_eq!(progress.remaining, 3);
        assert_eq!(progress.percentage, 50);
    }
}
