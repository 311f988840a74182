use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc::UnboundedSender;

use quiz_core::model::{
    Answer, AnswerFeedback, QuestionBank, QuizSettings, Selection, SessionId, ShuffledQuestion,
};
use quiz_core::scoring::QuizSummary;
use quiz_core::shuffle::{IdentityOrder, RandomSource, RngSource};
use storage::repository::{BestScore, BestScoreRepository};

use super::service::QuizSession;
use crate::Clock;
use crate::error::{QuizServiceError, SessionError};
use crate::timer::{QuestionTimer, TimerEvent};

/// Where shuffles draw their randomness from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Randomness {
    /// OS-seeded generator; falls back to original order if unavailable.
    #[default]
    Entropy,
    /// Same seed on every start, so every run plays identically.
    Seeded(u64),
    /// No shuffling at all.
    Identity,
}

/// Result of submitting an answer through the service.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub answer: Answer,
    pub feedback: AnswerFeedback,
    pub is_finished: bool,
    /// Present once the last question has been answered.
    pub summary: Option<QuizSummary>,
    /// True when this run was stored as the new best score.
    pub new_best: bool,
}

/// Orchestrates quiz sessions against a bank, the clock, and best-score storage.
///
/// The caller owns the [`QuizSession`]; the service stamps times, builds
/// feedback, and persists the best score when a session finishes.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    bank: Arc<QuestionBank>,
    best_scores: Arc<dyn BestScoreRepository>,
    settings: QuizSettings,
    randomness: Randomness,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        bank: Arc<QuestionBank>,
        best_scores: Arc<dyn BestScoreRepository>,
        settings: QuizSettings,
    ) -> Self {
        Self {
            clock,
            bank,
            best_scores,
            settings,
            randomness: Randomness::default(),
        }
    }

    #[must_use]
    pub fn with_randomness(mut self, randomness: Randomness) -> Self {
        self.randomness = randomness;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Stored best score, if any session has finished yet.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the repository cannot be read.
    pub async fn best_score(&self) -> Result<Option<BestScore>, QuizServiceError> {
        Ok(self.best_scores.get_best().await?)
    }

    /// Forget the stored best score.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the repository cannot be written.
    pub async fn clear_best_score(&self) -> Result<(), QuizServiceError> {
        self.best_scores.clear_best().await?;
        info!("best score cleared");
        Ok(())
    }

    /// Shuffle the bank into `session` and show the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` unless the session is `NotStarted`.
    pub fn start(&self, session: &mut QuizSession) -> Result<SessionId, QuizServiceError> {
        let now = self.clock.now();
        let id = match self.randomness {
            Randomness::Entropy => match RngSource::from_entropy() {
                Ok(mut source) => session.start(&self.bank, &mut source, now)?,
                Err(err) => {
                    warn!("{err}; questions will keep their original order");
                    session.start(&self.bank, &mut IdentityOrder, now)?
                }
            },
            Randomness::Seeded(seed) => {
                session.start(&self.bank, &mut RngSource::seeded(seed), now)?
            }
            Randomness::Identity => session.start(&self.bank, &mut IdentityOrder, now)?,
        };
        Ok(id)
    }

    /// Reset `session` and start it again with a fresh shuffle.
    ///
    /// # Errors
    ///
    /// See [`start`](Self::start).
    pub fn restart(&self, session: &mut QuizSession) -> Result<SessionId, QuizServiceError> {
        session.reset();
        self.start(session)
    }

    /// Show the next question.
    ///
    /// # Errors
    ///
    /// Forwards the `SessionError` from [`QuizSession::advance`].
    pub fn advance<'a>(
        &self,
        session: &'a mut QuizSession,
    ) -> Result<&'a ShuffledQuestion, QuizServiceError> {
        Ok(session.advance(self.clock.now())?)
    }

    pub fn reset(&self, session: &mut QuizSession) {
        session.reset();
    }

    /// Answer the current question and, on the last one, record the best score.
    ///
    /// A failing best-score write is logged and reported as `new_best = false`;
    /// the finished session stays intact so [`finalize_best`](Self::finalize_best)
    /// can retry.
    ///
    /// # Errors
    ///
    /// Forwards the `SessionError` from [`QuizSession::submit`].
    pub async fn submit(
        &self,
        session: &mut QuizSession,
        selection: Selection,
    ) -> Result<SubmitOutcome, QuizServiceError> {
        let now = self.clock.now();
        let answer = session.submit(selection, now)?.clone();
        let feedback = session
            .current_question()
            .map(|q| q.feedback(selection))
            .ok_or(SessionError::NotStarted)?;
        let is_finished = session.is_finished();

        let (summary, new_best) = if is_finished {
            let summary = QuizSummary::from_answers(session.answers(), &self.settings);
            let new_best = match self.record_summary(&summary).await {
                Ok(saved) => saved,
                Err(err) => {
                    warn!("could not store best score: {err}");
                    false
                }
            };
            (Some(summary), new_best)
        } else {
            (None, false)
        };

        Ok(SubmitOutcome {
            answer,
            feedback,
            is_finished,
            summary,
            new_best,
        })
    }

    /// Handle a timer expiry for `position` of session `session_id`.
    ///
    /// Returns `Ok(None)` when the event is stale: another session, another
    /// position, or a question that already has an answer.
    ///
    /// # Errors
    ///
    /// Forwards errors from [`submit`](Self::submit).
    pub async fn expire(
        &self,
        session: &mut QuizSession,
        session_id: SessionId,
        position: usize,
    ) -> Result<Option<SubmitOutcome>, QuizServiceError> {
        if session.session_id() != Some(session_id) || !session.awaits_answer(position) {
            debug!("ignoring stale expiry for session {session_id} position {position}");
            return Ok(None);
        }
        info!("time ran out on question {}", position + 1);
        self.submit(session, Selection::NoAnswer).await.map(Some)
    }

    /// Record a finished session's result as best score if it beats the stored one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` before the session ends and
    /// `QuizServiceError::Storage` if the repository fails.
    pub async fn finalize_best(&self, session: &QuizSession) -> Result<bool, QuizServiceError> {
        let summary = self.summary(session)?;
        self.record_summary(&summary).await
    }

    /// Results for a finished session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` unless the session is `Finished`.
    pub fn summary(&self, session: &QuizSession) -> Result<QuizSummary, QuizServiceError> {
        if !session.is_finished() {
            return Err(SessionError::NotFinished.into());
        }
        Ok(QuizSummary::from_answers(session.answers(), &self.settings))
    }

    /// Start the countdown for the question currently on screen.
    ///
    /// Returns a disabled timer when the timer is switched off or nothing awaits an answer.
    #[must_use]
    pub fn start_timer(
        &self,
        session: &QuizSession,
        events: UnboundedSender<TimerEvent>,
    ) -> QuestionTimer {
        let position = session.position();
        match session.session_id() {
            Some(id) if self.settings.timer_enabled() && session.awaits_answer(position) => {
                QuestionTimer::start(
                    id,
                    position,
                    self.settings.seconds_per_question(),
                    self.settings.urgent_threshold_secs(),
                    events,
                )
            }
            _ => QuestionTimer::disabled(),
        }
    }

    async fn record_summary(&self, summary: &QuizSummary) -> Result<bool, QuizServiceError> {
        let candidate = BestScore::new(summary.score, summary.total, self.clock.now());
        let saved = self.best_scores.record_if_better(&candidate).await?;
        if saved {
            info!(
                "new best score: {}% ({}/{})",
                candidate.percentage, candidate.score, candidate.total
            );
        }
        Ok(saved)
    }
}
