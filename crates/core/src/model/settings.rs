use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("seconds per question must be between 5 and 600")]
    InvalidSecondsPerQuestion,

    #[error("urgent threshold must be below seconds per question")]
    InvalidUrgentThreshold,

    #[error("difficult topic limit must be > 0")]
    InvalidDifficultTopicLimit,

    #[error("certificate threshold must be <= 100")]
    InvalidCertificateThreshold,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Tunables for a quiz run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    seconds_per_question: u32,
    timer_enabled: bool,
    urgent_threshold_secs: u32,
    difficult_topic_limit: usize,
    certificate_threshold: u32,
}

impl Default for QuizSettings {
    /// 30 s per question with the timer on, urgent at 5 s, three difficult
    /// topics reported, certificate from 70 %.
    fn default() -> Self {
        Self {
            seconds_per_question: 30,
            timer_enabled: true,
            urgent_threshold_secs: 5,
            difficult_topic_limit: 3,
            certificate_threshold: 70,
        }
    }
}

impl QuizSettings {
    pub const MIN_SECONDS_PER_QUESTION: u32 = 5;
    pub const MAX_SECONDS_PER_QUESTION: u32 = 600;

    /// # Errors
    ///
    /// Returns `SettingsError` when a value is outside its allowed range.
    pub fn new(
        seconds_per_question: u32,
        timer_enabled: bool,
        urgent_threshold_secs: u32,
        difficult_topic_limit: usize,
        certificate_threshold: u32,
    ) -> Result<Self, SettingsError> {
        if !(Self::MIN_SECONDS_PER_QUESTION..=Self::MAX_SECONDS_PER_QUESTION)
            .contains(&seconds_per_question)
        {
            return Err(SettingsError::InvalidSecondsPerQuestion);
        }
        if urgent_threshold_secs >= seconds_per_question {
            return Err(SettingsError::InvalidUrgentThreshold);
        }
        if difficult_topic_limit == 0 {
            return Err(SettingsError::InvalidDifficultTopicLimit);
        }
        if certificate_threshold > 100 {
            return Err(SettingsError::InvalidCertificateThreshold);
        }
        Ok(Self {
            seconds_per_question,
            timer_enabled,
            urgent_threshold_secs,
            difficult_topic_limit,
            certificate_threshold,
        })
    }

    /// Copy with a different time limit, keeping the other fields.
    ///
    /// The urgent threshold is lowered to `seconds - 1` if the new limit is
    /// not above it.
    ///
    /// # Errors
    ///
    /// Same range checks as [`QuizSettings::new`].
    pub fn with_seconds_per_question(&self, seconds: u32) -> Result<Self, SettingsError> {
        Self::new(
            seconds,
            self.timer_enabled,
            self.urgent_threshold_secs.min(seconds.saturating_sub(1)),
            self.difficult_topic_limit,
            self.certificate_threshold,
        )
    }

    #[must_use]
    pub fn with_timer_enabled(mut self, enabled: bool) -> Self {
        self.timer_enabled = enabled;
        self
    }

    #[must_use]
    pub fn seconds_per_question(&self) -> u32 {
        self.seconds_per_question
    }

    #[must_use]
    pub fn timer_enabled(&self) -> bool {
        self.timer_enabled
    }

    #[must_use]
    pub fn urgent_threshold_secs(&self) -> u32 {
        self.urgent_threshold_secs
    }

    #[must_use]
    pub fn difficult_topic_limit(&self) -> usize {
        self.difficult_topic_limit
    }

    #[must_use]
    pub fn certificate_threshold(&self) -> u32 {
        self.certificate_threshold
    }
}
