//! Per-session randomization of question order and alternative order.
//!
//! Both passes use the same Fisher–Yates walk over an injectable
//! [`RandomSource`], so a seeded source gives a reproducible session. The
//! correct answer is tracked through the permutation map rather than moved
//! alongside the shuffle, which keeps `correct_index` and the wrong-answer
//! explanations consistent with what the user actually sees.

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::model::{Question, QuestionBank, ShuffledQuestion};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ShuffleError {
    #[error("no entropy source available: {0}")]
    EntropyUnavailable(String),
}

//
// ─── RANDOM SOURCES ────────────────────────────────────────────────────────────
//

/// Uniform integer source consumed by the shuffle.
pub trait RandomSource {
    /// Uniform draw in `[0, bound_exclusive)`. Callers never pass `0`.
    fn next_int(&mut self, bound_exclusive: usize) -> usize;

    /// True for sources that do not actually randomize.
    fn is_degraded(&self) -> bool {
        false
    }
}

/// Adapter from any `rand::Rng` to [`RandomSource`].
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    #[must_use]
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    /// Reproducible source for tests and `--seed` runs.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Source seeded from the operating system.
    ///
    /// # Errors
    ///
    /// Returns `ShuffleError::EntropyUnavailable` if the OS cannot provide a seed.
    pub fn from_entropy() -> Result<Self, ShuffleError> {
        StdRng::try_from_os_rng()
            .map(Self::new)
            .map_err(|err| ShuffleError::EntropyUnavailable(err.to_string()))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_int(&mut self, bound_exclusive: usize) -> usize {
        self.rng.random_range(0..bound_exclusive)
    }
}

/// Degraded mode: keeps every sequence in its original order.
///
/// Always drawing the top of the range makes each Fisher–Yates step swap an
/// element with itself. Used only when no real random source can be built,
/// and reported through [`RandomSource::is_degraded`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityOrder;

impl RandomSource for IdentityOrder {
    fn next_int(&mut self, bound_exclusive: usize) -> usize {
        bound_exclusive.saturating_sub(1)
    }

    fn is_degraded(&self) -> bool {
        true
    }
}

//
// ─── SHUFFLE ───────────────────────────────────────────────────────────────────
//

/// In-place Fisher–Yates: for `i` from `n-1` down to `1`, swap `i` with a
/// uniform `j` in `[0, i]`.
pub fn fisher_yates<T>(items: &mut [T], source: &mut dyn RandomSource) {
    for i in (1..items.len()).rev() {
        // out-of-range draws from a misbehaving source are clamped to i
        let j = source.next_int(i + 1).min(i);
        items.swap(i, j);
    }
}

/// Reorder the alternatives of one question.
///
/// `position_in_session` is where this question sits in the shuffled session
/// order, not its index in the bank.
pub fn shuffle_alternatives(
    question: &Question,
    position_in_session: usize,
    source: &mut dyn RandomSource,
) -> ShuffledQuestion {
    let mut permutation_map: Vec<usize> = (0..question.alternatives().len()).collect();
    fisher_yates(&mut permutation_map, source);

    let alternatives = permutation_map
        .iter()
        .map(|&original| question.alternatives()[original].clone())
        .collect();
    // validated questions always contain their correct index, so the lookup hits
    let correct_index = permutation_map
        .iter()
        .position(|&original| original == question.correct_index())
        .unwrap_or(question.correct_index());

    ShuffledQuestion {
        id: question.id(),
        topic: question.topic().clone(),
        prompt: question.prompt().to_owned(),
        alternatives,
        correct_index,
        explanation: question.explanation().to_owned(),
        wrong_explanations: question.wrong_explanations().clone(),
        position_in_session,
        permutation_map,
    }
}

/// Shuffle the question order, then each question's alternatives independently.
pub fn shuffle_questions(
    bank: &QuestionBank,
    source: &mut dyn RandomSource,
) -> Vec<ShuffledQuestion> {
    if source.is_degraded() {
        warn!("shuffling in degraded mode: questions and alternatives keep their bank order");
    }

    let mut order: Vec<&Question> = bank.questions().iter().collect();
    fisher_yates(&mut order, source);

    let shuffled: Vec<ShuffledQuestion> = order
        .into_iter()
        .enumerate()
        .map(|(position, question)| shuffle_alternatives(question, position, source))
        .collect();
    debug!("shuffled {} questions", shuffled.len());
    shuffled
}
