use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::scoring::calculate_percentage;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Best result achieved across finished sessions.
///
/// Only `percentage` takes part in comparisons; the rest is context for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestScore {
    pub percentage: u32,
    pub score: u32,
    pub total: u32,
    pub achieved_at: DateTime<Utc>,
}

impl BestScore {
    #[must_use]
    pub fn new(score: u32, total: u32, achieved_at: DateTime<Utc>) -> Self {
        Self {
            percentage: calculate_percentage(score, total),
            score,
            total,
            achieved_at,
        }
    }

    /// Strictly greater percentage than `current` (or no current best at all).
    #[must_use]
    pub fn beats(&self, current: Option<&BestScore>) -> bool {
        current.is_none_or(|best| self.percentage > best.percentage)
    }
}

/// Persistence contract for the single best-score value.
///
/// Read once at startup, conditionally written after each finished session.
#[async_trait]
pub trait BestScoreRepository: Send + Sync {
    /// Fetch the stored best score, if any session has finished yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be read.
    async fn get_best(&self) -> Result<Option<BestScore>, StorageError>;

    /// Overwrite the stored best score unconditionally.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn save_best(&self, best: &BestScore) -> Result<(), StorageError>;

    /// Forget the stored best score.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be removed.
    async fn clear_best(&self) -> Result<(), StorageError>;

    /// Store `candidate` only if it beats the current best. Returns whether it did.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if reading or writing fails.
    async fn record_if_better(&self, candidate: &BestScore) -> Result<bool, StorageError> {
        let current = self.get_best().await?;
        if !candidate.beats(current.as_ref()) {
            return Ok(false);
        }
        self.save_best(candidate).await?;
        Ok(true)
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    best: Arc<Mutex<Option<BestScore>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            best: Arc::new(Mutex::new(None)),
        }
    }
}

#[async_trait]
impl BestScoreRepository for InMemoryRepository {
    async fn get_best(&self) -> Result<Option<BestScore>, StorageError> {
        let guard = self
            .best
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_best(&self, best: &BestScore) -> Result<(), StorageError> {
        let mut guard = self
            .best
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(best.clone());
        Ok(())
    }

    async fn clear_best(&self) -> Result<(), StorageError> {
        let mut guard = self
            .best
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub best_scores: Arc<dyn BestScoreRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let best_scores: Arc<dyn BestScoreRepository> = Arc::new(InMemoryRepository::new());
        Self { best_scores }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;

    #[test]
    fn best_score_derives_percentage() {
        let best = BestScore::new(7, 10, fixed_now());
        assert_eq!(best.percentage, 70);
        assert_eq!(BestScore::new(0, 0, fixed_now()).percentage, 0);
    }

    #[test]
    fn beats_requires_strictly_greater() {
        let current = BestScore::new(7, 10, fixed_now());
        assert!(BestScore::new(8, 10, fixed_now()).beats(Some(&current)));
        assert!(!BestScore::new(7, 10, fixed_now()).beats(Some(&current)));
        assert!(!BestScore::new(14, 20, fixed_now()).beats(Some(&current)));
        assert!(BestScore::new(0, 5, fixed_now()).beats(None));
    }

    #[tokio::test]
    async fn record_if_better_only_overwrites_on_improvement() {
        let repo = InMemoryRepository::new();
        assert_eq!(repo.get_best().await.unwrap(), None);

        assert!(repo.record_if_better(&BestScore::new(3, 5, fixed_now())).await.unwrap());
        assert!(!repo.record_if_better(&BestScore::new(3, 5, fixed_now())).await.unwrap());
        assert!(!repo.record_if_better(&BestScore::new(1, 5, fixed_now())).await.unwrap());
        assert_eq!(repo.get_best().await.unwrap().unwrap().percentage, 60);

        assert!(repo.record_if_better(&BestScore::new(5, 5, fixed_now())).await.unwrap());
        assert_eq!(repo.get_best().await.unwrap().unwrap().percentage, 100);

        repo.clear_best().await.unwrap();
        assert_eq!(repo.get_best().await.unwrap(), None);
    }

    #[tokio::test]
    async fn storage_in_memory_shares_one_value() {
        let storage = Storage::in_memory();
        let clone = storage.clone();
        storage
            .best_scores
            .save_best(&BestScore::new(4, 5, fixed_now()))
            .await
            .unwrap();
        assert_eq!(clone.best_scores.get_best().await.unwrap().unwrap().score, 4);
    }
}
