use async_trait::async_trait;

use crate::repository::{BestScore, BestScoreRepository, StorageError};

use super::SqliteRepository;
use super::mapping::map_best_score_row;

const UPSERT_BEST: &str = r"
    INSERT INTO best_score (id, percentage, score, total, achieved_at)
    VALUES (1, ?1, ?2, ?3, ?4)
    ON CONFLICT(id) DO UPDATE SET
        percentage = excluded.percentage,
        score = excluded.score,
        total = excluded.total,
        achieved_at = excluded.achieved_at
";

#[async_trait]
impl BestScoreRepository for SqliteRepository {
    async fn get_best(&self) -> Result<Option<BestScore>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT percentage, score, total, achieved_at
            FROM best_score
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        row.as_ref().map(map_best_score_row).transpose()
    }

    async fn save_best(&self, best: &BestScore) -> Result<(), StorageError> {
        sqlx::query(UPSERT_BEST)
            .bind(i64::from(best.percentage))
            .bind(i64::from(best.score))
            .bind(i64::from(best.total))
            .bind(best.achieved_at)
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn clear_best(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM best_score WHERE id = 1")
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }

    /// Single statement, so two finishing sessions cannot both "win".
    async fn record_if_better(&self, candidate: &BestScore) -> Result<bool, StorageError> {
        let sql = format!("{UPSERT_BEST} WHERE excluded.percentage > best_score.percentage");
        let res = sqlx::query(&sql)
            .bind(i64::from(candidate.percentage))
            .bind(i64::from(candidate.score))
            .bind(i64::from(candidate.total))
            .bind(candidate.achieved_at)
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(res.rows_affected() > 0)
    }
}
