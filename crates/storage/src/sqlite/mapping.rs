use quiz_core::scoring::calculate_percentage;
use sqlx::Row;

use crate::repository::{BestScore, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn map_best_score_row(row: &sqlx::sqlite::SqliteRow) -> Result<BestScore, StorageError> {
    let percentage = u32_from_i64("percentage", row.try_get::<i64, _>("percentage").map_err(ser)?)?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let total = u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?;
    let achieved_at = row.try_get("achieved_at").map_err(ser)?;

    if percentage != calculate_percentage(score, total) {
        return Err(StorageError::Serialization(format!(
            "stored percentage {percentage} does not match {score}/{total}"
        )));
    }

    Ok(BestScore {
        percentage,
        score,
        total,
        achieved_at,
    })
}
