//! Database query functions for the `study_plans` table.
//!
//! The table is append-only: rows are inserted once and never updated.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::models::StudyPlanRecord;

/// Column values for a new `study_plans` row.
#[derive(Debug, Clone)]
pub struct NewStudyPlan<'a> {
    pub user_id: &'a str,
    pub subjects: &'a serde_json::Value,
    pub weaknesses: &'a serde_json::Value,
    pub exam_dates: &'a serde_json::Value,
    pub generated_plan: &'a serde_json::Value,
}

/// Insert a study plan row. Returns the stored row with its server-assigned
/// id and creation time.
pub async fn insert_study_plan(pool: &PgPool, new: &NewStudyPlan<'_>) -> Result<StudyPlanRecord> {
    let record = sqlx::query_as::<_, StudyPlanRecord>(
        "INSERT INTO study_plans (user_id, subjects, weaknesses, exam_dates, generated_plan) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(new.user_id)
    .bind(new.subjects)
    .bind(new.weaknesses)
    .bind(new.exam_dates)
    .bind(new.generated_plan)
    .fetch_one(pool)
    .await
    .context("failed to insert study plan")?;

    Ok(record)
}

/// Fetch a study plan by id.
pub async fn get_study_plan(pool: &PgPool, id: i64) -> Result<Option<StudyPlanRecord>> {
    let record = sqlx::query_as::<_, StudyPlanRecord>("SELECT * FROM study_plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch study plan")?;

    Ok(record)
}

/// List all study plans, newest first. Rows created in the same instant are
/// ordered by descending id.
pub async fn list_study_plans(pool: &PgPool) -> Result<Vec<StudyPlanRecord>> {
    let records = sqlx::query_as::<_, StudyPlanRecord>(
        "SELECT * FROM study_plans ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await
    .context("failed to list study plans")?;

    Ok(records)
}

/// Count stored study plans.
pub async fn count_study_plans(pool: &PgPool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM study_plans")
        .fetch_one(pool)
        .await
        .context("failed to count study plans")?;

    Ok(count)
}
