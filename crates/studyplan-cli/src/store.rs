//! Storage seam for the HTTP service.
//!
//! Handlers talk to a [`PlanStore`]; production uses the PostgreSQL pool,
//! handler tests use an in-memory store.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use studyplan_db::models::StudyPlanRecord;
use studyplan_db::queries::study_plans::{self, NewStudyPlan};

#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn insert(&self, new: &NewStudyPlan<'_>) -> Result<StudyPlanRecord>;

    /// All records, newest first.
    async fn list(&self) -> Result<Vec<StudyPlanRecord>>;

    async fn get(&self, id: i64) -> Result<Option<StudyPlanRecord>>;
}

#[async_trait]
impl PlanStore for PgPool {
    async fn insert(&self, new: &NewStudyPlan<'_>) -> Result<StudyPlanRecord> {
        study_plans::insert_study_plan(self, new).await
    }

    async fn list(&self) -> Result<Vec<StudyPlanRecord>> {
        study_plans::list_study_plans(self).await
    }

    async fn get(&self, id: i64) -> Result<Option<StudyPlanRecord>> {
        study_plans::get_study_plan(self, id).await
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;
    use studyplan_test_utils::TestDb;

    use super::*;

    #[tokio::test]
    async fn pg_pool_store_roundtrip() {
        let db = TestDb::create().await;
        let store: &dyn PlanStore = &db.pool;

        let subjects = json!(["Math"]);
        let empty = json!({});
        let plan = json!({"status": "success", "plan": {}});
        let new = NewStudyPlan {
            user_id: "ada",
            subjects: &subjects,
            weaknesses: &empty,
            exam_dates: &empty,
            generated_plan: &plan,
        };

        let first = store.insert(&new).await.unwrap();
        let second = store.insert(&new).await.unwrap();

        let listed = store.list().await.unwrap();
        let ids: Vec<i64> = listed.iter().map(|r| r.id).collect();
        assert_eq!(ids, [second.id, first.id]);

        let fetched = store.get(first.id).await.unwrap().unwrap();
        assert_eq!(fetched.user_id, "ada");
        assert_eq!(fetched.generated_plan, plan);
        assert!(store.get(first.id + 100).await.unwrap().is_none());

        db.cleanup().await;
    }
}
