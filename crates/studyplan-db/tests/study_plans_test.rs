//! Integration tests for the `study_plans` queries.

use serde_json::json;

use studyplan_db::queries::study_plans::{
    NewStudyPlan, count_study_plans, get_study_plan, insert_study_plan, list_study_plans,
};
use studyplan_test_utils::TestDb;

async fn insert(db: &TestDb, user_id: &str, subject: &str) -> studyplan_db::models::StudyPlanRecord {
    let subjects = json!([subject]);
    let weaknesses = json!({ subject: {"Basics": 4} });
    let exam_dates = json!({ subject: "2024-03-15" });
    let plan = json!({
        "status": "success",
        "plan": {"2024-03-01": [{"subject": subject, "topic": "Basics", "duration": "2h"}]}
    });
    insert_study_plan(
        &db.pool,
        &NewStudyPlan {
            user_id,
            subjects: &subjects,
            weaknesses: &weaknesses,
            exam_dates: &exam_dates,
            generated_plan: &plan,
        },
    )
    .await
    .expect("insert_study_plan should succeed")
}

#[tokio::test]
async fn insert_and_get_study_plan() {
    let db = TestDb::create().await;

    let record = insert(&db, "anonymous", "Math").await;
    assert!(record.id > 0);
    assert_eq!(record.user_id, "anonymous");
    assert_eq!(record.subjects, json!(["Math"]));
    assert_eq!(record.exam_dates, json!({"Math": "2024-03-15"}));
    assert_eq!(record.generated_plan["status"], "success");
    assert_eq!(record.session_count(), 1);

    let fetched = get_study_plan(&db.pool, record.id)
        .await
        .expect("get_study_plan should succeed")
        .expect("record should exist");
    assert_eq!(fetched.id, record.id);
    assert_eq!(fetched.weaknesses, json!({"Math": {"Basics": 4}}));
    assert_eq!(fetched.created_at, record.created_at);

    db.cleanup().await;
}

#[tokio::test]
async fn get_missing_study_plan_is_none() {
    let db = TestDb::create().await;

    let fetched = get_study_plan(&db.pool, 4242)
        .await
        .expect("get_study_plan should succeed");
    assert!(fetched.is_none());

    db.cleanup().await;
}

#[tokio::test]
async fn ids_auto_increment() {
    let db = TestDb::create().await;

    let a = insert(&db, "u1", "Math").await;
    let b = insert(&db, "u1", "Bio").await;
    assert!(b.id > a.id);

    db.cleanup().await;
}

#[tokio::test]
async fn list_is_newest_first() {
    let db = TestDb::create().await;

    let first = insert(&db, "u1", "Math").await;
    let second = insert(&db, "u2", "Bio").await;
    let third = insert(&db, "u1", "Art").await;

    let records = list_study_plans(&db.pool)
        .await
        .expect("list_study_plans should succeed");
    let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, [third.id, second.id, first.id]);
    assert_eq!(count_study_plans(&db.pool).await.unwrap(), 3);

    db.cleanup().await;
}

#[tokio::test]
async fn list_empty() {
    let db = TestDb::create().await;

    let records = list_study_plans(&db.pool).await.unwrap();
    assert!(records.is_empty());

    db.cleanup().await;
}
