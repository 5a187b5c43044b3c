//! Integration tests for embedded migrations and database bootstrap.
//!
//! Each test runs against its own temporary database on the shared test
//! server (see `studyplan-test-utils`).

use sqlx::Row;
use uuid::Uuid;

use studyplan_db::config::DbConfig;
use studyplan_db::pool::{self, DatabaseStatus};
use studyplan_db::queries::study_plans::count_study_plans;
use studyplan_test_utils::{TestDb, server_url};

#[tokio::test]
async fn migrations_create_study_plans_table() {
    let db = TestDb::create().await;

    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT tablename::text FROM pg_tables \
         WHERE schemaname = 'public' AND tablename NOT LIKE '\\_sqlx%' \
         ORDER BY tablename",
    )
    .fetch_all(&db.pool)
    .await
    .expect("should list tables");
    let tables: Vec<&str> = rows.iter().map(|(t,)| t.as_str()).collect();
    assert_eq!(tables, ["study_plans"]);

    let columns: Vec<(String, String)> = sqlx::query_as(
        "SELECT column_name::text, data_type::text FROM information_schema.columns \
         WHERE table_name = 'study_plans' ORDER BY ordinal_position",
    )
    .fetch_all(&db.pool)
    .await
    .expect("should list columns");
    let columns: Vec<(&str, &str)> = columns
        .iter()
        .map(|(n, t)| (n.as_str(), t.as_str()))
        .collect();
    assert_eq!(
        columns,
        [
            ("id", "bigint"),
            ("user_id", "text"),
            ("subjects", "jsonb"),
            ("weaknesses", "jsonb"),
            ("exam_dates", "jsonb"),
            ("generated_plan", "jsonb"),
            ("created_at", "timestamp with time zone"),
        ]
    );

    db.cleanup().await;
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let db = TestDb::create().await;

    pool::run_migrations(&db.pool)
        .await
        .expect("second migration run should be a no-op");

    let row = sqlx::query("SELECT COUNT(*) AS cnt FROM study_plans")
        .fetch_one(&db.pool)
        .await
        .expect("count should succeed");
    let count: i64 = row.get("cnt");
    assert_eq!(count, 0);

    db.cleanup().await;
}

#[tokio::test]
async fn ensure_database_exists_is_idempotent() {
    let name = format!("studyplan_test_{}", Uuid::new_v4().simple());
    let config = DbConfig::new(format!("{}/{name}", server_url().await));

    let first = pool::ensure_database_exists(&config)
        .await
        .expect("first ensure should create the database");
    assert_eq!(first, DatabaseStatus::Created);
    let second = pool::ensure_database_exists(&config)
        .await
        .expect("second ensure should be a no-op");
    assert_eq!(second, DatabaseStatus::Existing);

    let pool = pool::open_store(&config)
        .await
        .expect("created database should accept connections and migrate");
    assert_eq!(count_study_plans(&pool).await.unwrap(), 0);
    TestDb { pool, name }.cleanup().await;
}

#[tokio::test]
async fn ensure_database_exists_rejects_unsafe_names() {
    let config = DbConfig::new(format!("{}/bad-name;drop", server_url().await));
    let err = pool::ensure_database_exists(&config)
        .await
        .expect_err("unsafe name should be rejected");
    assert!(err.to_string().contains("invalid characters"), "got: {err}");
}
