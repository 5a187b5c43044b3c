use anyhow::Result;
use sqlx::PgPool;

use studyplan_db::models::StudyPlanRecord;
use studyplan_db::queries::study_plans;

/// `studyplan plans [ID]`: list stored plans, or print one as JSON.
pub async fn run_plans(pool: &PgPool, id: Option<i64>) -> Result<()> {
    match id {
        Some(id) => show_plan(pool, id).await,
        None => list_plans(pool).await,
    }
}

// -----------------------------------------------------------------------
// studyplan plans
// -----------------------------------------------------------------------

async fn list_plans(pool: &PgPool) -> Result<()> {
    let records = study_plans::list_study_plans(pool).await?;

    if records.is_empty() {
        println!("No study plans stored. Submit one with `studyplan serve` and POST /api/generate_plan.");
        return Ok(());
    }

    print!("{}", render_table(&records));
    Ok(())
}

fn render_table(records: &[StudyPlanRecord]) -> String {
    let id_w = records
        .iter()
        .map(|r| r.id.to_string().len())
        .max()
        .unwrap_or(2)
        .max(2);
    let user_w = records
        .iter()
        .map(|r| r.user_id.len())
        .max()
        .unwrap_or(4)
        .max(4);
    let sessions_w = 8;

    let mut out = format!(
        "{:>id_w$}  {:<user_w$}  {:>sessions_w$}  {:<16}  SUBJECTS\n",
        "ID", "USER", "SESSIONS", "CREATED",
    );
    for record in records {
        let created = record.created_at.format("%Y-%m-%d %H:%M");
        out.push_str(&format!(
            "{:>id_w$}  {:<user_w$}  {:>sessions_w$}  {:<16}  {}\n",
            record.id,
            record.user_id,
            record.session_count(),
            created,
            record.subject_names().join(", "),
        ));
    }
    out
}

// -----------------------------------------------------------------------
// studyplan plans <id>
// -----------------------------------------------------------------------

async fn show_plan(pool: &PgPool, id: i64) -> Result<()> {
    let record = study_plans::get_study_plan(pool, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("study plan {id} not found"))?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
