use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use studyplan_core::plan::{PlanEnvelope, parse_submission};
use studyplan_core::runner::{PlanRunner, RunError};
use studyplan_db::queries::study_plans::NewStudyPlan;

use crate::store::PlanStore;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl From<RunError> for AppError {
    fn from(err: RunError) -> Self {
        match err {
            RunError::Generation(msg) => Self::unprocessable(msg),
            RunError::Transport(e) => Self::internal(e.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PlanStore>,
    pub runner: Arc<dyn PlanRunner>,
    /// Reference date for each generation request.
    pub today: fn() -> NaiveDate,
}

impl AppState {
    pub fn new(store: Arc<dyn PlanStore>, runner: Arc<dyn PlanRunner>) -> Self {
        Self {
            store,
            runner,
            today: local_today,
        }
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/generate_plan", post(generate_plan))
        .route("/api/plans", get(list_plans))
        .route("/api/plans/{id}", get(get_plan))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let runner = state.runner.name().to_owned();
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!(%runner, "studyplan serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("studyplan serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn generate_plan(
    State(state): State<AppState>,
    body: String,
) -> Result<axum::response::Response, AppError> {
    let submission = parse_submission(&body).map_err(|e| {
        warn!("rejected plan request: {e}");
        AppError::bad_request(e.to_string())
    })?;
    let request = &submission.request;
    let today = (state.today)();

    info!(
        user = %submission.user_id,
        subjects = request.subjects.len(),
        runner = state.runner.name(),
        %today,
        "generating study plan"
    );

    let plan = state.runner.run(request, today).await.map_err(|e| {
        warn!("plan generation failed: {e}");
        AppError::from(e)
    })?;
    let sessions = plan.session_count();
    let envelope = PlanEnvelope::success(plan);

    let subjects = to_json(&request.subjects)?;
    let weaknesses = to_json(&request.weaknesses)?;
    let exam_dates = to_json(&request.exams)?;
    let generated_plan = to_json(&envelope)?;

    let record = state
        .store
        .insert(&NewStudyPlan {
            user_id: &submission.user_id,
            subjects: &subjects,
            weaknesses: &weaknesses,
            exam_dates: &exam_dates,
            generated_plan: &generated_plan,
        })
        .await
        .map_err(|e| {
            tracing::error!("failed to store study plan: {e:#}");
            AppError::internal(e)
        })?;

    info!(id = record.id, sessions, "study plan stored");
    Ok(Json(envelope).into_response())
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, AppError> {
    serde_json::to_value(value).map_err(|e| AppError::internal(e.into()))
}

async fn list_plans(State(state): State<AppState>) -> Result<axum::response::Response, AppError> {
    let records = state.store.list().await.map_err(AppError::internal)?;
    Ok(Json(records).into_response())
}

async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<axum::response::Response, AppError> {
    let record = state
        .store
        .get(id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("study plan {id} not found")))?;

    Ok(Json(record).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
