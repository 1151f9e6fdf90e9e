use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;

use crate::db::JobApplication;
use crate::error::AppResult;
use crate::routes::auth::AuthUser;
use crate::services::applications::ApplicationService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_applications).post(apply))
        .route("/:id/status", put(update_status))
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub job_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// Free-form status text; normalized before it is stored
    pub status: String,
    pub notes: Option<String>,
}

async fn apply(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
    Json(body): Json<ApplyRequest>,
) -> AppResult<(StatusCode, Json<JobApplication>)> {
    let application = ApplicationService::apply(&state.db, &session, &body.job_id).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

async fn list_applications(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
) -> AppResult<Json<Vec<JobApplication>>> {
    Ok(Json(ApplicationService::list_own(&state.db, &session).await?))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> AppResult<Json<JobApplication>> {
    let application = ApplicationService::update_status(
        &state.db,
        state.feeds.store().as_ref(),
        &session,
        &id,
        &body.status,
        body.notes.as_deref(),
    )
    .await?;
    Ok(Json(application))
}
