use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::db::Job;
use crate::error::AppResult;
use crate::routes::auth::AuthUser;
use crate::services::jobs::{JobPosted, JobService, NewJobPosting};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(post_job))
        .route("/:id", get(get_job))
}

/// Post a job and alert every student
async fn post_job(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
    Json(posting): Json<NewJobPosting>,
) -> AppResult<(StatusCode, Json<JobPosted>)> {
    let posted = JobService::post_job(
        &state.db,
        state.feeds.store().as_ref(),
        &session,
        posting,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(posted)))
}

async fn get_job(
    State(state): State<Arc<AppState>>,
    AuthUser(_session): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Job>> {
    Ok(Json(JobService::find(&state.db, &id).await?))
}
