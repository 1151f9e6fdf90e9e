use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::routes::auth::AuthUser;
use crate::services::messages::MessageService;
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(send_message))
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub recipient_id: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub notification_id: String,
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
    Json(body): Json<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<SendMessageResponse>)> {
    let notification_id = MessageService::send(
        &state.db,
        state.feeds.store().as_ref(),
        &session,
        &body.recipient_id,
        &body.text,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(SendMessageResponse { notification_id })))
}
