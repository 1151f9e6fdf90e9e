use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Deserialize;

use crate::db::{UpsertUser, User, UserRepository};
use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::routes::auth::AuthUser;
use crate::AppState;

/// Router for the caller's own profile
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/me", get(get_me).put(update_me))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: String,
    /// Preferred notification language (`en`, `af`, or a region tag of those)
    pub lang: Option<String>,
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
) -> AppResult<Json<User>> {
    let user = UserRepository::find_by_id(&state.db, &session.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(i18n::t("not_found.user")))?;
    Ok(Json(user))
}

/// Create or update the caller's profile. The role always comes from the
/// token, never from the body.
async fn update_me(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
    Json(body): Json<UpdateProfileRequest>,
) -> AppResult<Json<User>> {
    let display_name = body.display_name.trim();
    if display_name.is_empty() {
        return Err(AppError::Validation("display_name is required".to_string()));
    }

    let lang = match body.lang.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => {
            let lang = i18n::normalize_language(raw);
            if !i18n::is_supported_language(&lang) {
                return Err(AppError::Validation(format!("Unsupported language: {}", raw)));
            }
            Some(lang)
        }
    };

    let user = UserRepository::upsert(
        &state.db,
        UpsertUser {
            id: session.user_id.clone(),
            display_name: display_name.to_string(),
            role: session.role,
            lang,
        },
    )
    .await?;

    tracing::debug!("Updated profile for user {}", user.id);
    Ok(Json(user))
}
