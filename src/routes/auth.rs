use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::db::Role;
use crate::error::AppError;
use crate::session::Session;
use crate::AppState;

/// Token claims. Tokens are issued by the identity provider; this service
/// only verifies them.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

/// Decode and validate a JWT, returning the claims
fn decode_jwt(secret: &str, token: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Build the request session from a bearer token string
pub fn session_from_token(secret: &str, token: &str) -> Result<Session, AppError> {
    let claims = decode_jwt(secret, token)?;
    if claims.sub.trim().is_empty() {
        return Err(AppError::Unauthorized);
    }
    let role = claims.role.parse::<Role>().map_err(|e| {
        tracing::debug!("Token for {} carries an unknown role: {}", claims.sub, e);
        AppError::Unauthorized
    })?;
    Ok(Session::new(claims.sub, role))
}

// ============================================================================
// Auth Extractor
// ============================================================================

/// Extractor for the authenticated session
pub struct AuthUser(pub Session);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // Extract Authorization header (Bearer token)
        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                tracing::debug!("Missing or invalid Authorization header");
                AppError::Unauthorized
            })?;

        if !auth_header.to_ascii_lowercase().starts_with("bearer ") {
            tracing::debug!("Authorization header doesn't start with 'Bearer '");
            return Err(AppError::Unauthorized);
        }

        let token = auth_header[7..].trim();
        if token.is_empty() {
            tracing::debug!("Empty bearer token in Authorization header");
            return Err(AppError::Unauthorized);
        }

        let session = session_from_token(&state.config.jwt.secret, token).map_err(|e| {
            tracing::debug!("Failed to build session from token: {:?}", e);
            e
        })?;

        tracing::debug!("Authenticated user: {} ({})", session.user_id, session.role);
        Ok(AuthUser(session))
    }
}
