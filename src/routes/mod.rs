pub mod applications;
pub mod auth;
pub mod health;
pub mod jobs;
pub mod messages;
pub mod notifications;
pub mod users;

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::AppState;

/// All HTTP routes, without the outer middleware stack.
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Profile
        .nest("/api/users", users::router())
        // Notification feed
        .nest("/api/notifications", notifications::router())
        // Producers
        .nest("/api/jobs", jobs::router())
        .nest("/api/applications", applications::router())
        .nest("/api/messages", messages::router())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use axum::Router;

    use crate::config::Config;
    use crate::AppState;

    /// Application state over an in-memory database plus its router.
    pub(crate) async fn test_state(page_size: usize) -> (Arc<AppState>, Router) {
        let mut config = Config::default();
        config.jwt.secret = super::auth::tests::SECRET.to_string();
        config.feed.page_size = page_size;

        let pool = crate::db::test_pool().await;
        let state = Arc::new(AppState::new(pool, config));
        let app = super::api_router(state.clone());
        (state, app)
    }
}
