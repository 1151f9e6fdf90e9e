use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::NotificationRecord;
use crate::error::AppResult;
use crate::routes::auth::AuthUser;
use crate::services::feed::{BulkDeleteOutcome, EventOutcome, FeedEvent, FeedSnapshot};
use crate::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(first_page))
        .route("/more", get(next_page))
        .route("/unread-count", get(unread_count))
        .route("/test-data", delete(delete_test_data))
        .route("/session/end", post(end_session))
        .route("/:id", delete(delete_notification))
        .route("/:id/read", post(mark_read))
        .route("/:id/events", post(handle_event))
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct EventRequest {
    pub event: FeedEvent,
}

#[derive(Debug, Serialize)]
pub struct SessionEndResponse {
    pub ended: bool,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub id: String,
    pub status: &'static str,
}

// ============================================================================
// Handlers
// ============================================================================

/// Reset the caller's feed and load the newest page
async fn first_page(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
) -> AppResult<Json<FeedSnapshot>> {
    let feed = state.feeds.feed_for(&session).await;
    feed.load_first_page().await?;
    Ok(Json(feed.snapshot().await))
}

/// Load the page after the current cursor
async fn next_page(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
) -> AppResult<Json<FeedSnapshot>> {
    let feed = state.feeds.feed_for(&session).await;
    feed.load_next_page().await?;
    Ok(Json(feed.snapshot().await))
}

/// Unread badge count, independent of what the feed has loaded
async fn unread_count(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
) -> AppResult<Json<UnreadCountResponse>> {
    let unread = state.notifications.count_unread(&session.user_id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

/// Fire-and-forget read flag update
async fn mark_read(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
    Path(id): Path<String>,
) -> (StatusCode, Json<MarkReadResponse>) {
    let feed = state.feeds.feed_for(&session).await;
    feed.mark_read(&id);
    (
        StatusCode::ACCEPTED,
        Json(MarkReadResponse {
            id,
            status: "accepted",
        }),
    )
}

async fn delete_notification(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<FeedSnapshot>> {
    let feed = state.feeds.feed_for(&session).await;
    feed.delete(&id).await?;
    Ok(Json(feed.snapshot().await))
}

/// Remove every seeded/test notification of the caller
async fn delete_test_data(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
) -> AppResult<Json<BulkDeleteOutcome>> {
    let feed = state.feeds.feed_for(&session).await;
    let outcome = feed
        .delete_all_matching(NotificationRecord::is_test_data)
        .await?;
    tracing::info!(
        "Removed {} test notification(s) for user {}",
        outcome.deleted,
        session.user_id
    );
    Ok(Json(outcome))
}

async fn handle_event(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<EventRequest>,
) -> AppResult<Json<EventOutcome>> {
    let feed = state.feeds.feed_for(&session).await;
    let outcome = feed.handle_event(&state.db, &id, body.event).await?;
    Ok(Json(outcome))
}

async fn end_session(
    State(state): State<Arc<AppState>>,
    AuthUser(session): AuthUser,
) -> Json<SessionEndResponse> {
    let ended = state.feeds.end_session(&session.user_id).await;
    Json(SessionEndResponse { ended })
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::db::{CreateNotification, NotificationType};
    use crate::routes::auth::tests::token_for;
    use crate::routes::tests::test_state;

    async fn call(
        app: axum::Router,
        method: Method,
        uri: &str,
        token: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(http::header::AUTHORIZATION, format!("Bearer {}", token));
        let body = match body {
            Some(v) => {
                builder = builder.header(http::header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let res = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn seed(state: &crate::AppState, title: &str, message: &str) -> String {
        state
            .feeds
            .store()
            .create(CreateNotification {
                user_id: "s1".to_string(),
                title: title.to_string(),
                message: message.to_string(),
                notification_type: NotificationType::NewMessage,
                job_id: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn feed_requires_a_token() {
        let (_state, app) = test_state(2).await;
        let res = app
            .oneshot(
                Request::builder()
                    .uri("/api/notifications")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn first_and_next_page_follow_the_cursor() {
        let (state, app) = test_state(2).await;
        for i in 0..3 {
            seed(&state, &format!("title {}", i), "hello").await;
        }
        let token = token_for("s1", "student");

        let (status, body) = call(app.clone(), Method::GET, "/api/notifications", &token, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"].as_array().unwrap().len(), 2);
        assert_eq!(body["items"][0]["title"], "title 2");
        assert_eq!(body["end_of_feed"], false);
        assert_eq!(body["loading"], false);

        let (status, body) =
            call(app.clone(), Method::GET, "/api/notifications/more", &token, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"].as_array().unwrap().len(), 3);
        assert_eq!(body["end_of_feed"], true);

        let (status, body) =
            call(app, Method::GET, "/api/notifications/unread-count", &token, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["unread"], 3);
    }

    #[tokio::test]
    async fn delete_removes_from_feed_and_unknown_id_is_ok() {
        let (state, app) = test_state(10).await;
        let id = seed(&state, "bye", "soon gone").await;
        seed(&state, "stay", "still here").await;
        let token = token_for("s1", "student");

        call(app.clone(), Method::GET, "/api/notifications", &token, None).await;
        let (status, body) = call(
            app.clone(),
            Method::DELETE,
            &format!("/api/notifications/{}", id),
            &token,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "stay");

        let (status, _) = call(
            app,
            Method::DELETE,
            "/api/notifications/no-such-id",
            &token,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_data_is_purged() {
        let (state, app) = test_state(1).await;
        seed(&state, "Test notification", "seeded").await;
        seed(&state, "Real one", "keep").await;
        seed(&state, "Another", "This is a test message").await;
        let token = token_for("s1", "student");

        let (status, body) = call(
            app,
            Method::DELETE,
            "/api/notifications/test-data",
            &token,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted"], 2);
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["title"], "Real one");
    }

    #[tokio::test]
    async fn click_event_routes_to_messages() {
        let (state, app) = test_state(10).await;
        let id = seed(&state, "New message from Acme", "hi").await;
        let token = token_for("s1", "student");

        call(app.clone(), Method::GET, "/api/notifications", &token, None).await;
        let (status, body) = call(
            app,
            Method::POST,
            &format!("/api/notifications/{}/events", id),
            &token,
            Some(serde_json::json!({ "event": "click" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "navigate");
        assert_eq!(body["route"]["target"], "messages");
    }

    #[tokio::test]
    async fn ending_the_session_drops_the_feed() {
        let (state, app) = test_state(10).await;
        let token = token_for("s1", "student");

        call(app.clone(), Method::GET, "/api/notifications", &token, None).await;
        assert_eq!(state.feeds.active_sessions().await, 1);

        let (status, body) = call(
            app,
            Method::POST,
            "/api/notifications/session/end",
            &token,
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ended"], true);
        assert_eq!(state.feeds.active_sessions().await, 0);
    }
}
