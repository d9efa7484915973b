//! HTTP endpoints for rinkside.
//!
//! Only the pre-launch waiting list lives here; everything else talks to the
//! backend directly.
//!
//! - `GET  /health`
//! - `GET  /api/waiting-list`: signup statistics
//! - `POST /api/waiting-list`: `{ "email", "role" }`

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use rinkside_core::services::waiting_list::{self, WaitingListStats};
use rinkside_core::{ApiError, Store, ValidationError, ValidationErrors};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info, warn};

/// Shared handler state: the store the waiting list lives in.
pub struct AppState<S> {
    pub store: Arc<S>,
}

impl<S> AppState<S> {
    pub fn new(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Backend request failed")]
    Backend,

    #[error("Internal server error")]
    Internal,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Backend => StatusCode::BAD_GATEWAY,
            ServerError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        if let Some(e) = err.downcast_ref::<ValidationError>() {
            return ServerError::BadRequest(e.to_string());
        }
        if let Some(e) = err.downcast_ref::<ValidationErrors>() {
            return ServerError::BadRequest(e.to_string());
        }
        if err.chain().any(|e| e.is::<ApiError>()) {
            warn!(error = %format!("{:#}", err), "Backend request failed");
            ServerError::Backend
        } else {
            error!(error = %format!("{:#}", err), "Request failed");
            ServerError::Internal
        }
    }
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        ServerError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "success": false, "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub success: bool,
    pub already_registered: bool,
    pub stats: WaitingListStats,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: WaitingListStats,
}

pub fn router<S: Store + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/api/waiting-list",
            get(waiting_list_stats::<S>).post(join_waiting_list::<S>),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn waiting_list_stats<S: Store + 'static>(
    State(state): State<AppState<S>>,
) -> Result<Json<StatsResponse>, ServerError> {
    let stats = waiting_list::waiting_list_stats(state.store.as_ref()).await?;
    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}

async fn join_waiting_list<S: Store + 'static>(
    State(state): State<AppState<S>>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<SignupResponse>, ServerError> {
    let Json(request) = payload?;
    let role = waiting_list::parse_role(&request.role)
        .map_err(|e| ServerError::BadRequest(e.to_string()))?;
    let outcome = waiting_list::join_waiting_list(state.store.as_ref(), &request.email, role).await?;
    info!(
        already_registered = outcome.already_registered,
        total = outcome.stats.total,
        "Waiting list signup handled"
    );
    Ok(Json(SignupResponse {
        success: true,
        already_registered: outcome.already_registered,
        stats: outcome.stats,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request};
    use rinkside_core::store::MemoryStore;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn call(app: Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if body.is_some() {
            request = request.header("content-type", "application/json");
        }
        let request = request
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(AppState::new(MemoryStore::new()));
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn test_signup_and_stats() {
        let state = AppState::new(MemoryStore::new());
        let signup = r#"{"email":" Coach@Example.com ","role":"coach"}"#;

        let (status, body) = call(router(state.clone()), Method::POST, "/api/waiting-list", Some(signup)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["already_registered"], false);
        assert_eq!(body["stats"]["coaches"], 1);

        let (_, body) = call(router(state.clone()), Method::POST, "/api/waiting-list", Some(signup)).await;
        assert_eq!(body["already_registered"], true);
        assert_eq!(body["stats"]["total"], 1);

        let (status, body) = call(router(state), Method::GET, "/api/waiting-list", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({
            "success": true,
            "stats": { "total": 1, "coaches": 1, "players": 0, "parents": 0, "organizations": 0 }
        }));
    }

    #[tokio::test]
    async fn test_bad_requests() {
        let state = AppState::new(MemoryStore::new());
        for payload in [
            r#"{"email":"nope","role":"coach"}"#,
            r#"{"email":"a@b.co","role":"zamboni driver"}"#,
            r#"{"email":"a@b.co"}"#,
            "not json",
        ] {
            let (status, body) =
                call(router(state.clone()), Method::POST, "/api/waiting-list", Some(payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", payload);
            assert_eq!(body["success"], false);
            assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()));
        }
        assert_eq!(state.store.count("waiting_list"), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_500() {
        let store = MemoryStore::new();
        store.fail_inserts_into("waiting_list");
        let (status, body) = call(
            router(AppState::new(store)),
            Method::POST,
            "/api/waiting-list",
            Some(r#"{"email":"a@b.co","role":"parent"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
    }

    #[test]
    fn test_backend_errors_map_to_502() {
        let err = anyhow::Error::from(ApiError::ServerError("503".to_string())).context("Failed to load waiting list");
        assert_eq!(ServerError::from(err).status(), StatusCode::BAD_GATEWAY);

        let err = anyhow::Error::from(ValidationError::new("email", "is invalid"));
        assert_eq!(ServerError::from(err).status(), StatusCode::BAD_REQUEST);
    }
}
