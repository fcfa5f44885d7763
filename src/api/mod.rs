//! Public REST surface under `/api/`.
//!
//! Each domain module exposes `routes(prefix)` returning a router with full
//! paths, so the same domain can be mounted under an alias prefix.

pub mod about;
pub mod admin;
pub mod guidance;
pub mod header;
pub mod home;
pub mod layout;
pub mod locations;
pub mod news;
pub mod products;
pub mod service;
pub mod user_support;

use crate::error::AppError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::MethodRouter;
use axum::{Json, Router};
use chrono::SecondsFormat;
use cms_core::{CmsError, RecordMeta, ValidationErrors};
use serde_json::{json, Value};
use tracing::error;

#[derive(Debug)]
pub enum ApiError {
    NotFound {
        message: String,
        debug_info: Option<Value>,
    },
    Validation(ValidationErrors),
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    MethodNotAllowed(String),
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound {
            message: message.into(),
            debug_info: None,
        }
    }

    pub fn not_found_with(message: impl Into<String>, debug_info: Value) -> Self {
        ApiError::NotFound {
            message: message.into(),
            debug_info: Some(debug_info),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound {
                message,
                debug_info: Some(debug_info),
            } => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": message, "debug_info": debug_info })),
            )
                .into_response(),
            ApiError::NotFound { message, .. } => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "non_field_errors": [message] })),
            )
                .into_response(),
            ApiError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Forbidden(message) => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": message }))).into_response()
            }
            ApiError::MethodNotAllowed(message) => (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(json!({ "error": message })),
            )
                .into_response(),
            ApiError::Internal(detail) => {
                error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<CmsError> for ApiError {
    fn from(err: CmsError) -> Self {
        match err {
            CmsError::Validation(errors) => ApiError::Validation(errors),
            CmsError::NotFound { .. } => ApiError::not_found("Not found."),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Core(core) => core.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Registers `path` both with and without a trailing slash.
pub fn route_both(
    router: Router<AppState>,
    path: &str,
    method_router: MethodRouter<AppState>,
) -> Router<AppState> {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return router.route("/", method_router);
    }
    router
        .route(trimmed, method_router.clone())
        .route(&format!("{trimmed}/"), method_router)
}

/// Appends `is_active`, `created_at` and `updated_at` to a JSON object.
pub fn with_meta(mut view: Value, meta: &RecordMeta) -> Value {
    if let Some(obj) = view.as_object_mut() {
        obj.insert("is_active".to_string(), json!(meta.is_active));
        obj.insert("created_at".to_string(), json!(meta.created_at));
        obj.insert("updated_at".to_string(), json!(meta.updated_at));
    }
    view
}

/// Serializes a record with all of its fields.
pub fn record_json<T: serde::Serialize>(record: &T) -> ApiResult<Value> {
    serde_json::to_value(record).map_err(|e| ApiError::Internal(e.to_string()))
}

pub fn iso_timestamp(meta: &RecordMeta) -> Option<String> {
    meta.updated_at
        .map(|at| at.to_rfc3339_opts(SecondsFormat::Micros, true))
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::config::Config;
    use crate::email::MemoryBackend;
    use crate::state::AppState;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use cms_core::storage::InMemoryStorage;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    pub fn test_state() -> AppState {
        AppState::new(
            Config::default(),
            Arc::new(InMemoryStorage::new()),
            Arc::new(MemoryBackend::new()),
        )
    }

    pub async fn send_json(
        app: Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        send_json(app, Method::GET, uri, None).await
    }
}
