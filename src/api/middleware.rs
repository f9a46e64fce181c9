//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error envelope
//! - Admin token authorization

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::services::{BlogError, BlogService};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub blog: Arc<BlogService>,
    /// Bearer token guarding admin routes; `None` leaves them open
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(blog: Arc<BlogService>, admin_token: Option<String>) -> Self {
        Self {
            blog,
            admin_token: admin_token.filter(|t| !t.is_empty()).map(Arc::from),
        }
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn backend_error(message: impl Into<String>) -> Self {
        Self::new("BACKEND_ERROR", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl From<BlogError> for ApiError {
    fn from(err: BlogError) -> Self {
        match err {
            BlogError::NotFound(msg) => Self::not_found(msg),
            BlogError::Validation(msg) => Self::validation_error(msg),
            BlogError::Backend(e) => Self::backend_error(e.to_string()),
            BlogError::NotConfigured(msg) => Self::new("NOT_CONFIGURED", msg),
            BlogError::Internal(e) => Self::internal_error(format!("{:#}", e)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "BACKEND_ERROR" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// Extract a bearer token from the Authorization header
fn extract_bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Admin authorization middleware
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(ref expected) = state.admin_token {
        let token = extract_bearer_token(&request)
            .ok_or_else(|| ApiError::unauthorized("Missing admin token"))?;
        if token != expected.as_ref() {
            tracing::warn!("Rejected admin request to {}", request.uri().path());
            return Err(ApiError::unauthorized("Invalid admin token"));
        }
    }

    Ok(next.run(request).await)
}
