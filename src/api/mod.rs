//! API layer - HTTP handlers and routing
//!
//! JSON API over the blog service, mounted at `/api/v1`:
//! - Post, category and tag reads for the public site
//! - Admin writes, cache reset, snapshot export/import and images, guarded
//!   by the admin token when one is configured

pub mod admin;
pub mod categories;
pub mod middleware;
pub mod posts;
pub mod responses;
pub mod tags;
pub mod upload;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

pub use middleware::{ApiError, AppState};

/// Build the API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let admin_routes = Router::new()
        .nest("/admin/posts", posts::admin_router())
        .nest("/admin/categories", categories::admin_router())
        .nest("/admin/tags", tags::admin_router())
        .nest("/admin/images", upload::router())
        .nest("/admin", admin::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_admin,
        ));

    Router::new()
        .nest("/posts", posts::router())
        .nest("/categories", categories::router())
        .nest("/tags", tags::router())
        .merge(admin_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, server: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);
    let cors = match server.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!("Ignoring invalid CORS origin: {}", server.cors_origin);
            cors
        }
    };

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
