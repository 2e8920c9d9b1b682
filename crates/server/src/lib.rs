//! BeezeTrack delivery tracking server library.
//!
//! The router is built by [`app`] so it can be driven in-process by tests as
//! well as served by the binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, header},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::get,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::services::uploads::UPLOADS_URL_PREFIX;
use crate::state::AppState;
use crate::store::DataStore;

/// Bundled stylesheet.
const APP_CSS: &str = include_str!("../static/app.css");

/// Multipart framing allowance on top of the image size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the full application router.
///
/// Sessions live in memory in mock mode and in `PostgreSQL` otherwise.
pub fn app(state: AppState) -> Router {
    let body_limit = state.uploads().max_bytes() + MULTIPART_OVERHEAD_BYTES;

    let router = routes::routes()
        .route("/static/app.css", get(stylesheet))
        .nest_service(UPLOADS_URL_PREFIX, ServeDir::new(state.uploads().dir()))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::route_guard_middleware,
        ))
        .layer(DefaultBodyLimit::max(body_limit));

    let router = match state.store() {
        DataStore::Mock(_) => router.layer(middleware::memory_session_layer(state.config())),
        DataStore::Postgres(pool) => {
            router.layer(middleware::postgres_session_layer(pool, state.config()))
        }
    };

    router
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn stylesheet() -> impl IntoResponse {
    (
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/css; charset=utf-8"),
        )],
        APP_CSS,
    )
}
