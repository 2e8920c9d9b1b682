//! JSON API handlers.
//!
//! Every handler returns `Result<_, AppError>` so failures render as
//! `{"error": "..."}` with the matching status.

pub mod auth;
pub mod deliveries;

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON body extractor whose rejections render as `{"error": "..."}`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path extractor whose rejections render as `{"error": "..."}`.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Map a session store failure to an internal error.
pub(crate) fn session_error(err: &tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("session error: {err}"))
}
