//! Page route guard.
//!
//! Anonymous visitors requesting a protected page are redirected to the
//! login page. In [`GuardMode::Bypass`] every request passes through and
//! handlers render their logged-out state instead.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::debug;

use super::auth::{LOGIN_PATH, current_user};
use crate::config::GuardMode;
use crate::state::AppState;

/// Path prefixes that require a logged-in user.
pub const PROTECTED_PREFIXES: [&str; 5] =
    ["/dashboard", "/track", "/schedule", "/profile", "/settings"];

/// Whether `path` is a protected page.
#[must_use]
pub fn is_protected(path: &str) -> bool {
    PROTECTED_PREFIXES.iter().any(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Redirect anonymous requests for protected pages to the login page.
///
/// Must run inside the session layer.
pub async fn route_guard_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if state.config().route_guard == GuardMode::Bypass || !is_protected(request.uri().path()) {
        return next.run(request).await;
    }

    let logged_in = match request.extensions().get::<Session>() {
        Some(session) => current_user(session).await.is_some(),
        None => false,
    };

    if logged_in {
        next.run(request).await
    } else {
        debug!(path = %request.uri().path(), "Redirecting anonymous visitor to login");
        Redirect::to(LOGIN_PATH).into_response()
    }
}
