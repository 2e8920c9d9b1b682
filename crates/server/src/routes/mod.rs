//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                         - Redirect to the dashboard
//! GET  /health                   - Liveness check
//! GET  /health/ready             - Readiness check (database mode pings the pool)
//! GET  /api/health               - API liveness check
//!
//! # Pages
//! GET  /login, POST /login       - Log in form
//! GET  /signup, POST /signup     - Sign up form
//! POST /logout                   - Log out
//! GET  /dashboard                - Statistics and delivery list
//! POST /dashboard/deliveries/{id}/status - Status change form
//! GET  /track?number=            - Tracking lookup
//! GET  /track/{tracking_number}  - Tracking lookup by path
//! GET  /schedule, POST /schedule - Pickup scheduling form
//! GET  /profile, POST /profile   - Profile form
//! GET  /settings                 - Settings page
//! POST /settings/password        - Password change form
//!
//! # API
//! /api/auth/*                    - See `api::auth`
//! /api/deliveries/*              - See `api::deliveries`
//! ```

pub mod account;
pub mod api;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod schedule;
pub mod track;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post, put},
};
use serde::Deserialize;

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Where logged-in users land.
pub const HOME_PATH: &str = "/dashboard";

/// Flash codes carried in the query string after a redirect.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub notice: Option<String>,
    pub error: Option<String>,
}

impl PageQuery {
    /// Message for the `notice` code, if it is a known one.
    #[must_use]
    pub fn notice_message(&self) -> Option<String> {
        let message = match self.notice.as_deref()? {
            "welcome" => "Welcome to BeezeTrack!",
            "logged_out" => "You have been logged out.",
            "scheduled" => "Pickup scheduled. Your package is on its way into our network.",
            "status_updated" => "Delivery status updated.",
            "profile_saved" => "Profile saved.",
            "password_changed" => "Password updated.",
            _ => return None,
        };
        Some(message.to_string())
    }

    /// Message for the `error` code, if it is a known one.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        let message = match self.error.as_deref()? {
            "status" => "Could not update that delivery.",
            "session" => "Your session could not be saved. Please try again.",
            _ => return None,
        };
        Some(message.to_string())
    }
}

/// Account API routes.
pub fn auth_api_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/register", post(api::auth::register))
        .route("/login", post(api::auth::login))
        .layer(auth_rate_limiter());

    Router::new()
        .merge(limited)
        .route("/logout", post(api::auth::logout))
        .route("/me", get(api::auth::me))
        .route("/profile", put(api::auth::update_profile))
        .route("/password", put(api::auth::change_password))
}

/// Delivery API routes.
pub fn delivery_api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(api::deliveries::list).post(api::deliveries::create),
        )
        .route("/schedule", post(api::deliveries::schedule))
        .route("/track", post(api::deliveries::track))
        .route("/statistics", get(api::deliveries::statistics))
        .route("/{id}", get(api::deliveries::show))
        .route("/{id}/status", put(api::deliveries::update_status))
        .route("/{id}/image", post(api::deliveries::upload_image))
        .layer(api_rate_limiter())
}

/// Login, signup and logout pages.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/signup", post(auth::signup))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/signup", get(auth::signup_page))
        .merge(limited)
        .route("/logout", post(auth::logout))
}

/// Pages behind the route guard.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::index))
        .route(
            "/dashboard/deliveries/{id}/status",
            post(dashboard::update_status),
        )
        .route("/track", get(track::search))
        .route("/track/{tracking_number}", get(track::show))
        .route("/schedule", get(schedule::form).post(schedule::submit))
        .route("/profile", get(account::profile).post(account::update_profile))
        .route("/settings", get(account::settings))
        .route("/settings/password", post(account::change_password))
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to(HOME_PATH) }))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/api/health", get(health::api_health))
        .merge(auth_routes())
        .merge(page_routes())
        .nest("/api/auth", auth_api_routes())
        .nest("/api/deliveries", delivery_api_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_flash_codes() {
        let query = PageQuery {
            notice: Some("scheduled".to_string()),
            error: Some("status".to_string()),
        };
        assert!(query.notice_message().is_some());
        assert_eq!(
            query.error_message().as_deref(),
            Some("Could not update that delivery.")
        );
    }

    #[test]
    fn test_unknown_flash_codes_are_ignored() {
        let query = PageQuery {
            notice: Some("<script>".to_string()),
            error: None,
        };
        assert_eq!(query.notice_message(), None);
        assert_eq!(query.error_message(), None);
    }
}
