//! Shared helpers for router tests.
//!
//! Each test builds its own mock-mode app seeded with the demo deliveries,
//! so tests never share state.

#![allow(dead_code, clippy::unwrap_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use chrono::Local;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use beezetrack_server::app;
use beezetrack_server::config::{BeezeTrackConfig, GuardMode, UploadConfig};
use beezetrack_server::services::deliveries::generator;
use beezetrack_server::state::AppState;
use beezetrack_server::store::{DataStore, MockStore};

/// An app plus the temp directory its uploads go to.
pub struct TestApp {
    pub router: Router,
    pub uploads: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_guard(GuardMode::Enforce)
    }

    pub fn with_guard(route_guard: GuardMode) -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let config = BeezeTrackConfig {
            uploads: UploadConfig {
                dir: uploads.path().to_path_buf(),
                max_bytes: 1024,
            },
            route_guard,
            ..BeezeTrackConfig::default()
        };
        let seed = generator::demo_deliveries(Local::now().date_naive(), &mut rand::rng());
        let state = AppState::new(config, DataStore::Mock(MockStore::ephemeral(seed)));

        Self {
            router: app(state),
            uploads,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send a JSON request, optionally with a session cookie.
    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> (StatusCode, Value, Option<String>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self.send(builder.body(body).unwrap()).await;
        let status = response.status();
        let cookie = session_cookie(&response);
        let value = read_json(response).await;
        (status, value, cookie)
    }

    /// Log in through the API and return the session cookie.
    pub async fn login(&self, email: &str) -> String {
        let (status, _, cookie) = self
            .json(
                "POST",
                "/api/auth/login",
                Some(serde_json::json!({ "email": email, "password": "anything" })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        cookie.unwrap()
    }
}

/// The `name=value` part of the session `Set-Cookie` header.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("bzt_session="))
        .and_then(|v| v.split(';').next())
        .map(String::from)
}

pub async fn read_body(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn read_json(response: Response<Body>) -> Value {
    let body = read_body(response).await;
    if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&body).unwrap()
    }
}
