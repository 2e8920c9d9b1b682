//! Integration tests for BeezeTrack.
//!
//! These tests drive a running server over HTTP. They are ignored by
//! default.
//!
//! # Running Tests
//!
//! ```bash
//! # Start the server (mock mode is enough for most tests)
//! cargo run -p beezetrack-server
//!
//! # Run integration tests
//! BEEZETRACK_TEST_URL=http://localhost:5000 cargo test -p beezetrack-integration-tests -- --ignored
//! ```

use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL of the server under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("BEEZETRACK_TEST_URL").unwrap_or_else(|_| "http://localhost:5000".to_string())
}

/// HTTP client that keeps the session cookie.
///
/// # Panics
///
/// Panics if the client cannot be built.
#[must_use]
#[allow(clippy::expect_used)]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// A unique address so repeated runs never collide.
#[must_use]
pub fn unique_email() -> String {
    format!("courier-{}@example.com", Uuid::new_v4().simple())
}

/// Register a fresh account and return a client logged in as it.
///
/// # Panics
///
/// Panics if registration fails.
#[allow(clippy::expect_used)]
pub async fn registered_client() -> (Client, Value) {
    let client = client();
    let response = client
        .post(format!("{}/api/auth/register", base_url()))
        .json(&json!({
            "name": "Integration Courier",
            "email": unique_email(),
            "password": "correct horse battery",
            "confirmPassword": "correct horse battery",
        }))
        .send()
        .await
        .expect("Failed to register");

    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let body: Value = response.json().await.expect("Invalid register response");
    (client, body["user"].clone())
}
