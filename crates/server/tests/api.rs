//! Router tests for the JSON API in mock mode.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode, header},
};
use serde_json::json;

use common::{TestApp, read_json};

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();

    let (status, body, _) = app.json("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");

    let (status, body, _) = app.json("GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _, _) = app.json("GET", "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_then_me() {
    let app = TestApp::new();

    let (status, body, cookie) = app
        .json(
            "POST",
            "/api/auth/register",
            Some(json!({
                "name": "Jo Courier",
                "email": "Jo@Example.com",
                "password": "correct horse",
                "confirmPassword": "correct horse",
                "city": "Denver",
            })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "jo@example.com");
    assert_eq!(body["user"]["city"], "Denver");
    assert!(body["user"].get("passwordHash").is_none());

    let (status, body, _) = app
        .json("GET", "/api/auth/me", None, cookie.as_deref())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Jo Courier");
}

#[tokio::test]
async fn test_register_validation_and_conflict() {
    let app = TestApp::new();
    let signup = |email: &str, password: &str, confirm: &str| {
        json!({
            "name": "Jo Courier",
            "email": email,
            "password": password,
            "confirmPassword": confirm,
        })
    };

    let (status, body, _) = app
        .json(
            "POST",
            "/api/auth/register",
            Some(signup("jo@example.com", "short", "short")),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("at least 8"));

    let (status, body, _) = app
        .json(
            "POST",
            "/api/auth/register",
            Some(signup("jo@example.com", "correct horse", "correct horsE")),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Passwords do not match");

    let (status, _, _) = app
        .json(
            "POST",
            "/api/auth/register",
            Some(signup("jo@example.com", "correct horse", "correct horse")),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _, _) = app
        .json(
            "POST",
            "/api/auth/register",
            Some(signup("JO@example.com", "correct horse", "correct horse")),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_mock_login_creates_account() {
    let app = TestApp::new();
    let cookie = app.login("jane.doe@example.com").await;

    let (status, body, _) = app.json("GET", "/api/auth/me", None, Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Jane Doe");
}

#[tokio::test]
async fn test_protected_api_requires_session() {
    let app = TestApp::new();

    for uri in ["/api/auth/me", "/api/deliveries", "/api/deliveries/statistics"] {
        let (status, body, _) = app.json("GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::new();
    let cookie = app.login("jo@example.com").await;

    let (status, _, _) = app
        .json("POST", "/api/auth/logout", None, Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = app.json("GET", "/api/auth/me", None, Some(&cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_add_delivery_increments_total() {
    let app = TestApp::new();
    let cookie = app.login("jo@example.com").await;

    let (_, before, _) = app
        .json("GET", "/api/deliveries/statistics", None, Some(&cookie))
        .await;

    let (status, body, _) = app
        .json(
            "POST",
            "/api/deliveries",
            Some(json!({ "from": "Austin, TX" })),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["delivery"]["from"], "Austin, TX");
    assert_ne!(body["delivery"]["to"], "Austin, TX");
    assert!(
        body["delivery"]["trackingNumber"]
            .as_str()
            .unwrap()
            .starts_with("BZ")
    );

    let (_, after, _) = app
        .json("GET", "/api/deliveries/statistics", None, Some(&cookie))
        .await;
    assert_eq!(
        after["statistics"]["totalDeliveries"].as_u64().unwrap(),
        before["statistics"]["totalDeliveries"].as_u64().unwrap() + 1
    );
}

#[tokio::test]
async fn test_schedule_pickup() {
    let app = TestApp::new();
    let cookie = app.login("jo@example.com").await;

    let (status, body, _) = app
        .json(
            "POST",
            "/api/deliveries/schedule",
            Some(json!({
                "pickupAddress": "1 Main St",
                "pickupCity": "New York",
                "pickupState": "NY",
                "pickupZip": "10001",
                "deliveryAddress": "2 Sunset Blvd",
                "deliveryCity": "Los Angeles",
                "deliveryState": "CA",
                "deliveryZip": "90001",
                "packageType": "document",
                "weight": "2",
                "pickupTime": "evening",
            })),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let delivery = &body["delivery"];
    assert_eq!(delivery["status"], "Pending");
    assert_eq!(delivery["from"], "New York, NY");
    assert_eq!(delivery["to"], "Los Angeles, CA");
    assert_eq!(delivery["packageType"], "Express Document");
    assert_eq!(delivery["weight"], "2 lbs");
    assert_eq!(delivery["pickup"]["time"], "05:00 PM");
    let updates = delivery["updates"].as_array().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0]["status"], "Order Placed");
}

#[tokio::test]
async fn test_schedule_rejects_missing_fields() {
    let app = TestApp::new();
    let cookie = app.login("jo@example.com").await;

    let (status, body, _) = app
        .json(
            "POST",
            "/api/deliveries/schedule",
            Some(json!({ "pickupCity": "New York", "weight": "2" })),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Pickup state is required");
}

#[tokio::test]
async fn test_track_known_and_unknown_numbers() {
    let app = TestApp::new();

    let (status, body, _) = app
        .json(
            "POST",
            "/api/deliveries/track",
            Some(json!({ "trackingNumber": "bz345678" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["placeholder"], false);
    assert_eq!(body["delivery"]["trackingNumber"], "BZ345678");
    assert_eq!(body["delivery"]["status"], "In-Transit");

    let (status, body, _) = app
        .json(
            "POST",
            "/api/deliveries/track",
            Some(json!({ "trackingNumber": "UNKNOWN123" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["placeholder"], true);
    assert_eq!(body["delivery"]["trackingNumber"], "UNKNOWN123");

    let (status, _, _) = app
        .json(
            "POST",
            "/api/deliveries/track",
            Some(json!({ "trackingNumber": "not a number!" })),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_placeholder_is_not_stored() {
    let app = TestApp::new();
    let cookie = app.login("jo@example.com").await;

    let (_, before, _) = app
        .json("GET", "/api/deliveries/statistics", None, Some(&cookie))
        .await;
    app.json(
        "POST",
        "/api/deliveries/track",
        Some(json!({ "trackingNumber": "BZ000001" })),
        None,
    )
    .await;
    let (_, after, _) = app
        .json("GET", "/api/deliveries/statistics", None, Some(&cookie))
        .await;

    assert_eq!(
        before["statistics"]["totalDeliveries"],
        after["statistics"]["totalDeliveries"]
    );
}

#[tokio::test]
async fn test_status_update_appends_timeline_entry() {
    let app = TestApp::new();
    let cookie = app.login("jo@example.com").await;

    let (_, created, _) = app
        .json("POST", "/api/deliveries", Some(json!({})), Some(&cookie))
        .await;
    let id = created["delivery"]["id"].as_i64().unwrap();
    let updates_before = created["delivery"]["updates"].as_array().unwrap().len();

    let (status, body, _) = app
        .json(
            "PUT",
            &format!("/api/deliveries/{id}/status"),
            Some(json!({ "status": "Delivered" })),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["delivery"]["status"], "Delivered");
    let updates = body["delivery"]["updates"].as_array().unwrap();
    assert_eq!(updates.len(), updates_before + 1);
    assert_eq!(
        updates.last().unwrap()["description"],
        "Package status updated to Delivered."
    );

    let (_, stats, _) = app
        .json("GET", "/api/deliveries/statistics", None, Some(&cookie))
        .await;
    assert_eq!(stats["statistics"]["onTimeDeliveryRate"], 95);

    let (status, body, _) = app
        .json(
            "PUT",
            &format!("/api/deliveries/{id}/status"),
            Some(json!({ "status": "Lost" })),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("In-Transit"));
}

#[tokio::test]
async fn test_other_users_delivery_is_forbidden() {
    let app = TestApp::new();
    let owner = app.login("owner@example.com").await;
    let other = app.login("other@example.com").await;

    let (_, created, _) = app
        .json("POST", "/api/deliveries", Some(json!({})), Some(&owner))
        .await;
    let id = created["delivery"]["id"].as_i64().unwrap();

    let (status, body, _) = app
        .json("GET", &format!("/api/deliveries/{id}"), None, Some(&other))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _, _) = app
        .json(
            "PUT",
            &format!("/api/deliveries/{id}/status"),
            Some(json!({ "status": "Cancelled" })),
            Some(&other),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = app
        .json("GET", "/api/deliveries/999999", None, Some(&other))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list, _) = app.json("GET", "/api/deliveries", None, Some(&other)).await;
    let ids: Vec<i64> = list["deliveries"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["id"].as_i64())
        .collect();
    assert!(!ids.contains(&id));
    assert_eq!(ids.len(), 4);
}

#[tokio::test]
async fn test_profile_update() {
    let app = TestApp::new();
    let cookie = app.login("jo@example.com").await;

    let (status, body, _) = app
        .json(
            "PUT",
            "/api/auth/profile",
            Some(json!({ "name": "Jo Q. Courier", "phone": "555-0100", "company": "" })),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["name"], "Jo Q. Courier");
    assert_eq!(body["user"]["phone"], "555-0100");
    assert!(body["user"].get("company").is_none());

    let (status, _, _) = app
        .json(
            "PUT",
            "/api/auth/profile",
            Some(json!({ "name": "J" })),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_password_change_validation() {
    let app = TestApp::new();
    let cookie = app.login("jo@example.com").await;

    let (status, _, _) = app
        .json(
            "PUT",
            "/api/auth/password",
            Some(json!({
                "currentPassword": "anything",
                "newPassword": "new password",
                "confirmPassword": "other password",
            })),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body, _) = app
        .json(
            "PUT",
            "/api/auth/password",
            Some(json!({
                "currentPassword": "anything",
                "newPassword": "new password",
                "confirmPassword": "new password",
            })),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password updated");
}

fn multipart_request(uri: &str, cookie: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "beezetrack-test-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_image_upload() {
    let app = TestApp::new();
    let cookie = app.login("jo@example.com").await;

    let (_, created, _) = app
        .json("POST", "/api/deliveries", Some(json!({})), Some(&cookie))
        .await;
    let id = created["delivery"]["id"].as_i64().unwrap();
    let uri = format!("/api/deliveries/{id}/image");

    let response = app
        .send(multipart_request(&uri, &cookie, "box.png", b"\x89PNG fake"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    let image_url = body["delivery"]["imageUrl"].as_str().unwrap().to_string();
    assert!(image_url.starts_with("/static/uploads/"));

    let served = app
        .send(
            Request::builder()
                .uri(&image_url)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(served.status(), StatusCode::OK);

    let response = app
        .send(multipart_request(&uri, &cookie, "notes.txt", b"hello"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(multipart_request(&uri, &cookie, "huge.png", &[0_u8; 2048]))
        .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_malformed_requests_get_json_errors() {
    let app = TestApp::new();
    let cookie = app.login("jo@example.com").await;

    let (status, body, _) = app
        .json("POST", "/api/deliveries/track", Some(json!({})), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Tracking number is required");

    let (status, body, _) = app
        .json("GET", "/api/deliveries/abc", None, Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("abc"));

    let (status, body, _) = app
        .json(
            "PUT",
            "/api/auth/profile",
            Some(json!({ "name": 42 })),
            Some(&cookie),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert!(read_json(response).await["error"].is_string());
}

fn login_from(peer: &str, email: &str) -> Request<Body> {
    let mut request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "email": email, "password": "anything" }).to_string(),
        ))
        .unwrap();
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}

#[tokio::test]
async fn test_login_rate_limit_is_per_client() {
    let app = TestApp::new();

    for n in 0..5 {
        let response = app
            .send(login_from("192.0.2.1:40000", &format!("user{n}@example.com")))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .send(login_from("192.0.2.1:40001", "user5@example.com"))
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = read_json(response).await;
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .starts_with("Too many requests")
    );

    let response = app
        .send(login_from("192.0.2.2:40000", "other@example.com"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}
