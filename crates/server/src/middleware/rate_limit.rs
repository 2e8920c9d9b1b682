//! Per-client rate limiting for the login, signup and delivery endpoints.
//!
//! Clients are keyed by the first address found in the proxy headers, then by
//! the peer address the server recorded in `ConnectInfo`. Only requests with
//! neither (in-process tests) share the loopback bucket.
//!
//! Rejections render as `{"error": "..."}` like every other API error.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

use crate::error::AppError;

/// Headers consulted for the client address, in order.
///
/// `x-forwarded-for` may carry a chain; the first entry is the client.
const CLIENT_IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-forwarded-for", "x-real-ip"];

/// Keys requests by client IP.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();
        let ip = CLIENT_IP_HEADERS
            .iter()
            .filter_map(|name| headers.get(*name)?.to_str().ok())
            .find_map(|value| value.split(',').next()?.trim().parse().ok())
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        Ok(ip)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Login and signup: one token every 6 seconds, burst of 5.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("auth rate limiter quota is non-zero");
    GovernorLayer::new(Arc::new(config)).error_handler(rate_limit_response)
}

/// Delivery API: one token per second, burst of 50.
#[must_use]
pub fn api_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(1)
        .burst_size(50)
        .finish()
        .expect("api rate limiter quota is non-zero");
    GovernorLayer::new(Arc::new(config)).error_handler(rate_limit_response)
}

/// Render a governor rejection through `AppError`, keeping any quota headers.
fn rate_limit_response(error: GovernorError) -> Response {
    match error {
        GovernorError::TooManyRequests { wait_time, headers } => {
            let mut response = AppError::RateLimited {
                retry_after_secs: wait_time,
            }
            .into_response();
            if let Some(headers) = headers {
                response.headers_mut().extend(headers);
            }
            response
        }
        other => AppError::Internal(format!("rate limiter: {other}")).into_response(),
    }
}
