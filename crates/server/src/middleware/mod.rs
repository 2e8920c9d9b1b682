//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP, frame options, etc.)
//! 5. Session layer (memory or `PostgreSQL` store)
//! 6. Route guard (protected pages)
//! 7. Rate limiting on auth and API routes (governor)

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod route_guard;
pub mod security_headers;
pub mod session;

pub use auth::{
    OptionalAuth, RequireAuth, clear_current_user, refresh_current_user, set_current_user,
};
pub use rate_limit::{api_rate_limiter, auth_rate_limiter};
pub use request_id::request_id_middleware;
pub use route_guard::route_guard_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{
    SessionMemoryStore, memory_session_layer, postgres_session_layer,
    spawn_expired_session_cleanup,
};
