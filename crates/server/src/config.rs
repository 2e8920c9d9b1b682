//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Data
//! - `BEEZETRACK_MOCK_MODE` - Simulate the backend in memory (default: true)
//! - `BEEZETRACK_DATABASE_URL` - `PostgreSQL` connection string, required when
//!   mock mode is off (falls back to `DATABASE_URL`)
//! - `BEEZETRACK_MOCK_SNAPSHOT` - JSON file persisting mock users and deliveries
//!
//! ## Server
//! - `BEEZETRACK_HOST` - Bind address (default: 127.0.0.1)
//! - `BEEZETRACK_PORT` - Listen port (default: 5000)
//! - `BEEZETRACK_BASE_URL` - Public URL (default: <http://localhost:5000>)
//! - `BEEZETRACK_ROUTE_GUARD` - `enforce` or `bypass` (default: enforce)
//!
//! ## Uploads
//! - `BEEZETRACK_UPLOAD_DIR` - Where package images are written (default: static/uploads)
//! - `BEEZETRACK_MAX_UPLOAD_BYTES` - Largest accepted image (default: 5 MiB)
//!
//! ## Error tracking
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Default upload size limit (5 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where users and deliveries live.
#[derive(Debug, Clone)]
pub enum DataMode {
    /// In-process state, optionally persisted to a JSON snapshot.
    Mock {
        /// Snapshot file path, if persistence is wanted.
        snapshot: Option<PathBuf>,
    },
    /// `PostgreSQL`-backed repositories.
    Database {
        /// Connection URL (contains password).
        url: SecretString,
    },
}

impl DataMode {
    /// Whether the backend is simulated.
    #[must_use]
    pub const fn is_mock(&self) -> bool {
        matches!(self, Self::Mock { .. })
    }
}

/// Behaviour of the page route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuardMode {
    /// Redirect anonymous visitors away from protected pages.
    #[default]
    Enforce,
    /// Let every request through.
    Bypass,
}

impl FromStr for GuardMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enforce" => Ok(Self::Enforce),
            "bypass" => Ok(Self::Bypass),
            other => Err(format!("expected 'enforce' or 'bypass', got '{other}'")),
        }
    }
}

/// Package image upload settings.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory uploaded images are written to; served under `/static/uploads`.
    pub dir: PathBuf,
    /// Maximum accepted image size in bytes.
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("static/uploads"),
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct BeezeTrackConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: Url,
    /// Mock or database-backed data
    pub data: DataMode,
    /// Image upload settings
    pub uploads: UploadConfig,
    /// Page route guard behaviour
    pub route_guard: GuardMode,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl Default for BeezeTrackConfig {
    /// Local mock-mode configuration without persistence.
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
            base_url: Url::parse("http://localhost:5000").unwrap_or_else(|_| unreachable!()),
            data: DataMode::Mock { snapshot: None },
            uploads: UploadConfig::default(),
            route_guard: GuardMode::Enforce,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }
}

impl BeezeTrackConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("BEEZETRACK_HOST", "127.0.0.1")?;
        let port = parse_env("BEEZETRACK_PORT", "5000")?;
        let base_url = parse_env("BEEZETRACK_BASE_URL", "http://localhost:5000")?;

        let mock_mode = parse_bool("BEEZETRACK_MOCK_MODE", true)?;
        let data = if mock_mode {
            DataMode::Mock {
                snapshot: get_optional_env("BEEZETRACK_MOCK_SNAPSHOT").map(PathBuf::from),
            }
        } else {
            DataMode::Database {
                url: get_database_url("BEEZETRACK_DATABASE_URL")?,
            }
        };

        let uploads = UploadConfig {
            dir: PathBuf::from(get_env_or_default("BEEZETRACK_UPLOAD_DIR", "static/uploads")),
            max_bytes: parse_env(
                "BEEZETRACK_MAX_UPLOAD_BYTES",
                &DEFAULT_MAX_UPLOAD_BYTES.to_string(),
            )?,
        };

        let route_guard = parse_env("BEEZETRACK_ROUTE_GUARD", "enforce")?;

        Ok(Self {
            host,
            port,
            base_url,
            data,
            uploads,
            route_guard,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable (or its default) with `FromStr`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a boolean flag, accepting `true/false`, `1/0`, `yes/no`, `on/off`.
fn parse_bool(key: &str, default: bool) -> Result<bool, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |raw| parse_flag(key, &raw))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}
