//! Business logic services.
//!
//! Services are constructed per request from the stores held in `AppState`.

pub mod auth;
pub mod deliveries;
pub mod uploads;

pub use auth::{AuthError, AuthService};
pub use deliveries::{DeliveryError, DeliveryService};
pub use uploads::{UploadError, UploadStore};
