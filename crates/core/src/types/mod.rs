//! Core types for BeezeTrack.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod statistics;
pub mod status;
pub mod tracking;

pub use email::{Email, EmailError};
pub use id::*;
pub use statistics::DeliveryStatistics;
pub use status::*;
pub use tracking::{TrackingNumber, TrackingNumberError};
