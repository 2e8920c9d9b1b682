//! BeezeTrack Core - Shared domain types.
//!
//! This crate provides the types used across all BeezeTrack components:
//! - `server` - REST API and server-rendered pages
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Statistics derivation lives here because it is a pure fold
//! over delivery statuses.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, tracking numbers, statuses and statistics

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
