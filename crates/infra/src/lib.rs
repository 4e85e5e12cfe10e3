//! # Slotwise Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - Database implementations (SQLite)
//! - HTTP client implementations
//! - External calendar collaborator adapter
//! - Webhook signing, SSRF guarding, and the delivery worker
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `slotwise-core`
//! - Depends on `slotwise-domain` and `slotwise-core`
//! - Contains all "impure" code (I/O, network)

pub mod calendar;
pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod webhooks;

pub use errors::InfraError;
