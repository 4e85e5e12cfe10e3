//! # Slotwise API
//!
//! HTTP surface of the booking engine: slot listing, booking commit, and
//! cancellation, served over axum. The binary in `main.rs` wires config,
//! storage, services, and the webhook delivery worker together.

pub mod error;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
