//! Booking commit path: re-validation, persistence, notification trigger

pub mod ports;
mod service;

pub use service::BookingService;
