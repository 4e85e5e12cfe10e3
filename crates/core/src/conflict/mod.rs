//! Conflict arbitration against internal bookings and external busy time

mod checker;
pub mod ports;

pub use checker::{CalendarFallback, ConflictChecker};
