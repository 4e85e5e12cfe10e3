//! External calendar adapters for the BusyCalendarPort

mod client;

pub use client::{HttpBusyCalendar, NullBusyCalendar};
