//! Notification fan-out: committed booking events into queued deliveries

pub mod ports;
mod service;

pub use service::NotificationService;
