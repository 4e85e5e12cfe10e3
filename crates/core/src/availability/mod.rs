//! Availability resolution: weekly rules, date overrides, holiday blocking

pub mod ports;
mod resolver;

pub use resolver::AvailabilityResolver;
