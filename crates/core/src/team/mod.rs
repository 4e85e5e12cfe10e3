//! Team scheduling arbitration: round-robin and collective selection

mod arbitrator;
pub mod ports;

pub use arbitrator::TeamArbitrator;
