//! Slot generation over resolved availability windows

mod generator;

pub use generator::{candidate_interval, generate_slots, local_to_utc, SlotQuery};
