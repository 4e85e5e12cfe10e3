//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! booking engine.

// Slot generation
//
// Candidate start times are walked in fixed steps of
// `min(duration, SLOT_STEP_CAP_MIN)` minutes. Guests compare listed slots to
// what they book, so this granularity must stay stable.
pub const SLOT_STEP_CAP_MIN: i64 = 30;

// Round-robin arbitration
//
// Assignment counts are tallied over a trailing window when picking the
// least-loaded member.
pub const ROUND_ROBIN_WINDOW_DAYS: i64 = 30;

// Webhook delivery
//
// Exactly MAX_DELIVERY_ATTEMPTS total attempts per delivery. A failed attempt
// reschedules after the corresponding backoff step; after the final attempt
// the delivery is terminally failed.
pub const MAX_DELIVERY_ATTEMPTS: u32 = 3;
pub const RETRY_BACKOFF_SECS: [i64; 2] = [60, 300];
pub const DELIVERY_TIMEOUT_SECS: u64 = 30;

// Webhook wire format
pub const SIGNATURE_HEADER: &str = "X-Slotwise-Signature";
pub const TIMESTAMP_HEADER: &str = "X-Slotwise-Timestamp";
pub const EVENT_HEADER: &str = "X-Slotwise-Event";

// Error detail limits
pub const MAX_DELIVERY_ERROR_LEN: usize = 256;
