//! Shared handler state.

use std::sync::Arc;

use slotwise_core::BookingService;

/// State injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    pub bookings: Arc<BookingService>,
}

impl AppState {
    pub fn new(bookings: Arc<BookingService>) -> Self {
        Self { bookings }
    }
}
