//! Booking API routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use slotwise_domain::{Booking, BookingRequest, Guest, SlotwiseError};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct SlotsQuery {
    date: NaiveDate,
    /// Timezone the slot starts are rendered in. Defaults to UTC.
    timezone: Option<String>,
}

#[derive(Debug, Serialize)]
struct SlotsResponse {
    slots: Vec<String>,
}

/// `GET /event-types/{id}/slots?date=&timezone=`
///
/// The date is interpreted in the event type's own timezone; the response
/// renders each start in the requested one.
async fn list_slots(
    State(state): State<AppState>,
    Path(event_type_id): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<SlotsResponse>, ApiError> {
    let tz: Tz = query
        .timezone
        .as_deref()
        .unwrap_or("UTC")
        .parse()
        .map_err(|_| {
            SlotwiseError::InvalidInput(format!(
                "unknown timezone: {}",
                query.timezone.as_deref().unwrap_or_default()
            ))
        })?;

    let starts = state.bookings.list_slots(&event_type_id, query.date).await?;
    let slots = starts.iter().map(|start| start.with_timezone(&tz).to_rfc3339()).collect();
    Ok(Json(SlotsResponse { slots }))
}

#[derive(Debug, Deserialize)]
struct CreateBookingBody {
    event_type_id: String,
    start: DateTime<Utc>,
    guest: Guest,
    #[serde(default)]
    recurrence_parent_id: Option<String>,
}

/// `POST /bookings`
async fn create_booking(
    State(state): State<AppState>,
    Json(body): Json<CreateBookingBody>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let booking = state
        .bookings
        .create_booking(BookingRequest {
            event_type_id: body.event_type_id,
            start: body.start,
            guest: body.guest,
            recurrence_parent_id: body.recurrence_parent_id,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// `GET /bookings/{id}`: booking with its derived status.
async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
) -> Result<Json<Booking>, ApiError> {
    Ok(Json(state.bookings.get_booking(&booking_id).await?))
}

#[derive(Debug, Default, Deserialize)]
struct CancelBody {
    reason: Option<String>,
}

/// `POST /bookings/{id}/cancel`
async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<String>,
    body: Option<Json<CancelBody>>,
) -> Result<Json<Booking>, ApiError> {
    let reason = body.and_then(|Json(b)| b.reason);
    Ok(Json(state.bookings.cancel_booking(&booking_id, reason).await?))
}

/// `POST /booking-series/{parent_id}/cancel`: cancel every live occurrence
/// of a recurring series.
async fn cancel_series(
    State(state): State<AppState>,
    Path(parent_id): Path<String>,
    body: Option<Json<CancelBody>>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let reason = body.and_then(|Json(b)| b.reason);
    Ok(Json(state.bookings.cancel_series(&parent_id, reason).await?))
}

/// Build the booking API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/event-types/{id}/slots", get(list_slots))
        .route("/bookings", post(create_booking))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/cancel", post(cancel_booking))
        .route("/booking-series/{parent_id}/cancel", post(cancel_series))
        .with_state(state)
}
