//! Error-to-response mapping.
//!
//! Every handler error becomes a structured `{error, message}` JSON body.
//! Messages come from the domain error display impls, which never embed raw
//! SQL or transport detail.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use slotwise_domain::SlotwiseError;
use tracing::error;

/// Wrapper turning a domain error into an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub SlotwiseError);

impl From<SlotwiseError> for ApiError {
    fn from(value: SlotwiseError) -> Self {
        ApiError(value)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, label) = match &self.0 {
            SlotwiseError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            SlotwiseError::SlotUnavailable(_) => (StatusCode::CONFLICT, "slot_unavailable"),
            SlotwiseError::AlreadyCancelled(_) => (StatusCode::CONFLICT, "already_cancelled"),
            SlotwiseError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            SlotwiseError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),
            SlotwiseError::Network(_) => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),
            SlotwiseError::Delivery(_)
            | SlotwiseError::Database(_)
            | SlotwiseError::Config(_)
            | SlotwiseError::Internal(_) => {
                error!(error = %self.0, "internal error serving request");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        };
        let body = ErrorBody { error: label, message: self.0.to_string() };
        (status, Json(body)).into_response()
    }
}
