//! Error newtype that keeps conversions on the infrastructure side and can be
//! converted back into the domain error.

use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;
use slotwise_domain::SlotwiseError;

#[derive(Debug)]
pub struct InfraError(pub SlotwiseError);

impl From<InfraError> for SlotwiseError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<SlotwiseError> for InfraError {
    fn from(value: SlotwiseError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → SlotwiseError */
/* -------------------------------------------------------------------------- */

impl From<SqlError> for InfraError {
    fn from(err: SqlError) -> Self {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        let domain = match err {
            RE::SqliteFailure(code, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match code.code {
                    ErrorCode::DatabaseBusy => SlotwiseError::Database("database is busy".into()),
                    ErrorCode::DatabaseLocked => {
                        SlotwiseError::Database("database is locked".into())
                    }
                    ErrorCode::ConstraintViolation => SlotwiseError::Database(format!(
                        "constraint violation (code {}): {}",
                        code.extended_code, message
                    )),
                    _ => SlotwiseError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        code.code, code.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => {
                SlotwiseError::NotFound("no rows returned by query".into())
            }
            other => SlotwiseError::Database(other.to_string()),
        };
        InfraError(domain)
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → SlotwiseError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(err: r2d2::Error) -> Self {
        InfraError(SlotwiseError::Database(format!("connection pool error: {err}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → SlotwiseError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(err: HttpError) -> Self {
        let domain = if err.is_timeout() {
            SlotwiseError::Network(format!("request timed out: {err}"))
        } else if err.is_connect() {
            SlotwiseError::Network(format!("connection failed: {err}"))
        } else if err.is_builder() {
            SlotwiseError::InvalidInput(format!("malformed request: {err}"))
        } else {
            SlotwiseError::Network(err.to_string())
        };
        InfraError(domain)
    }
}
