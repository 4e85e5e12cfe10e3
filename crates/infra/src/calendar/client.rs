//! HTTP adapter for an external busy-calendar service.
//!
//! Transport failures surface as `Upstream` errors so the conflict checker
//! can apply its configured fallback; they are never silently treated as
//! "no busy time".

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use slotwise_core::BusyCalendarPort;
use slotwise_domain::{BusyInterval, Result, SlotwiseError};
use tracing::{debug, instrument};

use crate::http::HttpClient;

#[derive(Debug, Deserialize)]
struct BusyIntervalDto {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Client for a calendar service exposing `GET {base}/busy`.
pub struct HttpBusyCalendar {
    http: HttpClient,
    base_url: String,
}

impl HttpBusyCalendar {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BusyCalendarPort for HttpBusyCalendar {
    #[instrument(skip(self))]
    async fn busy_intervals(
        &self,
        host_id: &str,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>> {
        let url = format!("{}/busy", self.base_url);
        let request = self.http.request(Method::GET, &url).query(&[
            ("host_id", host_id.to_string()),
            ("from", range_start.to_rfc3339()),
            ("to", range_end.to_rfc3339()),
        ]);

        let response = self
            .http
            .send(request)
            .await
            .map_err(|e| SlotwiseError::Upstream(format!("calendar request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SlotwiseError::Upstream(format!(
                "calendar service returned {status} for host '{host_id}'"
            )));
        }

        let intervals: Vec<BusyIntervalDto> = response
            .json()
            .await
            .map_err(|e| SlotwiseError::Upstream(format!("malformed calendar response: {e}")))?;

        debug!(host_id, count = intervals.len(), "fetched external busy intervals");
        Ok(intervals
            .into_iter()
            .map(|dto| BusyInterval::new(dto.start, dto.end))
            .collect())
    }
}

/// No-op calendar for deployments without an external calendar connection.
pub struct NullBusyCalendar;

#[async_trait]
impl BusyCalendarPort for NullBusyCalendar {
    async fn busy_intervals(
        &self,
        _host_id: &str,
        _range_start: DateTime<Utc>,
        _range_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>> {
        Ok(Vec::new())
    }
}
