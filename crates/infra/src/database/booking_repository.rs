//! SQLite-backed booking store.
//!
//! `insert_if_free` is the storage half of the double-booking guarantee: the
//! overlap re-check and the insert run inside one `BEGIN IMMEDIATE`
//! transaction, so concurrent commits for the same host serialize on the
//! write lock and exactly one wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, TransactionBehavior};
use slotwise_core::{BookingReadRepository, BookingStore};
use slotwise_domain::{
    Booking, BookingStatus, BusyInterval, Guest, Result, SlotwiseError,
};
use tracing::{debug, instrument};

use super::{from_epoch, SqlitePool};
use crate::errors::InfraError;

pub struct SqliteBookingRepository {
    pool: SqlitePool,
}

impl SqliteBookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn status_to_str(status: BookingStatus) -> &'static str {
    match status {
        BookingStatus::Pending => "PENDING",
        BookingStatus::Confirmed => "CONFIRMED",
        BookingStatus::Cancelled => "CANCELLED",
        // Derived at read time, never written.
        BookingStatus::Completed => "CONFIRMED",
    }
}

fn status_from_str(text: &str) -> Result<BookingStatus> {
    match text {
        "PENDING" => Ok(BookingStatus::Pending),
        "CONFIRMED" => Ok(BookingStatus::Confirmed),
        "CANCELLED" => Ok(BookingStatus::Cancelled),
        other => Err(SlotwiseError::Database(format!("unknown booking status '{other}'"))),
    }
}

type BookingRow =
    (String, String, String, String, String, String, i64, i64, String, Option<String>, i64);

const BOOKING_COLUMNS: &str = "id, event_type_id, host_id, guest_name, guest_email, \
     guest_timezone, start_ts, end_ts, status, recurrence_parent_id, created_at";

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<BookingRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
    ))
}

fn into_booking(row: BookingRow) -> Result<Booking> {
    let (
        id,
        event_type_id,
        host_id,
        guest_name,
        guest_email,
        guest_timezone,
        start_ts,
        end_ts,
        status,
        recurrence_parent_id,
        created_at,
    ) = row;
    Ok(Booking {
        id,
        event_type_id,
        host_id,
        guest: Guest { name: guest_name, email: guest_email, timezone: guest_timezone },
        start: from_epoch(start_ts)?,
        end: from_epoch(end_ts)?,
        status: status_from_str(&status)?,
        recurrence_parent_id,
        created_at: from_epoch(created_at)?,
    })
}

fn insert_booking(conn: &Connection, booking: &Booking) -> Result<()> {
    conn.execute(
        "INSERT INTO bookings (
            id, event_type_id, host_id, guest_name, guest_email, guest_timezone,
            start_ts, end_ts, status, recurrence_parent_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            booking.id,
            booking.event_type_id,
            booking.host_id,
            booking.guest.name,
            booking.guest.email,
            booking.guest.timezone,
            booking.start.timestamp(),
            booking.end.timestamp(),
            status_to_str(booking.status),
            booking.recurrence_parent_id,
            booking.created_at.timestamp(),
        ],
    )
    .map_err(InfraError::from)?;
    Ok(())
}

/// True when the host has a pending or confirmed booking whose
/// buffer-inflated interval overlaps `interval` (half-open comparison).
fn host_has_overlap(conn: &Connection, host_id: &str, interval: &BusyInterval) -> Result<bool> {
    let exists: bool = conn
        .query_row(
            "SELECT EXISTS (
                SELECT 1
                FROM bookings b
                JOIN event_types et ON et.id = b.event_type_id
                WHERE b.host_id = ?1
                  AND b.status IN ('PENDING', 'CONFIRMED')
                  AND (b.start_ts - et.buffer_before_min * 60) < ?3
                  AND (b.end_ts + et.buffer_after_min * 60) > ?2
            )",
            params![host_id, interval.start.timestamp(), interval.end.timestamp()],
            |row| row.get(0),
        )
        .map_err(InfraError::from)?;
    Ok(exists)
}

#[async_trait]
impl BookingReadRepository for SqliteBookingRepository {
    #[instrument(skip(self))]
    async fn active_intervals(
        &self,
        host_id: &str,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>> {
        let conn = self.pool.get()?;
        let mut stmt = conn
            .prepare(
                "SELECT b.start_ts - et.buffer_before_min * 60,
                        b.end_ts + et.buffer_after_min * 60
                 FROM bookings b
                 JOIN event_types et ON et.id = b.event_type_id
                 WHERE b.host_id = ?1
                   AND b.status IN ('PENDING', 'CONFIRMED')
                   AND (b.start_ts - et.buffer_before_min * 60) < ?3
                   AND (b.end_ts + et.buffer_after_min * 60) > ?2
                 ORDER BY b.start_ts",
            )
            .map_err(InfraError::from)?;

        let rows = stmt
            .query_map(
                params![host_id, range_start.timestamp(), range_end.timestamp()],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)),
            )
            .map_err(InfraError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(InfraError::from)?;

        rows.into_iter()
            .map(|(start, end)| Ok(BusyInterval::new(from_epoch(start)?, from_epoch(end)?)))
            .collect()
    }
}

#[async_trait]
impl BookingStore for SqliteBookingRepository {
    #[instrument(skip(self, booking), fields(booking_id = %booking.id, host_id = %booking.host_id))]
    async fn insert_if_free(
        &self,
        booking: &Booking,
        inflated: BusyInterval,
        competing_hosts: &[String],
    ) -> Result<()> {
        let mut conn = self.pool.get()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(InfraError::from)?;

        for host_id in competing_hosts {
            if host_has_overlap(&tx, host_id, &inflated)? {
                debug!(host_id, "overlap re-check failed inside commit transaction");
                return Err(SlotwiseError::SlotUnavailable(format!(
                    "slot at {} is no longer available",
                    booking.start
                )));
            }
        }

        insert_booking(&tx, booking)?;
        tx.commit().map_err(InfraError::from)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_booking(&self, id: &str) -> Result<Option<Booking>> {
        let conn = self.pool.get()?;
        let row = conn
            .query_row(
                &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
                params![id],
                read_row,
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(InfraError::from(other)),
            })?;
        row.map(into_booking).transpose()
    }

    #[instrument(skip(self))]
    async fn cancel(&self, id: &str) -> Result<Booking> {
        let mut conn = self.pool.get()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(InfraError::from)?;

        let row = tx
            .query_row(
                &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
                params![id],
                read_row,
            )
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    Err(InfraError(SlotwiseError::NotFound(format!("booking '{id}' not found"))))
                }
                other => Err(InfraError::from(other)),
            })?;
        let mut booking = into_booking(row)?;

        if booking.status == BookingStatus::Cancelled {
            return Err(SlotwiseError::AlreadyCancelled(format!(
                "booking '{id}' is already cancelled"
            )));
        }

        tx.execute("UPDATE bookings SET status = 'CANCELLED' WHERE id = ?1", params![id])
            .map_err(InfraError::from)?;
        tx.commit().map_err(InfraError::from)?;

        booking.status = BookingStatus::Cancelled;
        Ok(booking)
    }

    #[instrument(skip(self))]
    async fn cancel_series(&self, parent_id: &str) -> Result<Vec<Booking>> {
        let mut conn = self.pool.get()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(InfraError::from)?;

        let rows = {
            let mut stmt = tx
                .prepare(&format!(
                    "SELECT {BOOKING_COLUMNS} FROM bookings
                     WHERE recurrence_parent_id = ?1 AND status != 'CANCELLED'
                     ORDER BY start_ts"
                ))
                .map_err(InfraError::from)?;
            let rows = stmt
                .query_map(params![parent_id], read_row)
                .map_err(InfraError::from)?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(InfraError::from)?;
            rows
        };

        tx.execute(
            "UPDATE bookings SET status = 'CANCELLED'
             WHERE recurrence_parent_id = ?1 AND status != 'CANCELLED'",
            params![parent_id],
        )
        .map_err(InfraError::from)?;
        tx.commit().map_err(InfraError::from)?;

        rows.into_iter()
            .map(|row| {
                let mut booking = into_booking(row)?;
                booking.status = BookingStatus::Cancelled;
                Ok(booking)
            })
            .collect()
    }
}
