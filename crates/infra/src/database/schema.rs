//! Schema migrations.

use rusqlite::Connection;
use slotwise_domain::Result;
use tracing::info;

use crate::errors::InfraError;

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Apply the schema if the database is older than [`SCHEMA_VERSION`].
///
/// The statements are idempotent, so re-running against an up-to-date
/// database is harmless.
pub fn migrate(conn: &Connection) -> Result<()> {
    let version: i32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(InfraError::from)?;

    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    conn.execute_batch(SCHEMA_SQL).map_err(InfraError::from)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION).map_err(InfraError::from)?;

    info!(from = version, to = SCHEMA_VERSION, "database schema migrated");
    Ok(())
}
