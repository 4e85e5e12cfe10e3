//! r2d2-backed SQLite connection pool

use std::path::Path;

use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;
use slotwise_domain::Result;

use crate::errors::InfraError;

/// Shared SQLite pool with WAL and busy-timeout pragmas applied per
/// connection.
///
/// WAL keeps slot-listing reads from blocking behind booking writes; the
/// busy timeout lets a second writer wait for the immediate-transaction lock
/// instead of failing instantly.
#[derive(Clone)]
pub struct SqlitePool {
    inner: r2d2::Pool<SqliteConnectionManager>,
}

impl SqlitePool {
    /// Open (creating if needed) the database at `path` and run migrations.
    pub fn open<P: AsRef<Path>>(path: P, pool_size: u32) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA busy_timeout = 5000;
                 PRAGMA foreign_keys = ON;",
            )
        });
        let inner =
            r2d2::Pool::builder().max_size(pool_size).build(manager).map_err(InfraError::from)?;

        let conn = inner.get().map_err(InfraError::from)?;
        super::schema::migrate(&conn)?;

        Ok(Self { inner })
    }

    /// Check a connection out of the pool.
    pub fn get(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.inner.get().map_err(InfraError::from)?)
    }
}
