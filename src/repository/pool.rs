//! Diesel connection pool management for SQLite.
//!
//! diesel-async does not support SQLite, so operations use sync Diesel with
//! r2d2 connection pooling, wrapped in spawn_blocking.

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Diesel error type alias.
pub type DieselError = diesel::result::Error;

/// Connection pool for SQLite using r2d2.
pub type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

/// Pooled connection type.
pub type PooledConn = PooledConnection<ConnectionManager<SqliteConnection>>;

/// Create a Diesel connection pool for SQLite.
pub fn create_pool(db_path: &Path) -> Result<SqlitePool> {
    let db_url = format!("sqlite:{}", db_path.display());
    create_pool_from_url(&db_url)
}

/// Create a Diesel connection pool from a database URL.
pub fn create_pool_from_url(database_url: &str) -> Result<SqlitePool> {
    // Strip "sqlite:" prefix if present for Diesel
    let url = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

    let manager = ConnectionManager::<SqliteConnection>::new(url);

    Pool::builder()
        .max_size(10)
        .connection_timeout(Duration::from_secs(30))
        .connection_customizer(Box::new(ConnectionPragmas))
        .build(manager)
        .map_err(|e| Error::Connection(e.to_string()))
}

/// Initialize SQLite pragmas for a connection.
///
/// `foreign_keys` is per-connection state, so this runs on every acquisition.
pub fn init_connection_pragmas(conn: &mut SqliteConnection) -> std::result::Result<(), DieselError> {
    diesel::sql_query("PRAGMA journal_mode = WAL").execute(conn)?;
    diesel::sql_query("PRAGMA synchronous = NORMAL").execute(conn)?;
    diesel::sql_query("PRAGMA foreign_keys = ON").execute(conn)?;
    diesel::sql_query("PRAGMA busy_timeout = 5000").execute(conn)?;
    diesel::sql_query("PRAGMA temp_store = MEMORY").execute(conn)?;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct ConnectionPragmas;

impl diesel::r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionPragmas {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        init_connection_pragmas(conn).map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Run a blocking Diesel operation asynchronously.
///
/// Wraps a sync closure in spawn_blocking so Diesel operations can be used in
/// async contexts without blocking the runtime. Pool and task failures come
/// back as [`Error::Connection`], query failures as [`Error::Store`].
///
/// # Example
/// ```ignore
/// let count = run_blocking(pool.clone(), |conn| {
///     documents::table.select(count_star()).first::<i64>(conn)
/// }).await?;
/// ```
pub async fn run_blocking<F, T>(pool: SqlitePool, f: F) -> Result<T>
where
    F: FnOnce(&mut SqliteConnection) -> std::result::Result<T, DieselError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut conn = pool.get().map_err(|e| Error::Connection(e.to_string()))?;
        f(&mut conn).map_err(Error::Store)
    })
    .await
    .map_err(|e| Error::Connection(format!("blocking task failed: {e}")))?
}
