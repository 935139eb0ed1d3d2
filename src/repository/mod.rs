//! SQLite persistence for the word index.
//!
//! Repositories wrap sync Diesel in `spawn_blocking` (see [`pool`]) and store
//! timestamps as RFC 3339 text.

use chrono::{DateTime, Utc};

pub mod document;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod search_log;
pub mod session;

pub use document::DieselDocumentRepository;
pub use search_log::DieselSearchRepository;
pub use session::DieselSessionRepository;

/// Parse an RFC 3339 timestamp column, falling back to now on corrupt rows.
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Parse an optional RFC 3339 timestamp column.
pub(crate) fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.as_deref().map(parse_datetime)
}

// Helper struct for SQL query results
#[derive(diesel::QueryableByName)]
pub(crate) struct LastInsertRowId {
    #[diesel(sql_type = diesel::sql_types::BigInt, column_name = "last_insert_rowid()")]
    pub id: i64,
}
