//! Session lifecycle: fresh-start wipe and latest-session lookup.

use chrono::Utc;
use diesel::prelude::*;

use super::models::{NewSession, SessionRecord};
use super::pool::{run_blocking, DieselError, SqlitePool};
use super::{parse_datetime, parse_datetime_opt, LastInsertRowId};
use crate::error::{Error, Result};
use crate::models::Session;
use crate::schema::{documents, extracted_texts, sessions};

impl From<SessionRecord> for Session {
    fn from(record: SessionRecord) -> Self {
        Session {
            id: record.session_id,
            start_time: parse_datetime(&record.start_time),
            end_time: parse_datetime_opt(record.end_time),
        }
    }
}

/// Session repository. The fresh-start transaction is the only destructive
/// mutation in the system.
#[derive(Clone)]
pub struct DieselSessionRepository {
    pool: SqlitePool,
}

impl DieselSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Start or continue a session.
    ///
    /// `fresh = true` wipes the index and opens a new session; `fresh = false`
    /// returns the most recently started session, failing if none exists.
    pub async fn start(&self, fresh: bool) -> Result<Session> {
        if fresh {
            self.start_fresh().await
        } else {
            self.latest().await?.ok_or(Error::NotFound("session"))
        }
    }

    /// Atomically close the open session, wipe all documents and word
    /// occurrences, and open a new session.
    ///
    /// Prior sessions and search results are retained as history. A
    /// concurrent reader sees the store strictly before or strictly after
    /// this transaction.
    pub async fn start_fresh(&self) -> Result<Session> {
        let now = Utc::now().to_rfc3339();
        let pool = self.pool.clone();

        let record = run_blocking(pool, move |conn| {
            conn.transaction::<_, DieselError, _>(|conn| {
                diesel::update(sessions::table.filter(sessions::end_time.is_null()))
                    .set(sessions::end_time.eq(&now))
                    .execute(conn)?;

                // extracted_texts first: cascade would also cover it, but the
                // explicit order never depends on pragma state
                diesel::delete(extracted_texts::table).execute(conn)?;
                diesel::delete(documents::table).execute(conn)?;

                diesel::insert_into(sessions::table)
                    .values(NewSession { start_time: &now })
                    .execute(conn)?;

                let rowid: LastInsertRowId =
                    diesel::sql_query("SELECT last_insert_rowid()").get_result(conn)?;

                sessions::table
                    .find(rowid.id as i32)
                    .first::<SessionRecord>(conn)
            })
        })
        .await?;

        tracing::info!(session_id = record.session_id, "started fresh session");
        Ok(record.into())
    }

    /// Most recently started session, open or closed.
    pub async fn latest(&self) -> Result<Option<Session>> {
        let pool = self.pool.clone();

        run_blocking(pool, |conn| {
            sessions::table
                .order((sessions::start_time.desc(), sessions::session_id.desc()))
                .first::<SessionRecord>(conn)
                .optional()
        })
        .await
        .map(|opt| opt.map(Session::from))
    }

    /// Get a session by id.
    pub async fn get(&self, id: i32) -> Result<Option<Session>> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            sessions::table
                .find(id)
                .first::<SessionRecord>(conn)
                .optional()
        })
        .await
        .map(|opt| opt.map(Session::from))
    }

    /// Count all sessions, including closed ones.
    pub async fn count(&self) -> Result<u64> {
        let pool = self.pool.clone();

        run_blocking(pool, |conn| {
            use diesel::dsl::count_star;
            let count: i64 = sessions::table.select(count_star()).first(conn)?;
            Ok(count as u64)
        })
        .await
    }

    /// Count sessions with no end time. The invariant is that this is 0 or 1.
    pub async fn open_count(&self) -> Result<u64> {
        let pool = self.pool.clone();

        run_blocking(pool, |conn| {
            use diesel::dsl::count_star;
            let count: i64 = sessions::table
                .filter(sessions::end_time.is_null())
                .select(count_star())
                .first(conn)?;
            Ok(count as u64)
        })
        .await
    }
}
