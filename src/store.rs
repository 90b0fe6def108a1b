use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use crate::error::Result;
use crate::session::{Session, Split, SplitStatus};

/// Durable storage for sessions and their splits.
///
/// Implementations hold no business rules beyond keeping splits attached to
/// an existing session. Errors are passed through unchanged; nothing is
/// retried.
pub trait SessionStore {
    fn create_session(&mut self, name: &str) -> Result<Session>;
    /// Most recently started session, `None` when the store is empty
    fn get_last_session(&self) -> Result<Option<Session>>;
    fn get_session(&self, id: i64) -> Result<Option<Session>>;
    /// All sessions, most recent first
    fn get_all_sessions(&self) -> Result<Vec<Session>>;
    /// Removes the session and every split that references it
    fn delete_session(&mut self, id: i64) -> Result<()>;
    fn close_session(&mut self, id: i64) -> Result<()>;
    /// Recomputes totals from the split rows and stamps the end time
    fn update_session_totals(&mut self, id: i64) -> Result<()>;

    fn create_split(&mut self, session_id: i64, focus_minutes: u32, rest_minutes: u32)
        -> Result<Split>;
    fn update_split(&mut self, split: &Split) -> Result<()>;
    /// Splits of one session in the order they were started
    fn get_splits(&self, session_id: i64) -> Result<Vec<Split>>;
    /// Cancels splits left `in_progress` by a previous run, returning how many
    fn reconcile_orphaned_splits(&mut self) -> Result<usize>;
}

const SCHEMA: &str = r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT DEFAULT CURRENT_TIMESTAMP,
        total_focus_seconds INTEGER NOT NULL DEFAULT 0,
        total_rest_seconds INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS pomodoro_splits (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id INTEGER NOT NULL,
        focus_minutes INTEGER NOT NULL,
        rest_minutes INTEGER NOT NULL,
        start_time TEXT NOT NULL,
        end_time TEXT,
        status TEXT NOT NULL DEFAULT 'in_progress',
        actual_focus_seconds INTEGER NOT NULL DEFAULT 0,
        actual_rest_seconds INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (session_id) REFERENCES sessions (id)
    );

    CREATE INDEX IF NOT EXISTS idx_sessions_start_time ON sessions(start_time);
    CREATE INDEX IF NOT EXISTS idx_pomodoro_splits_session ON pomodoro_splits(session_id);
"#;

const SESSION_COLUMNS: &str =
    "id, name, start_time, end_time, total_focus_seconds, total_rest_seconds";

const SPLIT_COLUMNS: &str = "id, session_id, focus_minutes, rest_minutes, start_time, end_time, \
     status, actual_focus_seconds, actual_rest_seconds";

const TOTALS_ASSIGNMENT: &str = r#"
    total_focus_seconds = (
        SELECT COALESCE(SUM(actual_focus_seconds), 0)
        FROM pomodoro_splits
        WHERE session_id = ?1
    ),
    total_rest_seconds = (
        SELECT COALESCE(SUM(actual_rest_seconds), 0)
        FROM pomodoro_splits
        WHERE session_id = ?1
    )
"#;

/// Fixed-width UTC text so that lexical order is chronological order
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts our own RFC 3339 text and SQLite's `CURRENT_TIMESTAMP` form
pub fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    match DateTime::parse_from_rfc3339(s) {
        Ok(ts) => Ok(ts.with_timezone(&Utc)),
        Err(e) => NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .map(|naive| naive.and_utc())
            .map_err(|_| e),
    }
}

fn timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn optional_timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => parse_timestamp(&raw).map(Some).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        }),
        None => Ok(None),
    }
}

fn session_from_row(row: &Row) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        name: row.get(1)?,
        start_time: timestamp_column(row, 2)?,
        end_time: optional_timestamp_column(row, 3)?,
        total_focus_seconds: row.get(4)?,
        total_rest_seconds: row.get(5)?,
    })
}

fn split_from_row(row: &Row) -> rusqlite::Result<Split> {
    let status_raw: String = row.get(6)?;
    let status = SplitStatus::from_db(&status_raw).ok_or_else(|| {
        rusqlite::Error::InvalidColumnType(6, "status".to_string(), rusqlite::types::Type::Text)
    })?;

    Ok(Split {
        id: row.get(0)?,
        session_id: row.get(1)?,
        focus_minutes: row.get(2)?,
        rest_minutes: row.get(3)?,
        start_time: timestamp_column(row, 4)?,
        end_time: optional_timestamp_column(row, 5)?,
        status,
        actual_focus_seconds: row.get(7)?,
        actual_rest_seconds: row.get(8)?,
    })
}

/// SQLite-backed [`SessionStore`]
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if needed) the database file and its schema
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        debug!("opened session database at {}", path.display());
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}

impl SessionStore for SqliteStore {
    fn create_session(&mut self, name: &str) -> Result<Session> {
        let now = Utc::now();
        let stamp = format_timestamp(now);
        self.conn.execute(
            "INSERT INTO sessions (name, start_time, end_time) VALUES (?1, ?2, ?3)",
            params![name, stamp, stamp],
        )?;
        let id = self.conn.last_insert_rowid();
        info!("created session {} ({})", id, name);

        // Reload through the stored text so in-memory and on-disk precision agree
        Ok(Session {
            id,
            name: name.to_string(),
            start_time: parse_timestamp(&stamp).unwrap_or(now),
            end_time: Some(parse_timestamp(&stamp).unwrap_or(now)),
            total_focus_seconds: 0,
            total_rest_seconds: 0,
        })
    }

    fn get_last_session(&self) -> Result<Option<Session>> {
        let sql = format!(
            "SELECT {} FROM sessions ORDER BY start_time DESC, id DESC LIMIT 1",
            SESSION_COLUMNS
        );
        let session = self
            .conn
            .query_row(&sql, [], session_from_row)
            .optional()?;
        Ok(session)
    }

    fn get_session(&self, id: i64) -> Result<Option<Session>> {
        let sql = format!("SELECT {} FROM sessions WHERE id = ?1", SESSION_COLUMNS);
        let session = self
            .conn
            .query_row(&sql, params![id], session_from_row)
            .optional()?;
        Ok(session)
    }

    fn get_all_sessions(&self) -> Result<Vec<Session>> {
        let sql = format!(
            "SELECT {} FROM sessions ORDER BY start_time DESC, id DESC",
            SESSION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], session_from_row)?;

        let mut sessions = Vec::new();
        for session in rows {
            sessions.push(session?);
        }
        Ok(sessions)
    }

    fn delete_session(&mut self, id: i64) -> Result<()> {
        let tx = self.conn.transaction()?;
        let splits = tx.execute(
            "DELETE FROM pomodoro_splits WHERE session_id = ?1",
            params![id],
        )?;
        tx.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        tx.commit()?;

        info!("deleted session {} with {} splits", id, splits);
        Ok(())
    }

    fn close_session(&mut self, id: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE sessions SET end_time = ?2 WHERE id = ?1",
            params![id, format_timestamp(Utc::now())],
        )?;
        Ok(())
    }

    fn update_session_totals(&mut self, id: i64) -> Result<()> {
        let sql = format!(
            "UPDATE sessions SET end_time = ?2, {} WHERE id = ?1",
            TOTALS_ASSIGNMENT
        );
        self.conn
            .execute(&sql, params![id, format_timestamp(Utc::now())])?;
        Ok(())
    }

    fn create_split(
        &mut self,
        session_id: i64,
        focus_minutes: u32,
        rest_minutes: u32,
    ) -> Result<Split> {
        let now = Utc::now();
        let stamp = format_timestamp(now);
        self.conn.execute(
            r#"
            INSERT INTO pomodoro_splits (session_id, focus_minutes, rest_minutes, start_time, status)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                session_id,
                focus_minutes,
                rest_minutes,
                stamp,
                SplitStatus::InProgress.to_string()
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        info!(
            "created split {} for session {} ({}m focus / {}m rest)",
            id, session_id, focus_minutes, rest_minutes
        );

        Ok(Split {
            id,
            session_id,
            focus_minutes,
            rest_minutes,
            start_time: parse_timestamp(&stamp).unwrap_or(now),
            end_time: None,
            status: SplitStatus::InProgress,
            actual_focus_seconds: 0,
            actual_rest_seconds: 0,
        })
    }

    fn update_split(&mut self, split: &Split) -> Result<()> {
        let changed = self.conn.execute(
            r#"
            UPDATE pomodoro_splits
            SET end_time = ?2, status = ?3, actual_focus_seconds = ?4, actual_rest_seconds = ?5
            WHERE id = ?1
            "#,
            params![
                split.id,
                split.end_time.map(format_timestamp),
                split.status.to_string(),
                split.actual_focus_seconds,
                split.actual_rest_seconds,
            ],
        )?;
        if changed == 0 {
            debug!("update for split {} matched no rows", split.id);
        }
        Ok(())
    }

    fn get_splits(&self, session_id: i64) -> Result<Vec<Split>> {
        let sql = format!(
            "SELECT {} FROM pomodoro_splits WHERE session_id = ?1 ORDER BY start_time, id",
            SPLIT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![session_id], split_from_row)?;

        let mut splits = Vec::new();
        for split in rows {
            splits.push(split?);
        }
        Ok(splits)
    }

    fn reconcile_orphaned_splits(&mut self) -> Result<usize> {
        let tx = self.conn.transaction()?;

        let session_ids: Vec<i64> = {
            let mut stmt = tx.prepare(
                "SELECT DISTINCT session_id FROM pomodoro_splits WHERE status = 'in_progress'",
            )?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            let ids = rows.collect::<rusqlite::Result<Vec<i64>>>()?;
            ids
        };

        let reconciled = tx.execute(
            r#"
            UPDATE pomodoro_splits
            SET status = 'cancelled', end_time = COALESCE(end_time, start_time)
            WHERE status = 'in_progress'
            "#,
            [],
        )?;

        let totals_sql = format!("UPDATE sessions SET {} WHERE id = ?1", TOTALS_ASSIGNMENT);
        for session_id in &session_ids {
            tx.execute(&totals_sql, params![session_id])?;
        }
        tx.commit()?;

        if reconciled > 0 {
            warn!(
                "cancelled {} split(s) left in progress by a previous run across {} session(s)",
                reconciled,
                session_ids.len()
            );
        }
        Ok(reconciled)
    }
}
