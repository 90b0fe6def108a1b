//! Non-interactive views of the history: CSV export and a plain listing.

use chrono::{DateTime, Local, Utc};
use itertools::Itertools;
use serde::Serialize;
use std::io::Write;

use crate::error::Result;
use crate::session::Session;
use crate::store::{format_timestamp, SessionStore};
use crate::util::{format_total, humanize_since};

#[derive(Debug, Serialize)]
struct SplitRow<'a> {
    session_id: i64,
    session_name: &'a str,
    split_id: i64,
    focus_minutes: u32,
    rest_minutes: u32,
    start_time: String,
    end_time: Option<String>,
    status: String,
    actual_focus_seconds: u32,
    actual_rest_seconds: u32,
}

/// Write every split, grouped by session (most recent session first).
/// Returns the number of split rows written.
pub fn export_csv<S: SessionStore, W: Write>(store: &S, writer: W) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut rows = 0;

    for session in store.get_all_sessions()? {
        for split in store.get_splits(session.id)? {
            wtr.serialize(SplitRow {
                session_id: session.id,
                session_name: &session.name,
                split_id: split.id,
                focus_minutes: split.focus_minutes,
                rest_minutes: split.rest_minutes,
                start_time: format_timestamp(split.start_time),
                end_time: split.end_time.map(format_timestamp),
                status: split.status.to_string(),
                actual_focus_seconds: split.actual_focus_seconds,
                actual_rest_seconds: split.actual_rest_seconds,
            })?;
            rows += 1;
        }
    }

    wtr.flush()?;
    Ok(rows)
}

fn listing_line(session: &Session, now: DateTime<Utc>) -> String {
    let started = session.start_time.with_timezone(&Local);
    let last_active = session
        .end_time
        .map(|end| humanize_since(end, now))
        .unwrap_or_else(|| "open".to_string());

    format!(
        "{:>4}  {}  focus {:>8}  rest {:>8}  last active {}  {}",
        session.id,
        started.format("%Y-%m-%d %H:%M"),
        format_total(session.total_focus_seconds),
        format_total(session.total_rest_seconds),
        last_active,
        session.name
    )
}

/// One line per session, most recent first
pub fn render_listing(sessions: &[Session], now: DateTime<Utc>) -> String {
    if sessions.is_empty() {
        return "No sessions found.".to_string();
    }
    sessions.iter().map(|s| listing_line(s, now)).join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SplitStatus;
    use crate::store::SqliteStore;

    #[test]
    fn export_writes_header_and_rows() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let session = store.create_session("Morning, deep work").unwrap();
        let mut split = store.create_split(session.id, 25, 5).unwrap();
        split.status = SplitStatus::Completed;
        split.end_time = Some(Utc::now());
        split.actual_focus_seconds = 1500;
        split.actual_rest_seconds = 300;
        store.update_split(&split).unwrap();
        store.create_split(session.id, 10, 0).unwrap();

        let mut out = Vec::new();
        let rows = export_csv(&store, &mut out).unwrap();
        assert_eq!(rows, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("session_id,session_name,split_id"));
        // names with commas are quoted
        assert!(lines[1].contains("\"Morning, deep work\""));
        assert!(lines[1].contains("completed,1500,300"));
        assert!(lines[2].contains("in_progress,0,0"));
    }

    #[test]
    fn export_empty_store_writes_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        let mut out = Vec::new();
        assert_eq!(export_csv(&store, &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn listing_empty() {
        assert_eq!(render_listing(&[], Utc::now()), "No sessions found.");
    }

    #[test]
    fn listing_shows_totals_and_name() {
        let now = Utc::now();
        let session = Session {
            id: 7,
            name: "Writing".into(),
            start_time: now - chrono::Duration::hours(2),
            end_time: Some(now - chrono::Duration::hours(1)),
            total_focus_seconds: 3000,
            total_rest_seconds: 600,
        };
        let text = render_listing(&[session], now);
        assert!(text.contains("Writing"));
        assert!(text.contains("50:00"));
        assert!(text.contains("10:00"));
        assert!(text.contains("ago"));
    }
}
