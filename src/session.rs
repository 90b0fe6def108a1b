use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// A named block of work made of one or more splits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub name: String,
    pub start_time: DateTime<Utc>,
    /// Absent only for rows written by something other than this crate;
    /// every session we create starts with `end_time == start_time`.
    pub end_time: Option<DateTime<Utc>>,
    pub total_focus_seconds: u32,
    pub total_rest_seconds: u32,
}

impl Session {
    pub fn total_seconds(&self) -> u32 {
        self.total_focus_seconds + self.total_rest_seconds
    }

    /// Default label for sessions the user did not name
    pub fn generated_name(now: DateTime<Local>, format: &str) -> String {
        now.format(format).to_string()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SplitStatus {
    InProgress,
    Completed,
    Cancelled,
}

impl SplitStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(SplitStatus::InProgress),
            "completed" => Some(SplitStatus::Completed),
            "cancelled" => Some(SplitStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SplitStatus::InProgress)
    }
}

/// One focus+rest pairing: the plan (minutes) and the outcome (seconds)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub id: i64,
    pub session_id: i64,
    pub focus_minutes: u32,
    pub rest_minutes: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: SplitStatus,
    pub actual_focus_seconds: u32,
    pub actual_rest_seconds: u32,
}

impl Split {
    pub fn planned_focus_seconds(&self) -> u32 {
        self.focus_minutes * 60
    }

    pub fn planned_rest_seconds(&self) -> u32 {
        self.rest_minutes * 60
    }
}

/// Which half of a split is counting down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
pub enum Phase {
    Focus,
    Rest,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn status_display_matches_stored_text() {
        assert_eq!(SplitStatus::InProgress.to_string(), "in_progress");
        assert_eq!(SplitStatus::Completed.to_string(), "completed");
        assert_eq!(SplitStatus::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn status_from_db_roundtrips_display() {
        for status in [
            SplitStatus::InProgress,
            SplitStatus::Completed,
            SplitStatus::Cancelled,
        ] {
            assert_eq!(SplitStatus::from_db(&status.to_string()), Some(status));
        }
        assert_eq!(SplitStatus::from_db("paused"), None);
    }

    #[test]
    fn only_in_progress_is_open() {
        assert!(!SplitStatus::InProgress.is_terminal());
        assert!(SplitStatus::Completed.is_terminal());
        assert!(SplitStatus::Cancelled.is_terminal());
    }

    #[test]
    fn generated_name_uses_format() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            Session::generated_name(now, "Session_%Y-%m-%d_%H-%M-%S"),
            "Session_2024-03-09_07-05-01"
        );
    }

    #[test]
    fn planned_seconds() {
        let split = Split {
            id: 1,
            session_id: 1,
            focus_minutes: 25,
            rest_minutes: 5,
            start_time: Utc::now(),
            end_time: None,
            status: SplitStatus::InProgress,
            actual_focus_seconds: 0,
            actual_rest_seconds: 0,
        };
        assert_eq!(split.planned_focus_seconds(), 1500);
        assert_eq!(split.planned_rest_seconds(), 300);
    }
}
