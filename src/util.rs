use chrono::{DateTime, Utc};
use time_humanize::HumanTime;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// `MM:SS`, with minutes allowed past 99
pub fn format_duration(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Longer totals read better with hours split out
pub fn format_total(seconds: u32) -> String {
    let hours = seconds / 3600;
    if hours == 0 {
        return format_duration(seconds);
    }
    format!("{}h {:02}m", hours, (seconds % 3600) / 60)
}

/// Rough "how long ago" label relative to `now`
pub fn humanize_since(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = (now - then).num_seconds().max(0);
    HumanTime::from_seconds(-age).to_string()
}

/// Cut `text` to at most `max_width` terminal columns, marking the cut with `…`
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}
