use chrono::Local;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, StatefulWidget, Table, TableState, Widget},
};

use crate::controller::Snapshot;
use crate::session::Session;
use crate::util::{format_total, truncate_to_width};

const NAME_WIDTH: usize = 24;

/// Pure presenter for a single history row
pub fn present_row(session: &Session) -> Row<'static> {
    let started = session
        .start_time
        .with_timezone(&Local)
        .format("%m-%d %H:%M")
        .to_string();
    let ended = session
        .end_time
        .map(|end| end.with_timezone(&Local).format("%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "open".to_string());

    Row::new(vec![
        Cell::from(started),
        Cell::from(ended),
        Cell::from(format_total(session.total_focus_seconds)),
        Cell::from(format_total(session.total_rest_seconds)),
        Cell::from(truncate_to_width(&session.name, NAME_WIDTH)),
    ])
}

pub fn render_browser(snapshot: &Snapshot, area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Session History ({})", snapshot.sessions.len()));

    if snapshot.sessions.is_empty() {
        Paragraph::new("No sessions found.")
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .block(block)
            .render(area, buf);
        return;
    }

    let header = Row::new(vec!["Started", "Ended", "Focus", "Rest", "Name"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );
    let rows: Vec<Row> = snapshot.sessions.iter().map(present_row).collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(9),
            Constraint::Length(9),
            Constraint::Min(8),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(
        Style::default()
            .fg(Color::White)
            .bg(Color::Rgb(125, 86, 244)),
    )
    .highlight_symbol("→ ");

    let mut state = TableState::default().with_selected(Some(snapshot.selected));
    StatefulWidget::render(table, area, buf, &mut state);
}
