pub mod browser;
pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::controller::{AppState, Snapshot};
use crate::util::format_total;

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const CONTENT_WIDTH: u16 = 72;

pub const TITLE: &str = "ROMODORO";

/// Everything a frame needs: the controller snapshot plus the setup line
#[derive(Debug)]
pub struct View<'a> {
    pub snapshot: &'a Snapshot,
    pub input: &'a str,
}

impl<'a> View<'a> {
    pub fn new(snapshot: &'a Snapshot, input: &'a str) -> Self {
        Self { snapshot, input }
    }
}

pub(crate) fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

pub(crate) fn hint_style() -> Style {
    Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::ITALIC)
}

/// Narrow, horizontally centred column the screens draw into
fn content_column(area: Rect) -> Rect {
    let width = area.width.min(CONTENT_WIDTH);
    Rect {
        x: area.x + (area.width - width) / 2,
        width,
        ..area
    }
}

fn shows_session_header(state: AppState) -> bool {
    matches!(
        state,
        AppState::TimerSetup(_) | AppState::Running | AppState::Paused
    )
}

fn render_session_header(snapshot: &Snapshot, area: Rect, buf: &mut Buffer) {
    let Some(session) = &snapshot.session else {
        return;
    };

    let lines = vec![
        Line::from(vec![Span::raw("Session: "), Span::styled(&session.name, bold())]),
        Line::from(format!(
            "Total focus: {}   Total rest: {}",
            format_total(session.total_focus_seconds),
            format_total(session.total_rest_seconds)
        )),
    ];
    Paragraph::new(lines)
        .style(Style::default().fg(Color::Green))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .render(area, buf);
}

impl Widget for &View<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snapshot = self.snapshot;
        let header_height = if shows_session_header(snapshot.state) && snapshot.session.is_some() {
            4
        } else {
            0
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),             // title
                Constraint::Length(header_height), // session header
                Constraint::Min(3),                // screen body
                Constraint::Length(1),             // notice
                Constraint::Length(1),             // legend
            ])
            .split(area);

        Paragraph::new(Span::styled(
            TITLE,
            bold().fg(Color::White).bg(Color::Rgb(125, 86, 244)),
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        if header_height > 0 {
            render_session_header(snapshot, content_column(chunks[1]), buf);
        }

        let screen = screen::current_screen(snapshot.state);
        screen.render(self, content_column(chunks[2]), buf);

        if let Some(notice) = &snapshot.notice {
            Paragraph::new(Span::styled(notice.as_str(), bold().fg(Color::Red)))
                .alignment(Alignment::Center)
                .render(chunks[3], buf);
        }

        Paragraph::new(Span::styled(screen.legend(), hint_style()))
            .alignment(Alignment::Center)
            .render(chunks[4], buf);
    }
}
