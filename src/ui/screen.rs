use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};

use crate::controller::{AppState, SetupStep, TimerSnapshot};
use crate::error::SetupError;
use crate::session::Phase;
use crate::ui::{bold, browser::render_browser, hint_style, View};
use crate::util::format_duration;

/// A UI Screen boundary: draws the body for one controller state
pub trait Screen {
    fn render(&self, view: &View, area: Rect, buf: &mut Buffer);
    /// Key hints shown on the bottom line
    fn legend(&self) -> &'static str;
}

pub struct MainMenuScreen;

impl Screen for MainMenuScreen {
    fn render(&self, _view: &View, area: Rect, buf: &mut Buffer) {
        let lines = vec![
            Line::from(Span::styled("Welcome to Romodoro!", bold())),
            Line::from(""),
            Line::from("1. Continue Session"),
            Line::from("2. Browse Previous Sessions"),
            Line::from("3. Create New Session"),
        ];
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL))
            .render(area, buf);
    }

    fn legend(&self) -> &'static str {
        "(1) continue / (2) browse / (3) new / (q)uit"
    }
}

pub struct SetupScreen {
    step: SetupStep,
}

fn setup_prompt(step: SetupStep, error: Option<&SetupError>) -> String {
    let noun = match step {
        SetupStep::Focus => "focus",
        SetupStep::Rest => "rest",
    };
    match error {
        Some(e) => format!("Invalid {} time ({}). Enter {} time in minutes...", noun, e, noun),
        None => format!("Enter {} time in minutes...", noun),
    }
}

impl Screen for SetupScreen {
    fn render(&self, view: &View, area: Rect, buf: &mut Buffer) {
        let snapshot = view.snapshot;
        let mut lines = Vec::new();

        match self.step {
            SetupStep::Focus => lines.push(Line::from(Span::styled("Set Focus Time", bold()))),
            SetupStep::Rest => {
                lines.push(Line::from(Span::styled("Set Rest Time", bold())));
                if let Some(focus) = snapshot.pending_focus_minutes {
                    lines.push(Line::from(format!("Focus: {} minutes", focus)));
                }
            }
        }
        lines.push(Line::from(""));

        let input_line = if view.input.is_empty() {
            let style = if snapshot.setup_error.is_some() {
                Style::default().fg(Color::Red)
            } else {
                hint_style()
            };
            Span::styled(
                setup_prompt(self.step, snapshot.setup_error.as_ref()),
                style,
            )
        } else {
            Span::styled(format!("> {}", view.input), bold())
        };
        lines.push(Line::from(input_line));

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL))
            .render(area, buf);
    }

    fn legend(&self) -> &'static str {
        "type minutes + (enter) / (m)enu / (q)uit"
    }
}

pub struct TimerScreen {
    paused: bool,
}

fn phase_color(timer: &TimerSnapshot, paused: bool) -> Color {
    match (paused, timer.phase) {
        (true, _) => Color::Yellow,
        (false, Phase::Focus) => Color::Rgb(255, 107, 107),
        (false, Phase::Rest) => Color::Rgb(78, 205, 196),
    }
}

impl Screen for TimerScreen {
    fn render(&self, view: &View, area: Rect, buf: &mut Buffer) {
        let Some(timer) = &view.snapshot.timer else {
            return;
        };
        let color = phase_color(timer, self.paused);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color));
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // heading
                Constraint::Length(1), // gauge
                Constraint::Length(1),
                Constraint::Min(0), // details
            ])
            .split(inner);

        let heading = match (self.paused, timer.phase) {
            (true, _) => "PAUSED",
            (false, Phase::Focus) => "FOCUS TIME",
            (false, Phase::Rest) => "REST TIME",
        };
        Paragraph::new(Span::styled(heading, bold().fg(color)))
            .alignment(Alignment::Center)
            .render(chunks[0], buf);

        let ratio = timer.progress.clamp(0.0, 1.0);
        Gauge::default()
            .gauge_style(Style::default().fg(color))
            .ratio(ratio)
            .label(format!("{:.0}%", ratio * 100.0))
            .render(chunks[1], buf);

        let mut details = vec![Line::from(format!(
            "Time Remaining: {}",
            format_duration(timer.remaining_seconds)
        ))];
        if self.paused {
            details.push(Line::from(format!("Phase: {}", timer.phase)));
        } else {
            details.push(Line::from(format!(
                "Current Split: {}m focus / {}m rest",
                timer.focus_minutes, timer.rest_minutes
            )));
        }
        Paragraph::new(details)
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }

    fn legend(&self) -> &'static str {
        if self.paused {
            "(s)/(c) continue / (b)ack to session / (m)enu / (q)uit"
        } else {
            "(p)ause / (b)ack to session / (m)enu / (q)uit"
        }
    }
}

pub struct BrowserScreen;

impl Screen for BrowserScreen {
    fn render(&self, view: &View, area: Rect, buf: &mut Buffer) {
        render_browser(view.snapshot, area, buf);
    }

    fn legend(&self) -> &'static str {
        "(↑/k) (↓/j) navigate / (x) delete / (m)enu / (q)uit"
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: AppState) -> Box<dyn Screen> {
    match state {
        AppState::MainMenu => Box::new(MainMenuScreen),
        AppState::TimerSetup(step) => Box::new(SetupScreen { step }),
        AppState::Running => Box::new(TimerScreen { paused: false }),
        AppState::Paused => Box::new(TimerScreen { paused: true }),
        AppState::Browser => Box::new(BrowserScreen),
    }
}
