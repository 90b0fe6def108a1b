//! The session state machine.
//!
//! [`Controller`] is the only bridge between the [`TimerEngine`] and the
//! [`SessionStore`]. It takes one [`Intent`] or tick at a time, runs it to
//! completion, and leaves a consistent state behind: every path that ends a
//! split goes through [`Controller::finalize_split`], which writes the split
//! and then recomputes the session totals from storage.

use chrono::{Local, Utc};
use log::{debug, error, info, warn};

use crate::error::SetupError;
use crate::session::{Phase, Session, Split, SplitStatus};
use crate::store::SessionStore;
use crate::timer::{TickOutcome, TimerEngine};

/// Largest value the three-digit setup input can carry
pub const MAX_MINUTES: u32 = 999;

pub const DEFAULT_SESSION_NAME_FORMAT: &str = "Session_%Y-%m-%d_%H-%M-%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SetupStep {
    Focus,
    Rest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    MainMenu,
    TimerSetup(SetupStep),
    Running,
    Paused,
    Browser,
}

/// Everything the user can ask for, independent of which key produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    ContinueLast,
    Browse,
    NewSession,
    /// Raw text typed on the current setup step
    Submit(String),
    BackToMenu,
    /// Abandon the running split and plan the next one
    BackToSetup,
    Pause,
    Resume,
    SelectPrevious,
    SelectNext,
    DeleteSelected,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Notifications for the host, drained with [`Controller::drain_events`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    PhaseCompleted(Phase),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimerSnapshot {
    pub split_id: i64,
    pub focus_minutes: u32,
    pub rest_minutes: u32,
    pub phase: Phase,
    pub remaining_seconds: u32,
    pub total_seconds: u32,
    pub progress: f64,
    pub paused: bool,
}

/// Read-only view of the controller taken after a transition
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub state: AppState,
    pub session: Option<Session>,
    pub pending_focus_minutes: Option<u32>,
    pub setup_error: Option<SetupError>,
    pub timer: Option<TimerSnapshot>,
    pub sessions: Vec<Session>,
    pub selected: usize,
    pub notice: Option<String>,
}

fn parse_minutes(input: &str, min: u32) -> Result<u32, SetupError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SetupError::Empty);
    }

    let value: i64 = trimmed
        .parse()
        .map_err(|_| SetupError::NotANumber(trimmed.to_string()))?;

    if value < i64::from(min) || value > i64::from(MAX_MINUTES) {
        return Err(SetupError::OutOfRange {
            value,
            min,
            max: MAX_MINUTES,
        });
    }
    Ok(value as u32)
}

/// Focus must be a positive whole number of minutes
pub fn parse_focus_minutes(input: &str) -> Result<u32, SetupError> {
    parse_minutes(input, 1)
}

/// Rest may be zero
pub fn parse_rest_minutes(input: &str) -> Result<u32, SetupError> {
    parse_minutes(input, 0)
}

#[derive(Debug)]
struct ActiveSplit {
    split: Split,
    engine: TimerEngine,
}

#[derive(Debug)]
pub struct Controller<S: SessionStore> {
    store: S,
    state: AppState,
    session: Option<Session>,
    active: Option<ActiveSplit>,
    pending_focus: Option<u32>,
    setup_error: Option<SetupError>,
    sessions: Vec<Session>,
    selected: usize,
    notice: Option<String>,
    events: Vec<ControllerEvent>,
    session_name_format: String,
    next_session_name: Option<String>,
}

impl<S: SessionStore> Controller<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: AppState::MainMenu,
            session: None,
            active: None,
            pending_focus: None,
            setup_error: None,
            sessions: Vec::new(),
            selected: 0,
            notice: None,
            events: Vec::new(),
            session_name_format: DEFAULT_SESSION_NAME_FORMAT.to_string(),
            next_session_name: None,
        }
    }

    /// strftime pattern for generated session names
    pub fn with_session_name_format(mut self, format: impl Into<String>) -> Self {
        self.session_name_format = format.into();
        self
    }

    /// Use `name` for the next session created instead of a generated one
    pub fn with_session_name(mut self, name: Option<String>) -> Self {
        self.next_session_name = name.filter(|n| !n.trim().is_empty());
        self
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn current_split(&self) -> Option<&Split> {
        self.active.as_ref().map(|a| &a.split)
    }

    pub fn engine(&self) -> Option<&TimerEngine> {
        self.active.as_ref().map(|a| &a.engine)
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn drain_events(&mut self) -> Vec<ControllerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            session: self.session.clone(),
            pending_focus_minutes: self.pending_focus,
            setup_error: self.setup_error.clone(),
            timer: self.active.as_ref().map(|a| TimerSnapshot {
                split_id: a.split.id,
                focus_minutes: a.split.focus_minutes,
                rest_minutes: a.split.rest_minutes,
                phase: a.engine.phase(),
                remaining_seconds: a.engine.remaining_seconds(),
                total_seconds: a.engine.total_seconds(),
                progress: a.engine.progress(),
                paused: a.engine.is_paused(),
            }),
            sessions: self.sessions.clone(),
            selected: self.selected,
            notice: self.notice.clone(),
        }
    }

    pub fn handle(&mut self, intent: Intent) -> Flow {
        debug!("{:?} in {:?}", intent, self.state);
        self.notice = None;

        if intent == Intent::Quit {
            self.shutdown();
            return Flow::Exit;
        }

        match self.state {
            AppState::MainMenu => self.on_main_menu(intent),
            AppState::TimerSetup(step) => self.on_timer_setup(step, intent),
            AppState::Running => self.on_running(intent),
            AppState::Paused => self.on_paused(intent),
            AppState::Browser => self.on_browser(intent),
        }
        Flow::Continue
    }

    /// Advance the countdown by one second. Ignored unless running.
    pub fn tick(&mut self) {
        if self.state != AppState::Running {
            return;
        }
        let Some(active) = self.active.as_mut() else {
            warn!("tick while running without an active split");
            self.enter_setup();
            return;
        };

        match active.engine.tick() {
            TickOutcome::Running => {}
            TickOutcome::PhaseAdvanced => {
                info!("split {} moved to rest", active.split.id);
                self.events.push(ControllerEvent::PhaseCompleted(Phase::Focus));
            }
            TickOutcome::SplitComplete => {
                let (focus, rest) = active.engine.completed_seconds();
                self.events.push(ControllerEvent::PhaseCompleted(Phase::Rest));
                self.finalize_split(SplitStatus::Completed, focus, rest);
                self.enter_setup();
            }
        }
    }

    /// Cancel any split in flight and close the session. Safe to call twice.
    pub fn shutdown(&mut self) {
        self.interrupt_split();
        if let Some(session) = &self.session {
            if let Err(e) = self.store.close_session(session.id) {
                warn!("could not close session {}: {}", session.id, e);
            }
        }
    }

    fn on_main_menu(&mut self, intent: Intent) {
        match intent {
            Intent::ContinueLast => match self.store.get_last_session() {
                Ok(Some(session)) => {
                    info!("continuing session {} ({})", session.id, session.name);
                    self.session = Some(session);
                    self.enter_setup();
                }
                Ok(None) => {
                    debug!("no previous session, starting a new one");
                    self.create_session();
                }
                Err(e) => {
                    error!("could not load last session: {}", e);
                    self.notice = Some(format!("Could not load last session: {}", e));
                }
            },
            Intent::Browse => self.open_browser(),
            Intent::NewSession => self.create_session(),
            _ => {}
        }
    }

    fn on_timer_setup(&mut self, step: SetupStep, intent: Intent) {
        match (step, intent) {
            (_, Intent::BackToMenu) => {
                self.pending_focus = None;
                self.setup_error = None;
                self.state = AppState::MainMenu;
            }
            (SetupStep::Focus, Intent::Submit(text)) => match parse_focus_minutes(&text) {
                Ok(minutes) => {
                    self.pending_focus = Some(minutes);
                    self.setup_error = None;
                    self.state = AppState::TimerSetup(SetupStep::Rest);
                }
                Err(e) => self.setup_error = Some(e),
            },
            (SetupStep::Rest, Intent::Submit(text)) => match parse_rest_minutes(&text) {
                Ok(rest) => self.start_split(rest),
                Err(e) => self.setup_error = Some(e),
            },
            _ => {}
        }
    }

    fn on_running(&mut self, intent: Intent) {
        match intent {
            Intent::Pause => {
                if let Some(active) = self.active.as_mut() {
                    active.engine.pause();
                }
                self.state = AppState::Paused;
            }
            Intent::BackToSetup => {
                self.interrupt_split();
                self.enter_setup();
            }
            Intent::BackToMenu => {
                self.interrupt_split();
                self.state = AppState::MainMenu;
            }
            _ => {}
        }
    }

    fn on_paused(&mut self, intent: Intent) {
        match intent {
            Intent::Resume => {
                if let Some(active) = self.active.as_mut() {
                    active.engine.resume();
                }
                self.state = AppState::Running;
            }
            Intent::BackToSetup => {
                self.interrupt_split();
                self.enter_setup();
            }
            Intent::BackToMenu => {
                self.interrupt_split();
                self.state = AppState::MainMenu;
            }
            _ => {}
        }
    }

    fn on_browser(&mut self, intent: Intent) {
        match intent {
            Intent::SelectPrevious => {
                self.selected = self.selected.saturating_sub(1);
            }
            Intent::SelectNext => {
                if self.selected + 1 < self.sessions.len() {
                    self.selected += 1;
                }
            }
            Intent::DeleteSelected => self.delete_selected(),
            Intent::BackToMenu => self.state = AppState::MainMenu,
            _ => {}
        }
    }

    fn enter_setup(&mut self) {
        self.pending_focus = None;
        self.setup_error = None;
        self.state = AppState::TimerSetup(SetupStep::Focus);
    }

    fn create_session(&mut self) {
        let name = self.next_session_name.take().unwrap_or_else(|| {
            Session::generated_name(Local::now(), &self.session_name_format)
        });

        match self.store.create_session(&name) {
            Ok(session) => {
                self.session = Some(session);
                self.enter_setup();
            }
            Err(e) => {
                error!("could not create session {}: {}", name, e);
                self.notice = Some(format!("Could not create session: {}", e));
                self.state = AppState::MainMenu;
            }
        }
    }

    fn start_split(&mut self, rest_minutes: u32) {
        let Some(focus_minutes) = self.pending_focus else {
            self.enter_setup();
            return;
        };
        let Some(session_id) = self.session.as_ref().map(|s| s.id) else {
            warn!("timer setup without a session");
            self.state = AppState::MainMenu;
            return;
        };

        match self
            .store
            .create_split(session_id, focus_minutes, rest_minutes)
        {
            Ok(split) => {
                self.active = Some(ActiveSplit {
                    split,
                    engine: TimerEngine::start(focus_minutes, rest_minutes),
                });
                self.pending_focus = None;
                self.setup_error = None;
                self.state = AppState::Running;
            }
            Err(e) => {
                error!("could not create split: {}", e);
                self.enter_setup();
                self.notice = Some(format!("Could not start timer: {}", e));
            }
        }
    }

    /// Record partial time for the active split, if any, as cancelled
    fn interrupt_split(&mut self) {
        if let Some(active) = &self.active {
            let (focus, rest) = active.engine.interrupted_seconds();
            self.finalize_split(SplitStatus::Cancelled, focus, rest);
        }
    }

    /// The single write that ends a split, followed by a totals refresh.
    /// The split is dropped from memory whether or not the write succeeded.
    fn finalize_split(&mut self, status: SplitStatus, focus_seconds: u32, rest_seconds: u32) {
        let Some(ActiveSplit { mut split, .. }) = self.active.take() else {
            return;
        };

        split.status = status;
        split.end_time = Some(Utc::now());
        split.actual_focus_seconds = focus_seconds;
        split.actual_rest_seconds = rest_seconds;

        match self.store.update_split(&split) {
            Ok(()) => info!(
                "split {} {} after {}s focus / {}s rest",
                split.id, status, focus_seconds, rest_seconds
            ),
            Err(e) => error!("could not finalize split {}: {}", split.id, e),
        }
        self.refresh_session_totals();
    }

    fn refresh_session_totals(&mut self) {
        let Some(id) = self.session.as_ref().map(|s| s.id) else {
            return;
        };

        if let Err(e) = self.store.update_session_totals(id) {
            warn!("could not refresh totals for session {}: {}", id, e);
            return;
        }
        match self.store.get_session(id) {
            Ok(Some(session)) => self.session = Some(session),
            Ok(None) => warn!("session {} vanished during refresh", id),
            Err(e) => warn!("could not reload session {}: {}", id, e),
        }
    }

    fn open_browser(&mut self) {
        match self.store.get_all_sessions() {
            Ok(sessions) => {
                self.sessions = sessions;
                self.selected = 0;
                self.state = AppState::Browser;
            }
            Err(e) => {
                error!("could not load sessions: {}", e);
                self.notice = Some(format!("Could not load sessions: {}", e));
                self.state = AppState::MainMenu;
            }
        }
    }

    fn delete_selected(&mut self) {
        let Some(id) = self.sessions.get(self.selected).map(|s| s.id) else {
            return;
        };

        if let Err(e) = self.store.delete_session(id) {
            error!("could not delete session {}: {}", id, e);
            self.notice = Some(format!("Could not delete session: {}", e));
            return;
        }
        if self.session.as_ref().is_some_and(|s| s.id == id) {
            self.session = None;
        }

        match self.store.get_all_sessions() {
            Ok(sessions) => self.sessions = sessions,
            Err(e) => {
                warn!("could not reload sessions after delete: {}", e);
                self.sessions.retain(|s| s.id != id);
            }
        }
        self.selected = self.selected.min(self.sessions.len().saturating_sub(1));
    }
}
