//! Terminal-facing adapter around the [`Controller`].
//!
//! Maps raw keys to intents, owns the numeric input line used on the setup
//! screen, and forwards phase notifications to a [`Notifier`].

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::controller::{AppState, Controller, ControllerEvent, Flow, Intent, Snapshot};
use crate::notify::Notifier;
use crate::store::SessionStore;

/// Digits accepted on the setup line
pub const INPUT_CHAR_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Intent(Intent),
    Type(char),
    Erase,
    SubmitInput,
}

/// Which action, if any, a key means in the given state
pub fn key_action(state: AppState, key: KeyEvent) -> Option<KeyAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(KeyAction::Intent(Intent::Quit));
    }
    if key.code == KeyCode::Char('q') {
        return Some(KeyAction::Intent(Intent::Quit));
    }

    let intent = match state {
        AppState::MainMenu => match key.code {
            KeyCode::Char('1') => Intent::ContinueLast,
            KeyCode::Char('2') => Intent::Browse,
            KeyCode::Char('3') => Intent::NewSession,
            _ => return None,
        },
        AppState::TimerSetup(_) => {
            return match key.code {
                KeyCode::Enter => Some(KeyAction::SubmitInput),
                KeyCode::Backspace => Some(KeyAction::Erase),
                KeyCode::Char('m') | KeyCode::Char('M') | KeyCode::Esc => {
                    Some(KeyAction::Intent(Intent::BackToMenu))
                }
                KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => Some(KeyAction::Type(c)),
                _ => None,
            }
        }
        AppState::Running => match key.code {
            KeyCode::Char('p') | KeyCode::Char('P') => Intent::Pause,
            KeyCode::Char('b') | KeyCode::Char('B') => Intent::BackToSetup,
            KeyCode::Char('m') | KeyCode::Char('M') => Intent::BackToMenu,
            _ => return None,
        },
        AppState::Paused => match key.code {
            KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Char('c') | KeyCode::Char('C') => {
                Intent::Resume
            }
            KeyCode::Char('b') | KeyCode::Char('B') => Intent::BackToSetup,
            KeyCode::Char('m') | KeyCode::Char('M') => Intent::BackToMenu,
            _ => return None,
        },
        AppState::Browser => match key.code {
            KeyCode::Up | KeyCode::Char('k') => Intent::SelectPrevious,
            KeyCode::Down | KeyCode::Char('j') => Intent::SelectNext,
            KeyCode::Char('x') | KeyCode::Char('X') => Intent::DeleteSelected,
            KeyCode::Char('b') | KeyCode::Char('B') | KeyCode::Char('m') | KeyCode::Char('M')
            | KeyCode::Esc => Intent::BackToMenu,
            _ => return None,
        },
    };
    Some(KeyAction::Intent(intent))
}

/// Single-line text entry with a character limit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputLine {
    value: String,
    limit: usize,
}

impl InputLine {
    pub fn new(limit: usize) -> Self {
        Self {
            value: String::new(),
            limit,
        }
    }

    pub fn push(&mut self, c: char) {
        if self.value.chars().count() < self.limit {
            self.value.push(c);
        }
    }

    pub fn pop(&mut self) {
        self.value.pop();
    }

    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.value)
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

pub struct App<S: SessionStore, N: Notifier> {
    pub controller: Controller<S>,
    pub input: InputLine,
    notifier: N,
}

impl<S: SessionStore, N: Notifier> App<S, N> {
    pub fn new(controller: Controller<S>, notifier: N) -> Self {
        Self {
            controller,
            input: InputLine::new(INPUT_CHAR_LIMIT),
            notifier,
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn snapshot(&self) -> Snapshot {
        self.controller.snapshot()
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Flow {
        match key_action(self.controller.state(), key) {
            Some(KeyAction::Type(c)) => {
                self.input.push(c);
                Flow::Continue
            }
            Some(KeyAction::Erase) => {
                self.input.pop();
                Flow::Continue
            }
            Some(KeyAction::SubmitInput) => {
                let text = self.input.take();
                self.dispatch(Intent::Submit(text))
            }
            Some(KeyAction::Intent(intent)) => self.dispatch(intent),
            None => Flow::Continue,
        }
    }

    pub fn on_tick(&mut self) {
        self.controller.tick();
        self.forward_events();
    }

    pub fn shutdown(&mut self) {
        self.controller.shutdown();
    }

    fn dispatch(&mut self, intent: Intent) -> Flow {
        let before = self.controller.state();
        let flow = self.controller.handle(intent);
        // a fresh screen always starts with an empty line
        if self.controller.state() != before {
            self.input.clear();
        }
        self.forward_events();
        flow
    }

    fn forward_events(&mut self) {
        for event in self.controller.drain_events() {
            match event {
                ControllerEvent::PhaseCompleted(phase) => self.notifier.phase_completed(phase),
            }
        }
    }
}
