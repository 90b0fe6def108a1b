//! Countdown for the active split.
//!
//! The engine is a logical clock: every [`TimerEngine::tick`] is one second,
//! whatever the wall clock says. It never touches storage and does not gate
//! ticks on its own pause flag; the controller only delivers ticks while
//! running.

use log::debug;

use crate::session::Phase;

/// What a single tick did to the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still counting down in the same phase
    Running,
    /// Focus ran out and rest has begun; the split continues
    PhaseAdvanced,
    /// Rest ran out; the split is over
    SplitComplete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerEngine {
    focus_minutes: u32,
    rest_minutes: u32,
    phase: Phase,
    total_seconds: u32,
    remaining_seconds: u32,
    paused: bool,
    elapsed_focus_seconds: u32,
    elapsed_rest_seconds: u32,
}

impl TimerEngine {
    /// Begin a split in the focus phase
    pub fn start(focus_minutes: u32, rest_minutes: u32) -> Self {
        let total = focus_minutes * 60;
        Self {
            focus_minutes,
            rest_minutes,
            phase: Phase::Focus,
            total_seconds: total,
            remaining_seconds: total,
            paused: false,
            elapsed_focus_seconds: 0,
            elapsed_rest_seconds: 0,
        }
    }

    pub fn tick(&mut self) -> TickOutcome {
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds > 0 {
            return TickOutcome::Running;
        }

        match self.phase {
            Phase::Focus => {
                self.elapsed_focus_seconds = self.total_seconds;
                self.phase = Phase::Rest;
                self.total_seconds = self.rest_minutes * 60;
                self.remaining_seconds = self.total_seconds;
                debug!("focus finished, resting for {}s", self.total_seconds);
                TickOutcome::PhaseAdvanced
            }
            Phase::Rest => {
                self.elapsed_rest_seconds = self.total_seconds;
                debug!("rest finished");
                TickOutcome::SplitComplete
            }
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn focus_minutes(&self) -> u32 {
        self.focus_minutes
    }

    pub fn rest_minutes(&self) -> u32 {
        self.rest_minutes
    }

    /// Fraction of the current phase consumed, in `0.0..=1.0`.
    /// A zero-length phase counts as fully consumed.
    pub fn progress(&self) -> f64 {
        if self.total_seconds == 0 {
            return 1.0;
        }
        f64::from(self.total_seconds - self.remaining_seconds) / f64::from(self.total_seconds)
    }

    /// Seconds recorded by natural phase ends, as `(focus, rest)`
    pub fn completed_seconds(&self) -> (u32, u32) {
        (self.elapsed_focus_seconds, self.elapsed_rest_seconds)
    }

    /// Seconds actually spent if the split were cut short right now, as
    /// `(focus, rest)`. Reaching rest implies the whole focus was spent.
    pub fn interrupted_seconds(&self) -> (u32, u32) {
        let spent = self.total_seconds - self.remaining_seconds;
        match self.phase {
            Phase::Focus => (spent, 0),
            Phase::Rest => (self.focus_minutes * 60, spent),
        }
    }
}
