use std::io::Write;

use log::{debug, warn};

use crate::session::Phase;

/// Receives "phase completed" signals; how they are surfaced is up to the
/// implementation.
pub trait Notifier {
    fn phase_completed(&mut self, phase: Phase);
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn phase_completed(&mut self, phase: Phase) {
        (**self).phase_completed(phase);
    }
}

/// Rings the terminal bell on stdout
#[derive(Debug, Default)]
pub struct TerminalBell;

impl Notifier for TerminalBell {
    fn phase_completed(&mut self, phase: Phase) {
        debug!("{} phase completed, ringing bell", phase);
        let mut stdout = std::io::stdout();
        if let Err(e) = stdout.write_all(b"\x07").and_then(|_| stdout.flush()) {
            warn!("could not ring terminal bell: {}", e);
        }
    }
}

#[derive(Debug, Default)]
pub struct Silent;

impl Notifier for Silent {
    fn phase_completed(&mut self, phase: Phase) {
        debug!("{} phase completed (silent)", phase);
    }
}

/// Keeps every notification, for tests
#[derive(Debug, Default)]
pub struct Recording {
    pub phases: Vec<Phase>,
}

impl Notifier for Recording {
    fn phase_completed(&mut self, phase: Phase) {
        self.phases.push(phase);
    }
}
