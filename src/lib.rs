pub mod app;
pub mod app_dirs;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod notify;
pub mod runtime;
pub mod session;
pub mod store;
pub mod timer;
pub mod ui;
pub mod util;

pub use controller::{AppState, Controller, Intent};
pub use error::{RomodoroError, Result};
pub use store::{SessionStore, SqliteStore};
