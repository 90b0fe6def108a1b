use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use romodoro::{
    app::App,
    controller::{AppState, Controller, Flow, SetupStep},
    notify::Recording,
    runtime::{AppEvent, FixedTicker, Runner, TestEventSource},
    session::{Phase, SplitStatus},
    store::{SessionStore, SqliteStore},
};

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn chars(app: &mut App<SqliteStore, Recording>, text: &str) {
    for c in text.chars() {
        app.on_key(key(KeyCode::Char(c)));
    }
}

fn submit(app: &mut App<SqliteStore, Recording>, text: &str) {
    chars(app, text);
    app.on_key(key(KeyCode::Enter));
}

fn new_app() -> App<SqliteStore, Recording> {
    let store = SqliteStore::open_in_memory().unwrap();
    App::new(Controller::new(store), Recording::default())
}

// Drives a whole split through Runner/TestEventSource without a TTY
#[test]
fn headless_split_completes_through_runner() {
    let mut app = new_app();

    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(1));
    let mut runner = Runner::new(es, ticker);

    for code in [
        KeyCode::Char('3'),
        KeyCode::Char('1'),
        KeyCode::Enter,
        KeyCode::Char('0'),
        KeyCode::Enter,
    ] {
        tx.send(AppEvent::Key(key(code))).unwrap();
    }

    // 60 focus ticks plus one for the zero-minute rest, with room for the keys
    for _ in 0..1000u32 {
        match runner.step() {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => {}
            AppEvent::Key(k) => {
                app.on_key(k);
            }
        }
        if app.notifier().phases.len() == 2 {
            break;
        }
    }

    assert_eq!(app.notifier().phases, vec![Phase::Focus, Phase::Rest]);
    assert_eq!(
        app.controller.state(),
        AppState::TimerSetup(SetupStep::Focus)
    );

    let session_id = app.controller.session().unwrap().id;
    let splits = app.controller.store().get_splits(session_id).unwrap();
    assert_eq!(splits.len(), 1);
    assert_eq!(splits[0].status, SplitStatus::Completed);
    assert_eq!(splits[0].actual_focus_seconds, 60);
    assert_eq!(splits[0].actual_rest_seconds, 0);
    assert!(splits[0].end_time.is_some());

    let session = app.controller.store().get_session(session_id).unwrap().unwrap();
    assert_eq!(session.total_focus_seconds, 60);
    assert_eq!(session.total_rest_seconds, 0);

    assert_eq!(app.on_key(key(KeyCode::Char('q'))), Flow::Exit);
    let closed = app.controller.store().get_session(session_id).unwrap().unwrap();
    assert!(closed.end_time.is_some());
    // quitting after completion leaves the split alone
    let splits = app.controller.store().get_splits(session_id).unwrap();
    assert_eq!(splits[0].status, SplitStatus::Completed);
}

#[test]
fn headless_pause_then_menu_cancels_split() {
    let mut app = new_app();
    chars(&mut app, "3");
    submit(&mut app, "2");
    submit(&mut app, "1");
    assert_eq!(app.controller.state(), AppState::Running);

    for _ in 0..30 {
        app.on_tick();
    }
    app.on_key(key(KeyCode::Char('p')));
    assert_eq!(app.controller.state(), AppState::Paused);

    // paused countdown does not move
    for _ in 0..10 {
        app.on_tick();
    }
    assert_eq!(app.snapshot().timer.unwrap().remaining_seconds, 90);

    app.on_key(key(KeyCode::Char('m')));
    assert_eq!(app.controller.state(), AppState::MainMenu);
    assert!(app.notifier().phases.is_empty());

    let session_id = app.controller.session().unwrap().id;
    let splits = app.controller.store().get_splits(session_id).unwrap();
    assert_eq!(splits[0].status, SplitStatus::Cancelled);
    assert_eq!(splits[0].actual_focus_seconds, 30);
    assert_eq!(splits[0].actual_rest_seconds, 0);

    let session = app.controller.store().get_session(session_id).unwrap().unwrap();
    assert_eq!(session.total_focus_seconds, 30);
}

#[test]
fn headless_interrupt_during_rest_keeps_full_focus() {
    let mut app = new_app();
    chars(&mut app, "3");
    submit(&mut app, "1");
    submit(&mut app, "1");

    for _ in 0..75 {
        app.on_tick();
    }
    assert_eq!(app.notifier().phases, vec![Phase::Focus]);

    app.on_key(key(KeyCode::Char('b')));
    assert_eq!(
        app.controller.state(),
        AppState::TimerSetup(SetupStep::Focus)
    );

    let session_id = app.controller.session().unwrap().id;
    let splits = app.controller.store().get_splits(session_id).unwrap();
    assert_eq!(splits[0].status, SplitStatus::Cancelled);
    assert_eq!(splits[0].actual_focus_seconds, 60);
    assert_eq!(splits[0].actual_rest_seconds, 15);
}

#[test]
fn headless_invalid_input_stays_on_setup() {
    let mut app = new_app();
    chars(&mut app, "3");

    submit(&mut app, "0");
    let snap = app.snapshot();
    assert_eq!(snap.state, AppState::TimerSetup(SetupStep::Focus));
    assert!(snap.setup_error.is_some());

    submit(&mut app, "-5");
    assert_eq!(
        app.controller.state(),
        AppState::TimerSetup(SetupStep::Focus)
    );

    // letters never reach the input line
    chars(&mut app, "ab");
    assert_eq!(app.input.value(), "");

    submit(&mut app, "25");
    let snap = app.snapshot();
    assert_eq!(snap.state, AppState::TimerSetup(SetupStep::Rest));
    assert_eq!(snap.pending_focus_minutes, Some(25));
    assert_eq!(snap.setup_error, None);
}

#[test]
fn headless_browse_and_delete() {
    let mut app = new_app();
    chars(&mut app, "3");
    submit(&mut app, "1");
    submit(&mut app, "0");
    app.on_key(key(KeyCode::Char('m')));
    chars(&mut app, "3");
    app.on_key(key(KeyCode::Char('m')));

    chars(&mut app, "2");
    assert_eq!(app.controller.state(), AppState::Browser);
    assert_eq!(app.controller.sessions().len(), 2);

    app.on_key(key(KeyCode::Char('j')));
    assert_eq!(app.controller.selected(), 1);
    app.on_key(key(KeyCode::Char('j')));
    assert_eq!(app.controller.selected(), 1);

    // the older session carries the split; deleting it removes both
    let doomed = app.controller.sessions()[1].id;
    app.on_key(key(KeyCode::Char('x')));
    assert_eq!(app.controller.sessions().len(), 1);
    assert_eq!(app.controller.selected(), 0);
    assert!(app.controller.store().get_session(doomed).unwrap().is_none());
    assert!(app.controller.store().get_splits(doomed).unwrap().is_empty());

    app.on_key(key(KeyCode::Esc));
    assert_eq!(app.controller.state(), AppState::MainMenu);
}

#[test]
fn headless_continue_reopens_last_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.db");

    let first_id = {
        let store = SqliteStore::open(&path).unwrap();
        let mut app = App::new(
            Controller::new(store).with_session_name(Some("Thesis".to_string())),
            Recording::default(),
        );
        chars(&mut app, "3");
        let id = app.controller.session().unwrap().id;
        assert_eq!(app.on_key(key(KeyCode::Char('q'))), Flow::Exit);
        id
    };

    let store = SqliteStore::open(&path).unwrap();
    let mut app = App::new(Controller::new(store), Recording::default());
    chars(&mut app, "1");

    let session = app.controller.session().unwrap();
    assert_eq!(session.id, first_id);
    assert_eq!(session.name, "Thesis");
    assert_eq!(
        app.controller.state(),
        AppState::TimerSetup(SetupStep::Focus)
    );
}
