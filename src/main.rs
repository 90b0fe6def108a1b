use std::{
    error::Error,
    fs::{self, File, OpenOptions},
    io::{self, stdin, Write},
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::Utc;
use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use romodoro::{
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    controller::{Controller, Flow},
    export,
    notify::{Notifier, Silent, TerminalBell},
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    store::{SessionStore, SqliteStore},
    ui::View,
};

/// pomodoro timer tui with persistent session history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal pomodoro timer. Work in focus/rest splits grouped into named sessions; every split and session total is kept in a local SQLite database you can browse, list or export."
)]
pub struct Cli {
    /// sessions database to use instead of the default location
    #[clap(long)]
    db: Option<PathBuf>,

    /// do not ring the terminal bell when a phase ends
    #[clap(long)]
    no_bell: bool,

    /// name for the first session created in this run
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// wall-clock milliseconds per timer second
    #[clap(long, hide = true)]
    tick_millis: Option<u64>,

    /// write the log here instead of the state directory
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// store the effective settings in the config file
    #[clap(long)]
    save_config: bool,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// print every recorded session, most recent first
    List,
    /// write all splits as CSV
    Export {
        /// destination file; stdout when omitted
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    /// Layer command line overrides on top of the stored config
    fn apply(&self, mut config: Config) -> Config {
        if let Some(db) = &self.db {
            config.db_path = Some(db.clone());
        }
        if self.no_bell {
            config.bell = false;
        }
        if let Some(ms) = self.tick_millis {
            config.tick_millis = ms.max(1);
        }
        config
    }
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Logs go to a file; stderr would tear the alternate screen
fn init_logging(path: Option<PathBuf>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match path.map(|p| open_log_file(&p)) {
        Some(Ok(file)) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        _ => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    let _ = builder.try_init();
}

fn run_command(command: Command, store: &SqliteStore) -> Result<(), Box<dyn Error>> {
    match command {
        Command::List => {
            let sessions = store.get_all_sessions()?;
            println!("{}", export::render_listing(&sessions, Utc::now()));
        }
        Command::Export { output } => {
            let rows = match &output {
                Some(path) => export::export_csv(store, File::create(path)?)?,
                None => export::export_csv(store, io::stdout().lock())?,
            };
            if let Some(path) = output {
                eprintln!("exported {} splits to {}", rows, path.display());
            }
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    init_logging(cli.log_file.clone().or_else(AppDirs::log_path));

    let config_store = FileConfigStore::new();
    let config = cli.apply(config_store.load());
    if cli.save_config {
        config_store.save(&config)?;
        info!("saved config to {}", config_store.path().display());
    }

    let mut store = SqliteStore::open(config.resolved_db_path())?;

    if let Some(command) = cli.command.clone() {
        return run_command(command, &store);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if config.reconcile_on_startup {
        let repaired = store.reconcile_orphaned_splits()?;
        if repaired > 0 {
            warn!("cancelled {} split(s) left in progress", repaired);
        }
    }

    let controller = Controller::new(store)
        .with_session_name_format(config.session_name_format.clone())
        .with_session_name(cli.name.clone());
    let notifier: Box<dyn Notifier> = if config.bell {
        Box::new(TerminalBell)
    } else {
        Box::new(Silent)
    };
    let mut app = App::new(controller, notifier);

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick = Duration::from_millis(config.tick_millis.max(1));
    let result = start_tui(&mut terminal, &mut app, tick);
    app.shutdown();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    io::stdout().flush()?;

    result
}

fn draw<B: Backend, S: SessionStore, N: Notifier>(
    terminal: &mut Terminal<B>,
    app: &App<S, N>,
) -> io::Result<()> {
    let snapshot = app.snapshot();
    let view = View::new(&snapshot, app.input.value());
    terminal.draw(|f| f.render_widget(&view, f.area()))?;
    Ok(())
}

fn start_tui<B: Backend, S: SessionStore, N: Notifier>(
    terminal: &mut Terminal<B>,
    app: &mut App<S, N>,
    tick: Duration,
) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(tick));

    loop {
        draw(terminal, app)?;

        match runner.step() {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if app.on_key(key) == Flow::Exit {
                    break;
                }
            }
        }
    }

    Ok(())
}
