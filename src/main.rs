//! Social support application wizard for the terminal.
//!
//! Sets up configuration, logging and the background runtime, then runs the
//! UI loop until the user quits.

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use social_support::application::{
    App, BackgroundEvent, DraftState, TaskRunner, Wizard, supervise,
};
use social_support::config::AppConfig;
use social_support::infrastructure::{JsonStore, SimulatedSubmission, SuggestionClient};
use social_support::logging::init_logging;
use social_support::presentation::{InputHandler, TerminalGuard, install_panic_hook, render_ui};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

/// How long to wait for a key before checking background results again.
const TICK: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(
    name = "social-support",
    version,
    about = "Apply for social support, one step at a time"
)]
struct Cli {
    /// Directory holding the saved draft and logs
    #[arg(long, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(long)]
    debug: bool,

    /// Discard the saved draft and start a new application
    #[arg(long)]
    reset: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load()?;
    if let Some(dir) = cli.state_dir {
        config.state_dir = dir;
    }
    let logging = init_logging(&config, cli.debug)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    let suggestions = SuggestionClient::from_config(&config.ai)?;
    if !suggestions.is_configured() {
        tracing::warn!("no API key configured; writing help will report a configuration error");
    }
    let submission = SimulatedSubmission::from_config(&config.submission);

    let mut draft = DraftState::load(JsonStore::new(&config.state_dir));
    if cli.reset {
        draft.reset();
    }
    let mut app = App::new(Wizard::new(draft));

    let (events_tx, mut events_rx) = unbounded_channel();
    let mut runner = TaskRunner::new(runtime.handle().clone(), events_tx, suggestions, submission);

    install_panic_hook();
    let result = {
        let _guard = TerminalGuard::new()?;
        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        run_app(&mut terminal, &mut app, &mut runner, &mut events_rx)
    };

    drop(runner);
    runtime.shutdown_timeout(Duration::from_millis(500));

    if let Err(err) = &result {
        tracing::error!(error = %err, "terminal error");
        eprintln!("{err:?}");
        eprintln!("Log file: {}", logging.log_file_path.display());
    }
    tracing::info!("exiting");
    Ok(result?)
}

/// Main application event loop.
///
/// Draws, applies finished background work, then waits up to [`TICK`] for
/// a key. Every handler runs supervised, so a panic lands on the crash
/// screen instead of tearing the terminal down.
///
/// # Errors
///
/// Returns an IO error if terminal operations fail.
fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &mut TaskRunner,
    events: &mut UnboundedReceiver<BackgroundEvent>,
) -> io::Result<()> {
    loop {
        let drawn = supervise(app, "render", |app| {
            terminal.draw(|f| render_ui(f, app)).map(|_| ())
        });
        if let Some(Err(err)) = drawn {
            return Err(err);
        }

        while let Ok(event) = events.try_recv() {
            supervise(app, "background", |app| app.handle_background_event(event));
        }

        if !event::poll(TICK)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let ctrl_c = key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl_c || (key.code == KeyCode::Char('q') && app.can_quit()) {
            return Ok(());
        }

        let effect = supervise(app, "input", |app| {
            InputHandler::handle_key_event(app, key.code, key.modifiers)
        });
        if let Some(Some(effect)) = effect {
            runner.dispatch(effect);
        }
    }
}
