//! `tasklist`: terminal task list synced to a hosted row store.
//!
//! Configuration via CLI flags, environment variables, or config file
//! (`~/.config/tasklist/config.toml`).
//!
//! ```bash
//! # Hosted store
//! cargo run --bin tasklist -- --url https://project.example.co --key <anon-key>
//!
//! # Or via environment variables
//! TASKLIST_URL=http://127.0.0.1:54321 TASKLIST_KEY=local-dev-key cargo run --bin tasklist
//!
//! # In-memory list for this session only
//! cargo run --bin tasklist -- --local
//! ```

use std::io;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use tasklist::app::App;
use tasklist::config::{CliArgs, ClientConfig};
use tasklist::repository::TaskRepository;
use tasklist::repository::memory::InMemoryRepository;
use tasklist::repository::rest::RestRepository;
use tasklist::store::TaskListStore;
use tasklist::sync::{self, SyncCommand, SyncEvent};
use tasklist::ui;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Logs go to a file; the terminal belongs to ratatui.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    let result = if cli.local {
        tracing::info!("tasklist starting with in-memory tasks");
        run(TaskListStore::ready(InMemoryRepository::new()), &config).await
    } else {
        let repo = match config
            .to_remote_config()
            .map_err(|e| e.to_string())
            .and_then(|remote| RestRepository::new(&remote).map_err(|e| e.to_string()))
        {
            Ok(repo) => repo,
            Err(e) => {
                tracing::error!(error = %e, "cannot start without a store");
                eprintln!("Error: {e}");
                eprintln!("Use --local to keep tasks in memory instead.");
                return ExitCode::FAILURE;
            }
        };
        tracing::info!(url = %repo.table_url(), "tasklist starting");
        run(TaskListStore::new(repo), &config).await
    };

    match result {
        Ok(()) => {
            tracing::info!("tasklist exiting");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "terminal error");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown so buffered
/// entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("tasklist.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Set up the terminal, run the app, and restore the terminal.
async fn run<R>(store: TaskListStore<R>, config: &ClientConfig) -> io::Result<()>
where
    R: TaskRepository + 'static,
{
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, store, config).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Main application loop driving the sync worker.
async fn run_app<R>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    store: TaskListStore<R>,
    config: &ClientConfig,
) -> io::Result<()>
where
    R: TaskRepository + 'static,
{
    let mut app = App::new(store.repository().kind())
        .with_default_priority(config.default_priority)
        .with_filter(config.default_filter);
    app.phase = store.phase();
    let (cmd_tx, mut evt_rx) = sync::spawn_sync(store, config.channel_capacity);

    loop {
        // Step 1: Draw the UI frame.
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Step 2: Drain pending SyncEvents (non-blocking).
        drain_sync_events(&mut app, &mut evt_rx);

        // Step 3: Poll for terminal input events.
        if event::poll(config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            if let Some(cmd) = app.handle_key_event(key) {
                match cmd_tx.try_send(cmd) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        app.set_status("Busy, try again");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        app.set_status("Sync worker stopped");
                    }
                }
            }
        }

        if app.should_quit {
            // Unblocks a worker waiting on a full event channel.
            drop(evt_rx);
            let _ = cmd_tx.send(SyncCommand::Shutdown).await;
            return Ok(());
        }
    }
}

/// Drain all pending `SyncEvent`s from the receiver and apply them to the app.
fn drain_sync_events(app: &mut App, rx: &mut mpsc::Receiver<SyncEvent>) {
    while let Ok(event) = rx.try_recv() {
        app.apply_event(event);
    }
}
