//! linkdash - a terminal dashboard for a URL shortener's admin API.
//!
//! Log in with the admin password, then create, edit, copy, open and delete
//! short links from the keyboard. A few flag-style commands run headless.

mod actions;
mod app;
mod commands;
mod ui;
mod utils;

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use linkdash_core::auth::open_store;
use linkdash_core::Config;

use app::{App, AppState};
use commands::Command;
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Number of daily log files kept
const MAX_LOG_FILES: usize = 7;

/// Headless commands log to stderr.
fn init_stderr_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// The TUI owns the terminal, so it logs to a daily file under the data dir.
/// The returned guard flushes the writer on drop.
fn init_file_tracing(data_dir: &Path) -> Result<WorkerGuard> {
    let appender = Builder::new()
        .rotation(Rotation::DAILY)
        .filename_prefix("linkdash")
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(data_dir.join("logs"))
        .context("Failed to create log appender")?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let command = Command::from_args(&args)?;
    let config = Config::load()?;

    if command != Command::Interactive {
        init_stderr_tracing();
        return commands::run(command, &config).await;
    }

    let data_dir = config.data_dir()?;
    let _log_guard = init_file_tracing(&data_dir)?;
    info!(api = %config.api_base_url, store = ?config.token_store, "linkdash starting");

    // Create app and restore any stored session
    let store = open_store(config.token_store, &data_dir);
    let mut app = App::new(config, store)?;
    if let Ok(password) = std::env::var("LINKDASH_PASSWORD") {
        app.login_password = password;
    }
    app.start();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("linkdash shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_input(app, key) {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks
        app.check_background_tasks();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }

        // Give spawned tasks a chance to run between frames
        tokio::task::yield_now().await;
    }
}
