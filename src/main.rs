//! worldnews — per-country headlines, translated, with favorites.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌───────────┐ timer_tick ┌───────────────┐ fetch  ┌───────────┐
//! │ refresh.rs│ ─────────► │ controller.rs │ ─────► │ source/   │
//! │  (task)   │            │ (FeedState)   │        └───────────┘
//! └───────────┘            │               │ enrich ┌───────────┐   ┌──────────────┐
//!                          │               │ ─────► │pipeline.rs│ ─►│ translate.rs │
//!      Command             │               │        └───────────┘   └──────────────┘
//! ┌──────────┐  (spawned)  │               │ toggle ┌──────────────┐
//! │ input.rs │ ──────────► │               │ ─────► │ favorites.rs │
//! └──────────┘             └───────────────┘        └──────────────┘
//!                                 │ watch<FeedState>
//!                                 ▼
//!                  ┌──────────┐  draw()  ┌──────────┐
//!                  │  app.rs  │ ───────► │  ui.rs   │
//!                  └──────────┘          └──────────┘
//! ```
//!
//! * **`source/`** — the `HeadlineSource` trait, article types, countries,
//!   and the JSON-over-HTTP implementation.
//! * **`translate`** — the `Translator` trait and the HTTP translator.
//! * **`pipeline`** — raw articles → translated, favorite-tagged articles.
//! * **`favorites`** — the favorite set and its atomic on-disk file.
//! * **`paginator`** — page arithmetic.
//! * **`controller`** — owns `FeedState`, runs commands, guards stale loads.
//! * **`refresh`** — background timer driving periodic reloads.
//! * **`app` / `ui` / `input`** — the terminal front-end.
//! * **`main`** — wires everything together: config, logging, terminal,
//!   event loop.

mod app;
mod config;
mod controller;
mod favorites;
mod input;
mod paginator;
mod pipeline;
mod refresh;
mod source;
mod translate;
mod ui;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::App;
use config::{Config, LogConfig, DEFAULT_CONFIG_FILE};
use controller::{Command, ControllerOptions, FeedController};
use favorites::FavoriteStore;
use source::NewsApiSource;
use translate::GoogleTranslator;

// ---------------------------------------------------------------------------
// RAII terminal guard — idiomatic cleanup even on panic
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
///
/// Constructing this struct enters raw mode + alternate screen.  When the
/// value is dropped (normally or during stack unwinding) it restores the
/// terminal.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

/// Log to a file; the terminal belongs to the UI.  `RUST_LOG` overrides the
/// configured filter.
fn init_logging(log: &LogConfig) -> Result<()> {
    let log_file = File::create(&log.file)
        .with_context(|| format!("Failed to create log file: {}", log.file.display()))?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    install_panic_hook();

    // -- configuration -------------------------------------------------------
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = Config::load(&config_path)?;
    init_logging(&config.log)?;
    info!(config = %config_path.display(), "starting worldnews");

    // -- core ----------------------------------------------------------------
    let source = NewsApiSource::new(&config.feed.base_url, config.request_timeout())?;
    let translator =
        GoogleTranslator::new(&config.translate.base_url, &config.translate.target_language);
    info!(target_language = translator.target_language(), "translator ready");
    let favorites = FavoriteStore::open(&config.favorites.path);

    let controller = Arc::new(FeedController::new(
        Arc::new(source),
        Arc::new(translator),
        favorites,
        ControllerOptions::from_config(&config),
    ));
    let mut state_rx = controller.subscribe();

    let initial = controller.snapshot().current_country;
    spawn_command(&controller, Command::SelectCountry(initial));
    let timer = refresh::spawn(Arc::downgrade(&controller), config.refresh_interval());

    // -- terminal setup (RAII — Drop restores on exit or panic) --------------
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(state_rx.borrow_and_update().clone());

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Pick up the latest controller state, if it changed.
    //   2. Render the UI.
    //   3. Poll for keyboard input (up to tick_rate) and dispatch commands.
    let tick_rate = Duration::from_millis(100);

    loop {
        if state_rx.has_changed().unwrap_or(false) {
            app.update(state_rx.borrow_and_update().clone());
        }

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if let Some(command) = input::handle_key_event(&mut app, key) {
                    spawn_command(&controller, command);
                }
            }
        }

        if app.quit {
            break;
        }
    }

    drop(guard);
    timer.shutdown().await;
    info!("bye");
    Ok(())
}

/// Run a command without blocking the event loop.
fn spawn_command(controller: &Arc<FeedController>, command: Command) {
    let controller = Arc::clone(controller);
    tokio::spawn(async move { controller.dispatch(command).await });
}
