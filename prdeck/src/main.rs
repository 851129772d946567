//! prdeck: review pull-request threads, CI checks and approvals in the terminal.
//!
//! Entry point for the `prdeck` binary. Wires the terminal lifecycle (`tui`), the event bus
//! (`event`), the root state (`app`), the renderer (`ui`) and the effect runner (`effects`) to the
//! `gh`-backed GitHub adapter from `prdeck-core`.
//!
//! # Startup sequence
//!
//! 1. Parse flags, load the config file and start file logging. Nothing touches the terminal yet,
//!    so failures here print a plain message and exit non-zero.
//! 2. Resolve the repository (flag, or `gh repo view`).
//! 3. `install_panic_hook()`, then `register_sigterm()`, then `init_tui()`.
//! 4. Spawn the terminal event task, send the first `Resize`, run the startup effects.
//!
//! `restore_tui()` runs once after the loop exits, whichever way it exits.

mod app;
mod cli;
mod config;
mod effects;
mod event;
mod logging;
mod platform;
mod theme;
mod tui;
mod ui;
mod views;

use std::io;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use prdeck_core::github::{GhClient, ProcessCommandRunner};
use prdeck_core::types::PullRequestRef;
use prdeck_core::GithubError;

use crate::app::{App, View};
use crate::cli::{Cli, Command};
use crate::effects::EffectRunner;
use crate::event::AppEvent;
use crate::platform::{ArboardClipboard, SystemBrowser};
use crate::views::watcher::Watcher;

/// Maps the subcommand onto the first view, building the watcher when `--watch` was given.
fn start_view(command: Option<&Command>, config: &config::Config) -> (View, Option<Watcher>) {
    let view = match command {
        None | Some(Command::Comments) => View::CommentsList,
        Some(Command::Checks { watch: false, .. }) => View::ChecksList,
        Some(Command::Checks { watch: true, .. }) => View::Watch,
        Some(Command::Resolve) => View::Resolve,
        Some(Command::Summary { .. }) => View::Summary,
    };
    let watcher = command.and_then(Command::watch).map(|(policy, interval)| {
        let interval = interval
            .map(|secs| Duration::from_secs(secs.max(1)))
            .unwrap_or_else(|| config.poll_interval());
        Watcher::new(interval, policy)
    });
    (view, watcher)
}

/// Reports a GitHub failure that happened before the terminal was taken over, then exits with
/// the error's exit code (2 for auth, rate-limit and not-found, 1 otherwise).
fn exit_on_startup_error(err: &GithubError) -> ! {
    tracing::error!(error = %err, "startup failed");
    eprintln!("prdeck: {}", err.user_message());
    std::process::exit(err.exit_code())
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let config = config::load();
    match logging::init() {
        Ok(path) => tracing::info!(log = %path.display(), "prdeck starting"),
        Err(err) => eprintln!("prdeck: file logging disabled: {err}"),
    }

    let github = GhClient::new(ProcessCommandRunner, config.gh_binary.clone());
    let slug = match cli.repo.clone() {
        Some(slug) => slug,
        None => match github.current_repo().await {
            Ok(slug) => slug,
            Err(err) => exit_on_startup_error(&err),
        },
    };
    let pr = PullRequestRef::parse(&slug, cli.pr).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid repository {slug:?}, expected OWNER/NAME"),
        )
    })?;
    let theme = theme::Theme::from_name(cli.theme.as_deref().unwrap_or(&config.theme));
    let (view, watcher) = start_view(cli.command.as_ref(), &config);
    tracing::info!(repo = %pr.slug(), pr = pr.number, ?view, "session configured");

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm()?;
    let mut terminal = tui::init_tui()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let mut rx = handler.rx;

    let runner = EffectRunner::new(
        Arc::new(github),
        Arc::new(ArboardClipboard),
        Arc::new(SystemBrowser::default()),
        pr.clone(),
        handler.tx.clone(),
    );

    let mut app = App::new(pr, theme, view, watcher);
    let size = terminal.size()?;
    app.handle_event(AppEvent::Resize(size.width, size.height));
    runner.run_all(app.init());

    // Exits only via `break` so `restore_tui()` below is always reached.
    let mut result = Ok(());
    'event_loop: loop {
        tokio::select! {
            // A quiet terminal would otherwise block in `recv()` and never see SIGTERM.
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(AppEvent::Render) => {
                        if let Err(err) = terminal.draw(|frame| ui::draw(frame, &app)) {
                            tracing::error!(error = %err, "draw failed");
                            result = Err(err);
                            break 'event_loop;
                        }
                    }
                    Some(event) => runner.run_all(app.handle_event(event)),
                    None => break 'event_loop,
                }
                if app.should_quit() || term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
        }
    }

    tui::restore_tui()?;
    tracing::info!("prdeck exiting");
    result
}
