//! Event bus for prdeck.
//!
//! Terminal input, render ticks and the completions of background effects are normalised into a
//! single `AppEvent` enum and sent over a tokio unbounded MPSC channel. The main loop receives
//! from this channel and feeds each event to [`crate::app::App::handle_event`].
//!
//! The render interval (33 ms, about 30 FPS) is the only timer owned by the bus. The watch loop's
//! poll timer is a one-shot effect re-armed by the watcher itself.

use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use futures::{FutureExt, StreamExt};
use prdeck_core::types::{ChecksResult, CommentsResult, Review};
use prdeck_core::GithubError;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;

/// All events the application can receive from any source.
#[derive(Debug)]
pub enum AppEvent {
    /// A key press from the terminal (`KeyEventKind::Press` only).
    ///
    /// Release and repeat events are filtered in [`spawn_event_task`] to avoid double-firing on
    /// Windows, which synthesises both press and release for every keystroke.
    Key(KeyEvent),
    /// Terminal was resized to (columns, rows).
    Resize(u16, u16),
    /// Render tick. Triggers exactly one `terminal.draw()` call.
    Render,
    /// Quit signal.
    Quit,
    CommentsLoaded(Result<CommentsResult, GithubError>),
    ChecksLoaded(Result<ChecksResult, GithubError>),
    ReviewsLoaded(Result<Vec<Review>, GithubError>),
    /// One thread of a resolve batch finished. The error is already a display string.
    ThreadResolved {
        thread_id: String,
        result: Result<(), String>,
    },
    /// The watch timer fired.
    WatchTick,
    WatchPolled(Result<ChecksResult, GithubError>),
    /// Clipboard completion. Nothing in the UI consumes it.
    ClipboardCopied(Result<(), String>),
    /// Browser completion. Nothing in the UI consumes it.
    UrlOpened(Result<(), String>),
}

/// Holds the sender and receiver ends of the unified event channel.
///
/// The sender (`tx`) is cloned into the terminal task and the effect runner; the receiver (`rx`)
/// is owned by the main event loop.
pub struct EventHandler {
    pub tx: mpsc::UnboundedSender<AppEvent>,
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the background task that forwards terminal input and render ticks.
///
/// - `reader.next().fuse()` keeps `tokio::select!` from polling a finished stream.
/// - Only `KeyEventKind::Press` is forwarded.
/// - Send errors are ignored; the task is torn down with the runtime once the receiver is gone.
pub fn spawn_event_task(tx: mpsc::UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        let mut render_interval = interval(Duration::from_millis(33));
        let mut reader = EventStream::new();

        loop {
            let render_tick = render_interval.tick();
            let crossterm_event = reader.next().fuse();

            tokio::select! {
                _ = render_tick => {
                    let _ = tx.send(AppEvent::Render);
                }
                maybe_event = crossterm_event => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) => {
                            if key.kind == KeyEventKind::Press {
                                let _ = tx.send(AppEvent::Key(key));
                            }
                        }
                        Some(Ok(Event::Resize(w, h))) => {
                            let _ = tx.send(AppEvent::Resize(w, h));
                        }
                        Some(Err(err)) => {
                            tracing::error!(error = %err, "terminal event stream failed");
                            let _ = tx.send(AppEvent::Quit);
                            break;
                        }
                        None => {
                            let _ = tx.send(AppEvent::Quit);
                            break;
                        }
                        _ => {}
                    }
                }
            }
        }
    });
}
