//! Deferred work requested by the sub-models.
//!
//! Sub-models never touch the network, the clipboard or timers. They return an [`Effect`] and the
//! shell either consumes it (the `Select*` intents) or hands it to the [`EffectRunner`], which
//! spawns a one-shot task that reports back with exactly one [`AppEvent`] per outcome.

use std::sync::Arc;
use std::time::Duration;

use prdeck_core::ports::{
    Browser, CheckFetcher, Clipboard, GithubPorts, ReviewFetcher, ThreadFetcher, ThreadResolver,
};
use prdeck_core::types::PullRequestRef;
use tokio::sync::mpsc::UnboundedSender;

use crate::event::AppEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open the expanded view on this thread index. Consumed by the shell.
    SelectThread(usize),
    /// Open the log view on this check index. Consumed by the shell.
    SelectCheck(usize),
    CopyToClipboard(String),
    OpenUrl(String),
    /// Resolve every listed thread; one completion per id.
    ResolveThreads(Vec<String>),
    FetchComments,
    FetchChecks,
    FetchReviews,
    /// Fetch checks for the watch loop.
    PollChecks,
    /// Fire `WatchTick` once after the delay.
    SchedulePoll(Duration),
}

/// Runs effects against the ports and reports completions on the event channel.
#[derive(Clone)]
pub struct EffectRunner {
    github: Arc<dyn GithubPorts>,
    clipboard: Arc<dyn Clipboard>,
    browser: Arc<dyn Browser>,
    pr: PullRequestRef,
    tx: UnboundedSender<AppEvent>,
}

impl EffectRunner {
    pub fn new(
        github: Arc<dyn GithubPorts>,
        clipboard: Arc<dyn Clipboard>,
        browser: Arc<dyn Browser>,
        pr: PullRequestRef,
        tx: UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            github,
            clipboard,
            browser,
            pr,
            tx,
        }
    }

    pub fn run_all(&self, effects: impl IntoIterator<Item = Effect>) {
        for effect in effects {
            self.run(effect);
        }
    }

    /// Spawns the task for `effect` and returns immediately.
    pub fn run(&self, effect: Effect) {
        tracing::debug!(?effect, "running effect");
        let tx = self.tx.clone();
        match effect {
            Effect::SelectThread(_) | Effect::SelectCheck(_) => {
                tracing::warn!(?effect, "selection intent reached the effect runner");
            }
            Effect::FetchComments => {
                let (github, pr) = (Arc::clone(&self.github), self.pr.clone());
                tokio::spawn(async move {
                    let _ = tx.send(AppEvent::CommentsLoaded(github.fetch_threads(&pr).await));
                });
            }
            Effect::FetchChecks => {
                let (github, pr) = (Arc::clone(&self.github), self.pr.clone());
                tokio::spawn(async move {
                    let _ = tx.send(AppEvent::ChecksLoaded(github.fetch_checks(&pr).await));
                });
            }
            Effect::FetchReviews => {
                let (github, pr) = (Arc::clone(&self.github), self.pr.clone());
                tokio::spawn(async move {
                    let _ = tx.send(AppEvent::ReviewsLoaded(github.fetch_reviews(&pr).await));
                });
            }
            Effect::PollChecks => {
                let (github, pr) = (Arc::clone(&self.github), self.pr.clone());
                tokio::spawn(async move {
                    let _ = tx.send(AppEvent::WatchPolled(github.fetch_checks(&pr).await));
                });
            }
            Effect::SchedulePoll(delay) => {
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(AppEvent::WatchTick);
                });
            }
            Effect::ResolveThreads(ids) => {
                for thread_id in ids {
                    let (github, tx) = (Arc::clone(&self.github), tx.clone());
                    tokio::spawn(async move {
                        let result = match github.resolve_thread(&thread_id).await {
                            Ok(_) => Ok(()),
                            Err(err) => {
                                tracing::warn!(%thread_id, error = %err, "resolve failed");
                                Err(err.to_string())
                            }
                        };
                        let _ = tx.send(AppEvent::ThreadResolved { thread_id, result });
                    });
                }
            }
            Effect::CopyToClipboard(text) => {
                let clipboard = Arc::clone(&self.clipboard);
                tokio::task::spawn_blocking(move || {
                    let result = clipboard.copy(&text);
                    if let Err(err) = &result {
                        tracing::warn!(error = %err, "clipboard copy failed");
                    }
                    let _ = tx.send(AppEvent::ClipboardCopied(result));
                });
            }
            Effect::OpenUrl(url) => {
                let browser = Arc::clone(&self.browser);
                tokio::task::spawn_blocking(move || {
                    let result = browser.open(&url);
                    if let Err(err) = &result {
                        tracing::warn!(%url, error = %err, "browser launch failed");
                    }
                    let _ = tx.send(AppEvent::UrlOpened(result));
                });
            }
        }
    }
}
