//! Root application state for prdeck.
//!
//! `App` owns the active view, the three datasets with their load bookkeeping, and one sub-model
//! per view. It is pure state: [`App::handle_event`] mutates it and returns the effects to run,
//! and [`crate::ui::draw`] reads it once per render tick.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use prdeck_core::types::{ChecksResult, CommentsResult, PullRequestRef, Review, ReviewThread};
use prdeck_core::GithubError;
use ratatui::style::Style;
use ratatui::text::{Line, Span};

use crate::effects::Effect;
use crate::event::AppEvent;
use crate::theme::Theme;
use crate::ui::help_bar::{
    KeyBinding, CHECKS_LIST_KEYS, CHECKS_WATCH_KEYS, COMMENTS_EXPANDED_KEYS, COMMENTS_LIST_KEYS,
    RESOLVE_KEYS, SUMMARY_KEYS,
};
use crate::ui::status_bar::StatusBarData;
use crate::views::checks_list::ChecksList;
use crate::views::checks_log::ChecksLog;
use crate::views::comments_expanded::CommentsExpanded;
use crate::views::comments_list::CommentsList;
use crate::views::resolve::{Resolve, ResolveState};
use crate::views::summary::{merge_badge, Summary, SummaryData};
use crate::views::watcher::Watcher;
use crate::views::{is_char, is_down};

#[cfg(test)]
mod tests;

/// Which screen fills the content area.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum View {
    #[default]
    CommentsList,
    CommentsExpand,
    ChecksList,
    ChecksLog,
    Resolve,
    Summary,
    Watch,
}

impl View {
    /// Top-level views cycled by Tab, in order.
    const TOP_LEVEL: [View; 2] = [View::CommentsList, View::ChecksList];

    fn is_detail(self) -> bool {
        matches!(self, View::CommentsExpand | View::ChecksLog)
    }

    /// Position in [`Self::TOP_LEVEL`]; detail views count as their list, everything else as the
    /// first entry.
    fn top_level_index(self) -> usize {
        match self {
            View::ChecksList | View::ChecksLog => 1,
            _ => 0,
        }
    }
}

/// Outstanding startup loads. Each flag is cleared only by its own dataset arriving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loading {
    pub comments: bool,
    pub checks: bool,
    pub reviews: bool,
}

impl Loading {
    fn any(self) -> bool {
        self.comments || self.checks || self.reviews
    }
}

impl Default for Loading {
    fn default() -> Self {
        Self {
            comments: true,
            checks: true,
            reviews: true,
        }
    }
}

/// The three datasets plus the errors of the loads that failed.
#[derive(Debug, Default)]
pub struct Datasets {
    pub comments: Option<CommentsResult>,
    pub checks: Option<ChecksResult>,
    pub reviews: Option<Vec<Review>>,
    pub load_errors: Vec<String>,
    pub loading: Loading,
}

impl Datasets {
    pub fn summary_data(&self) -> SummaryData<'_> {
        SummaryData {
            comments: self.comments.as_ref(),
            checks: self.checks.as_ref(),
            reviews: self.reviews.as_deref(),
            load_errors: &self.load_errors,
            loading: self.loading.any(),
        }
    }

    /// Stores `result` or records `"<kind>: <message>"`. Returns whether it was stored.
    fn accept<T>(
        slot: &mut Option<T>,
        errors: &mut Vec<String>,
        kind: &str,
        result: Result<T, GithubError>,
    ) -> bool {
        match result {
            Ok(value) => {
                *slot = Some(value);
                true
            }
            Err(err) => {
                tracing::warn!(kind, error = %err, "load failed");
                errors.push(format!("{kind}: {err}"));
                false
            }
        }
    }
}

pub struct App {
    pr: PullRequestRef,
    theme: Theme,
    view: View,
    /// Target of Esc from a non-detail view.
    previous: View,
    /// The view that opened the check log: the checks list or the watcher.
    log_parent: View,
    width: u16,
    height: u16,
    data: Datasets,

    comments_list: CommentsList,
    expanded: CommentsExpanded,
    checks_list: ChecksList,
    checks_log: ChecksLog,
    resolve: Resolve,
    summary: Summary,
    /// Present only when the session was started in watch mode.
    watcher: Option<Watcher>,

    should_quit: bool,
}

impl App {
    /// Builds the shell for `pr`, starting in `view`. A watch session needs its `watcher`.
    pub fn new(pr: PullRequestRef, theme: Theme, view: View, watcher: Option<Watcher>) -> Self {
        let view = if view == View::Watch && watcher.is_none() {
            View::ChecksList
        } else {
            view
        };
        let threads: Arc<[ReviewThread]> = Arc::from(Vec::new());
        Self {
            pr,
            theme,
            view,
            previous: view,
            log_parent: View::ChecksList,
            width: 0,
            height: 0,
            data: Datasets::default(),
            comments_list: CommentsList::new(Arc::clone(&threads)),
            expanded: CommentsExpanded::new(Arc::clone(&threads), 0),
            checks_list: ChecksList::new(Vec::new()),
            checks_log: ChecksLog::default(),
            resolve: Resolve::new(threads),
            summary: Summary::default(),
            watcher,
            should_quit: false,
        }
    }

    /// Effects to run once at startup: the three loads, plus the first poll of a watch session.
    pub fn init(&self) -> Vec<Effect> {
        let mut effects = vec![
            Effect::FetchComments,
            Effect::FetchChecks,
            Effect::FetchReviews,
        ];
        if let Some(watcher) = &self.watcher {
            effects.push(watcher.init());
        }
        effects
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn data(&self) -> &Datasets {
        &self.data
    }

    /// Height left for the active view once the status and help bars are drawn.
    fn content_height(&self) -> u16 {
        self.height.saturating_sub(2).max(1)
    }

    /// Folds one event into the state and returns the effects it produced.
    pub fn handle_event(&mut self, event: AppEvent) -> Vec<Effect> {
        match event {
            AppEvent::Key(key) => return self.handle_key(key),
            AppEvent::Resize(width, height) => self.resize(width, height),
            AppEvent::Render => {}
            AppEvent::Quit => self.should_quit = true,
            AppEvent::CommentsLoaded(result) => {
                self.data.loading.comments = false;
                if Datasets::accept(
                    &mut self.data.comments,
                    &mut self.data.load_errors,
                    "comments",
                    result,
                ) {
                    self.rebuild_comments();
                }
                self.refresh_summary();
            }
            AppEvent::ChecksLoaded(result) => {
                self.data.loading.checks = false;
                if Datasets::accept(
                    &mut self.data.checks,
                    &mut self.data.load_errors,
                    "checks",
                    result,
                ) {
                    self.rebuild_checks();
                }
                self.refresh_summary();
            }
            AppEvent::ReviewsLoaded(result) => {
                self.data.loading.reviews = false;
                Datasets::accept(
                    &mut self.data.reviews,
                    &mut self.data.load_errors,
                    "reviews",
                    result,
                );
                self.refresh_summary();
            }
            AppEvent::ThreadResolved { thread_id, result } => {
                self.resolve.apply_result(&thread_id, result);
            }
            AppEvent::WatchTick => {
                return self.watcher.as_ref().and_then(Watcher::tick).into_iter().collect();
            }
            AppEvent::WatchPolled(result) => {
                let Some(watcher) = self.watcher.as_mut() else {
                    return Vec::new();
                };
                let polled = result.as_ref().ok().cloned();
                let next = watcher.apply_poll(result);
                if let Some(checks) = polled {
                    self.data.checks = Some(checks);
                    self.rebuild_checks();
                    self.refresh_summary();
                }
                return next.into_iter().collect();
            }
            AppEvent::ClipboardCopied(result) => {
                tracing::debug!(ok = result.is_ok(), "clipboard copy finished");
            }
            AppEvent::UrlOpened(result) => {
                tracing::debug!(ok = result.is_ok(), "browser launch finished");
            }
        }
        Vec::new()
    }

    /// Stores the terminal size and hands the content area to every sub-model.
    fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let content = self.content_height();
        self.comments_list.set_size(width, content);
        self.expanded.set_size(width, content);
        self.checks_list.set_size(width, content);
        self.checks_log.set_size(content);
        self.resolve.set_size(width, content);
        self.summary
            .set_size(width, content, &self.data.summary_data(), &self.theme);
        if let Some(watcher) = self.watcher.as_mut() {
            watcher.set_size(width, content);
        }
    }

    fn rebuild_comments(&mut self) {
        let threads: Arc<[ReviewThread]> = self
            .data
            .comments
            .as_ref()
            .map(|c| Arc::from(c.threads.clone()))
            .unwrap_or_else(|| Arc::from(Vec::new()));
        let content = self.content_height();
        self.comments_list = CommentsList::new(Arc::clone(&threads));
        self.comments_list.set_size(self.width, content);
        self.resolve = Resolve::new(threads);
        self.resolve.set_size(self.width, content);
    }

    /// Refreshes the checks list from the dataset. The cursor survives so a watch poll does not
    /// jump the selection back to the top.
    fn rebuild_checks(&mut self) {
        let checks = self
            .data
            .checks
            .as_ref()
            .map(|c| c.checks.clone())
            .unwrap_or_default();
        self.checks_list.replace_checks(checks);
        self.checks_list
            .set_size(self.width, self.content_height());
    }

    fn refresh_summary(&mut self) {
        self.summary
            .refresh(&self.data.summary_data(), &self.theme);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if is_char(&key, 'q')
            || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
        {
            self.should_quit = true;
            return Vec::new();
        }

        match key.code {
            KeyCode::Tab => {
                self.cycle_view(1);
                return Vec::new();
            }
            KeyCode::BackTab => {
                self.cycle_view(-1);
                return Vec::new();
            }
            KeyCode::Esc => return self.handle_esc(key),
            _ => {}
        }

        if self.view == View::Summary {
            self.handle_summary_key(&key);
            return Vec::new();
        }

        if is_char(&key, 'r') && matches!(self.view, View::CommentsList | View::CommentsExpand) {
            self.previous = self.view;
            self.view = View::Resolve;
            return Vec::new();
        }

        let effect = match self.view {
            View::CommentsList => self.comments_list.handle(key),
            View::CommentsExpand => self.expanded.handle(key, &self.theme),
            View::ChecksList => self.checks_list.handle(key),
            View::ChecksLog => self.checks_log.handle(key),
            View::Resolve => self.resolve.handle(key),
            View::Watch => self.watcher.as_mut().and_then(|w| w.handle(key)),
            View::Summary => None,
        };
        self.dispatch(effect)
    }

    fn handle_esc(&mut self, key: KeyEvent) -> Vec<Effect> {
        if self.view.is_detail() {
            self.view = match self.view {
                View::ChecksLog => self.log_parent,
                _ => View::CommentsList,
            };
        } else if self.view == View::Resolve && self.resolve.state() == ResolveState::Confirming {
            let effect = self.resolve.handle(key);
            return self.dispatch(effect);
        } else if self.previous != self.view {
            self.view = self.previous;
        }
        Vec::new()
    }

    /// `c`, `k` and `r` jump to a view and remember the summary; `j`/Down and Up scroll.
    fn handle_summary_key(&mut self, key: &KeyEvent) {
        let target = if is_char(key, 'c') {
            Some(View::CommentsList)
        } else if is_char(key, 'k') {
            Some(View::ChecksList)
        } else if is_char(key, 'r') {
            Some(View::Resolve)
        } else {
            None
        };
        if let Some(target) = target {
            self.previous = View::Summary;
            self.view = target;
        } else if is_down(key) {
            self.summary.scroll_down();
        } else if key.code == KeyCode::Up {
            self.summary.scroll_up();
        }
    }

    fn cycle_view(&mut self, direction: isize) {
        let len = View::TOP_LEVEL.len() as isize;
        let current = self.view.top_level_index() as isize;
        let next = (current + direction).rem_euclid(len) as usize;
        self.view = View::TOP_LEVEL[next];
    }

    /// Turns selection intents into transitions; every other effect goes back to the runner.
    fn dispatch(&mut self, effect: Option<Effect>) -> Vec<Effect> {
        match effect {
            Some(Effect::SelectThread(index)) => {
                self.open_thread(index);
                Vec::new()
            }
            Some(Effect::SelectCheck(index)) => {
                self.open_check(index);
                Vec::new()
            }
            Some(effect) => vec![effect],
            None => Vec::new(),
        }
    }

    fn open_thread(&mut self, index: usize) {
        let Some(comments) = self.data.comments.as_ref() else {
            return;
        };
        if index >= comments.threads.len() {
            return;
        }
        let threads: Arc<[ReviewThread]> = Arc::from(comments.threads.clone());
        self.expanded = CommentsExpanded::new(threads, index);
        self.expanded
            .set_size(self.width, self.content_height());
        self.view = View::CommentsExpand;
    }

    fn open_check(&mut self, index: usize) {
        let source = if self.view == View::Watch {
            self.watcher.as_ref().and_then(Watcher::latest)
        } else {
            self.data.checks.as_ref()
        };
        let Some(check) = source.and_then(|r| r.checks.get(index)).cloned() else {
            return;
        };
        self.checks_log = ChecksLog::new(check, &self.theme);
        self.checks_log.set_size(self.content_height());
        self.log_parent = if self.view == View::Watch {
            View::Watch
        } else {
            View::ChecksList
        };
        self.view = View::ChecksLog;
    }

    /// Lines for the content area, already cut to its height.
    pub fn content(&self) -> Vec<Line<'static>> {
        let theme = &self.theme;
        match self.view {
            View::CommentsList => self.comments_list.render(theme),
            View::CommentsExpand => self.expanded.render(theme),
            View::ChecksList => self.checks_list.render(theme),
            View::ChecksLog => self.checks_log.render(theme),
            View::Resolve => self.resolve.render(theme),
            View::Summary => self.summary.render(&self.data.summary_data(), theme),
            View::Watch => self
                .watcher
                .as_ref()
                .map(|w| w.render(theme))
                .unwrap_or_default(),
        }
    }

    pub fn help_bindings(&self) -> &'static [KeyBinding] {
        match self.view {
            View::CommentsList => COMMENTS_LIST_KEYS,
            View::CommentsExpand => COMMENTS_EXPANDED_KEYS,
            View::ChecksList | View::ChecksLog => CHECKS_LIST_KEYS,
            View::Watch => CHECKS_WATCH_KEYS,
            View::Resolve => RESOLVE_KEYS,
            View::Summary => SUMMARY_KEYS,
        }
    }

    /// Status bar contents for the active view.
    pub fn status_bar(&self) -> StatusBarData {
        let theme = &self.theme;
        let mut bar = StatusBarData {
            repo: self.pr.slug(),
            pr: self.pr.number,
            ..StatusBarData::default()
        };
        let mut right: Vec<Span<'static>> = Vec::new();
        let mut push = |span: Span<'static>| {
            if !right.is_empty() {
                right.push(Span::raw("  "));
            }
            right.push(span);
        };

        match self.view {
            View::CommentsList | View::CommentsExpand => {
                if let Some(comments) = &self.data.comments {
                    if comments.unresolved_count > 0 {
                        push(Span::styled(
                            format!(" {} unresolved ", comments.unresolved_count),
                            theme.badge(theme.fail),
                        ));
                    }
                    if comments.resolved_count > 0 {
                        push(Span::styled(
                            format!("{} resolved", comments.resolved_count),
                            theme.dim_style(),
                        ));
                    }
                    if self.view == View::CommentsExpand && self.expanded.thread_count() > 0 {
                        push(Span::styled(
                            format!(
                                "Thread {} of {}",
                                self.expanded.index() + 1,
                                self.expanded.thread_count()
                            ),
                            theme.dim_style(),
                        ));
                    }
                }
            }
            View::ChecksList | View::ChecksLog | View::Watch => {
                if let Some(checks) = &self.data.checks {
                    let sha: String = checks.head_sha.chars().take(7).collect();
                    bar.left = vec![Span::styled(format!("HEAD: {sha}"), theme.dim_style())];
                    if checks.pass_count > 0 {
                        push(Span::styled(
                            format!(" {} passed ", checks.pass_count),
                            theme.badge(theme.pass),
                        ));
                    }
                    if checks.fail_count > 0 {
                        push(Span::styled(
                            format!(" {} failed ", checks.fail_count),
                            theme.badge(theme.fail),
                        ));
                    }
                }
            }
            View::Summary => {
                bar.badge = Some(merge_badge(&self.data.summary_data(), theme));
            }
            View::Resolve => {
                if let Some(comments) = &self.data.comments {
                    bar.left = vec![Span::styled("resolve mode", theme.dim_style())];
                    let selected = self.resolve.selected_count();
                    if selected > 0 {
                        push(Span::styled(
                            format!("{selected} selected"),
                            Style::default().fg(theme.pass),
                        ));
                    }
                    push(Span::styled(
                        format!("of {} unresolved", comments.unresolved_count),
                        theme.dim_style(),
                    ));
                } else {
                    bar.badge = Some(("RESOLVE".to_owned(), theme.pending));
                }
            }
        }
        bar.right = right;
        bar
    }
}
