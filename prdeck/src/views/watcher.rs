//! CI watch loop: polls checks on a fixed interval and logs each run as it completes.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent};
use prdeck_core::status::WatchPolicy;
use prdeck_core::types::{CheckStatus, ChecksResult, Conclusion, OverallStatus};
use prdeck_core::GithubError;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::effects::Effect;
use crate::theme::Theme;
use crate::ui::text::{format_duration, pad_between, placeholder, time_ago};
use crate::views::{
    check_duration, check_icon, check_status_text, clamp_offset, is_down, is_up,
};

/// Lines around the checks block: status line, blank, blank, log header, blank.
const CHROME_LINES: usize = 5;
const MIN_LOG_HEIGHT: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WatchState {
    #[default]
    Polling,
    /// Terminal: the checks passed.
    Done,
    /// Terminal: a check failed.
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WatchEventKind {
    Completed(Option<Conclusion>),
    PollError,
}

/// One append-only event-log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchEvent {
    pub at: OffsetDateTime,
    pub kind: WatchEventKind,
    pub name: String,
    pub detail: String,
}

#[derive(Debug)]
pub struct Watcher {
    interval: Duration,
    policy: WatchPolicy,
    state: WatchState,
    latest: Option<ChecksResult>,
    /// Check id to the conclusion it was first seen completing with.
    seen: HashMap<i64, Option<Conclusion>>,
    events: Vec<WatchEvent>,
    started: Instant,
    last_update: Option<OffsetDateTime>,
    cursor: usize,
    /// First check row shown when the checks do not fit above the event log.
    check_offset: usize,
    log_offset: usize,
    width: u16,
    height: u16,
}

impl Watcher {
    pub fn new(interval: Duration, policy: WatchPolicy) -> Self {
        Self {
            interval,
            policy,
            state: WatchState::Polling,
            latest: None,
            seen: HashMap::new(),
            events: Vec::new(),
            started: Instant::now(),
            last_update: None,
            cursor: 0,
            check_offset: 0,
            log_offset: 0,
            width: 0,
            height: 0,
        }
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.ensure_cursor_visible();
        self.scroll_log_to_tail();
    }

    pub fn policy(&self) -> WatchPolicy {
        self.policy
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn events(&self) -> &[WatchEvent] {
        &self.events
    }

    pub fn latest(&self) -> Option<&ChecksResult> {
        self.latest.as_ref()
    }

    pub fn log_offset(&self) -> usize {
        self.log_offset
    }

    pub fn check_offset(&self) -> usize {
        self.check_offset
    }

    /// First poll, issued when the view starts.
    pub fn init(&self) -> Effect {
        Effect::PollChecks
    }

    /// A re-armed timer fired. Terminal states accept no further ticks.
    pub fn tick(&self) -> Option<Effect> {
        (self.state == WatchState::Polling).then_some(Effect::PollChecks)
    }

    /// Folds a poll outcome into the session and returns the next timer when polling continues.
    pub fn apply_poll(&mut self, result: Result<ChecksResult, GithubError>) -> Option<Effect> {
        if self.state != WatchState::Polling {
            return None;
        }
        let now = OffsetDateTime::now_utc();
        self.last_update = Some(now);
        let result = match result {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(error = %err, "check poll failed");
                self.events.push(WatchEvent {
                    at: now,
                    kind: WatchEventKind::PollError,
                    name: "poll error".to_owned(),
                    detail: err.to_string(),
                });
                self.scroll_log_to_tail();
                return Some(Effect::SchedulePoll(self.interval));
            }
        };

        for check in &result.checks {
            if check.status != CheckStatus::Completed || self.seen.contains_key(&check.id) {
                continue;
            }
            self.seen.insert(check.id, check.conclusion.clone());
            self.events.push(WatchEvent {
                at: now,
                kind: WatchEventKind::Completed(check.conclusion.clone()),
                name: check.name.clone(),
                detail: check_duration(check),
            });
        }

        let terminal = self.policy.is_terminal(&result);
        let failed = result.overall_status == OverallStatus::Fail;
        self.cursor = self.cursor.min(result.checks.len().saturating_sub(1));
        self.latest = Some(result);
        self.ensure_cursor_visible();
        self.scroll_log_to_tail();

        if terminal {
            self.state = if failed {
                WatchState::Failed
            } else {
                WatchState::Done
            };
            tracing::info!(state = ?self.state, "watch finished");
            None
        } else {
            Some(Effect::SchedulePoll(self.interval))
        }
    }

    pub fn handle(&mut self, key: KeyEvent) -> Option<Effect> {
        let count = self.latest.as_ref().map_or(0, |r| r.checks.len());
        if count == 0 {
            return None;
        }
        if is_down(&key) {
            self.cursor = (self.cursor + 1).min(count - 1);
        } else if is_up(&key) {
            self.cursor = self.cursor.saturating_sub(1);
        } else if key.code == KeyCode::Enter {
            return Some(Effect::SelectCheck(self.cursor));
        }
        self.ensure_cursor_visible();
        None
    }

    fn check_count(&self) -> usize {
        self.latest.as_ref().map_or(0, |r| r.checks.len())
    }

    /// Rows given to the checks block. The event log always keeps `MIN_LOG_HEIGHT` rows.
    fn checks_height(&self) -> usize {
        let room = usize::from(self.height)
            .saturating_sub(CHROME_LINES + MIN_LOG_HEIGHT)
            .max(1);
        self.check_count().max(1).min(room)
    }

    fn log_height(&self) -> usize {
        usize::from(self.height)
            .saturating_sub(CHROME_LINES + self.checks_height())
            .max(MIN_LOG_HEIGHT)
    }

    fn ensure_cursor_visible(&mut self) {
        let rows = self.checks_height();
        if self.cursor < self.check_offset {
            self.check_offset = self.cursor;
        } else if self.cursor >= self.check_offset + rows {
            self.check_offset = self.cursor + 1 - rows;
        }
        self.check_offset = clamp_offset(self.check_offset, self.check_count(), rows);
    }

    fn scroll_log_to_tail(&mut self) {
        self.log_offset = self.events.len().saturating_sub(self.log_height());
    }

    pub fn render(&self, theme: &Theme) -> Vec<Line<'static>> {
        let width = usize::from(self.width);
        let dim = theme.dim_style();
        let mut lines = vec![self.status_line(theme), Line::default()];

        match self.latest.as_ref().filter(|r| !r.checks.is_empty()) {
            None => lines.push(placeholder("  Waiting for first poll...", dim)),
            Some(result) => {
                let visible = result
                    .checks
                    .iter()
                    .enumerate()
                    .skip(self.check_offset)
                    .take(self.checks_height());
                for (i, check) in visible {
                    let left = vec![
                        Span::raw("  "),
                        check_icon(check, theme),
                        Span::raw(" "),
                        Span::styled(check.name.clone(), Style::default().fg(theme.text)),
                    ];
                    let right = vec![
                        Span::styled(check_duration(check), dim),
                        Span::raw("  "),
                        check_status_text(check, theme),
                        Span::raw(" "),
                    ];
                    let line = pad_between(left, right, width);
                    lines.push(if i == self.cursor {
                        line.style(Style::default().bg(theme.selection_bg))
                    } else {
                        line
                    });
                }
            }
        }

        lines.push(Line::default());
        let header = vec![
            Span::raw(" "),
            Span::styled("Event Log", Style::default().add_modifier(Modifier::BOLD)),
        ];
        let updated = self
            .last_update
            .map(|at| vec![Span::styled(format!("last updated {} ", time_ago(at)), dim)])
            .unwrap_or_default();
        lines.push(pad_between(header, updated, width));
        lines.push(Line::default());

        if self.events.is_empty() {
            lines.push(placeholder("  Waiting for events...", dim));
        } else {
            lines.extend(
                self.events
                    .iter()
                    .skip(self.log_offset)
                    .take(self.log_height())
                    .map(|event| event_line(event, theme)),
            );
        }
        lines.truncate(usize::from(self.height));
        lines
    }

    fn status_line(&self, theme: &Theme) -> Line<'static> {
        let dim = theme.dim_style();
        let bold = |color| Style::default().fg(color).add_modifier(Modifier::BOLD);
        let mut spans = vec![Span::raw(" ")];
        spans.push(match self.state {
            WatchState::Polling => Span::styled("● watching", bold(theme.accent)),
            WatchState::Done => Span::styled("✓ All checks passed", bold(theme.pass)),
            WatchState::Failed => Span::styled(
                match self.policy {
                    WatchPolicy::FailFast => "✗ Check failure detected / fail-fast triggered",
                    WatchPolicy::WaitAll => "✗ Check failure detected",
                },
                bold(theme.fail),
            ),
        });
        if let Some(result) = &self.latest {
            let total = result.checks.len();
            if total > 0 {
                let completed = result
                    .checks
                    .iter()
                    .filter(|c| c.status == CheckStatus::Completed)
                    .count();
                spans.push(Span::styled(format!("  {completed}/{total}"), dim));
            }
        }
        spans.push(Span::styled(
            format!("  elapsed: {}", format_duration(self.started.elapsed())),
            dim,
        ));
        spans.push(Span::styled(format!("  poll: {}s", self.interval.as_secs()), dim));
        Line::from(spans)
    }
}

fn event_line(event: &WatchEvent, theme: &Theme) -> Line<'static> {
    let clock = event
        .at
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_default();
    let icon = match &event.kind {
        WatchEventKind::PollError
        | WatchEventKind::Completed(Some(Conclusion::Failure | Conclusion::TimedOut)) => {
            Span::styled("✗", Style::default().fg(theme.fail))
        }
        WatchEventKind::Completed(Some(Conclusion::Skipped | Conclusion::Cancelled)) => {
            Span::styled("—", theme.dim_style())
        }
        WatchEventKind::Completed(_) => Span::styled("✓", Style::default().fg(theme.pass)),
    };
    Line::from(vec![
        Span::styled(format!("  {clock} "), theme.dim_style()),
        icon,
        Span::raw(" "),
        Span::styled(event.name.clone(), Style::default().fg(theme.text)),
        Span::styled(format!(" {}", event.detail), theme.dim_style()),
    ])
}
