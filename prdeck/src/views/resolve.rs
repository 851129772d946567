//! Multi-select resolve workflow.
//!
//! The user picks threads while browsing, confirms the batch, and then watches per-thread
//! outcomes arrive. The model moves through four states:
//!
//! ```text
//! Browsing --enter--> Confirming --enter/y--> Resolving --(all selected reported)--> Done
//!     ^                   |
//!     +-----esc/n---------+
//! ```
//!
//! `Done` is never signalled from outside. It is derived from the outcomes recorded by
//! [`Resolve::apply_result`] as soon as no selected thread is still waiting.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use prdeck_core::types::ReviewThread;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::effects::Effect;
use crate::theme::Theme;
use crate::ui::text::{pad_between, placeholder, strip_markdown, truncate};
use crate::views::{is_char, is_down, is_up};

const LINES_PER_ITEM: usize = 2;
/// Blank separator plus the footer line.
const FOOTER_LINES: u16 = 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolveState {
    #[default]
    Browsing,
    Confirming,
    Resolving,
    Done,
}

#[derive(Debug, Default)]
pub struct Resolve {
    threads: Arc<[ReviewThread]>,
    selected: Vec<bool>,
    resolved: Vec<bool>,
    errors: Vec<Option<String>>,
    state: ResolveState,
    cursor: usize,
    offset: usize,
    width: u16,
    height: u16,
}

impl Resolve {
    pub fn new(threads: Arc<[ReviewThread]>) -> Self {
        let n = threads.len();
        Self {
            threads,
            selected: vec![false; n],
            resolved: vec![false; n],
            errors: vec![None; n],
            ..Self::default()
        }
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.ensure_visible();
    }

    pub fn state(&self) -> ResolveState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn has_threads(&self) -> bool {
        !self.threads.is_empty()
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.get(index).copied().unwrap_or(false)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.iter().filter(|s| **s).count()
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved.iter().filter(|r| **r).count()
    }

    pub fn error_count(&self) -> usize {
        self.errors.iter().filter(|e| e.is_some()).count()
    }

    /// Threads still open, counting the ones resolved in this session as closed.
    pub fn unresolved_count(&self) -> usize {
        self.threads
            .iter()
            .zip(&self.resolved)
            .filter(|(t, resolved)| !t.is_resolved && !**resolved)
            .count()
    }

    /// Whether the thread at `index` may be toggled.
    fn is_eligible(&self, index: usize) -> bool {
        let thread = &self.threads[index];
        thread.viewer_can_resolve && !thread.is_resolved && !self.resolved[index]
    }

    pub fn handle(&mut self, key: KeyEvent) -> Option<Effect> {
        if self.threads.is_empty() {
            return None;
        }
        match self.state {
            ResolveState::Browsing => self.handle_browsing(key),
            ResolveState::Confirming => {
                if key.code == KeyCode::Enter || is_char(&key, 'y') {
                    self.state = ResolveState::Resolving;
                    return Some(Effect::ResolveThreads(self.selected_ids()));
                }
                if key.code == KeyCode::Esc || is_char(&key, 'n') {
                    self.state = ResolveState::Browsing;
                    self.ensure_visible();
                }
                None
            }
            ResolveState::Resolving | ResolveState::Done => None,
        }
    }

    fn handle_browsing(&mut self, key: KeyEvent) -> Option<Effect> {
        if is_down(&key) {
            if self.cursor + 1 < self.threads.len() {
                self.cursor += 1;
                self.ensure_visible();
            }
        } else if is_up(&key) {
            if self.cursor > 0 {
                self.cursor -= 1;
                self.ensure_visible();
            }
        } else if is_char(&key, ' ') {
            if self.is_eligible(self.cursor) {
                self.selected[self.cursor] = !self.selected[self.cursor];
            }
        } else if is_char(&key, 'a') {
            self.toggle_all();
        } else if key.code == KeyCode::Enter {
            if self.selected_count() > 0 {
                self.state = ResolveState::Confirming;
                self.ensure_visible();
            }
        } else if is_char(&key, 'o') {
            return self.threads[self.cursor]
                .url()
                .map(|url| Effect::OpenUrl(url.to_owned()));
        }
        None
    }

    /// Selects every eligible thread, or clears them all when every one is already selected.
    fn toggle_all(&mut self) {
        let eligible: Vec<usize> = (0..self.threads.len())
            .filter(|&i| self.is_eligible(i))
            .collect();
        let all_selected = eligible.iter().all(|&i| self.selected[i]);
        for i in eligible {
            self.selected[i] = !all_selected;
        }
    }

    fn selected_ids(&self) -> Vec<String> {
        self.threads
            .iter()
            .zip(&self.selected)
            .filter(|(_, selected)| **selected)
            .map(|(t, _)| t.id.clone())
            .collect()
    }

    /// Records the outcome for `thread_id` and moves to `Done` once every selected thread has one.
    pub fn apply_result(&mut self, thread_id: &str, result: Result<(), String>) {
        let Some(index) = self.threads.iter().position(|t| t.id == thread_id) else {
            tracing::debug!(thread_id, "resolve result for unknown thread");
            return;
        };
        match result {
            Ok(()) => self.resolved[index] = true,
            Err(message) => self.errors[index] = Some(message),
        }
        if self.state == ResolveState::Resolving && self.all_reported() {
            self.state = ResolveState::Done;
        }
    }

    fn all_reported(&self) -> bool {
        (0..self.threads.len())
            .filter(|&i| self.selected[i])
            .all(|i| self.resolved[i] || self.errors[i].is_some())
    }

    fn list_height(&self) -> usize {
        let height = match self.state {
            ResolveState::Browsing => self.height,
            _ => self.height.saturating_sub(FOOTER_LINES),
        };
        usize::from(height)
    }

    fn ensure_visible(&mut self) {
        let visible_items = (self.list_height() / LINES_PER_ITEM).max(1);
        if self.cursor < self.offset {
            self.offset = self.cursor;
        } else if self.cursor >= self.offset + visible_items {
            self.offset = self.cursor + 1 - visible_items;
        }
    }

    pub fn render(&self, theme: &Theme) -> Vec<Line<'static>> {
        if self.threads.is_empty() {
            return vec![placeholder(" No review threads to resolve.", theme.dim_style())];
        }
        let list_height = self.list_height();
        let mut lines: Vec<Line<'static>> = self
            .threads
            .iter()
            .enumerate()
            .skip(self.offset)
            .flat_map(|(i, thread)| self.render_item(i, thread, theme))
            .take(list_height)
            .collect();
        if let Some(footer) = self.footer(theme) {
            lines.resize(list_height, Line::default());
            lines.push(Line::default());
            lines.push(footer);
        }
        lines
    }

    fn checkbox(&self, index: usize, theme: &Theme) -> Span<'static> {
        let thread = &self.threads[index];
        if self.resolved[index] {
            Span::styled("[✓]", Style::default().fg(theme.pass))
        } else if self.errors[index].is_some() {
            Span::styled("[✗]", Style::default().fg(theme.fail))
        } else if !thread.viewer_can_resolve {
            Span::styled("[-]", theme.dim_style())
        } else if self.selected[index] {
            Span::styled("[✓]", Style::default().fg(theme.pass))
        } else {
            Span::styled("[ ]", theme.dim_style())
        }
    }

    fn render_item(&self, index: usize, thread: &ReviewThread, theme: &Theme) -> [Line<'static>; 2] {
        let dim = theme.dim_style();
        let cursor = if index == self.cursor {
            Span::styled("▶ ", Style::default().fg(theme.accent))
        } else {
            Span::raw("  ")
        };
        let author = thread
            .root_comment()
            .map(|c| c.author.as_str())
            .unwrap_or("unknown");
        let mut left = vec![
            cursor,
            self.checkbox(index, theme),
            Span::raw(" "),
            Span::styled(
                format!("{}{}", thread.path, thread.line_label()),
                Style::default().fg(theme.file_path),
            ),
            Span::styled(" — ", dim),
            Span::styled(format!("@{author}"), Style::default().fg(theme.author)),
        ];
        if !thread.viewer_can_resolve {
            left.push(Span::styled(" (no permission)", dim));
        }
        let right = vec![Span::styled(
            truncate(&thread.id, 17),
            Style::default().fg(theme.thread_id),
        )];
        let first = pad_between(left, right, usize::from(self.width));

        let body_width = usize::from(self.width).saturating_sub(8);
        let second = match &self.errors[index] {
            Some(message) => Line::from(vec![
                Span::raw("     "),
                Span::styled(truncate(message, body_width), Style::default().fg(theme.fail)),
            ]),
            None => {
                let body = thread
                    .root_comment()
                    .map(|c| strip_markdown(&c.body))
                    .unwrap_or_default();
                Line::from(vec![Span::raw("     "), Span::styled(truncate(&body, body_width), dim)])
            }
        };
        [first, second]
    }

    fn footer(&self, theme: &Theme) -> Option<Line<'static>> {
        let bold = |color| Style::default().fg(color).add_modifier(Modifier::BOLD);
        match self.state {
            ResolveState::Browsing => None,
            ResolveState::Confirming => {
                let count = self.selected_count();
                let noun = if count == 1 { "thread" } else { "threads" };
                Some(Line::from(vec![
                    Span::styled(format!(" Resolve {count} {noun}?"), bold(theme.pending)),
                    Span::styled("  Press enter to confirm, esc to cancel", theme.dim_style()),
                ]))
            }
            ResolveState::Resolving => {
                let done = self.resolved_count() + self.error_count();
                Some(Line::from(Span::styled(
                    format!(" ⟳ Resolving... {done}/{}", self.selected_count()),
                    Style::default().fg(theme.accent),
                )))
            }
            ResolveState::Done => {
                let mut spans = vec![Span::raw(" ")];
                let resolved = self.resolved_count();
                let failed = self.error_count();
                if resolved > 0 {
                    spans.push(Span::styled(format!("✓ {resolved} resolved"), bold(theme.pass)));
                }
                if failed > 0 {
                    if resolved > 0 {
                        spans.push(Span::raw("  "));
                    }
                    spans.push(Span::styled(format!("✗ {failed} failed"), bold(theme.fail)));
                }
                Some(Line::from(spans))
            }
        }
    }
}
