//! CI check runs, with failed runs expanded inline to show their annotations.

use crossterm::event::{KeyCode, KeyEvent};
use prdeck_core::status::check_is_failed;
use prdeck_core::types::{Annotation, CheckRun};
use ratatui::style::Style;
use ratatui::text::{Line, Span};

use crate::effects::Effect;
use crate::theme::Theme;
use crate::ui::text::{pad_between, placeholder, plural, truncate};
use crate::views::{check_duration, check_icon, check_name, check_status_text, is_char, is_down, is_up};

#[derive(Debug, Default)]
pub struct ChecksList {
    checks: Vec<CheckRun>,
    cursor: usize,
    offset: usize,
    width: u16,
    height: u16,
}

/// Failed runs with annotations get a count header plus one line per annotation.
fn row_cost(check: &CheckRun) -> usize {
    if check_is_failed(check) && !check.annotations.is_empty() {
        2 + check.annotations.len()
    } else {
        1
    }
}

impl ChecksList {
    pub fn new(checks: Vec<CheckRun>) -> Self {
        Self {
            checks,
            ..Self::default()
        }
    }

    /// Swaps in a fresh poll of the same PR, keeping the cursor clamped to the new length.
    pub fn replace_checks(&mut self, checks: Vec<CheckRun>) {
        self.checks = checks;
        self.cursor = self.cursor.min(self.checks.len().saturating_sub(1));
        self.offset = self.offset.min(self.cursor);
        self.ensure_visible();
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.ensure_visible();
    }

    pub fn checks(&self) -> &[CheckRun] {
        &self.checks
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn handle(&mut self, key: KeyEvent) -> Option<Effect> {
        if self.checks.is_empty() {
            return None;
        }
        if is_down(&key) {
            if self.cursor + 1 < self.checks.len() {
                self.cursor += 1;
                self.ensure_visible();
            }
        } else if is_up(&key) {
            if self.cursor > 0 {
                self.cursor -= 1;
                self.ensure_visible();
            }
        } else if key.code == KeyCode::Enter || is_char(&key, 'l') {
            return Some(Effect::SelectCheck(self.cursor));
        } else if is_char(&key, 'o') {
            let url = &self.checks[self.cursor].html_url;
            if !url.is_empty() {
                return Some(Effect::OpenUrl(url.clone()));
            }
        }
        None
    }

    fn ensure_visible(&mut self) {
        let height = usize::from(self.height);
        if height == 0 {
            return;
        }
        if self.cursor < self.offset {
            self.offset = self.cursor;
        }
        while self.offset < self.cursor
            && self.checks[self.offset..=self.cursor]
                .iter()
                .map(row_cost)
                .sum::<usize>()
                > height
        {
            self.offset += 1;
        }
    }

    pub fn render(&self, theme: &Theme) -> Vec<Line<'static>> {
        if self.checks.is_empty() {
            return vec![placeholder("  No check runs found.", theme.dim_style())];
        }
        let height = usize::from(self.height);
        let width = usize::from(self.width);
        let mut lines = Vec::with_capacity(height);
        for (i, check) in self.checks.iter().enumerate().skip(self.offset) {
            if lines.len() >= height {
                break;
            }
            lines.push(self.render_row(check, i == self.cursor, theme));
            if row_cost(check) > 1 {
                let count = check.annotations.len();
                lines.push(Line::from(Span::styled(
                    format!("      {}", plural(count, "error", "errors")),
                    Style::default().fg(theme.fail),
                )));
                let message_width = width.saturating_sub(30).max(20);
                lines.extend(
                    check
                        .annotations
                        .iter()
                        .map(|a| annotation_line(a, message_width, theme)),
                );
            }
        }
        lines.truncate(height);
        lines
    }

    fn render_row(&self, check: &CheckRun, is_cursor: bool, theme: &Theme) -> Line<'static> {
        let marker = if is_cursor {
            Span::styled(" ▶ ", Style::default().fg(theme.accent))
        } else {
            Span::raw("   ")
        };
        let left = vec![marker, check_icon(check, theme), Span::raw(" "), check_name(check, theme)];
        let right = vec![
            Span::styled(check_duration(check), theme.dim_style()),
            Span::raw("  "),
            check_status_text(check, theme),
            Span::raw(" "),
        ];
        let line = pad_between(left, right, usize::from(self.width));
        if is_cursor {
            line.style(Style::default().bg(theme.selection_bg))
        } else {
            line
        }
    }
}

/// `      ● path:line [title] message`.
fn annotation_line(annotation: &Annotation, message_width: usize, theme: &Theme) -> Line<'static> {
    let mut spans = vec![
        Span::styled("      ● ", Style::default().fg(theme.fail)),
        Span::styled(
            format!("{}:{}", annotation.path, annotation.start_line),
            Style::default().fg(theme.file_path),
        ),
    ];
    if !annotation.title.is_empty() {
        spans.push(Span::styled(format!(" [{}]", annotation.title), theme.dim_style()));
    }
    spans.push(Span::styled(
        format!(" {}", truncate(&annotation.message, message_width)),
        Style::default().fg(theme.text),
    ));
    Line::from(spans)
}
