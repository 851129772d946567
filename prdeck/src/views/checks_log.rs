//! Detail page for one check run: timing, annotations and the error excerpt of its log.

use crossterm::event::KeyEvent;
use prdeck_core::status::check_is_failed;
use prdeck_core::types::CheckRun;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::effects::Effect;
use crate::theme::Theme;
use crate::ui::text::{placeholder, plural};
use crate::views::{check_duration, check_icon, clamp_offset, is_char, is_down, is_up};

#[derive(Debug, Default)]
pub struct ChecksLog {
    check: Option<CheckRun>,
    /// Built once per selection; only the offset changes while scrolling.
    content: Vec<Line<'static>>,
    offset: usize,
    height: u16,
}

impl ChecksLog {
    pub fn new(check: CheckRun, theme: &Theme) -> Self {
        Self {
            content: build_content(&check, theme),
            check: Some(check),
            ..Self::default()
        }
    }

    pub fn set_size(&mut self, height: u16) {
        self.height = height;
        self.offset = clamp_offset(self.offset, self.content.len(), usize::from(height));
    }

    pub fn check(&self) -> Option<&CheckRun> {
        self.check.as_ref()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn handle(&mut self, key: KeyEvent) -> Option<Effect> {
        let check = self.check.as_ref()?;
        if is_down(&key) {
            self.offset = clamp_offset(
                self.offset + 1,
                self.content.len(),
                usize::from(self.height),
            );
        } else if is_up(&key) {
            self.offset = self.offset.saturating_sub(1);
        } else if is_char(&key, 'o') && !check.html_url.is_empty() {
            return Some(Effect::OpenUrl(check.html_url.clone()));
        }
        None
    }

    pub fn render(&self, theme: &Theme) -> Vec<Line<'static>> {
        if self.check.is_none() {
            return vec![placeholder("  No check selected.", theme.dim_style())];
        }
        self.content
            .iter()
            .skip(self.offset)
            .take(usize::from(self.height))
            .cloned()
            .collect()
    }
}

fn build_content(check: &CheckRun, theme: &Theme) -> Vec<Line<'static>> {
    let dim = theme.dim_style();
    let failed = check_is_failed(check);
    let name_color = if failed { theme.fail } else { theme.pass };
    let status = check
        .conclusion
        .as_ref()
        .map(|c| c.as_str().to_owned())
        .unwrap_or_else(|| check.status.as_str().to_owned());

    let mut lines = vec![
        Line::from(vec![
            Span::raw(" "),
            check_icon(check, theme),
            Span::raw(" "),
            Span::styled(
                check.name.clone(),
                Style::default()
                    .fg(name_color)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::default(),
        Line::from(vec![
            Span::styled(" Duration: ", dim),
            Span::styled(check_duration(check), Style::default().fg(theme.text)),
            Span::styled("  Status: ", dim),
            Span::styled(status, Style::default().fg(name_color)),
        ]),
        Line::default(),
    ];

    if !check.annotations.is_empty() {
        lines.push(Line::from(Span::styled(
            format!(" {}", plural(check.annotations.len(), "annotation", "annotations")),
            Style::default()
                .fg(theme.fail)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::default());
        for annotation in &check.annotations {
            lines.push(Line::from(vec![
                Span::styled("  ● ", Style::default().fg(theme.fail)),
                Span::styled(
                    format!("{}:{}", annotation.path, annotation.start_line),
                    Style::default().fg(theme.file_path),
                ),
            ]));
            let mut detail = vec![Span::raw("    ")];
            if !annotation.title.is_empty() {
                detail.push(Span::styled(format!("[{}] ", annotation.title), dim));
            }
            detail.push(Span::styled(
                annotation.message.clone(),
                Style::default().fg(theme.text),
            ));
            lines.push(Line::from(detail));
            lines.push(Line::default());
        }
    }

    if !check.log_excerpt.is_empty() {
        lines.push(Line::from(Span::styled(
            " Log excerpt:",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::default());
        for (i, log_line) in check.log_excerpt.lines().enumerate() {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:>3} ", i + 1), dim),
                Span::styled(log_line.to_owned(), log_line_style(log_line, theme)),
            ]));
        }
    } else if failed {
        lines.push(Line::from(Span::styled(" No log excerpt available.", dim)));
    }
    lines
}

/// Error and failure lines in red, warnings in yellow, elision markers dim.
fn log_line_style(line: &str, theme: &Theme) -> Style {
    let lower = line.to_ascii_lowercase();
    if lower.contains("error") || lower.contains("fail") {
        Style::default().fg(theme.fail)
    } else if lower.contains("warn") {
        Style::default().fg(theme.pending)
    } else if line.trim() == "..." {
        theme.dim_style()
    } else {
        Style::default().fg(theme.text)
    }
}
