//! Per-view sub-models.
//!
//! Each sub-model owns its cursor and scroll state, reacts to keys through
//! `handle(KeyEvent) -> Option<Effect>` and renders only the lines that fit its content area.
//! The root shell in [`crate::app`] decides which one is active.

pub mod checks_list;
pub mod checks_log;
pub mod comments_expanded;
pub mod comments_list;
pub mod resolve;
pub mod summary;
pub mod watcher;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use prdeck_core::status::check_is_failed;
use prdeck_core::types::{CheckRun, CheckStatus, Conclusion};
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;

use crate::theme::Theme;
use crate::ui::text::{elapsed_between, format_duration};

pub(crate) fn is_down(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Down | KeyCode::Char('j')) && plain(key)
}

pub(crate) fn is_up(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Up | KeyCode::Char('k')) && plain(key)
}

pub(crate) fn is_char(key: &KeyEvent, c: char) -> bool {
    key.code == KeyCode::Char(c) && plain(key)
}

/// No modifier other than shift, which terminals report for uppercase letters.
fn plain(key: &KeyEvent) -> bool {
    key.modifiers.difference(KeyModifiers::SHIFT).is_empty()
}

/// Status glyph for a check row.
pub(crate) fn check_icon(check: &CheckRun, theme: &Theme) -> Span<'static> {
    match check.status {
        CheckStatus::InProgress => Span::styled("⟳", Style::default().fg(theme.accent)),
        CheckStatus::Queued => Span::styled("◌", Style::default().fg(theme.pending)),
        CheckStatus::Completed => match check.conclusion {
            Some(Conclusion::Success | Conclusion::Neutral | Conclusion::Skipped) => {
                Span::styled("✓", Style::default().fg(theme.pass))
            }
            _ => Span::styled("✗", Style::default().fg(theme.fail)),
        },
    }
}

/// Right-hand status word of a check row.
pub(crate) fn check_status_text(check: &CheckRun, theme: &Theme) -> Span<'static> {
    let styled = |text: &str, color| Span::styled(text.to_owned(), Style::default().fg(color));
    match check.status {
        CheckStatus::InProgress => styled("running", theme.accent),
        CheckStatus::Queued => styled("queued", theme.pending),
        CheckStatus::Completed => match &check.conclusion {
            Some(Conclusion::Success) => styled("passed", theme.pass),
            Some(Conclusion::Failure) => styled("failed", theme.fail),
            Some(Conclusion::Cancelled) => styled("cancelled", theme.fail),
            Some(Conclusion::Skipped) => styled("skipped", theme.pass),
            Some(Conclusion::Neutral) => styled("neutral", theme.pass),
            Some(other) => styled(other.as_str(), theme.dim),
            None => styled("", theme.dim),
        },
    }
}

/// `running...` while in progress without timestamps, `—` when timestamps are missing.
pub(crate) fn check_duration(check: &CheckRun) -> String {
    match elapsed_between(check.started_at, check.completed_at) {
        Some(elapsed) => format_duration(elapsed),
        None if check.status == CheckStatus::InProgress => "running...".to_owned(),
        None => "—".to_owned(),
    }
}

/// Check name, bold in the failure color when the run failed.
pub(crate) fn check_name(check: &CheckRun, theme: &Theme) -> Span<'static> {
    if check_is_failed(check) {
        Span::styled(
            check.name.clone(),
            Style::default().fg(theme.fail).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(check.name.clone(), Style::default().fg(theme.text))
    }
}

/// Shared scroll rule of the static-content views: `0 <= offset <= max(0, lines - height)`.
pub(crate) fn clamp_offset(offset: usize, lines: usize, height: usize) -> usize {
    offset.min(lines.saturating_sub(height))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use prdeck_core::types::{Comment, ReviewThread};
    use ratatui::text::Line;

    pub fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    pub fn ch(c: char) -> KeyEvent {
        key(KeyCode::Char(c))
    }

    pub fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    pub fn thread(id: &str, path: &str, line: u32) -> ReviewThread {
        ReviewThread {
            id: id.to_owned(),
            path: path.to_owned(),
            line,
            viewer_can_resolve: true,
            comments: vec![Comment {
                id: format!("c-{id}"),
                author: "reviewer".to_owned(),
                body: format!("comment on **{id}**"),
                url: format!("https://github.com/o/r/pull/1#discussion_{id}"),
                path: path.to_owned(),
                ..Comment::default()
            }],
            ..ReviewThread::default()
        }
    }
}
