//! Top status bar: app name, repository, PR number, and per-view counts on the right.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::theme::Theme;
use crate::ui::text::truncate;

/// Everything the status bar shows. Views fill `left`, `right` and `badge`.
#[derive(Debug, Clone, Default)]
pub struct StatusBarData {
    /// `owner/repo`.
    pub repo: String,
    pub pr: u64,
    /// Extra text after the PR number (e.g. `HEAD: 0123abc`).
    pub left: Vec<Span<'static>>,
    /// Right-aligned counts.
    pub right: Vec<Span<'static>>,
    /// Right-most badge text and its color.
    pub badge: Option<(String, Color)>,
}

/// Renders the bar as one line exactly `width` columns wide.
///
/// When the two halves do not fit, the left half is cut first so counts and badges stay visible.
pub fn render_status_bar(data: &StatusBarData, width: u16, theme: &Theme) -> Line<'static> {
    let width = usize::from(width);
    if width == 0 {
        return Line::default();
    }
    let dim = Style::default().fg(theme.dim);

    let mut left = vec![Span::styled(
        "prdeck",
        Style::default()
            .fg(theme.accent)
            .add_modifier(Modifier::BOLD),
    )];
    if !data.repo.is_empty() {
        left.push(Span::raw("  "));
        left.push(Span::styled(data.repo.clone(), dim));
    }
    if data.pr > 0 {
        left.push(Span::raw("  "));
        left.push(Span::styled(format!(" PR #{} ", data.pr), theme.badge(theme.thread_id)));
    }
    if !data.left.is_empty() {
        left.push(Span::raw("  "));
        left.extend(data.left.iter().cloned());
    }

    let mut right: Vec<Span<'static>> = data.right.clone();
    if let Some((text, color)) = &data.badge {
        if !right.is_empty() {
            right.push(Span::raw("  "));
        }
        right.push(Span::styled(format!(" {text} "), theme.badge(*color)));
    }

    let right_w = spans_width(&right);
    let available_left = width.saturating_sub(right_w + 3);
    let left = clip_spans(left, available_left);
    let left_w = spans_width(&left);
    let gap = width.saturating_sub(left_w + right_w + 2).max(1);

    let mut spans = Vec::with_capacity(left.len() + right.len() + 3);
    spans.push(Span::raw(" "));
    spans.extend(left);
    spans.push(Span::raw(" ".repeat(gap)));
    spans.extend(right);
    spans.push(Span::raw(" "));

    let line = Line::from(clip_spans(spans, width));
    line.style(
        Style::default()
            .bg(theme.status_bar_bg)
            .fg(theme.status_bar_fg),
    )
}

fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|s| s.content.width()).sum()
}

/// Keeps whole spans while they fit and cuts the first one that does not.
fn clip_spans(spans: Vec<Span<'static>>, max_width: usize) -> Vec<Span<'static>> {
    let mut out = Vec::with_capacity(spans.len());
    let mut used = 0;
    for span in spans {
        let w = span.content.width();
        if used + w <= max_width {
            used += w;
            out.push(span);
            continue;
        }
        let room = max_width - used;
        if room > 0 {
            out.push(Span::styled(truncate(&span.content, room), span.style));
        }
        break;
    }
    out
}
