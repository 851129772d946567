//! Text shaping helpers shared by every view.
//!
//! All width arithmetic goes through `unicode-width` so wide glyphs (CJK, emoji) in comment bodies
//! and check names never push a row past the terminal edge.

use std::sync::LazyLock;
use std::time::Duration;

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use regex::Regex;
use time::OffsetDateTime;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

static MARKDOWN_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").expect("image regex compiles"));
static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("link regex compiles"));
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("html regex compiles"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("whitespace regex compiles"));

/// Reduces a markdown comment body to a single plain-text line for previews.
pub fn strip_markdown(body: &str) -> String {
    let flat = body.replace('\n', " ").replace('\r', "");
    let flat = MARKDOWN_IMAGE.replace_all(&flat, "");
    let flat = MARKDOWN_LINK.replace_all(&flat, "$1");
    let flat = HTML_TAG.replace_all(&flat, "");
    let flat = flat
        .replace("***", "")
        .replace("**", "")
        .replace("__", "")
        .replace('`', "");
    WHITESPACE_RUN.replace_all(&flat, " ").trim().to_owned()
}

/// Human-readable age such as `5m ago` or `2mo ago`.
pub fn format_time_ago(age: Duration) -> String {
    let secs = age.as_secs();
    let days = secs / 86_400;
    if secs < 60 {
        "just now".to_owned()
    } else if secs < 3_600 {
        format!("{}m ago", secs / 60)
    } else if secs < 86_400 {
        format!("{}h ago", secs / 3_600)
    } else if days < 30 {
        format!("{days}d ago")
    } else if days / 30 < 12 {
        format!("{}mo ago", days / 30)
    } else {
        format!("{}y ago", days / 365)
    }
}

/// Age of `at` relative to now. Timestamps in the future count as "just now".
pub fn time_ago(at: OffsetDateTime) -> String {
    let elapsed = OffsetDateTime::now_utc() - at;
    format_time_ago(Duration::try_from(elapsed).unwrap_or_default())
}

/// Formats a span of time as `45s`, `3m` or `3m 12s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs() + u64::from(duration.subsec_millis() >= 500);
    if secs < 60 {
        return format!("{secs}s");
    }
    match secs % 60 {
        0 => format!("{}m", secs / 60),
        rest => format!("{}m {rest}s", secs / 60),
    }
}

/// Elapsed time between two optional timestamps, `None` when either is missing or the range is
/// negative.
pub fn elapsed_between(
    start: Option<OffsetDateTime>,
    end: Option<OffsetDateTime>,
) -> Option<Duration> {
    let (start, end) = (start?, end?);
    Duration::try_from(end - start).ok()
}

/// Truncates `text` to at most `max_width` columns, ending in `…` when cut.
pub fn truncate(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if text.width() <= max_width {
        return text.to_owned();
    }
    let budget = max_width - 1;
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

/// Keeps the first `max_chars` characters and appends `...` when anything was dropped.
///
/// Used for opaque GraphQL node ids where a column-exact cut is not needed.
pub fn shorten_id(id: &str, max_chars: usize) -> String {
    if id.chars().count() <= max_chars {
        return id.to_owned();
    }
    let head: String = id.chars().take(max_chars).collect();
    format!("{head}...")
}

/// `1 reply`, `3 replies`.
pub fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("1 {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Display width of a styled line.
pub fn line_width(line: &Line<'_>) -> usize {
    line.spans.iter().map(|s| s.content.width()).sum()
}

/// Appends `right` after enough spaces to push it flush against `width`.
///
/// Falls back to a single space separator when the two halves do not fit.
pub fn pad_between(
    mut left: Vec<Span<'static>>,
    right: Vec<Span<'static>>,
    width: usize,
) -> Line<'static> {
    let left_w: usize = left.iter().map(|s| s.content.width()).sum();
    let right_w: usize = right.iter().map(|s| s.content.width()).sum();
    let gap = width.saturating_sub(left_w + right_w).max(1);
    left.push(Span::raw(" ".repeat(gap)));
    left.extend(right);
    Line::from(left)
}

/// Pads a line with trailing spaces up to `width` columns, leaving longer lines untouched.
pub fn pad_line(mut line: Line<'static>, width: usize) -> Line<'static> {
    let w = line_width(&line);
    if w < width {
        line.spans.push(Span::raw(" ".repeat(width - w)));
    }
    line
}

/// A single dim line, used for every empty-state placeholder.
pub fn placeholder(text: &str, style: Style) -> Line<'static> {
    Line::from(Span::styled(text.to_owned(), style))
}
