//! Bottom help bar listing the key bindings of the active view.

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::theme::Theme;

/// One `key action` pair shown in the help bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub key: &'static str,
    pub action: &'static str,
}

const fn kb(key: &'static str, action: &'static str) -> KeyBinding {
    KeyBinding { key, action }
}

pub const COMMENTS_LIST_KEYS: &[KeyBinding] = &[
    kb("j/k", "navigate"),
    kb("enter", "expand"),
    kb("r", "resolve"),
    kb("y", "copy ID"),
    kb("o", "open in browser"),
    kb("f", "filter by file"),
    kb("tab", "checks view"),
    kb("q", "quit"),
];

pub const COMMENTS_EXPANDED_KEYS: &[KeyBinding] = &[
    kb("esc", "back to list"),
    kb("j/k", "scroll"),
    kb("r", "resolve thread"),
    kb("y", "copy ID"),
    kb("o", "open in browser"),
    kb("n/p", "next/prev thread"),
    kb("q", "quit"),
];

/// Shared by the checks list and the log view.
pub const CHECKS_LIST_KEYS: &[KeyBinding] = &[
    kb("j/k", "navigate"),
    kb("enter", "view logs"),
    kb("l", "view full log"),
    kb("o", "open in browser"),
    kb("R", "re-run failed"),
    kb("tab", "comments view"),
    kb("q", "quit"),
];

pub const CHECKS_WATCH_KEYS: &[KeyBinding] = &[
    kb("j/k", "navigate"),
    kb("enter", "view logs"),
    kb("ctrl+c", "stop watching"),
    kb("q", "quit"),
];

pub const RESOLVE_KEYS: &[KeyBinding] = &[
    kb("j/k", "navigate"),
    kb("space", "toggle select"),
    kb("a", "select all"),
    kb("enter", "resolve selected"),
    kb("esc", "cancel"),
    kb("q", "quit"),
];

pub const SUMMARY_KEYS: &[KeyBinding] = &[
    kb("c", "comments"),
    kb("k", "checks"),
    kb("r", "resolve"),
    kb("o", "open PR"),
    kb("R", "re-run failed"),
    kb("q", "quit"),
];

/// Renders `bindings` left to right, dropping trailing bindings that would overflow `width`.
///
/// The first binding is always kept; the result is padded with spaces to `width`.
pub fn render_help_bar(bindings: &[KeyBinding], width: u16, theme: &Theme) -> Line<'static> {
    let width = usize::from(width);
    let Some((first, rest)) = bindings.split_first() else {
        return Line::default();
    };
    if width == 0 {
        return Line::default();
    }

    let key_style = Style::default().fg(theme.help_key);
    let action_style = Style::default().fg(theme.dim);
    let item = |b: &KeyBinding| {
        [
            Span::styled(b.key, key_style),
            Span::raw(" "),
            Span::styled(b.action, action_style),
        ]
    };
    let item_width = |b: &KeyBinding| b.key.width() + 1 + b.action.width();

    let mut spans = vec![Span::raw(" ")];
    spans.extend(item(first));
    let mut used = 1 + item_width(first);
    for binding in rest {
        let next = used + 2 + item_width(binding);
        if next + 2 > width {
            break;
        }
        spans.push(Span::raw("  "));
        spans.extend(item(binding));
        used = next;
    }
    spans.push(Span::raw(" "));
    used += 1;
    if used < width {
        spans.push(Span::raw(" ".repeat(width - used)));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::text::line_width;

    fn plain(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn wide_terminal_shows_every_binding() {
        let line = render_help_bar(RESOLVE_KEYS, 120, &Theme::dark());
        let text = plain(&line);
        assert!(text.starts_with(" j/k navigate  space toggle select"));
        assert!(text.contains("q quit"));
        assert_eq!(line_width(&line), 120);
    }

    #[test]
    fn narrow_terminal_drops_trailing_bindings() {
        let line = render_help_bar(COMMENTS_LIST_KEYS, 30, &Theme::dark());
        let text = plain(&line);
        assert!(text.contains("j/k navigate"));
        assert!(text.contains("enter expand"));
        assert!(!text.contains("quit"));
        assert_eq!(line_width(&line), 30);
    }

    #[test]
    fn empty_bindings_render_nothing() {
        assert!(render_help_bar(&[], 80, &Theme::dark()).spans.is_empty());
    }
}
