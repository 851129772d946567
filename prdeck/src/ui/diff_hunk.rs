//! Diff-hunk renderer for the expanded thread view.
//!
//! GitHub attaches a unified-diff excerpt to every review comment. Code is syntax-highlighted with
//! syntect using the file extension of the commented path, and adjacent `-`/`+` line pairs get
//! word-level emphasis computed with `similar`.

use std::sync::LazyLock;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use similar::{ChangeTag, TextDiff};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;

use crate::theme::Theme;
use crate::ui::text::pad_line;

static PS: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static TS: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// Renders `hunk` into styled lines, each padded to `width` columns.
///
/// `path` only selects the syntax. An empty hunk renders no lines; blank lines inside the hunk
/// are kept as blank lines.
pub fn render_diff_hunk(hunk: &str, path: &str, width: u16, theme: &Theme) -> Vec<Line<'static>> {
    if hunk.is_empty() {
        return Vec::new();
    }
    let width = usize::from(width);
    let syntax = PS
        .find_syntax_by_extension(file_ext(path))
        .unwrap_or_else(|| PS.find_syntax_plain_text());
    let mut highlighter = TS
        .themes
        .get("base16-ocean.dark")
        .or_else(|| TS.themes.values().next())
        .map(|t| HighlightLines::new(syntax, t));

    let removed_style = Style::default().fg(theme.diff_removed);
    let added_style = Style::default().fg(theme.diff_added);

    let mut out: Vec<Line<'static>> = Vec::new();
    let mut pending_removed: Option<(String, Vec<Span<'static>>)> = None;

    for raw in hunk.split('\n') {
        let raw = raw.trim_end_matches('\r');
        if raw.is_empty() {
            flush(&mut pending_removed, &mut out);
            out.push(Line::default());
            continue;
        }
        if raw.starts_with("@@") {
            flush(&mut pending_removed, &mut out);
            out.push(Line::from(Span::styled(
                raw.to_owned(),
                Style::default().fg(theme.diff_hunk_header),
            )));
            continue;
        }

        let (origin, code) = match raw.chars().next() {
            Some(c @ ('+' | '-' | ' ')) => (c, &raw[1..]),
            _ => (' ', raw),
        };
        let base_spans = match highlighter.as_mut() {
            Some(h) => highlight_code(code, h),
            None => vec![Span::styled(code.to_owned(), Style::default().fg(theme.diff_context))],
        };

        match origin {
            '-' => {
                flush(&mut pending_removed, &mut out);
                let mut spans = vec![Span::styled("-", removed_style)];
                spans.extend(base_spans);
                pending_removed = Some((code.to_owned(), spans));
            }
            '+' => match pending_removed.take() {
                Some((old_code, _)) => {
                    let (old_words, new_words) = word_diff_spans(&old_code, code, theme);
                    let mut old_line = vec![Span::styled("-", removed_style)];
                    old_line.extend(old_words);
                    out.push(Line::from(old_line));
                    let mut new_line = vec![Span::styled("+", added_style)];
                    new_line.extend(new_words);
                    out.push(Line::from(new_line));
                }
                None => {
                    let mut spans = vec![Span::styled("+", added_style)];
                    spans.extend(base_spans);
                    out.push(Line::from(spans));
                }
            },
            _ => {
                flush(&mut pending_removed, &mut out);
                let mut spans = vec![Span::styled(" ", Style::default().fg(theme.dim))];
                spans.extend(base_spans);
                out.push(Line::from(spans));
            }
        }
    }
    flush(&mut pending_removed, &mut out);

    if width > 0 {
        out = out.into_iter().map(|line| pad_line(line, width)).collect();
    }
    out
}

fn flush(pending: &mut Option<(String, Vec<Span<'static>>)>, out: &mut Vec<Line<'static>>) {
    if let Some((_, spans)) = pending.take() {
        out.push(Line::from(spans));
    }
}

/// Converts a syntect style into an owned ratatui span.
fn syntect_to_span(style: syntect::highlighting::Style, content: &str) -> Span<'static> {
    use syntect::highlighting::{Color as SC, FontStyle};
    let to_color = |c: SC| (c.a > 0).then_some(Color::Rgb(c.r, c.g, c.b));
    let mut out = Style::default();
    if let Some(fg) = to_color(style.foreground) {
        out = out.fg(fg);
    }
    if style.font_style.contains(FontStyle::BOLD) {
        out = out.add_modifier(Modifier::BOLD);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        out = out.add_modifier(Modifier::ITALIC);
    }
    Span::styled(content.to_owned(), out)
}

/// Highlights one line of code, falling back to a plain span when syntect fails.
fn highlight_code(code: &str, h: &mut HighlightLines) -> Vec<Span<'static>> {
    let spans: Vec<Span<'static>> = h
        .highlight_line(code, &PS)
        .unwrap_or_default()
        .into_iter()
        .map(|(style, text)| syntect_to_span(style, text))
        .collect();
    if spans.is_empty() {
        vec![Span::raw(code.to_owned())]
    } else {
        spans
    }
}

/// Word-level diff of a removed/added pair. Changed words are bold.
fn word_diff_spans(
    old_line: &str,
    new_line: &str,
    theme: &Theme,
) -> (Vec<Span<'static>>, Vec<Span<'static>>) {
    let diff = TextDiff::from_words(old_line, new_line);
    let mut old_spans = Vec::new();
    let mut new_spans = Vec::new();

    for op in diff.ops() {
        for change in diff.iter_inline_changes(op) {
            for (emphasized, value) in change.iter_strings_lossy() {
                let text = value.into_owned();
                let emphasize = |style: Style| {
                    if emphasized {
                        style.add_modifier(Modifier::BOLD)
                    } else {
                        style
                    }
                };
                match change.tag() {
                    ChangeTag::Delete => {
                        old_spans.push(Span::styled(
                            text,
                            emphasize(Style::default().fg(theme.diff_removed)),
                        ));
                    }
                    ChangeTag::Insert => {
                        new_spans.push(Span::styled(
                            text,
                            emphasize(Style::default().fg(theme.diff_added)),
                        ));
                    }
                    ChangeTag::Equal => {
                        let span = Span::styled(text, Style::default().fg(theme.dim));
                        old_spans.push(span.clone());
                        new_spans.push(span);
                    }
                }
            }
        }
    }
    (old_spans, new_spans)
}

/// Extension of a repository-relative path, `txt` when there is none.
fn file_ext(path: &str) -> &str {
    match path.rsplit_once('.') {
        Some((_, ext)) if !ext.contains('/') => ext,
        _ => "txt",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::text::line_width;

    fn plain(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    const HUNK: &str = "@@ -10,3 +10,3 @@ fn main() {\n     let a = 1;\n-    let b = 2;\n+    let b = 3;\n }";

    #[test]
    fn keeps_every_line_in_order() {
        let theme = Theme::dark();
        let lines = render_diff_hunk(HUNK, "src/main.rs", 0, &theme);
        let text: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(
            text,
            [
                "@@ -10,3 +10,3 @@ fn main() {",
                "     let a = 1;",
                "-    let b = 2;",
                "+    let b = 3;",
                " }",
            ]
        );
        assert_eq!(lines[0].spans[0].style.fg, Some(theme.diff_hunk_header));
        assert_eq!(lines[2].spans[0].style.fg, Some(theme.diff_removed));
        assert_eq!(lines[3].spans[0].style.fg, Some(theme.diff_added));
    }

    #[test]
    fn changed_words_are_emphasized() {
        let theme = Theme::dark();
        let lines = render_diff_hunk("-let b = 2;\n+let b = 3;", "x.rs", 0, &theme);
        let bold_added: Vec<&str> = lines[1]
            .spans
            .iter()
            .filter(|s| s.style.add_modifier.contains(Modifier::BOLD))
            .map(|s| s.content.as_ref())
            .collect();
        let bold_added = bold_added.concat();
        assert!(bold_added.contains('3'));
        assert!(!bold_added.contains("let"));
    }

    #[test]
    fn pads_to_width_and_handles_empty_input() {
        let theme = Theme::dark();
        assert!(render_diff_hunk("", "a.rs", 40, &theme).is_empty());
        let lines = render_diff_hunk("@@ -1 +1 @@\n\n+x", "notes", 40, &theme);
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| line_width(l) == 40));
    }

    #[test]
    fn extension_lookup() {
        assert_eq!(file_ext("src/lib.rs"), "rs");
        assert_eq!(file_ext("Makefile"), "txt");
        assert_eq!(file_ext("dir.d/README"), "txt");
    }
}
