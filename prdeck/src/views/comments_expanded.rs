//! Full view of one review thread: diff context, root comment and replies.

use std::sync::Arc;

use crossterm::event::KeyEvent;
use prdeck_core::types::{Comment, ReviewThread};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::effects::Effect;
use crate::theme::Theme;
use crate::ui::diff_hunk::render_diff_hunk;
use crate::ui::text::{placeholder, shorten_id, time_ago};
use crate::views::{clamp_offset, is_char, is_down, is_up};

#[derive(Debug, Default)]
pub struct CommentsExpanded {
    threads: Arc<[ReviewThread]>,
    index: usize,
    offset: usize,
    width: u16,
    height: u16,
}

impl CommentsExpanded {
    pub fn new(threads: Arc<[ReviewThread]>, index: usize) -> Self {
        Self {
            index: index.min(threads.len().saturating_sub(1)),
            threads,
            ..Self::default()
        }
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    pub fn current(&self) -> Option<&ReviewThread> {
        self.threads.get(self.index)
    }

    pub fn handle(&mut self, key: KeyEvent, theme: &Theme) -> Option<Effect> {
        if is_down(&key) {
            let max = self.content(theme).len().saturating_sub(usize::from(self.height));
            if self.offset < max {
                self.offset += 1;
            }
        } else if is_up(&key) {
            self.offset = self.offset.saturating_sub(1);
        } else if is_char(&key, 'n') {
            if self.index + 1 < self.threads.len() {
                self.index += 1;
                self.offset = 0;
            }
        } else if is_char(&key, 'p') {
            if self.index > 0 {
                self.index -= 1;
                self.offset = 0;
            }
        } else if is_char(&key, 'y') {
            return self
                .current()
                .map(|t| Effect::CopyToClipboard(t.id.clone()));
        } else if is_char(&key, 'o') {
            return self
                .current()
                .and_then(ReviewThread::url)
                .map(|url| Effect::OpenUrl(url.to_owned()));
        }
        None
    }

    pub fn render(&self, theme: &Theme) -> Vec<Line<'static>> {
        if self.current().is_none() {
            return vec![placeholder("  No thread selected.", theme.dim_style())];
        }
        let content = self.content(theme);
        let height = usize::from(self.height);
        let offset = clamp_offset(self.offset, content.len(), height);
        content.into_iter().skip(offset).take(height).collect()
    }

    /// Every line of the current thread, before scrolling.
    fn content(&self, theme: &Theme) -> Vec<Line<'static>> {
        let Some(thread) = self.current() else {
            return Vec::new();
        };
        let dim = theme.dim_style();
        let mut lines = vec![
            Line::from(vec![
                Span::raw(" "),
                Span::styled(
                    format!("{}{}", thread.path, thread.line_label()),
                    Style::default()
                        .fg(theme.file_path)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(shorten_id(&thread.id, 20), Style::default().fg(theme.thread_id)),
            ]),
            Line::default(),
        ];

        let Some((root, replies)) = thread.comments.split_first() else {
            return lines;
        };

        if !root.diff_hunk.is_empty() {
            lines.push(Line::from(Span::styled(" Diff context:", dim)));
            let hunk_width = self.width.saturating_sub(4).max(20);
            for hunk_line in render_diff_hunk(&root.diff_hunk, &thread.path, hunk_width, theme) {
                let mut spans = vec![Span::raw("  ")];
                spans.extend(hunk_line.spans);
                lines.push(Line::from(spans));
            }
            lines.push(Line::default());
        }

        lines.push(comment_header(root, " ", theme));
        for body_line in root.body.lines() {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(body_line.to_owned(), Style::default().fg(theme.text)),
            ]));
        }
        lines.push(Line::default());

        for reply in replies {
            let border = || Span::styled("    │", dim);
            lines.push(Line::from(border()));
            lines.push(comment_header(reply, "    │ ", theme));
            for body_line in reply.body.lines() {
                lines.push(Line::from(vec![
                    border(),
                    Span::raw(" "),
                    Span::styled(body_line.to_owned(), Style::default().fg(theme.text)),
                ]));
            }
            lines.push(Line::default());
        }
        lines
    }
}

/// `@author  3h ago`, after `prefix`.
fn comment_header(comment: &Comment, prefix: &str, theme: &Theme) -> Line<'static> {
    let mut spans = vec![
        Span::styled(prefix.to_owned(), theme.dim_style()),
        Span::styled(
            format!("@{}", comment.author),
            Style::default()
                .fg(theme.author)
                .add_modifier(Modifier::BOLD),
        ),
    ];
    if let Some(created) = comment.created_at {
        spans.push(Span::styled(format!("  {}", time_ago(created)), theme.dim_style()));
    }
    Line::from(spans)
}
