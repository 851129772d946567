//! Review threads grouped under per-file headers.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use prdeck_core::types::ReviewThread;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::effects::Effect;
use crate::theme::Theme;
use crate::ui::text::{pad_line, placeholder, plural, shorten_id, strip_markdown, time_ago, truncate};
use crate::views::{is_char, is_down, is_up};

/// Screen lines of a thread row: marker line, body preview, metadata.
const THREAD_ROW_LINES: usize = 3;

/// One row of the flattened list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListItem {
    FileHeader(String),
    /// Index into the thread sequence.
    ThreadRow(usize),
}

impl ListItem {
    fn cost(&self) -> usize {
        match self {
            ListItem::FileHeader(_) => 1,
            ListItem::ThreadRow(_) => THREAD_ROW_LINES,
        }
    }
}

#[derive(Debug, Default)]
pub struct CommentsList {
    threads: Arc<[ReviewThread]>,
    items: Vec<ListItem>,
    /// Index into `items`; always a `ThreadRow` when any exist.
    cursor: usize,
    offset: usize,
    width: u16,
    height: u16,
    /// Distinct paths in sorted order, cycled by the file filter.
    paths: Vec<String>,
    filter: Option<usize>,
}

impl CommentsList {
    pub fn new(threads: Arc<[ReviewThread]>) -> Self {
        let mut paths: Vec<String> = threads.iter().map(|t| t.path.clone()).collect();
        paths.sort();
        paths.dedup();
        let mut list = Self {
            threads,
            paths,
            ..Self::default()
        };
        list.rebuild();
        list
    }

    pub fn set_size(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.ensure_visible();
    }

    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Path the list is currently narrowed to.
    pub fn filter(&self) -> Option<&str> {
        self.filter.map(|i| self.paths[i].as_str())
    }

    /// Thread index under the cursor.
    pub fn selected_thread(&self) -> Option<usize> {
        match self.items.get(self.cursor) {
            Some(ListItem::ThreadRow(idx)) => Some(*idx),
            _ => None,
        }
    }

    pub fn handle(&mut self, key: KeyEvent) -> Option<Effect> {
        if is_down(&key) {
            self.move_cursor(1);
        } else if is_up(&key) {
            self.move_cursor(-1);
        } else if key.code == KeyCode::Enter {
            return self.selected_thread().map(Effect::SelectThread);
        } else if is_char(&key, 'y') {
            let idx = self.selected_thread()?;
            return Some(Effect::CopyToClipboard(self.threads[idx].id.clone()));
        } else if is_char(&key, 'o') {
            let idx = self.selected_thread()?;
            return self.threads[idx]
                .url()
                .map(|url| Effect::OpenUrl(url.to_owned()));
        } else if is_char(&key, 'f') {
            self.cycle_filter();
        }
        None
    }

    /// Groups threads by path, honoring the active filter, and parks the cursor on the first
    /// thread.
    fn rebuild(&mut self) {
        let filter = self.filter.map(|i| self.paths[i].clone());
        self.items.clear();
        for path in &self.paths {
            if filter.as_ref().is_some_and(|f| f != path) {
                continue;
            }
            let rows: Vec<ListItem> = self
                .threads
                .iter()
                .enumerate()
                .filter(|(_, t)| &t.path == path)
                .map(|(idx, _)| ListItem::ThreadRow(idx))
                .collect();
            if rows.is_empty() {
                continue;
            }
            self.items.push(ListItem::FileHeader(path.clone()));
            self.items.extend(rows);
        }
        self.cursor = self
            .items
            .iter()
            .position(|item| matches!(item, ListItem::ThreadRow(_)))
            .unwrap_or(0);
        self.offset = 0;
    }

    /// No filter, then each path in turn, then back to no filter.
    fn cycle_filter(&mut self) {
        if self.paths.is_empty() {
            return;
        }
        self.filter = match self.filter {
            None => Some(0),
            Some(i) if i + 1 < self.paths.len() => Some(i + 1),
            Some(_) => None,
        };
        self.rebuild();
    }

    /// Moves to the next thread row in `delta`'s direction, never wrapping.
    fn move_cursor(&mut self, delta: isize) {
        let mut pos = self.cursor;
        loop {
            pos = match pos.checked_add_signed(delta) {
                Some(p) if p < self.items.len() => p,
                _ => return,
            };
            if matches!(self.items[pos], ListItem::ThreadRow(_)) {
                self.cursor = pos;
                self.ensure_visible();
                return;
            }
        }
    }

    fn lines_between(&self, from: usize, to: usize) -> usize {
        self.items
            .iter()
            .take(to)
            .skip(from)
            .map(ListItem::cost)
            .sum()
    }

    fn ensure_visible(&mut self) {
        let height = usize::from(self.height);
        if height == 0 {
            return;
        }
        if self.cursor < self.offset {
            self.offset = self.cursor;
        }
        while self.offset < self.cursor && self.lines_between(self.offset, self.cursor + 1) > height
        {
            self.offset += 1;
        }
    }

    pub fn render(&self, theme: &Theme) -> Vec<Line<'static>> {
        if self.items.is_empty() {
            return vec![placeholder("  No review threads found.", theme.dim_style())];
        }
        let height = usize::from(self.height);
        let mut lines = Vec::with_capacity(height);
        for (i, item) in self.items.iter().enumerate().skip(self.offset) {
            if lines.len() >= height {
                break;
            }
            match item {
                ListItem::FileHeader(path) => lines.push(self.render_header(path, theme)),
                ListItem::ThreadRow(idx) => {
                    lines.extend(self.render_thread(&self.threads[*idx], i == self.cursor, theme));
                }
            }
        }
        lines.truncate(height);
        lines
    }

    fn render_header(&self, path: &str, theme: &Theme) -> Line<'static> {
        let label_width = path.width() + 2;
        let rule = usize::from(self.width).saturating_sub(label_width);
        Line::from(vec![
            Span::raw(" "),
            Span::styled(
                path.to_owned(),
                Style::default()
                    .fg(theme.file_path)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" "),
            Span::styled("─".repeat(rule), theme.dim_style()),
        ])
    }

    fn render_thread(
        &self,
        thread: &ReviewThread,
        is_cursor: bool,
        theme: &Theme,
    ) -> [Line<'static>; THREAD_ROW_LINES] {
        let dim = theme.dim_style();
        let root = thread.root_comment();

        let marker = if is_cursor {
            Span::styled("▶", Style::default().fg(theme.accent))
        } else {
            Span::raw(" ")
        };
        let mut first = vec![
            Span::raw(" "),
            marker,
            Span::raw(" "),
            Span::styled(thread.line_label(), Style::default().fg(theme.line_number)),
        ];
        if let Some(root) = root {
            first.push(Span::styled(" —", dim));
            first.push(Span::styled(
                format!(" @{}", root.author),
                Style::default().fg(theme.author),
            ));
            if let Some(created) = root.created_at {
                first.push(Span::styled(format!(" {}", time_ago(created)), dim));
            }
        }

        let preview_width = usize::from(self.width).saturating_sub(10).max(20);
        let preview = root
            .map(|c| truncate(&strip_markdown(&c.body), preview_width))
            .unwrap_or_default();
        let second = vec![Span::raw("     "), Span::styled(preview, Style::default().fg(theme.text))];

        let mut meta = Vec::new();
        if !thread.id.is_empty() {
            meta.push(shorten_id(&thread.id, 14));
        }
        if thread.reply_count() > 0 {
            meta.push(plural(thread.reply_count(), "reply", "replies"));
        }
        let third = vec![Span::raw("     "), Span::styled(meta.join(" · "), dim)];

        let rows = [Line::from(first), Line::from(second), Line::from(third)];
        if is_cursor {
            let width = usize::from(self.width);
            rows.map(|line| pad_line(line, width).style(Style::default().bg(theme.selection_bg)))
        } else {
            rows
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::test_support::{ch, key, text, thread};

    fn sample() -> Arc<[ReviewThread]> {
        let mut threads = vec![
            thread("PRRT_main_one", "src/main.rs", 10),
            thread("PRRT_lib_one", "src/lib.rs", 4),
            thread("PRRT_main_two", "src/main.rs", 30),
            thread("PRRT_cfg_one", "Cargo.toml", 1),
        ];
        let reply = threads[2].comments[0].clone();
        threads[2].comments.push(reply);
        threads.into()
    }

    fn list(height: u16) -> CommentsList {
        let mut list = CommentsList::new(sample());
        list.set_size(80, height);
        list
    }

    #[test]
    fn groups_threads_under_sorted_file_headers() {
        let list = list(40);
        assert_eq!(
            list.items(),
            [
                ListItem::FileHeader("Cargo.toml".to_owned()),
                ListItem::ThreadRow(3),
                ListItem::FileHeader("src/lib.rs".to_owned()),
                ListItem::ThreadRow(1),
                ListItem::FileHeader("src/main.rs".to_owned()),
                ListItem::ThreadRow(0),
                ListItem::ThreadRow(2),
            ]
        );
        assert_eq!(list.cursor(), 1);
        assert_eq!(list.selected_thread(), Some(3));
    }

    #[test]
    fn cursor_skips_headers_and_never_wraps() {
        let mut list = list(40);
        let mut visited = vec![list.selected_thread()];
        for _ in 0..10 {
            list.handle(ch('j'));
            visited.push(list.selected_thread());
            assert!(matches!(list.items()[list.cursor()], ListItem::ThreadRow(_)));
        }
        assert_eq!(list.selected_thread(), Some(2));
        visited.dedup();
        assert_eq!(visited, [Some(3), Some(1), Some(0), Some(2)]);

        for _ in 0..10 {
            list.handle(key(KeyCode::Up));
            assert!(matches!(list.items()[list.cursor()], ListItem::ThreadRow(_)));
        }
        assert_eq!(list.selected_thread(), Some(3));
    }

    #[test]
    fn file_filter_cycles_back_to_everything() {
        let mut list = list(40);
        let unfiltered = list.items().to_vec();

        list.handle(ch('f'));
        assert_eq!(list.filter(), Some("Cargo.toml"));
        list.handle(ch('f'));
        assert_eq!(list.filter(), Some("src/lib.rs"));
        assert_eq!(
            list.items(),
            [ListItem::FileHeader("src/lib.rs".to_owned()), ListItem::ThreadRow(1)]
        );
        assert_eq!(list.cursor(), 1);
        assert_eq!(list.offset(), 0);

        list.handle(ch('f'));
        list.handle(ch('f'));
        assert_eq!(list.filter(), None);
        assert_eq!(list.items(), unfiltered.as_slice());
    }

    #[test]
    fn ensure_visible_keeps_the_whole_cursor_row_on_screen() {
        for height in 3..12u16 {
            let mut list = list(height);
            for _ in 0..3 {
                list.handle(ch('j'));
                let visible = list.lines_between(list.offset(), list.cursor() + 1);
                assert!(list.offset() <= list.cursor());
                assert!(visible <= usize::from(height), "height {height}");
            }
            for _ in 0..3 {
                list.handle(ch('k'));
                assert!(list.offset() <= list.cursor());
            }
        }
    }

    #[test]
    fn emits_effects_for_the_thread_under_the_cursor() {
        let mut list = list(40);
        assert_eq!(list.handle(key(KeyCode::Enter)), Some(Effect::SelectThread(3)));
        assert_eq!(
            list.handle(ch('y')),
            Some(Effect::CopyToClipboard("PRRT_cfg_one".to_owned()))
        );
        assert_eq!(
            list.handle(ch('o')),
            Some(Effect::OpenUrl(
                "https://github.com/o/r/pull/1#discussion_PRRT_cfg_one".to_owned()
            ))
        );
    }

    #[test]
    fn open_is_a_no_op_without_a_url() {
        let mut threads = vec![thread("t1", "a.rs", 1)];
        threads[0].comments[0].url.clear();
        let mut list = CommentsList::new(threads.into());
        assert_eq!(list.handle(ch('o')), None);
    }

    #[test]
    fn renders_rows_within_the_viewport() {
        let theme = Theme::dark();
        let list = list(5);
        let lines = list.render(&theme);
        assert_eq!(lines.len(), 5);
        assert!(text(&lines[0]).starts_with(" Cargo.toml ─"));
        assert!(text(&lines[1]).starts_with(" ▶ :1 — @reviewer"));
        assert_eq!(text(&lines[2]).trim_end(), "     comment on PRRT_cfg_one");
        assert_eq!(text(&lines[3]).trim_end(), "     PRRT_cfg_one");

        let full = self::list(40).render(&theme);
        let meta: Vec<String> = full.iter().map(text).collect();
        assert!(meta.iter().any(|l| l == "     PRRT_main_two · 1 reply"));
    }

    #[test]
    fn empty_state() {
        let list = CommentsList::new(Vec::new().into());
        let lines = list.render(&Theme::dark());
        assert_eq!(text(&lines[0]), "  No review threads found.");
        assert_eq!(list.selected_thread(), None);
    }
}
