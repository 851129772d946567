//! Read-only PR dashboard: KPI cards, section previews and merge readiness.

use prdeck_core::status::check_is_failed;
use prdeck_core::types::{ChecksResult, CommentsResult, OverallStatus, Review, ReviewState};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthStr;

use crate::theme::Theme;
use crate::ui::text::{pad_between, placeholder, time_ago};

const MAX_THREADS_SHOWN: usize = 3;
const MAX_ANNOTATIONS_SHOWN: usize = 3;
const MAX_REVIEWS_SHOWN: usize = 5;

/// Borrowed view of the shell's datasets.
#[derive(Debug, Clone, Copy, Default)]
pub struct SummaryData<'a> {
    pub comments: Option<&'a CommentsResult>,
    pub checks: Option<&'a ChecksResult>,
    pub reviews: Option<&'a [Review]>,
    pub load_errors: &'a [String],
    /// Any of the three startup loads is still outstanding.
    pub loading: bool,
}

impl SummaryData<'_> {
    fn nothing_loaded(&self) -> bool {
        self.comments.is_none() && self.checks.is_none() && self.reviews.is_none()
    }

    fn approval_count(&self) -> usize {
        self.reviews
            .unwrap_or_default()
            .iter()
            .filter(|r| r.state == ReviewState::Approved)
            .count()
    }
}

/// Whether the pull request can be merged as far as the loaded data shows.
///
/// Datasets that have not arrived do not block readiness, but a failed load does.
pub fn is_merge_ready(data: &SummaryData<'_>) -> bool {
    if data.comments.is_some_and(|c| c.unresolved_count > 0) {
        return false;
    }
    if data
        .checks
        .is_some_and(|c| c.overall_status != OverallStatus::Pass)
    {
        return false;
    }
    if let Some(reviews) = data.reviews.filter(|r| !r.is_empty()) {
        let approved = reviews.iter().any(|r| r.state == ReviewState::Approved);
        let blocked = reviews
            .iter()
            .any(|r| r.state == ReviewState::ChangesRequested);
        if !approved || blocked {
            return false;
        }
    }
    data.load_errors.is_empty()
}

/// `READY` in the pass color or `NOT READY` in the fail color.
pub fn merge_badge(data: &SummaryData<'_>, theme: &Theme) -> (String, Color) {
    if is_merge_ready(data) {
        ("READY".to_owned(), theme.pass)
    } else {
        ("NOT READY".to_owned(), theme.fail)
    }
}

/// Lower sorts first: changes requested, then approvals, then comments, then the rest.
fn review_priority(state: ReviewState) -> u8 {
    match state {
        ReviewState::ChangesRequested => 0,
        ReviewState::Approved => 1,
        ReviewState::Commented => 2,
        ReviewState::Pending | ReviewState::Dismissed => 3,
    }
}

#[derive(Debug, Default)]
pub struct Summary {
    offset: usize,
    max_offset: usize,
    width: u16,
    height: u16,
}

impl Summary {
    pub fn set_size(&mut self, width: u16, height: u16, data: &SummaryData<'_>, theme: &Theme) {
        self.width = width;
        self.height = height;
        self.refresh(data, theme);
    }

    /// Recomputes the scroll limit after the datasets or the size changed.
    pub fn refresh(&mut self, data: &SummaryData<'_>, theme: &Theme) {
        let lines = self.content(data, theme).len();
        self.max_offset = lines.saturating_sub(usize::from(self.height));
        self.offset = self.offset.min(self.max_offset);
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn scroll_down(&mut self) {
        if self.offset < self.max_offset {
            self.offset += 1;
        }
    }

    pub fn scroll_up(&mut self) {
        self.offset = self.offset.saturating_sub(1);
    }

    pub fn render(&self, data: &SummaryData<'_>, theme: &Theme) -> Vec<Line<'static>> {
        if data.loading && data.nothing_loaded() {
            return vec![placeholder("  Loading PR data...", theme.dim_style())];
        }
        let content = self.content(data, theme);
        let height = usize::from(self.height);
        let offset = self.offset.min(content.len().saturating_sub(height));
        content.into_iter().skip(offset).take(height).collect()
    }

    fn content(&self, data: &SummaryData<'_>, theme: &Theme) -> Vec<Line<'static>> {
        let mut lines = self.kpi_cards(data, theme);
        lines.push(Line::default());
        lines.extend(self.threads_section(data, theme));
        lines.push(Line::default());
        lines.extend(self.checks_section(data, theme));
        lines.push(Line::default());
        lines.extend(self.approvals_section(data, theme));
        if !data.load_errors.is_empty() {
            lines.push(Line::default());
            lines.push(self.section_header(theme.fail, "Errors", String::new(), theme));
            for error in data.load_errors {
                lines.push(Line::from(Span::styled(
                    format!("   {error}"),
                    Style::default().fg(theme.fail),
                )));
            }
        }
        lines
    }

    fn kpi_cards(&self, data: &SummaryData<'_>, theme: &Theme) -> Vec<Line<'static>> {
        let red_if_nonzero = |count: usize| if count > 0 { theme.fail } else { theme.pass };
        let unresolved = data.comments.map_or(0, |c| c.unresolved_count);
        let passed = data.checks.map_or(0, |c| c.pass_count);
        let failed = data.checks.map_or(0, |c| c.fail_count);
        let approvals = data.approval_count();
        let cards = [
            (unresolved, "UNRESOLVED", red_if_nonzero(unresolved)),
            (passed, "PASSED", theme.pass),
            (failed, "FAILED", red_if_nonzero(failed)),
            (
                approvals,
                "APPROVALS",
                if approvals > 0 { theme.pass } else { theme.pending },
            ),
        ];

        let inner = (usize::from(self.width).saturating_sub(12) / 4).max(10);
        let border = theme.dim_style();
        let mut rows: [Vec<Span<'static>>; 4] = Default::default();
        for (i, (count, label, color)) in cards.into_iter().enumerate() {
            if i > 0 {
                for row in &mut rows {
                    row.push(Span::raw(" "));
                }
            }
            rows[0].push(Span::styled(format!("╭{}╮", "─".repeat(inner)), border));
            rows[1].push(Span::styled("│", border));
            rows[1].push(Span::styled(
                center(&count.to_string(), inner),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
            rows[1].push(Span::styled("│", border));
            rows[2].push(Span::styled("│", border));
            rows[2].push(Span::styled(center(label, inner), theme.dim_style()));
            rows[2].push(Span::styled("│", border));
            rows[3].push(Span::styled(format!("╰{}╯", "─".repeat(inner)), border));
        }
        rows.into_iter().map(Line::from).collect()
    }

    fn threads_section(&self, data: &SummaryData<'_>, theme: &Theme) -> Vec<Line<'static>> {
        let dim = theme.dim_style();
        let (dot, info) = match data.comments {
            Some(c) => {
                let mut parts = Vec::new();
                if c.unresolved_count > 0 {
                    parts.push(format!("{} unresolved", c.unresolved_count));
                }
                if c.resolved_count > 0 {
                    parts.push(format!("{} resolved", c.resolved_count));
                }
                let dot = if c.unresolved_count > 0 { theme.fail } else { theme.pass };
                (dot, parts.join(" · "))
            }
            None => (theme.fail, String::new()),
        };
        let mut lines = vec![self.section_header(dot, "Review Threads", info, theme)];
        let threads = data.comments.map(|c| c.threads.as_slice()).unwrap_or_default();
        if threads.is_empty() {
            lines.push(Line::from(Span::styled("   No review threads", dim)));
            return lines;
        }
        let row_width = usize::from(self.width).saturating_sub(2);
        for thread in threads.iter().take(MAX_THREADS_SHOWN) {
            let mut left = vec![
                Span::raw("   "),
                Span::styled(thread.path.clone(), Style::default().fg(theme.file_path)),
                Span::styled(format!(":{}", thread.line), Style::default().fg(theme.line_number)),
                Span::styled(" — ", dim),
            ];
            let mut right = Vec::new();
            if let Some(root) = thread.root_comment() {
                left.push(Span::styled(
                    format!("@{}", root.author),
                    Style::default().fg(theme.author),
                ));
                if let Some(created) = root.created_at {
                    right.push(Span::styled(time_ago(created), dim));
                }
            }
            lines.push(pad_between(left, right, row_width));
        }
        if threads.len() > MAX_THREADS_SHOWN {
            lines.push(Line::from(Span::styled(
                format!("   ... and {} more", threads.len() - MAX_THREADS_SHOWN),
                dim,
            )));
        }
        lines
    }

    fn checks_section(&self, data: &SummaryData<'_>, theme: &Theme) -> Vec<Line<'static>> {
        let dim = theme.dim_style();
        let (dot, info) = match data.checks {
            Some(c) => {
                let mut parts = Vec::new();
                if c.pass_count > 0 {
                    parts.push(format!("{} passed", c.pass_count));
                }
                if c.fail_count > 0 {
                    parts.push(format!("{} failed", c.fail_count));
                }
                let dot = if c.fail_count > 0 {
                    theme.fail
                } else if c.pending_count > 0 {
                    theme.pending
                } else {
                    theme.pass
                };
                (dot, parts.join(" · "))
            }
            None => (theme.pass, String::new()),
        };
        let mut lines = vec![self.section_header(dot, "CI Checks", info, theme)];
        let Some(checks) = data.checks.filter(|c| !c.checks.is_empty()) else {
            lines.push(Line::from(Span::styled("   No CI checks", dim)));
            return lines;
        };

        let row_width = usize::from(self.width).saturating_sub(2);
        let fail = Style::default().fg(theme.fail);
        for check in checks.checks.iter().filter(|c| check_is_failed(c)) {
            let left = vec![
                Span::styled("   ✗ ", fail),
                Span::styled(check.name.clone(), fail),
            ];
            lines.push(if check.annotations.is_empty() {
                Line::from(left)
            } else {
                let count = format!("{} errors", check.annotations.len());
                pad_between(left, vec![Span::styled(count, dim)], row_width)
            });
            for annotation in check.annotations.iter().take(MAX_ANNOTATIONS_SHOWN) {
                let mut spans = vec![Span::styled(
                    format!("      {}:{}", annotation.path, annotation.start_line),
                    dim,
                )];
                if !annotation.title.is_empty() {
                    spans.push(Span::styled(
                        format!(" [{}]", annotation.title),
                        Style::default().fg(theme.pending),
                    ));
                }
                lines.push(Line::from(spans));
            }
        }

        if checks.pass_count > 0 {
            let pass = Style::default().fg(theme.pass);
            let mut spans = vec![
                Span::styled("   ✓ ", pass),
                Span::styled(format!("{} checks passed", checks.pass_count), pass),
            ];
            let names = passed_names(checks);
            if !names.is_empty() {
                spans.push(Span::styled(format!(" ({names})"), dim));
            }
            lines.push(Line::from(spans));
        }
        lines
    }

    fn approvals_section(&self, data: &SummaryData<'_>, theme: &Theme) -> Vec<Line<'static>> {
        let dim = theme.dim_style();
        let reviews = data.reviews.unwrap_or_default();
        let dot = if data.approval_count() > 0 { theme.pass } else { theme.pending };
        let info = if reviews.is_empty() {
            String::new()
        } else {
            format!("{} reviews", reviews.len())
        };
        let mut lines = vec![self.section_header(dot, "Approvals", info, theme)];
        if reviews.is_empty() {
            lines.push(Line::from(Span::styled("   No reviews yet", dim)));
            return lines;
        }

        let mut sorted: Vec<&Review> = reviews.iter().collect();
        sorted.sort_by_key(|r| review_priority(r.state));
        let row_width = usize::from(self.width).saturating_sub(2);
        for review in sorted.iter().take(MAX_REVIEWS_SHOWN) {
            let (icon, state, color) = match review.state {
                ReviewState::Approved => ("✓", "approved", theme.pass),
                ReviewState::ChangesRequested => ("✗", "changes requested", theme.pending),
                ReviewState::Commented => ("○", "commented", theme.dim),
                ReviewState::Dismissed => ("—", "dismissed", theme.dim),
                ReviewState::Pending => ("◌", "pending", theme.dim),
            };
            let style = Style::default().fg(color);
            let left = vec![
                Span::raw("   "),
                Span::styled(icon, style),
                Span::raw(" "),
                Span::styled(format!("@{}", review.author), Style::default().fg(theme.author)),
                Span::raw(" "),
                Span::styled(state, style),
            ];
            let right = review
                .submitted_at
                .map(|at| vec![Span::styled(time_ago(at), dim)])
                .unwrap_or_default();
            lines.push(pad_between(left, right, row_width));
        }
        if sorted.len() > MAX_REVIEWS_SHOWN {
            lines.push(Line::from(Span::styled(
                format!("   ... and {} more", sorted.len() - MAX_REVIEWS_SHOWN),
                dim,
            )));
        }
        lines
    }

    /// ` ● Title` with optional dim text flush right.
    fn section_header(&self, dot: Color, title: &str, info: String, theme: &Theme) -> Line<'static> {
        let left = vec![
            Span::raw(" "),
            Span::styled("●", Style::default().fg(dot)),
            Span::raw(" "),
            Span::styled(title.to_owned(), Style::default().add_modifier(Modifier::BOLD)),
        ];
        if info.is_empty() {
            return Line::from(left);
        }
        pad_between(
            left,
            vec![Span::styled(info, theme.dim_style()), Span::raw(" ")],
            usize::from(self.width),
        )
    }
}

/// Names of the passing checks: all of them up to four, otherwise three and a remainder count.
fn passed_names(checks: &ChecksResult) -> String {
    let names: Vec<&str> = checks
        .checks
        .iter()
        .filter(|c| !check_is_failed(c))
        .map(|c| c.name.as_str())
        .collect();
    if names.len() > 4 {
        format!("{}, +{} more", names[..3].join(", "), names.len() - 3)
    } else {
        names.join(", ")
    }
}

fn center(text: &str, width: usize) -> String {
    let w = text.width();
    if w >= width {
        return text.to_owned();
    }
    let left = (width - w) / 2;
    format!("{}{text}{}", " ".repeat(left), " ".repeat(width - w - left))
}
