//! Domain snapshots fetched from GitHub.
//!
//! Every type here is a read-only value produced by the network adapter. The TUI replaces them
//! wholesale when fresh data arrives and never edits individual fields.

use time::OffsetDateTime;

/// Identifies a single pull request on GitHub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl PullRequestRef {
    /// Parses `owner/repo` plus a PR number.
    ///
    /// Returns `None` when `slug` is not exactly two non-empty `/`-separated parts.
    pub fn parse(slug: &str, number: u64) -> Option<Self> {
        let (owner, repo) = slug.trim().split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(Self {
            owner: owner.to_owned(),
            repo: repo.to_owned(),
            number,
        })
    }

    /// `owner/repo` form used in status lines and API paths.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Web URL of the pull request.
    pub fn html_url(&self) -> String {
        format!(
            "https://github.com/{}/{}/pull/{}",
            self.owner, self.repo, self.number
        )
    }
}

/// A single comment inside a review thread.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comment {
    pub id: String,
    pub database_id: i64,
    pub author: String,
    pub body: String,
    pub created_at: Option<OffsetDateTime>,
    pub url: String,
    /// Unified-diff excerpt GitHub attaches to the comment. Empty when absent.
    pub diff_hunk: String,
    pub path: String,
}

/// A review thread anchored to a file and line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewThread {
    pub id: String,
    pub path: String,
    pub line: u32,
    /// First line of a multi-line range. `None` for single-line threads.
    pub start_line: Option<u32>,
    pub is_resolved: bool,
    pub is_outdated: bool,
    pub viewer_can_resolve: bool,
    pub viewer_can_unresolve: bool,
    pub viewer_can_reply: bool,
    pub comments: Vec<Comment>,
}

impl ReviewThread {
    /// The comment that opened the thread.
    pub fn root_comment(&self) -> Option<&Comment> {
        self.comments.first()
    }

    /// Number of comments after the root comment.
    pub fn reply_count(&self) -> usize {
        self.comments.len().saturating_sub(1)
    }

    /// `:line` or `:start-line` when the thread spans a range.
    pub fn line_label(&self) -> String {
        match self.start_line {
            Some(start) if start > 0 && start != self.line => format!(":{start}-{}", self.line),
            _ => format!(":{}", self.line),
        }
    }

    /// Url of the root comment when it has one.
    pub fn url(&self) -> Option<&str> {
        self.root_comment()
            .map(|c| c.url.as_str())
            .filter(|url| !url.is_empty())
    }
}

/// Review threads for one pull request plus aggregate counts.
///
/// The adapter only keeps unresolved threads in `threads`, but the counts cover every thread
/// GitHub returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentsResult {
    pub pr_number: u64,
    pub threads: Vec<ReviewThread>,
    pub total_count: usize,
    pub resolved_count: usize,
    pub unresolved_count: usize,
}

impl CommentsResult {
    /// Builds a result whose counts are derived from `threads`.
    pub fn from_threads(pr_number: u64, threads: Vec<ReviewThread>) -> Self {
        let resolved_count = threads.iter().filter(|t| t.is_resolved).count();
        Self {
            pr_number,
            total_count: threads.len(),
            unresolved_count: threads.len() - resolved_count,
            resolved_count,
            threads,
        }
    }
}

/// Aggregate CI status of a pull request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OverallStatus {
    Pass,
    Fail,
    #[default]
    Pending,
}

impl OverallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OverallStatus::Pass => "pass",
            OverallStatus::Fail => "failure",
            OverallStatus::Pending => "pending",
        }
    }
}

/// Lifecycle state of a check run as reported by the checks API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckStatus {
    #[default]
    Queued,
    InProgress,
    Completed,
}

impl CheckStatus {
    /// Maps the API `status` field. Unknown values (`waiting`, `requested`, `pending`) count as
    /// queued.
    pub fn from_api(value: &str) -> Self {
        match value {
            "completed" => CheckStatus::Completed,
            "in_progress" => CheckStatus::InProgress,
            _ => CheckStatus::Queued,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Queued => "queued",
            CheckStatus::InProgress => "in_progress",
            CheckStatus::Completed => "completed",
        }
    }
}

/// Final outcome of a completed check run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Conclusion {
    Success,
    Failure,
    Neutral,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
    StartupFailure,
    Stale,
    Other(String),
}

impl Conclusion {
    /// Maps the API `conclusion` field. An empty string means the run has no conclusion yet.
    pub fn from_api(value: &str) -> Option<Self> {
        let conclusion = match value {
            "" => return None,
            "success" => Conclusion::Success,
            "failure" => Conclusion::Failure,
            "neutral" => Conclusion::Neutral,
            "cancelled" => Conclusion::Cancelled,
            "skipped" => Conclusion::Skipped,
            "timed_out" => Conclusion::TimedOut,
            "action_required" => Conclusion::ActionRequired,
            "startup_failure" => Conclusion::StartupFailure,
            "stale" => Conclusion::Stale,
            other => Conclusion::Other(other.to_owned()),
        };
        Some(conclusion)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Conclusion::Success => "success",
            Conclusion::Failure => "failure",
            Conclusion::Neutral => "neutral",
            Conclusion::Cancelled => "cancelled",
            Conclusion::Skipped => "skipped",
            Conclusion::TimedOut => "timed_out",
            Conclusion::ActionRequired => "action_required",
            Conclusion::StartupFailure => "startup_failure",
            Conclusion::Stale => "stale",
            Conclusion::Other(other) => other,
        }
    }
}

/// A file/line-scoped diagnostic attached to a check run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotation {
    pub path: String,
    pub start_line: u32,
    pub end_line: u32,
    /// `failure`, `warning` or `notice`.
    pub level: String,
    pub title: String,
    pub message: String,
}

/// One CI job for the pull request head commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckRun {
    pub id: i64,
    pub name: String,
    pub status: CheckStatus,
    pub conclusion: Option<Conclusion>,
    pub started_at: Option<OffsetDateTime>,
    pub completed_at: Option<OffsetDateTime>,
    pub html_url: String,
    pub annotations: Vec<Annotation>,
    /// Error-focused excerpt of the job log. Empty when unavailable.
    pub log_excerpt: String,
}

/// All check runs for a pull request head commit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChecksResult {
    pub pr_number: u64,
    pub head_sha: String,
    pub overall_status: OverallStatus,
    pub checks: Vec<CheckRun>,
    pub pass_count: usize,
    pub fail_count: usize,
    pub pending_count: usize,
}

impl ChecksResult {
    /// Builds a result whose counts and overall status are derived from `checks`.
    pub fn from_checks(pr_number: u64, head_sha: impl Into<String>, checks: Vec<CheckRun>) -> Self {
        let mut result = Self {
            pr_number,
            head_sha: head_sha.into(),
            ..Self::default()
        };
        let mut statuses = Vec::with_capacity(checks.len());
        for check in &checks {
            let status = crate::status::classify_check_status(check);
            match status {
                OverallStatus::Pass => result.pass_count += 1,
                OverallStatus::Fail => result.fail_count += 1,
                OverallStatus::Pending => result.pending_count += 1,
            }
            statuses.push(status);
        }
        result.overall_status = crate::status::aggregate_status(&statuses);
        result.checks = checks;
        result
    }
}

/// A reviewer's verdict on the whole pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Pending,
    Dismissed,
}

impl ReviewState {
    pub fn from_api(value: &str) -> Option<Self> {
        match value {
            "APPROVED" => Some(ReviewState::Approved),
            "CHANGES_REQUESTED" => Some(ReviewState::ChangesRequested),
            "COMMENTED" => Some(ReviewState::Commented),
            "PENDING" => Some(ReviewState::Pending),
            "DISMISSED" => Some(ReviewState::Dismissed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReviewState::Approved => "APPROVED",
            ReviewState::ChangesRequested => "CHANGES_REQUESTED",
            ReviewState::Commented => "COMMENTED",
            ReviewState::Pending => "PENDING",
            ReviewState::Dismissed => "DISMISSED",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    pub id: String,
    pub author: String,
    pub state: ReviewState,
    pub body: String,
    pub submitted_at: Option<OffsetDateTime>,
}

/// Outcome of a resolve or unresolve mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveResult {
    pub thread_id: String,
    pub path: String,
    pub line: u32,
    pub is_resolved: bool,
}

/// Outcome of posting a reply to a thread.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyResult {
    pub thread_id: String,
    pub comment_id: i64,
    pub url: String,
    pub body: String,
    pub created_at: Option<OffsetDateTime>,
}
