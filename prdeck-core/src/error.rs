use thiserror::Error;

/// Classified failure from any GitHub port.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GithubError {
    #[error("not authenticated")]
    Auth,
    #[error("rate limit exceeded")]
    RateLimit,
    #[error("{0} not found")]
    NotFound(String),
    #[error("github command failed: {0}")]
    Command(String),
    #[error("failed to parse github response: {0}")]
    Parse(String),
}

impl GithubError {
    /// Classifies the stderr text of a failed `gh` invocation.
    ///
    /// `resource` names what was being fetched and fills the not-found message when GitHub does not
    /// say which resource was missing.
    pub fn classify(detail: &str, resource: &str) -> Self {
        let lower = detail.to_ascii_lowercase();
        if lower.contains("rate limit") || lower.contains("http 429") {
            return GithubError::RateLimit;
        }
        if lower.contains("http 401")
            || lower.contains("bad credentials")
            || lower.contains("not logged")
            || lower.contains("authentication")
            || lower.contains("auth token")
        {
            return GithubError::Auth;
        }
        if lower.contains("could not resolve to a repository") {
            return GithubError::NotFound("repository".to_owned());
        }
        if lower.contains("could not resolve to a pullrequest") {
            return GithubError::NotFound("pull request".to_owned());
        }
        if lower.contains("http 404") || lower.contains("not found") {
            return GithubError::NotFound(resource.to_owned());
        }
        if lower.contains("http 403") {
            return GithubError::Auth;
        }
        GithubError::Command(detail.trim().to_owned())
    }

    /// User-facing message with a remediation hint, used for fatal startup errors.
    pub fn user_message(&self) -> String {
        match self {
            GithubError::Auth => "Not authenticated. Run `gh auth login` first.".to_owned(),
            GithubError::RateLimit => "Rate limit exceeded. Try again later.".to_owned(),
            GithubError::NotFound(_) => format!("{self}."),
            other => other.to_string(),
        }
    }

    /// Whether retrying the same request later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GithubError::RateLimit | GithubError::Command(_))
    }

    /// Process exit code: 2 for classified API errors, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            GithubError::Auth | GithubError::RateLimit | GithubError::NotFound(_) => 2,
            GithubError::Command(_) | GithubError::Parse(_) => 1,
        }
    }
}
