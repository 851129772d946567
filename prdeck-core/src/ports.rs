//! Capabilities the TUI consumes. The `gh` adapter implements the GitHub ports; the binary supplies
//! the platform ports.

use async_trait::async_trait;

use crate::error::GithubError;
use crate::types::{
    ChecksResult, CommentsResult, PullRequestRef, ReplyResult, ResolveResult, Review,
};

#[async_trait]
pub trait ThreadFetcher: Send + Sync {
    async fn fetch_threads(&self, pr: &PullRequestRef) -> Result<CommentsResult, GithubError>;
}

#[async_trait]
pub trait CheckFetcher: Send + Sync {
    async fn fetch_checks(&self, pr: &PullRequestRef) -> Result<ChecksResult, GithubError>;
}

#[async_trait]
pub trait ReviewFetcher: Send + Sync {
    async fn fetch_reviews(&self, pr: &PullRequestRef) -> Result<Vec<Review>, GithubError>;
}

#[async_trait]
pub trait ThreadResolver: Send + Sync {
    async fn resolve_thread(&self, thread_id: &str) -> Result<ResolveResult, GithubError>;
    async fn unresolve_thread(&self, thread_id: &str) -> Result<ResolveResult, GithubError>;
}

#[async_trait]
pub trait ThreadReplier: Send + Sync {
    async fn reply_to_thread(
        &self,
        pr: &PullRequestRef,
        thread_id: &str,
        body: &str,
    ) -> Result<ReplyResult, GithubError>;
}

/// Every GitHub capability the TUI needs, behind one trait object.
pub trait GithubPorts:
    ThreadFetcher + CheckFetcher + ReviewFetcher + ThreadResolver + ThreadReplier
{
}

impl<T> GithubPorts for T where
    T: ThreadFetcher + CheckFetcher + ReviewFetcher + ThreadResolver + ThreadReplier
{
}

/// System clipboard. Failures are reported to the caller but never shown in the UI.
pub trait Clipboard: Send + Sync {
    fn copy(&self, text: &str) -> Result<(), String>;
}

/// Launches a url in the user's browser without waiting for it.
pub trait Browser: Send + Sync {
    fn open(&self, url: &str) -> Result<(), String>;
}
