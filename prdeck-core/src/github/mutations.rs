use std::ffi::OsString;

use async_trait::async_trait;
use serde::Deserialize;

use super::{decode, parse_timestamp, CommandRunner, GhClient, Var};
use crate::error::GithubError;
use crate::ports::{ThreadReplier, ThreadResolver};
use crate::types::{PullRequestRef, ReplyResult, ResolveResult};

const RESOLVE_THREAD_MUTATION: &str = r#"
mutation ResolveThread($threadId: ID!) {
  resolveReviewThread(input: { threadId: $threadId }) {
    thread { id isResolved path line }
  }
}
"#;

const UNRESOLVE_THREAD_MUTATION: &str = r#"
mutation UnresolveThread($threadId: ID!) {
  unresolveReviewThread(input: { threadId: $threadId }) {
    thread { id isResolved path line }
  }
}
"#;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolveData {
    resolve_review_thread: Option<ThreadPayload>,
    unresolve_review_thread: Option<ThreadPayload>,
}

#[derive(Deserialize)]
struct ThreadPayload {
    thread: ResolvedThread,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolvedThread {
    id: String,
    is_resolved: bool,
    #[serde(default)]
    path: String,
    line: Option<u32>,
}

#[derive(Deserialize)]
struct ReplyResponse {
    id: i64,
    #[serde(default)]
    body: String,
    #[serde(default)]
    html_url: String,
    created_at: Option<String>,
}

impl<R: CommandRunner> GhClient<R> {
    async fn mutate_thread(
        &self,
        document: &str,
        thread_id: &str,
    ) -> Result<ResolveResult, GithubError> {
        let resource = format!("thread {thread_id}");
        let data: ResolveData = self
            .graphql(document, &[Var::Str("threadId", thread_id)], &resource)
            .await?;
        let thread = data
            .resolve_review_thread
            .or(data.unresolve_review_thread)
            .ok_or_else(|| GithubError::Parse(format!("mutation on {resource} returned no thread")))?
            .thread;
        Ok(ResolveResult {
            thread_id: thread.id,
            path: thread.path,
            line: thread.line.unwrap_or(0),
            is_resolved: thread.is_resolved,
        })
    }
}

#[async_trait]
impl<R: CommandRunner> ThreadResolver for GhClient<R> {
    async fn resolve_thread(&self, thread_id: &str) -> Result<ResolveResult, GithubError> {
        self.mutate_thread(RESOLVE_THREAD_MUTATION, thread_id).await
    }

    async fn unresolve_thread(&self, thread_id: &str) -> Result<ResolveResult, GithubError> {
        self.mutate_thread(UNRESOLVE_THREAD_MUTATION, thread_id).await
    }
}

#[async_trait]
impl<R: CommandRunner> ThreadReplier for GhClient<R> {
    /// Replies under the last comment of the thread via the REST replies endpoint.
    async fn reply_to_thread(
        &self,
        pr: &PullRequestRef,
        thread_id: &str,
        body: &str,
    ) -> Result<ReplyResult, GithubError> {
        let (_, threads) = self.fetch_all_threads(pr).await?;
        let thread = threads
            .into_iter()
            .find(|t| t.id == thread_id)
            .ok_or_else(|| GithubError::NotFound(format!("thread {thread_id}")))?;
        if !thread.viewer_can_reply {
            return Err(GithubError::Command(format!(
                "viewer cannot reply to thread {thread_id}"
            )));
        }
        let last = thread
            .comments
            .last()
            .ok_or_else(|| GithubError::Command(format!("thread {thread_id} has no comments")))?;

        let args = [
            OsString::from("api"),
            OsString::from("--method"),
            OsString::from("POST"),
            OsString::from(format!(
                "repos/{}/{}/pulls/{}/comments/{}/replies",
                pr.owner, pr.repo, pr.number, last.database_id
            )),
            OsString::from("-f"),
            OsString::from(format!("body={body}")),
        ];
        let stdout = self.run_gh(&args, &format!("thread {thread_id}")).await?;
        let reply: ReplyResponse = decode(&stdout)?;
        Ok(ReplyResult {
            thread_id: thread_id.to_owned(),
            comment_id: reply.id,
            url: reply.html_url,
            body: reply.body,
            created_at: parse_timestamp(reply.created_at.as_deref()),
        })
    }
}
