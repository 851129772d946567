use async_trait::async_trait;
use serde::Deserialize;

use super::{parse_timestamp, CommandRunner, GhClient, Var};
use crate::error::GithubError;
use crate::ports::ThreadFetcher;
use crate::types::{Comment, CommentsResult, PullRequestRef, ReviewThread};

const REVIEW_THREADS_QUERY: &str = r#"
query($owner: String!, $repo: String!, $pr: Int!, $cursor: String) {
  repository(owner: $owner, name: $repo) {
    pullRequest(number: $pr) {
      reviewThreads(first: 100, after: $cursor) {
        totalCount
        nodes {
          id
          isResolved
          isOutdated
          path
          line
          startLine
          viewerCanResolve
          viewerCanUnresolve
          viewerCanReply
          comments(first: 50) {
            nodes {
              id
              databaseId
              body
              author { login }
              path
              diffHunk
              createdAt
              url
            }
          }
        }
        pageInfo {
          hasNextPage
          endCursor
        }
      }
    }
  }
}
"#;

#[derive(Deserialize)]
struct ThreadsData {
    repository: Option<RepositoryNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    pull_request: Option<PullRequestNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestNode {
    review_threads: ThreadConnection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadConnection {
    total_count: usize,
    #[serde(default)]
    nodes: Vec<ThreadNode>,
    page_info: PageInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThreadNode {
    id: String,
    is_resolved: bool,
    #[serde(default)]
    is_outdated: bool,
    path: String,
    line: Option<u32>,
    start_line: Option<u32>,
    #[serde(default)]
    viewer_can_resolve: bool,
    #[serde(default)]
    viewer_can_unresolve: bool,
    #[serde(default)]
    viewer_can_reply: bool,
    comments: CommentConnection,
}

#[derive(Deserialize)]
struct CommentConnection {
    #[serde(default)]
    nodes: Vec<CommentNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentNode {
    id: String,
    #[serde(default)]
    database_id: i64,
    #[serde(default)]
    body: String,
    author: Option<Author>,
    #[serde(default)]
    path: String,
    diff_hunk: Option<String>,
    created_at: Option<String>,
    #[serde(default)]
    url: String,
}

#[derive(Deserialize)]
struct Author {
    login: String,
}

impl From<ThreadNode> for ReviewThread {
    fn from(node: ThreadNode) -> Self {
        ReviewThread {
            id: node.id,
            path: node.path,
            line: node.line.unwrap_or(0),
            start_line: node.start_line.filter(|s| *s > 0),
            is_resolved: node.is_resolved,
            is_outdated: node.is_outdated,
            viewer_can_resolve: node.viewer_can_resolve,
            viewer_can_unresolve: node.viewer_can_unresolve,
            viewer_can_reply: node.viewer_can_reply,
            comments: node
                .comments
                .nodes
                .into_iter()
                .map(|c| Comment {
                    id: c.id,
                    database_id: c.database_id,
                    // Deleted accounts come back with a null author.
                    author: c.author.map(|a| a.login).unwrap_or_else(|| "ghost".to_owned()),
                    body: c.body,
                    created_at: parse_timestamp(c.created_at.as_deref()),
                    url: c.url,
                    diff_hunk: c.diff_hunk.unwrap_or_default(),
                    path: c.path,
                })
                .collect(),
        }
    }
}

impl<R: CommandRunner> GhClient<R> {
    /// Fetches every review thread of the pull request, following pagination.
    pub(crate) async fn fetch_all_threads(
        &self,
        pr: &PullRequestRef,
    ) -> Result<(usize, Vec<ReviewThread>), GithubError> {
        let detail = format!("PR #{} in {}", pr.number, pr.slug());
        let mut threads = Vec::new();
        let mut cursor: Option<String> = None;
        let total = loop {
            let mut vars = vec![
                Var::Str("owner", &pr.owner),
                Var::Str("repo", &pr.repo),
                Var::Int("pr", pr.number),
            ];
            if let Some(cursor) = cursor.as_deref() {
                vars.push(Var::Str("cursor", cursor));
            }
            let data: ThreadsData = self.graphql(REVIEW_THREADS_QUERY, &vars, &detail).await?;
            let connection = data
                .repository
                .and_then(|r| r.pull_request)
                .ok_or_else(|| GithubError::NotFound(detail.clone()))?
                .review_threads;

            threads.extend(connection.nodes.into_iter().map(ReviewThread::from));
            match connection.page_info.end_cursor {
                Some(next) if connection.page_info.has_next_page => cursor = Some(next),
                _ => break connection.total_count,
            }
        };
        tracing::debug!(pr = pr.number, total, fetched = threads.len(), "fetched review threads");
        Ok((total, threads))
    }
}

/// Keeps only unresolved threads while counting both kinds.
fn unresolved_result(pr_number: u64, total: usize, all: Vec<ReviewThread>) -> CommentsResult {
    let resolved_count = all.iter().filter(|t| t.is_resolved).count();
    let unresolved: Vec<ReviewThread> = all.into_iter().filter(|t| !t.is_resolved).collect();
    CommentsResult {
        pr_number,
        total_count: total,
        resolved_count,
        unresolved_count: unresolved.len(),
        threads: unresolved,
    }
}

#[async_trait]
impl<R: CommandRunner> ThreadFetcher for GhClient<R> {
    async fn fetch_threads(&self, pr: &PullRequestRef) -> Result<CommentsResult, GithubError> {
        let (total, all) = self.fetch_all_threads(pr).await?;
        Ok(unresolved_result(pr.number, total, all))
    }
}
