use async_trait::async_trait;
use serde::Deserialize;

use super::{parse_timestamp, CommandRunner, GhClient, Var};
use crate::error::GithubError;
use crate::ports::ReviewFetcher;
use crate::types::{PullRequestRef, Review, ReviewState};

const REVIEWS_QUERY: &str = r#"
query($owner: String!, $repo: String!, $pr: Int!) {
  repository(owner: $owner, name: $repo) {
    pullRequest(number: $pr) {
      reviews(first: 100) {
        nodes {
          id
          author { login }
          state
          body
          submittedAt
        }
      }
    }
  }
}
"#;

#[derive(Deserialize)]
struct ReviewsData {
    repository: Option<Repository>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Repository {
    pull_request: Option<PullRequest>,
}

#[derive(Deserialize)]
struct PullRequest {
    reviews: ReviewConnection,
}

#[derive(Deserialize)]
struct ReviewConnection {
    #[serde(default)]
    nodes: Vec<ReviewNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewNode {
    id: String,
    author: Option<Login>,
    state: String,
    #[serde(default)]
    body: String,
    submitted_at: Option<String>,
}

#[derive(Deserialize)]
struct Login {
    login: String,
}

#[async_trait]
impl<R: CommandRunner> ReviewFetcher for GhClient<R> {
    async fn fetch_reviews(&self, pr: &PullRequestRef) -> Result<Vec<Review>, GithubError> {
        let detail = format!("PR #{} in {}", pr.number, pr.slug());
        let vars = [
            Var::Str("owner", &pr.owner),
            Var::Str("repo", &pr.repo),
            Var::Int("pr", pr.number),
        ];
        let data: ReviewsData = self.graphql(REVIEWS_QUERY, &vars, &detail).await?;
        let nodes = data
            .repository
            .and_then(|r| r.pull_request)
            .ok_or_else(|| GithubError::NotFound(detail.clone()))?
            .reviews
            .nodes;

        let reviews = nodes
            .into_iter()
            .filter_map(|node| {
                let Some(state) = ReviewState::from_api(&node.state) else {
                    tracing::debug!(state = %node.state, "skipping review with unknown state");
                    return None;
                };
                Some(Review {
                    id: node.id,
                    author: node.author.map(|a| a.login).unwrap_or_else(|| "ghost".to_owned()),
                    state,
                    body: node.body,
                    submitted_at: parse_timestamp(node.submitted_at.as_deref()),
                })
            })
            .collect();
        Ok(reviews)
    }
}
