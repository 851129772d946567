use std::ffi::OsString;

use async_trait::async_trait;
use serde::Deserialize;

use super::{parse_timestamp, CommandRunner, GhClient};
use crate::error::GithubError;
use crate::logs::extract_error_lines;
use crate::ports::CheckFetcher;
use crate::status::check_is_failed;
use crate::types::{
    Annotation, CheckRun, CheckStatus, ChecksResult, Conclusion, PullRequestRef,
};

#[derive(Deserialize)]
struct PullRequestHead {
    head: HeadRef,
}

#[derive(Deserialize)]
struct HeadRef {
    sha: String,
}

#[derive(Deserialize)]
struct CheckRunsPage {
    total_count: usize,
    #[serde(default)]
    check_runs: Vec<CheckRunNode>,
}

#[derive(Deserialize)]
struct CheckRunNode {
    id: i64,
    name: String,
    status: String,
    conclusion: Option<String>,
    started_at: Option<String>,
    completed_at: Option<String>,
    #[serde(default)]
    html_url: String,
    #[serde(default)]
    output: CheckOutput,
}

#[derive(Deserialize, Default)]
struct CheckOutput {
    #[serde(default)]
    annotations_count: usize,
}

#[derive(Deserialize)]
struct AnnotationNode {
    #[serde(default)]
    path: String,
    #[serde(default)]
    start_line: u32,
    #[serde(default)]
    end_line: u32,
    #[serde(default)]
    annotation_level: String,
    title: Option<String>,
    #[serde(default)]
    message: String,
}

impl From<AnnotationNode> for Annotation {
    fn from(node: AnnotationNode) -> Self {
        Annotation {
            path: node.path,
            start_line: node.start_line,
            end_line: node.end_line,
            level: node.annotation_level,
            title: node.title.unwrap_or_default(),
            message: node.message,
        }
    }
}

impl<R: CommandRunner> GhClient<R> {
    async fn fetch_head_sha(&self, pr: &PullRequestRef) -> Result<String, GithubError> {
        let path = format!("repos/{}/{}/pulls/{}", pr.owner, pr.repo, pr.number);
        let detail = format!("PR #{} in {}", pr.number, pr.slug());
        let head: PullRequestHead = self.rest(&path, &detail).await?;
        Ok(head.head.sha)
    }

    async fn fetch_check_runs(
        &self,
        pr: &PullRequestRef,
        sha: &str,
    ) -> Result<Vec<CheckRunNode>, GithubError> {
        let mut runs = Vec::new();
        let mut page = 1;
        loop {
            let path = format!(
                "repos/{}/{}/commits/{sha}/check-runs?per_page=100&page={page}",
                pr.owner, pr.repo
            );
            let batch: CheckRunsPage = self.rest(&path, "check runs").await?;
            let fetched = batch.check_runs.len();
            runs.extend(batch.check_runs);
            if fetched == 0 || runs.len() >= batch.total_count {
                break;
            }
            page += 1;
        }
        Ok(runs)
    }

    async fn fetch_annotations(
        &self,
        pr: &PullRequestRef,
        check_run_id: i64,
    ) -> Result<Vec<Annotation>, GithubError> {
        let path = format!(
            "repos/{}/{}/check-runs/{check_run_id}/annotations",
            pr.owner, pr.repo
        );
        let nodes: Vec<AnnotationNode> = self.rest(&path, "annotations").await?;
        Ok(nodes.into_iter().map(Annotation::from).collect())
    }

    /// Downloads the raw log of an Actions job. For Actions-backed checks the job id equals the
    /// check run id.
    pub async fn fetch_job_log(
        &self,
        pr: &PullRequestRef,
        job_id: i64,
    ) -> Result<String, GithubError> {
        let args = [
            OsString::from("api"),
            OsString::from(format!(
                "repos/{}/{}/actions/jobs/{job_id}/logs",
                pr.owner, pr.repo
            )),
        ];
        let stdout = self.run_gh(&args, "job log").await?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

#[async_trait]
impl<R: CommandRunner> CheckFetcher for GhClient<R> {
    async fn fetch_checks(&self, pr: &PullRequestRef) -> Result<ChecksResult, GithubError> {
        let sha = self.fetch_head_sha(pr).await?;
        let nodes = self.fetch_check_runs(pr, &sha).await?;

        let mut checks = Vec::with_capacity(nodes.len());
        for node in nodes {
            let mut check = CheckRun {
                id: node.id,
                name: node.name,
                status: CheckStatus::from_api(&node.status),
                conclusion: node.conclusion.as_deref().and_then(Conclusion::from_api),
                started_at: parse_timestamp(node.started_at.as_deref()),
                completed_at: parse_timestamp(node.completed_at.as_deref()),
                html_url: node.html_url,
                annotations: Vec::new(),
                log_excerpt: String::new(),
            };
            if check_is_failed(&check) {
                if node.output.annotations_count > 0 {
                    match self.fetch_annotations(pr, check.id).await {
                        Ok(annotations) => check.annotations = annotations,
                        Err(error) => {
                            tracing::debug!(check = %check.name, %error, "annotations unavailable")
                        }
                    }
                }
                // Non-Actions checks have no job log; a missing excerpt is not an error.
                match self.fetch_job_log(pr, check.id).await {
                    Ok(log) => check.log_excerpt = extract_error_lines(&log),
                    Err(error) => {
                        tracing::debug!(check = %check.name, %error, "job log unavailable")
                    }
                }
            }
            checks.push(check);
        }

        let result = ChecksResult::from_checks(pr.number, sha, checks);
        tracing::debug!(
            pr = pr.number,
            status = result.overall_status.as_str(),
            checks = result.checks.len(),
            "fetched checks"
        );
        Ok(result)
    }
}
