//! `gh`-backed adapter driven through a scripted command runner.

use std::collections::VecDeque;
use std::ffi::OsString;
use std::io;
use std::process::Output;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use prdeck_core::github::{CommandRunner, GhClient};
use prdeck_core::ports::{CheckFetcher, ReviewFetcher, ThreadFetcher, ThreadResolver};
use prdeck_core::types::{CheckStatus, Conclusion, OverallStatus, PullRequestRef, ReviewState};
use prdeck_core::GithubError;

struct StubRunner {
    calls: Mutex<Vec<Vec<String>>>,
    results: Mutex<VecDeque<io::Result<Output>>>,
}

impl StubRunner {
    fn with_results(results: Vec<io::Result<Output>>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            results: Mutex::new(VecDeque::from(results)),
        }
    }
}

#[async_trait]
impl CommandRunner for StubRunner {
    async fn run(&self, _program: &str, args: &[OsString]) -> io::Result<Output> {
        self.calls.lock().expect("lock").push(
            args.iter()
                .map(|a| a.to_string_lossy().into_owned())
                .collect(),
        );
        self.results
            .lock()
            .expect("lock")
            .pop_front()
            .unwrap_or_else(|| {
                Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "missing stubbed command output",
                ))
            })
    }
}

fn output(status_code: i32, stdout: &str, stderr: &str) -> Output {
    use std::os::unix::process::ExitStatusExt;
    Output {
        status: std::process::ExitStatus::from_raw(status_code << 8),
        stdout: stdout.as_bytes().to_vec(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

fn ok(stdout: &str) -> io::Result<Output> {
    Ok(output(0, stdout, ""))
}

fn pr() -> PullRequestRef {
    PullRequestRef::parse("octo/widgets", 7).expect("valid slug")
}

fn thread_json(id: &str, path: &str, resolved: bool) -> String {
    format!(
        r#"{{"id":"{id}","isResolved":{resolved},"isOutdated":false,"path":"{path}","line":12,
        "startLine":null,"viewerCanResolve":true,"viewerCanUnresolve":false,"viewerCanReply":true,
        "comments":{{"nodes":[{{"id":"c-{id}","databaseId":99,"body":"nit","author":{{"login":"rev"}},
        "path":"{path}","diffHunk":"@@ -1 +1 @@","createdAt":"2024-05-01T10:00:00Z","url":"https://x/{id}"}}]}}}}"#
    )
}

fn threads_page(nodes: &[String], next: Option<&str>) -> String {
    let page_info = match next {
        Some(cursor) => format!(r#"{{"hasNextPage":true,"endCursor":"{cursor}"}}"#),
        None => r#"{"hasNextPage":false,"endCursor":null}"#.to_owned(),
    };
    format!(
        r#"{{"data":{{"repository":{{"pullRequest":{{"reviewThreads":{{"totalCount":3,"nodes":[{}],"pageInfo":{page_info}}}}}}}}}}}"#,
        nodes.join(",")
    )
}

#[tokio::test]
async fn fetch_threads_follows_pages_and_keeps_unresolved() {
    let runner = StubRunner::with_results(vec![
        ok(&threads_page(
            &[thread_json("t1", "a.rs", false), thread_json("t2", "b.rs", true)],
            Some("CUR1"),
        )),
        ok(&threads_page(&[thread_json("t3", "a.rs", false)], None)),
    ]);
    let client = GhClient::new(runner, "gh");

    let result = client.fetch_threads(&pr()).await.expect("threads");
    assert_eq!(result.total_count, 3);
    assert_eq!(result.resolved_count, 1);
    assert_eq!(result.unresolved_count, 2);
    let ids: Vec<&str> = result.threads.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, ["t1", "t3"]);
    assert_eq!(result.threads[0].comments[0].author, "rev");
    assert!(result.threads[0].comments[0].created_at.is_some());
    assert_eq!(result.threads[0].start_line, None);

    let calls = client_calls(&client);
    assert_eq!(calls.len(), 2);
    assert_eq!(&calls[0][..2], ["api", "graphql"]);
    assert!(calls[0].contains(&"owner=octo".to_owned()));
    assert!(calls[0].contains(&"pr=7".to_owned()));
    assert!(calls[1].contains(&"cursor=CUR1".to_owned()));
}

fn client_calls(client: &GhClient<StubRunner>) -> Vec<Vec<String>> {
    client.runner().calls.lock().expect("lock").clone()
}

#[tokio::test]
async fn fetch_checks_enriches_failed_runs() {
    let runs = r#"{"total_count":2,"check_runs":[
        {"id":1,"name":"build","status":"completed","conclusion":"success",
         "started_at":"2024-05-01T10:00:00Z","completed_at":"2024-05-01T10:01:30Z",
         "html_url":"https://ci/1","output":{"annotations_count":0}},
        {"id":2,"name":"lint","status":"completed","conclusion":"failure",
         "started_at":"2024-05-01T10:00:00Z","completed_at":"2024-05-01T10:00:20Z",
         "html_url":"https://ci/2","output":{"annotations_count":1}}]}"#;
    let annotations = r#"[{"path":"src/lib.rs","start_line":3,"end_line":3,
        "annotation_level":"failure","title":"clippy","message":"unused import"}]"#;
    let runner = StubRunner::with_results(vec![
        ok(r#"{"head":{"sha":"0123456789abcdef"}}"#),
        ok(runs),
        ok(annotations),
        ok("step 1\nerror: unused import\ndone\n"),
    ]);
    let client = GhClient::new(runner, "gh");

    let result = client.fetch_checks(&pr()).await.expect("checks");
    assert_eq!(result.head_sha, "0123456789abcdef");
    assert_eq!(result.overall_status, OverallStatus::Fail);
    assert_eq!((result.pass_count, result.fail_count, result.pending_count), (1, 1, 0));

    let lint = &result.checks[1];
    assert_eq!(lint.status, CheckStatus::Completed);
    assert_eq!(lint.conclusion, Some(Conclusion::Failure));
    assert_eq!(lint.annotations.len(), 1);
    assert_eq!(lint.annotations[0].title, "clippy");
    assert!(lint.log_excerpt.contains("error: unused import"));

    let calls = client_calls(&client);
    assert_eq!(calls[0], ["api", "repos/octo/widgets/pulls/7"]);
    assert_eq!(
        calls[1][1],
        "repos/octo/widgets/commits/0123456789abcdef/check-runs?per_page=100&page=1"
    );
    assert_eq!(calls[2][1], "repos/octo/widgets/check-runs/2/annotations");
    assert_eq!(calls[3][1], "repos/octo/widgets/actions/jobs/2/logs");
}

#[tokio::test]
async fn missing_job_log_does_not_fail_the_fetch() {
    let runs = r#"{"total_count":1,"check_runs":[
        {"id":5,"name":"external","status":"completed","conclusion":"failure",
         "started_at":null,"completed_at":null,"html_url":"","output":{"annotations_count":0}}]}"#;
    let runner = StubRunner::with_results(vec![
        ok(r#"{"head":{"sha":"abc"}}"#),
        ok(runs),
        Ok(output(1, "", "gh: Not Found (HTTP 404)")),
    ]);
    let client = GhClient::new(runner, "gh");

    let result = client.fetch_checks(&pr()).await.expect("checks");
    assert_eq!(result.checks[0].log_excerpt, "");
    assert_eq!(result.fail_count, 1);
}

#[tokio::test]
async fn failed_annotations_request_does_not_fail_the_fetch() {
    let runs = r#"{"total_count":2,"check_runs":[
        {"id":8,"name":"test","status":"completed","conclusion":"failure",
         "started_at":null,"completed_at":null,"html_url":"","output":{"annotations_count":3}},
        {"id":9,"name":"docs","status":"completed","conclusion":"success",
         "started_at":null,"completed_at":null,"html_url":"","output":{"annotations_count":0}}]}"#;
    let runner = StubRunner::with_results(vec![
        ok(r#"{"head":{"sha":"abc"}}"#),
        ok(runs),
        Ok(output(1, "", "gh: Server Error (HTTP 502)")),
        ok("##[error]Process completed with exit code 1.\n"),
    ]);
    let client = GhClient::new(runner, "gh").with_retry(0, Duration::ZERO);

    let result = client.fetch_checks(&pr()).await.expect("checks");
    assert_eq!(result.checks.len(), 2);
    assert!(result.checks[0].annotations.is_empty());
    assert!(result.checks[0].log_excerpt.contains("exit code 1"));
    assert_eq!((result.pass_count, result.fail_count), (1, 1));
    assert_eq!(result.overall_status, OverallStatus::Fail);

    let calls = client_calls(&client);
    assert_eq!(calls[2][1], "repos/octo/widgets/check-runs/8/annotations");
    assert_eq!(calls[3][1], "repos/octo/widgets/actions/jobs/8/logs");
}

#[tokio::test]
async fn transient_gh_failures_are_retried() {
    let body = r#"{"data":{"repository":{"pullRequest":{"reviews":{"nodes":[]}}}}}"#;
    let runner = StubRunner::with_results(vec![
        Ok(output(1, "", "gh: Bad Gateway (HTTP 502)")),
        ok(body),
    ]);
    let client = GhClient::new(runner, "gh").with_retry(2, Duration::ZERO);

    let reviews = client.fetch_reviews(&pr()).await.expect("reviews");
    assert!(reviews.is_empty());
    assert_eq!(client_calls(&client).len(), 2);
}

#[tokio::test]
async fn retries_stop_after_the_limit() {
    let runner = StubRunner::with_results(vec![
        Ok(output(1, "", "gh: Bad Gateway (HTTP 502)")),
        Ok(output(1, "", "gh: Bad Gateway (HTTP 502)")),
        Ok(output(1, "", "gh: Bad Gateway (HTTP 502)")),
    ]);
    let client = GhClient::new(runner, "gh").with_retry(1, Duration::ZERO);

    let err = client.fetch_reviews(&pr()).await.expect_err("still failing");
    assert!(matches!(err, GithubError::Command(_)));
    assert_eq!(client_calls(&client).len(), 2);
}

#[tokio::test]
async fn auth_failures_are_not_retried() {
    let runner = StubRunner::with_results(vec![Ok(output(
        4,
        "",
        "HTTP 401: Bad credentials (https://api.github.com/graphql)",
    ))]);
    let client = GhClient::new(runner, "gh").with_retry(3, Duration::ZERO);

    let err = client.fetch_reviews(&pr()).await.expect_err("auth");
    assert_eq!(err, GithubError::Auth);
    assert_eq!(client_calls(&client).len(), 1);
}

#[tokio::test]
async fn graphql_errors_are_classified() {
    let runner = StubRunner::with_results(vec![Ok(output(
        1,
        "",
        "GraphQL: Could not resolve to a PullRequest with the number of 7. (repository.pullRequest)",
    ))]);
    let client = GhClient::new(runner, "gh");

    let err = client.fetch_threads(&pr()).await.expect_err("not found");
    assert_eq!(err, GithubError::NotFound("pull request".to_owned()));
}

#[tokio::test]
async fn missing_gh_binary_is_actionable() {
    let runner = StubRunner::with_results(vec![Err(io::Error::new(
        io::ErrorKind::NotFound,
        "missing",
    ))]);
    let client = GhClient::new(runner, "gh");

    let err = client.fetch_reviews(&pr()).await.expect_err("no gh");
    assert!(err.to_string().contains("Install gh"));
}

#[tokio::test]
async fn reviews_skip_unknown_states() {
    let body = r#"{"data":{"repository":{"pullRequest":{"reviews":{"nodes":[
        {"id":"r1","author":{"login":"amy"},"state":"APPROVED","body":"","submittedAt":"2024-05-01T10:00:00Z"},
        {"id":"r2","author":null,"state":"SOMETHING_NEW","body":"","submittedAt":null},
        {"id":"r3","author":null,"state":"CHANGES_REQUESTED","body":"fix","submittedAt":null}]}}}}}"#;
    let client = GhClient::new(StubRunner::with_results(vec![ok(body)]), "gh");

    let reviews = client.fetch_reviews(&pr()).await.expect("reviews");
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0].state, ReviewState::Approved);
    assert_eq!(reviews[1].author, "ghost");
    assert_eq!(reviews[1].state, ReviewState::ChangesRequested);
}

#[tokio::test]
async fn resolve_thread_reports_new_state() {
    let body = r#"{"data":{"resolveReviewThread":{"thread":
        {"id":"t1","isResolved":true,"path":"a.rs","line":4}}}}"#;
    let client = GhClient::new(StubRunner::with_results(vec![ok(body)]), "gh");

    let result = client.resolve_thread("t1").await.expect("resolve");
    assert!(result.is_resolved);
    assert_eq!(result.line, 4);
    let calls = client_calls(&client);
    assert!(calls[0].contains(&"threadId=t1".to_owned()));
}
