//! GitHub adapter that shells out to the `gh` CLI.
//!
//! `gh` owns authentication, host selection and HTTP transport, so this module only builds argument
//! vectors, runs them through a [`CommandRunner`] and decodes the JSON that comes back. Every
//! failure is mapped onto [`GithubError`] before it leaves the module.

mod checks;
mod mutations;
mod reviews;
mod threads;

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::GithubError;

/// Runs an external program to completion and captures its output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[OsString]) -> io::Result<Output>;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Default)]
pub struct ProcessCommandRunner;

#[async_trait]
impl CommandRunner for ProcessCommandRunner {
    async fn run(&self, program: &str, args: &[OsString]) -> io::Result<Output> {
        tokio::process::Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
    }
}

/// A GraphQL variable passed with `-f` (string) or `-F` (typed) to `gh api graphql`.
pub(crate) enum Var<'a> {
    Str(&'a str, &'a str),
    Int(&'a str, u64),
}

#[derive(Deserialize)]
struct GraphqlEnvelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlErrorItem>,
}

#[derive(Deserialize)]
struct GraphqlErrorItem {
    message: String,
}

/// Extra attempts for a `gh` call that failed with a retryable error.
const DEFAULT_RETRIES: u32 = 2;
const DEFAULT_BACKOFF: Duration = Duration::from_millis(500);

/// GitHub client that implements every port in [`crate::ports`] via `gh api`.
pub struct GhClient<R: CommandRunner> {
    runner: R,
    binary: PathBuf,
    retries: u32,
    backoff: Duration,
}

impl<R: CommandRunner> GhClient<R> {
    pub fn new(runner: R, binary: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            binary: binary.into(),
            retries: DEFAULT_RETRIES,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Overrides how often a retryable `gh` failure is re-run, and the base delay between runs.
    /// The delay doubles after each attempt.
    pub fn with_retry(mut self, retries: u32, backoff: Duration) -> Self {
        self.retries = retries;
        self.backoff = backoff;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Resolves the `owner/name` slug of the repository in the current directory.
    pub async fn current_repo(&self) -> Result<String, GithubError> {
        #[derive(Deserialize)]
        struct RepoView {
            #[serde(rename = "nameWithOwner")]
            name_with_owner: String,
        }
        let args = [
            OsString::from("repo"),
            OsString::from("view"),
            OsString::from("--json"),
            OsString::from("nameWithOwner"),
        ];
        let stdout = self.run_gh(&args, "repository").await?;
        let view: RepoView = decode(&stdout)?;
        Ok(view.name_with_owner)
    }

    /// Runs `gh` and returns stdout, classifying failures.
    ///
    /// A non-zero exit whose classification [`is_retryable`](GithubError::is_retryable) is re-run
    /// up to `retries` times with a doubling backoff. Spawn failures are returned at once.
    pub(crate) async fn run_gh(
        &self,
        args: &[OsString],
        resource: &str,
    ) -> Result<Vec<u8>, GithubError> {
        let program = self
            .binary
            .to_str()
            .ok_or_else(|| GithubError::Command("invalid gh binary path".to_owned()))?;

        let mut delay = self.backoff;
        let mut attempt = 0;
        loop {
            tracing::debug!(command = %render_args(args), attempt, "running gh");
            let output = self
                .runner
                .run(program, args)
                .await
                .map_err(|error| self.spawn_error(error))?;

            if output.status.success() {
                return Ok(output.stdout);
            }
            let detail = output_detail(&output);
            let error = GithubError::classify(&detail, resource);
            if attempt >= self.retries || !error.is_retryable() {
                tracing::debug!(command = %render_args(args), %detail, "gh failed");
                return Err(error);
            }
            tracing::warn!(command = %render_args(args), %error, ?delay, "gh failed, retrying");
            tokio::time::sleep(delay).await;
            delay = delay.saturating_mul(2);
            attempt += 1;
        }
    }

    fn spawn_error(&self, error: io::Error) -> GithubError {
        match error.kind() {
            io::ErrorKind::NotFound => GithubError::Command(format!(
                "GitHub CLI `{}` was not found. Install gh and authenticate with `gh auth login`.",
                self.binary.display()
            )),
            _ => GithubError::Command(format!(
                "failed to execute GitHub CLI `{}`: {error}",
                self.binary.display()
            )),
        }
    }

    /// Runs a REST `GET` through `gh api` and decodes the JSON body.
    pub(crate) async fn rest<T: DeserializeOwned>(
        &self,
        path: &str,
        resource: &str,
    ) -> Result<T, GithubError> {
        let args = [OsString::from("api"), OsString::from(path)];
        let stdout = self.run_gh(&args, resource).await?;
        decode(&stdout)
    }

    /// Runs a GraphQL document through `gh api graphql` and returns its `data` object.
    pub(crate) async fn graphql<T: DeserializeOwned>(
        &self,
        document: &str,
        vars: &[Var<'_>],
        resource: &str,
    ) -> Result<T, GithubError> {
        let mut args = vec![
            OsString::from("api"),
            OsString::from("graphql"),
            OsString::from("-f"),
            OsString::from(format!("query={document}")),
        ];
        for var in vars {
            match var {
                Var::Str(name, value) => {
                    args.push(OsString::from("-f"));
                    args.push(OsString::from(format!("{name}={value}")));
                }
                Var::Int(name, value) => {
                    args.push(OsString::from("-F"));
                    args.push(OsString::from(format!("{name}={value}")));
                }
            }
        }

        let stdout = self.run_gh(&args, resource).await?;
        let envelope: GraphqlEnvelope<T> = decode(&stdout)?;
        if !envelope.errors.is_empty() {
            let messages: Vec<&str> = envelope.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(GithubError::classify(&messages.join("; "), resource));
        }
        envelope
            .data
            .ok_or_else(|| GithubError::Parse("graphql response had no data".to_owned()))
    }
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, GithubError> {
    serde_json::from_slice(bytes).map_err(|error| GithubError::Parse(error.to_string()))
}

/// Parses an RFC 3339 timestamp, treating empty or malformed values as absent.
pub(crate) fn parse_timestamp(value: Option<&str>) -> Option<time::OffsetDateTime> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    time::OffsetDateTime::parse(value, &time::format_description::well_known::Rfc3339).ok()
}

fn render_args(args: &[OsString]) -> String {
    args.iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn output_detail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
    if !stderr.is_empty() {
        return stderr;
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_owned();
    if !stdout.is_empty() {
        return stdout;
    }
    format!("exit status {}", output.status)
}
