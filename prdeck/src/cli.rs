//! Command-line surface. Flags override the config file; the subcommand picks the starting view.

use clap::{Parser, Subcommand};
use prdeck_core::status::WatchPolicy;

#[derive(Debug, Parser)]
#[command(name = "prdeck")]
#[command(about = "Review pull-request threads, CI checks and approvals in the terminal", long_about = None)]
pub struct Cli {
    /// Repository as `owner/name`. Detected with `gh repo view` when omitted.
    #[arg(long, value_name = "OWNER/NAME")]
    pub repo: Option<String>,

    /// Pull request number.
    #[arg(long, value_name = "N")]
    pub pr: u64,

    /// Color theme: `dark` or `catppuccin-mocha`.
    #[arg(long, value_name = "NAME")]
    pub theme: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Start in the review-thread list (default).
    Comments,
    /// Start in the CI checks list.
    Checks {
        /// Poll checks until they reach a final state.
        #[arg(long)]
        watch: bool,
        /// Seconds between polls; defaults to the configured interval.
        #[arg(long, value_name = "SECS", requires = "watch")]
        interval: Option<u64>,
    },
    /// Start in the multi-select resolve view.
    Resolve,
    /// Start in the summary dashboard.
    Summary {
        /// Keep polling checks until every one has completed.
        #[arg(long)]
        watch: bool,
        /// Seconds between polls; defaults to the configured interval.
        #[arg(long, value_name = "SECS", requires = "watch")]
        interval: Option<u64>,
    },
}

impl Command {
    /// Poll policy and explicit interval, when `--watch` was given.
    ///
    /// The checks list stops at the first pass or fail; the summary waits for every check.
    pub fn watch(&self) -> Option<(WatchPolicy, Option<u64>)> {
        match *self {
            Command::Checks {
                watch: true,
                interval,
            } => Some((WatchPolicy::FailFast, interval)),
            Command::Summary {
                watch: true,
                interval,
            } => Some((WatchPolicy::WaitAll, interval)),
            _ => None,
        }
    }
}
