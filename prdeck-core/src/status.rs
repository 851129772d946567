//! CI status classification shared by the adapter, the dashboard and the watcher.

use crate::types::{CheckRun, CheckStatus, ChecksResult, Conclusion, OverallStatus};

/// Returns `true` for conclusions that count as a failed run.
pub fn is_fail_conclusion(conclusion: &Conclusion) -> bool {
    matches!(
        conclusion,
        Conclusion::Failure
            | Conclusion::TimedOut
            | Conclusion::ActionRequired
            | Conclusion::StartupFailure
            | Conclusion::Stale
            | Conclusion::Cancelled
    )
}

/// Returns `true` when the run has completed with a failure-class conclusion.
pub fn check_is_failed(check: &CheckRun) -> bool {
    check.status == CheckStatus::Completed
        && check.conclusion.as_ref().is_some_and(is_fail_conclusion)
}

/// Maps a single run onto pass / fail / pending.
///
/// Unknown conclusions stay pending rather than being guessed as pass or fail.
pub fn classify_check_status(check: &CheckRun) -> OverallStatus {
    if check.status != CheckStatus::Completed {
        return OverallStatus::Pending;
    }
    match &check.conclusion {
        Some(Conclusion::Success | Conclusion::Neutral | Conclusion::Skipped) => {
            OverallStatus::Pass
        }
        Some(c) if is_fail_conclusion(c) => OverallStatus::Fail,
        _ => OverallStatus::Pending,
    }
}

/// Highest-priority status wins: fail > pending > pass. An empty slice is a pass.
pub fn aggregate_status(statuses: &[OverallStatus]) -> OverallStatus {
    let mut result = OverallStatus::Pass;
    for status in statuses {
        match status {
            OverallStatus::Fail => return OverallStatus::Fail,
            OverallStatus::Pending => result = OverallStatus::Pending,
            OverallStatus::Pass => {}
        }
    }
    result
}

/// When a CI watch loop considers a poll result final.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WatchPolicy {
    /// Stop at the first definitive pass or fail signal.
    #[default]
    FailFast,
    /// Stop only once every check has completed.
    WaitAll,
}

impl WatchPolicy {
    pub fn is_terminal(self, result: &ChecksResult) -> bool {
        match self {
            WatchPolicy::FailFast => matches!(
                result.overall_status,
                OverallStatus::Pass | OverallStatus::Fail
            ),
            WatchPolicy::WaitAll => result.pending_count == 0 && !result.checks.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(status: CheckStatus, conclusion: &str) -> CheckRun {
        CheckRun {
            status,
            conclusion: Conclusion::from_api(conclusion),
            ..CheckRun::default()
        }
    }

    #[test]
    fn classifies_completed_runs_by_conclusion() {
        assert_eq!(
            classify_check_status(&run(CheckStatus::Completed, "success")),
            OverallStatus::Pass
        );
        assert_eq!(
            classify_check_status(&run(CheckStatus::Completed, "skipped")),
            OverallStatus::Pass
        );
        assert_eq!(
            classify_check_status(&run(CheckStatus::Completed, "cancelled")),
            OverallStatus::Fail
        );
        assert_eq!(
            classify_check_status(&run(CheckStatus::Completed, "mystery")),
            OverallStatus::Pending
        );
    }

    #[test]
    fn unfinished_runs_are_pending_regardless_of_conclusion() {
        assert_eq!(
            classify_check_status(&run(CheckStatus::InProgress, "failure")),
            OverallStatus::Pending
        );
        assert!(!check_is_failed(&run(CheckStatus::Queued, "failure")));
        assert!(check_is_failed(&run(CheckStatus::Completed, "timed_out")));
    }

    #[test]
    fn aggregate_prefers_fail_then_pending() {
        use OverallStatus::*;
        assert_eq!(aggregate_status(&[]), Pass);
        assert_eq!(aggregate_status(&[Pass, Pending, Pass]), Pending);
        assert_eq!(aggregate_status(&[Pending, Fail, Pass]), Fail);
    }

    #[test]
    fn wait_all_needs_at_least_one_check() {
        let empty = ChecksResult::from_checks(1, "abc", Vec::new());
        assert!(!WatchPolicy::WaitAll.is_terminal(&empty));
        assert!(WatchPolicy::FailFast.is_terminal(&empty));

        let mixed = ChecksResult::from_checks(
            1,
            "abc",
            vec![
                run(CheckStatus::Completed, "failure"),
                run(CheckStatus::InProgress, ""),
            ],
        );
        assert!(WatchPolicy::FailFast.is_terminal(&mixed));
        assert!(!WatchPolicy::WaitAll.is_terminal(&mixed));
    }
}
