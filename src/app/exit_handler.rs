//! Exit code logic for the planetary-fetch process.
//!
//! Single responsibility: map a finished run to the process exit outcome.

use planetary_fetch::RunReport;

use crate::ProcessExit;

/// Determines the process exit outcome from a run report.
pub(crate) fn determine_exit_outcome(report: &RunReport) -> ProcessExit {
    if report.interrupted() {
        return ProcessExit::Interrupted;
    }
    outcome_from_failures(report.failed())
}

/// Partial and total failure share one exit code.
fn outcome_from_failures(failed: usize) -> ProcessExit {
    if failed == 0 {
        ProcessExit::Success
    } else {
        ProcessExit::Failure
    }
}
