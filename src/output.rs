//! CLI output formatting: the end-of-run summary.

use planetary_fetch::RunReport;

/// Builds the summary printed after a run.
pub(crate) fn summary_lines(pattern: &str, report: &RunReport) -> Vec<String> {
    if report.is_empty() {
        return vec![format!("No products matched '{pattern}'.")];
    }

    let mut lines = vec![format!(
        "{} product(s) matched: {} downloaded, {} skipped, {} failed",
        report.matched_products,
        report.completed(),
        report.skipped(),
        report.failed()
    )];
    lines.extend(report.failures().filter_map(|outcome| {
        outcome
            .error()
            .map(|error| format!("  FAILED {}: {error}", outcome.job.file.name))
    }));
    if report.interrupted() {
        lines.push("Interrupted: remaining files were not downloaded.".to_string());
    }
    lines
}

/// Prints the run summary to stdout.
pub(crate) fn print_summary(pattern: &str, report: &RunReport) {
    for line in summary_lines(pattern, report) {
        println!("{line}");
    }
}
