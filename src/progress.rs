//! Progress bar for download runs.

use std::io::{self, IsTerminal};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const TEMPLATE: &str = "{msg} {bar:40} {pos}/{len} [{elapsed_precise}]";

/// Handle to the run's progress bar.
///
/// Cloning is cheap; every clone drives the same bar. A hidden handle
/// accepts the same calls and draws nothing.
#[derive(Debug, Clone)]
pub struct Progress {
    bar: ProgressBar,
}

impl Progress {
    /// Creates a bar for `total` jobs.
    ///
    /// The bar is drawn only when `enabled` is true, stderr is a terminal and
    /// `TERM` is not `dumb`.
    #[must_use]
    pub fn new(total: usize, enabled: bool) -> Self {
        if !should_draw(enabled, io::stderr().is_terminal(), is_dumb_terminal()) {
            return Self::hidden();
        }
        let bar = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::with_template(TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_message("Downloading files");
        Self { bar }
    }

    /// A handle that never draws.
    #[must_use]
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Returns true when nothing is drawn.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.bar.is_hidden()
    }

    /// Advances the bar by one finished job.
    pub fn inc(&self) {
        self.bar.inc(1);
    }

    /// Number of finished jobs recorded so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Removes the bar from the terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

fn should_draw(enabled: bool, stderr_is_terminal: bool, dumb_terminal: bool) -> bool {
    enabled && stderr_is_terminal && !dumb_terminal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_draw_requires_all_conditions() {
        assert!(should_draw(true, true, false));
        assert!(!should_draw(false, true, false));
        assert!(!should_draw(true, false, false));
        assert!(!should_draw(true, true, true));
    }

    #[test]
    fn test_disabled_progress_is_hidden() {
        assert!(Progress::new(5, false).is_hidden());
    }

    #[test]
    fn test_hidden_progress_still_counts() {
        let progress = Progress::hidden();
        let clone = progress.clone();
        progress.inc();
        clone.inc();
        assert_eq!(progress.position(), 2);
        progress.finish();
    }
}
