//! Terminal display of pipeline progress.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use newsbrief_core::{ProgressDetail, ProgressEvent, ProgressSink};

/// Progress sink drawing an indicatif spinner on stderr.
pub(crate) struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    pub(crate) fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(Duration::from_millis(80));
        Self { spinner }
    }

    /// Clear the spinner if the run ended without a terminal event.
    pub(crate) fn finish(&self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}

impl ProgressSink for CliProgress {
    fn emit(&self, event: ProgressEvent) {
        match event.detail {
            ProgressDetail::Entered => {
                let label = event.stage.label();
                self.spinner.set_message(format!("{label}..."));
            }
            ProgressDetail::SeedLoaded { title, chars } => {
                self.spinner
                    .println(format!("  Seed:       {title} ({chars} chars)"));
            }
            ProgressDetail::KeywordsDerived { keywords } => {
                self.spinner
                    .println(format!("  Keywords:   {}", keywords.join(", ")));
            }
            ProgressDetail::CandidatesCollected { count } => {
                self.spinner
                    .println(format!("  Candidates: {count} related articles"));
            }
            ProgressDetail::CandidateFetched {
                completed,
                total,
                url,
                failure,
            } => {
                if let Some(kind) = failure {
                    self.spinner.println(format!("  ✗ {url} ({kind})"));
                }
                self.spinner
                    .set_message(format!("fetching articles [{completed}/{total}] {url}"));
            }
            ProgressDetail::ContentAggregated { .. } => {}
            ProgressDetail::Finished { .. } | ProgressDetail::Aborted { .. } => {
                self.spinner.finish_and_clear();
            }
        }
    }
}
