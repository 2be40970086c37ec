//! Terminal progress reporting for batches

use indicatif::{ProgressBar, ProgressStyle};

use crate::domain::model::{BatchProgress, JobId, JobStatus};
use crate::ports::BatchObserver;

const TEMPLATE: &str = "[{elapsed_precise}] [{wide_bar:.white/green}] {pos}/{len} ({percent}%) {msg}";

/// Batch observer drawing a progress bar on stderr
pub struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░-");
        bar.set_style(style);
        Self { bar }
    }

    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressBarObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchObserver for ProgressBarObserver {
    fn on_status(&self, job: JobId, status: JobStatus) {
        if status == JobStatus::Failed {
            self.bar.println(format!("{} failed", job));
        }
        self.bar.set_message(format!("{} {}", job, status));
    }

    fn on_progress(&self, job: JobId, percent: u8) {
        self.bar.set_message(format!("{} {}%", job, percent));
    }

    fn on_batch_progress(&self, progress: BatchProgress) {
        self.bar.set_length(progress.total as u64);
        self.bar.set_position(progress.processed as u64);
    }
}
