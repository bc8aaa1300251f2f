use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

use crate::orchestrator::ProgressCallback;

const RUNNING_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {msg:>50}";
const DONE_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.green/blue}] {msg:>50}";

/// Terminal progress bar for one filing analysis.
#[derive(Clone)]
pub struct ProgressTracker {
    progress_bar: ProgressBar,
    filing_name: String,
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

impl ProgressTracker {
    pub fn new(multi_progress: Option<&Arc<MultiProgress>>, filing_name: &str) -> Self {
        let progress_bar = match multi_progress {
            Some(mp) => {
                let pb = mp.add(ProgressBar::new(100));
                pb.enable_steady_tick(Duration::from_millis(100));
                pb
            }
            None => ProgressBar::new(100),
        };
        progress_bar.set_style(style(RUNNING_TEMPLATE));
        Self {
            progress_bar,
            filing_name: filing_name.to_string(),
        }
    }

    /// Tracks progress without drawing anything.
    pub fn hidden(filing_name: &str) -> Self {
        let progress_bar = ProgressBar::hidden();
        progress_bar.set_length(100);
        Self {
            progress_bar,
            filing_name: filing_name.to_string(),
        }
    }

    pub fn update(&self, progress: f64, message: &str) {
        let position = (progress.clamp(0.0, 1.0) * 100.0).round() as u64;
        self.progress_bar.set_position(position);
        self.progress_bar
            .set_message(format!("Analyzing [{}] - {}", self.filing_name, message));
        if position >= 100 {
            self.finish();
        }
    }

    pub fn finish(&self) {
        self.progress_bar.set_style(style(DONE_TEMPLATE));
        self.progress_bar
            .set_message(format!("Complete [{}]", self.filing_name));
        self.progress_bar.finish();
    }

    pub fn position(&self) -> u64 {
        self.progress_bar.position()
    }

    pub fn is_finished(&self) -> bool {
        self.progress_bar.is_finished()
    }

    /// Callback that drives this bar from orchestration progress.
    pub fn callback(&self) -> ProgressCallback {
        let tracker = self.clone();
        ProgressCallback::sync(move |progress, message| {
            tracker.update(progress, message);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_moves_bar() {
        let tracker = ProgressTracker::hidden("0000320193-23-000106");
        tracker.update(0.4, "Filing sections extracted");
        assert_eq!(tracker.position(), 40);
        assert!(!tracker.is_finished());

        tracker.update(1.0, "Analysis completed");
        assert_eq!(tracker.position(), 100);
        assert!(tracker.is_finished());
    }

    #[tokio::test]
    async fn test_callback_drives_bar() {
        let tracker = ProgressTracker::hidden("0000320193-23-000106");
        let mut reporter = crate::orchestrator::ProgressReporter::new(
            Some(tracker.callback()),
            Duration::from_secs(1),
        );
        reporter.report(0.8, "LLM analysis completed").await;
        assert_eq!(tracker.position(), 80);
    }
}
