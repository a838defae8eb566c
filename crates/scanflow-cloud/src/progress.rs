//! Progress display for long-running remote operations

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct JobProgress {
    spinner: ProgressBar,
}

impl JobProgress {
    pub fn new(message: &str) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap(),
        );
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));

        Self { spinner }
    }

    pub fn set_message(&self, msg: &str) {
        self.spinner.set_message(msg.to_string());
    }

    pub fn finish_success(&self, message: &str) {
        self.spinner.finish_with_message(format!("{} ✓", message));
    }

    pub fn finish_error(&self, error: &str) {
        self.spinner.finish_with_message(format!("Failed: {}", error));
    }
}
