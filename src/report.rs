//! Final run report (C7 terminal stage).

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Report {
    pub duration: Duration,
    pub attempted: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub voided_count: usize,
    pub output_file: PathBuf,
    pub error_file: PathBuf,
}

impl Report {
    pub fn log_summary(&self) {
        tracing::info!(
            duration_secs = self.duration.as_secs_f64(),
            attempted = self.attempted,
            success = self.success_count,
            failure = self.failure_count,
            voided = self.voided_count,
            output_file = %self.output_file.display(),
            error_file = %self.error_file.display(),
            "run complete",
        );
    }
}
