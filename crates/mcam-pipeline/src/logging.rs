//! Structured per-cycle logging.

use tracing::{error, info, warn};

/// Logger carrying cycle and stage context through a pipeline run.
#[derive(Debug, Clone)]
pub struct CycleLogger {
    cycle: u64,
    stage: &'static str,
}

impl CycleLogger {
    pub fn new(cycle: u64, stage: &'static str) -> Self {
        Self { cycle, stage }
    }

    /// Logger for the same cycle at a different stage.
    pub fn stage(&self, stage: &'static str) -> Self {
        Self {
            cycle: self.cycle,
            stage,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(cycle = self.cycle, stage = self.stage, "{}", message);
    }

    pub fn log_progress(&self, message: &str) {
        info!(cycle = self.cycle, stage = self.stage, "{}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(cycle = self.cycle, stage = self.stage, "{}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(cycle = self.cycle, stage = self.stage, "{}", message);
    }
}
