//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

use mcam_models::ExportFormat;

/// Capture pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Acceleration magnitude any axis must exceed to trigger a recording
    pub motion_threshold: f64,
    /// Recording deadline per cycle
    pub record_duration: Duration,
    /// Presentation-time stretch applied to each capture
    pub scale_factor: f64,
    /// Directory holding per-cycle output directories
    pub work_dir: PathBuf,
    /// Container for exported compositions
    pub export_format: ExportFormat,
    /// Trigger channel capacity
    pub trigger_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            motion_threshold: 1.5,
            record_duration: Duration::from_secs(10),
            scale_factor: 2.0,
            work_dir: PathBuf::from("/tmp/mcam"),
            export_format: ExportFormat::Mp4,
            trigger_capacity: 16,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            motion_threshold: std::env::var("MCAM_MOTION_THRESHOLD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.motion_threshold),
            record_duration: std::env::var("MCAM_RECORD_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.record_duration),
            scale_factor: std::env::var("MCAM_SCALE_FACTOR")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.scale_factor),
            work_dir: std::env::var("MCAM_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            export_format: std::env::var("MCAM_EXPORT_FORMAT")
                .ok()
                .and_then(|s| ExportFormat::from_name(&s))
                .unwrap_or(defaults.export_format),
            trigger_capacity: std::env::var("MCAM_TRIGGER_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.trigger_capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.motion_threshold, 1.5);
        assert_eq!(config.record_duration, Duration::from_secs(10));
        assert_eq!(config.scale_factor, 2.0);
        assert_eq!(config.export_format, ExportFormat::Mp4);
    }
}
