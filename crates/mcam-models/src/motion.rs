//! Motion sensor samples and the detection threshold.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single accelerometer reading, one value per axis.
///
/// Samples are ephemeral: the sensor produces them continuously, the motion
/// monitor consumes them, and nothing stores them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// When the sensor produced this reading.
    pub timestamp: DateTime<Utc>,
}

impl MotionSample {
    /// Create a sample stamped with the current time.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            timestamp: Utc::now(),
        }
    }

    /// Largest absolute reading across the three axes.
    pub fn peak_axis(&self) -> f64 {
        self.x.abs().max(self.y.abs()).max(self.z.abs())
    }

    /// True iff any axis exceeds the threshold.
    pub fn exceeds(&self, threshold: MotionThreshold) -> bool {
        self.peak_axis() > threshold.value()
    }
}

/// Error for invalid threshold values.
#[derive(Debug, Error, PartialEq)]
pub enum ThresholdError {
    #[error("threshold must be finite, got {0}")]
    NotFinite(f64),

    #[error("threshold must be non-negative, got {0}")]
    Negative(f64),
}

/// Motion detection threshold in sensor units.
///
/// A single shared configuration scalar, read-only after construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MotionThreshold(f64);

impl MotionThreshold {
    /// Validate and wrap a threshold value.
    pub fn new(value: f64) -> Result<Self, ThresholdError> {
        if !value.is_finite() {
            return Err(ThresholdError::NotFinite(value));
        }
        if value < 0.0 {
            return Err(ThresholdError::Negative(value));
        }
        Ok(Self(value))
    }

    /// The threshold value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for MotionThreshold {
    fn default() -> Self {
        Self(1.5)
    }
}

impl std::fmt::Display for MotionThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A qualifying motion event emitted by the monitor.
///
/// One trigger is emitted per qualifying sample; the monitor does not
/// debounce, the recording controller drops triggers that arrive mid-cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Trigger {
    /// The sample that crossed the threshold.
    pub sample: MotionSample,
    /// When the monitor observed the crossing.
    pub detected_at: DateTime<Utc>,
}

impl Trigger {
    pub fn new(sample: MotionSample) -> Self {
        Self {
            sample,
            detected_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_fires_iff_any_axis_exceeds_threshold() {
        let threshold = MotionThreshold::new(1.5).unwrap();

        for (x, y, z, expected) in [
            (0.0, 0.0, 0.0, false),
            (1.5, 0.0, 0.0, false), // boundary: strictly greater
            (1.6, 0.0, 0.0, true),
            (0.0, -2.0, 0.0, true), // absolute value per axis
            (0.0, 0.0, 2.0, true),
            (1.4, 1.4, 1.4, false),
            (-1.51, 0.2, 0.2, true),
        ] {
            let sample = MotionSample::new(x, y, z);
            assert_eq!(
                sample.exceeds(threshold),
                expected,
                "sample ({x}, {y}, {z})"
            );
            assert_eq!(
                sample.peak_axis() > threshold.value(),
                sample.exceeds(threshold)
            );
        }
    }

    #[test]
    fn test_threshold_rejects_invalid_values() {
        assert_eq!(
            MotionThreshold::new(-0.1),
            Err(ThresholdError::Negative(-0.1))
        );
        assert!(matches!(
            MotionThreshold::new(f64::NAN),
            Err(ThresholdError::NotFinite(_))
        ));
        assert!(MotionThreshold::new(0.0).is_ok());
    }
}
