//! Error types for capture operations.

use thiserror::Error;

/// Result type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Errors raised by the sensor and camera capture stages.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("video input device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("failed to attach output sink: {0}")]
    OutputAttach(String),

    #[error("a recording is already in progress")]
    AlreadyRecording,

    #[error("capture session is not configured")]
    NotConfigured,

    #[error("recording failed: {reason}")]
    Recording { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    /// Create a device unavailable error.
    pub fn device_unavailable(message: impl Into<String>) -> Self {
        Self::DeviceUnavailable(message.into())
    }

    /// Create an output attach error.
    pub fn output_attach(message: impl Into<String>) -> Self {
        Self::OutputAttach(message.into())
    }

    /// Create a recording failure with a reason.
    pub fn recording(reason: impl Into<String>) -> Self {
        Self::Recording {
            reason: reason.into(),
        }
    }
}
