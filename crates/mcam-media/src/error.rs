use std::path::PathBuf;
use thiserror::Error;

pub type MediaResult<T> = Result<T, MediaError>;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("no video track in {0}")]
    NoVideoTrack(PathBuf),

    #[error("probe failed: {0}")]
    Probe(String),

    #[error("composition error: {0}")]
    Composition(String),

    #[error("destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("export failed: {reason}")]
    ExportFailed { reason: String },

    #[error("artifact not ready: {0}")]
    ArtifactNotReady(PathBuf),

    #[error("overlay error: {0}")]
    Overlay(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("ffmpeg binary not found in PATH")]
    FfmpegNotFound,

    #[error("ffprobe binary not found in PATH")]
    FfprobeNotFound,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("probe output parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition(msg.into())
    }

    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    pub fn export_failed(reason: impl Into<String>) -> Self {
        Self::ExportFailed {
            reason: reason.into(),
        }
    }

    pub fn overlay(msg: impl Into<String>) -> Self {
        Self::Overlay(msg.into())
    }
}
