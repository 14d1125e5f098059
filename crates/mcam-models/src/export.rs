//! Export jobs and their status state machine.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::composition::Composition;

/// Unique identifier for an export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportId(Uuid);

impl ExportId {
    /// Generate a new random export ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ExportId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ExportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output container formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Mp4,
    Mov,
    Matroska,
}

impl ExportFormat {
    /// File extension for this container.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Mp4 => "mp4",
            ExportFormat::Mov => "mov",
            ExportFormat::Matroska => "mkv",
        }
    }

    /// Muxer name understood by the media backend.
    pub fn muxer(&self) -> &'static str {
        match self {
            ExportFormat::Mp4 => "mp4",
            ExportFormat::Mov => "mov",
            ExportFormat::Matroska => "matroska",
        }
    }

    /// Parse a format name ("mp4", "mov", "mkv"/"matroska").
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mp4" => Some(ExportFormat::Mp4),
            "mov" => Some(ExportFormat::Mov),
            "mkv" | "matroska" => Some(ExportFormat::Matroska),
            _ => None,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Export job status.
///
/// Transitions are monotonic: once a terminal status is reached the job
/// never moves again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    /// Job created, render not started
    #[default]
    Pending,
    /// Render in progress
    Running,
    /// Output file complete and closed for writing
    Completed,
    /// Render failed; partial output removed
    Failed,
    /// Cancelled before completion
    Cancelled,
}

impl ExportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportStatus::Pending => "pending",
            ExportStatus::Running => "running",
            ExportStatus::Completed => "completed",
            ExportStatus::Failed => "failed",
            ExportStatus::Cancelled => "cancelled",
        }
    }

    /// Check if this is a terminal status (no more transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExportStatus::Completed | ExportStatus::Failed | ExportStatus::Cancelled
        )
    }
}

impl fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An export of a composition to an output container.
///
/// Owned exclusively by the export pipeline for its lifetime; handed back
/// to the caller once a terminal status is reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    pub id: ExportId,
    pub composition: Composition,
    pub output: PathBuf,
    pub format: ExportFormat,
    pub status: ExportStatus,
    /// Failure reason when status is `Failed`.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ExportJob {
    /// Create a pending job.
    pub fn new(composition: Composition, output: impl Into<PathBuf>, format: ExportFormat) -> Self {
        let now = Utc::now();
        Self {
            id: ExportId::new(),
            composition,
            output: output.into(),
            format,
            status: ExportStatus::Pending,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `next` unless the job already reached a terminal status.
    ///
    /// Returns whether the transition was applied.
    fn advance(&mut self, next: ExportStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = next;
        self.updated_at = Utc::now();
        true
    }

    /// Mark the render as running.
    pub fn start(&mut self) -> bool {
        self.advance(ExportStatus::Running)
    }

    /// Mark the job completed.
    pub fn complete(&mut self) -> bool {
        self.advance(ExportStatus::Completed)
    }

    /// Mark the job failed with a reason.
    pub fn fail(&mut self, reason: impl Into<String>) -> bool {
        if self.advance(ExportStatus::Failed) {
            self.error = Some(reason.into());
            true
        } else {
            false
        }
    }

    /// Mark the job cancelled.
    pub fn cancel(&mut self) -> bool {
        self.advance(ExportStatus::Cancelled)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composition::{CompositionTrack, TimeRange, TrackKind};
    use std::time::Duration;

    fn job() -> ExportJob {
        let track = CompositionTrack {
            kind: TrackKind::Video,
            source: PathBuf::from("/tmp/raw.mov"),
            source_range: TimeRange::from_start(Duration::from_secs(10)),
            scaled_duration: Duration::from_secs(20),
        };
        ExportJob::new(
            Composition::single_track(track, 2.0),
            "/tmp/edited.mp4",
            ExportFormat::Mp4,
        )
    }

    #[test]
    fn test_status_transitions_are_monotonic() {
        let mut job = job();
        assert_eq!(job.status, ExportStatus::Pending);

        assert!(job.start());
        assert_eq!(job.status, ExportStatus::Running);

        assert!(job.complete());
        assert!(job.is_terminal());

        // No regression out of a terminal status.
        assert!(!job.start());
        assert!(!job.fail("too late"));
        assert!(!job.cancel());
        assert_eq!(job.status, ExportStatus::Completed);
        assert!(job.error.is_none());
    }

    #[test]
    fn test_failed_job_records_reason() {
        let mut job = job();
        job.start();
        assert!(job.fail("disk full"));
        assert_eq!(job.status, ExportStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("disk full"));

        assert!(!job.complete());
        assert_eq!(job.status, ExportStatus::Failed);
    }

    #[test]
    fn test_cancel_is_terminal() {
        let mut job = job();
        assert!(job.cancel());
        assert!(job.is_terminal());
        assert!(!job.complete());
    }

    #[test]
    fn test_format_names() {
        assert_eq!(ExportFormat::from_name("MP4"), Some(ExportFormat::Mp4));
        assert_eq!(ExportFormat::from_name("mkv"), Some(ExportFormat::Matroska));
        assert_eq!(ExportFormat::from_name("webm"), None);
        assert_eq!(ExportFormat::Matroska.extension(), "mkv");
        assert_eq!(ExportFormat::Matroska.muxer(), "matroska");
    }
}
