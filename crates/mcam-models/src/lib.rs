//! Shared data models for the motion-capture pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Motion samples, thresholds, and triggers
//! - Recording artifacts and correlation tokens
//! - Time-scaled media compositions
//! - Export jobs and their status state machine

pub mod asset;
pub mod composition;
pub mod export;
pub mod motion;

// Re-export common types
pub use asset::{FinalArtifact, OverlayRequest, RawAsset, RecordingToken};
pub use composition::{Composition, CompositionTrack, SourceTrack, TimeRange, TrackKind};
pub use export::{ExportFormat, ExportId, ExportJob, ExportStatus};
pub use motion::{MotionSample, MotionThreshold, ThresholdError, Trigger};
