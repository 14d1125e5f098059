//! Recording artifacts and correlation tokens.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlates a `start_recording` call with its eventual completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordingToken(Uuid);

impl RecordingToken {
    /// Generate a fresh token.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RecordingToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A finished raw recording on disk.
///
/// Owned by the recording controller until handed to the time transform;
/// read-only once the recording finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAsset {
    /// Container file the capture was written to.
    pub location: PathBuf,
    /// Recorded duration.
    pub duration: Duration,
}

impl RawAsset {
    pub fn new(location: impl Into<PathBuf>, duration: Duration) -> Self {
        Self {
            location: location.into(),
            duration,
        }
    }

    /// Zero-duration captures are treated as recording failures upstream.
    pub fn is_empty(&self) -> bool {
        self.duration.is_zero()
    }
}

/// A request to composite a still image onto an exported artifact.
///
/// Created only once the export reached `Completed`; discarded when the
/// overlay stage finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayRequest {
    /// The exported artifact to composite onto.
    pub target: PathBuf,
    /// The user-supplied still image.
    pub image: PathBuf,
}

impl OverlayRequest {
    pub fn new(target: impl Into<PathBuf>, image: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            image: image.into(),
        }
    }
}

/// Terminal entity of the pipeline; immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalArtifact {
    location: PathBuf,
}

impl FinalArtifact {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
        }
    }

    pub fn location(&self) -> &Path {
        &self.location
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_raw_asset() {
        let asset = RawAsset::new("/tmp/raw.mov", Duration::ZERO);
        assert!(asset.is_empty());

        let asset = RawAsset::new("/tmp/raw.mov", Duration::from_secs(10));
        assert!(!asset.is_empty());
    }

    #[test]
    fn test_recording_tokens_are_unique() {
        assert_ne!(RecordingToken::new(), RecordingToken::new());
    }
}
