//! Time-scaled media compositions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Media track kinds carried by a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Video,
    Audio,
}

impl TrackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Video => "video",
            TrackKind::Audio => "audio",
        }
    }
}

/// A track discovered in a source container by the media backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceTrack {
    pub kind: TrackKind,
    pub duration: Duration,
}

/// Half-open time range `[start, start + duration)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Duration,
    pub duration: Duration,
}

impl TimeRange {
    /// Range starting at zero.
    pub fn from_start(duration: Duration) -> Self {
        Self {
            start: Duration::ZERO,
            duration,
        }
    }

    pub fn end(&self) -> Duration {
        self.start + self.duration
    }
}

/// A source track inserted into a composition with a stretched timeline.
///
/// The content of `source_range` is copied complete and untruncated; only
/// the presentation duration changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionTrack {
    pub kind: TrackKind,
    /// Container the track content is read from.
    pub source: PathBuf,
    /// The copied range of the source track.
    pub source_range: TimeRange,
    /// Presentation duration after the time-scale transform.
    pub scaled_duration: Duration,
}

/// An ordered set of tracks with a target presentation duration.
///
/// Invariant: `duration` equals the source duration multiplied by
/// `scale_factor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub tracks: Vec<CompositionTrack>,
    pub duration: Duration,
    /// The stretch factor applied to the source timeline.
    pub scale_factor: f64,
}

impl Composition {
    /// Build a composition holding a single time-stretched track.
    pub fn single_track(track: CompositionTrack, scale_factor: f64) -> Self {
        let duration = track.scaled_duration;
        Self {
            tracks: vec![track],
            duration,
            scale_factor,
        }
    }

    /// The first track, if any.
    pub fn primary_track(&self) -> Option<&CompositionTrack> {
        self.tracks.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_track_composition_duration() {
        let track = CompositionTrack {
            kind: TrackKind::Video,
            source: PathBuf::from("/tmp/raw.mov"),
            source_range: TimeRange::from_start(Duration::from_secs(10)),
            scaled_duration: Duration::from_secs(20),
        };
        let composition = Composition::single_track(track, 2.0);

        assert_eq!(composition.duration, Duration::from_secs(20));
        assert_eq!(composition.tracks.len(), 1);
        assert_eq!(
            composition.primary_track().map(|t| t.source_range.end()),
            Some(Duration::from_secs(10))
        );
    }
}
