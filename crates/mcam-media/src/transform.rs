//! Time-scale transform: raw asset in, stretched composition out.

use std::sync::Arc;

use tracing::info;

use mcam_models::{Composition, CompositionTrack, RawAsset, TimeRange, TrackKind};

use crate::backend::MediaBackend;
use crate::error::{MediaError, MediaResult};

/// Builds a slowed-down composition from a raw capture.
///
/// The whole source range is inserted untruncated and its presentation
/// duration stretched by the scale factor. Content and frame count never
/// change, only timing.
pub struct TimeTransformEngine {
    backend: Arc<dyn MediaBackend>,
}

impl TimeTransformEngine {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self { backend }
    }

    pub async fn transform(&self, asset: &RawAsset, scale: f64) -> MediaResult<Composition> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(MediaError::composition(format!(
                "scale factor must be finite and positive, got {scale}"
            )));
        }
        if asset.is_empty() {
            return Err(MediaError::composition("raw asset has zero duration"));
        }
        if !tokio::fs::try_exists(&asset.location).await? {
            return Err(MediaError::FileNotFound(asset.location.clone()));
        }

        let tracks = self.backend.probe_tracks(&asset.location).await?;
        if !tracks.iter().any(|t| t.kind == TrackKind::Video) {
            return Err(MediaError::NoVideoTrack(asset.location.clone()));
        }

        let track = CompositionTrack {
            kind: TrackKind::Video,
            source: asset.location.clone(),
            source_range: TimeRange::from_start(asset.duration),
            scaled_duration: asset.duration.mul_f64(scale),
        };
        let composition = Composition::single_track(track, scale);
        info!(
            source = %asset.location.display(),
            source_duration = ?asset.duration,
            scaled_duration = ?composition.duration,
            scale,
            "built time-scaled composition"
        );
        Ok(composition)
    }
}
