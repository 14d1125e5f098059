//! Overlay stage: composite a still image over a completed export.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use mcam_models::{ExportJob, ExportStatus, FinalArtifact, OverlayRequest};

use crate::backend::MediaBackend;
use crate::error::{MediaError, MediaResult};

/// Composites a validated still over the final frame area of an export.
pub struct OverlayStage {
    backend: Arc<dyn MediaBackend>,
}

impl OverlayStage {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self { backend }
    }

    /// Produce a framed artifact next to the export output.
    ///
    /// Requires the job to be completed with its output present on disk;
    /// anything else is an artifact-not-ready error. The request exists
    /// only for the duration of the compositing and is dropped with it.
    pub async fn attach_overlay(
        &self,
        job: &ExportJob,
        image: &Path,
    ) -> MediaResult<FinalArtifact> {
        if job.status != ExportStatus::Completed {
            return Err(MediaError::ArtifactNotReady(job.output.clone()));
        }
        if !tokio::fs::try_exists(&job.output).await? {
            return Err(MediaError::ArtifactNotReady(job.output.clone()));
        }
        let request = OverlayRequest::new(&job.output, image);
        validate_still(&request.image)?;

        let destination = overlay_destination(&request.target).await?;
        self.backend
            .composite_overlay(&request.target, &request.image, &destination)
            .await?;
        info!(
            id = %job.id,
            artifact = %destination.display(),
            "overlay composited"
        );
        Ok(FinalArtifact::new(destination))
    }
}

/// Check the overlay image decodes to a non-degenerate still.
fn validate_still(image: &Path) -> MediaResult<()> {
    let (width, height) = image::image_dimensions(image)
        .map_err(|err| MediaError::overlay(format!("unreadable overlay image: {err}")))?;
    if width == 0 || height == 0 {
        return Err(MediaError::overlay("overlay image has zero dimensions"));
    }
    Ok(())
}

/// `video.mp4` becomes `video-framed.mp4`, bumping a suffix on collision.
async fn overlay_destination(output: &Path) -> MediaResult<PathBuf> {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| MediaError::overlay("export output has no file name"))?;
    let ext = output
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("mp4");

    let mut candidate = output.with_file_name(format!("{stem}-framed.{ext}"));
    let mut bump = 1u32;
    while tokio::fs::try_exists(&candidate).await? {
        candidate = output.with_file_name(format!("{stem}-framed-{bump}.{ext}"));
        bump += 1;
    }
    Ok(candidate)
}
