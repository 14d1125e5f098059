use std::path::Path;

use async_trait::async_trait;
use tokio::sync::watch;

use mcam_models::{Composition, ExportFormat, SourceTrack};

use crate::error::MediaResult;

/// Rendering and probing operations the media stages run against.
///
/// The shipped implementation shells out to ffmpeg; tests swap in fakes.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// List the tracks of a media file.
    async fn probe_tracks(&self, source: &Path) -> MediaResult<Vec<SourceTrack>>;

    /// Render a composition to `output`. Must observe `cancel` and stop
    /// promptly once it flips to true, returning [`MediaError::Cancelled`].
    async fn render(
        &self,
        composition: &Composition,
        output: &Path,
        format: ExportFormat,
        cancel: watch::Receiver<bool>,
    ) -> MediaResult<()>;

    /// Composite a still image centered over a video.
    async fn composite_overlay(
        &self,
        video: &Path,
        image: &Path,
        output: &Path,
    ) -> MediaResult<()>;
}

/// Resolve once the cancel flag flips to true. Pends forever if the
/// sender is dropped without cancelling, so callers can select on it.
pub(crate) async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
