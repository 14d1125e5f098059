//! Capture device capability interface.

use std::path::Path;

use async_trait::async_trait;

use mcam_models::RawAsset;

use crate::error::CaptureResult;

/// Abstract video capture device.
///
/// Physical drivers live behind this trait; the session only sequences
/// acquire/attach/run/write calls on it. Implementations report failures
/// with `DeviceUnavailable`, `OutputAttach`, or `Recording` errors.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Acquire the default video input.
    async fn acquire_input(&mut self) -> CaptureResult<()>;

    /// Attach the movie file output sink.
    async fn attach_sink(&mut self) -> CaptureResult<()>;

    /// Start the underlying capture graph.
    async fn power_on(&mut self) -> CaptureResult<()>;

    /// Stop the graph and release input and sink.
    async fn power_off(&mut self);

    /// Begin writing captured frames to `destination`.
    async fn begin_write(&mut self, destination: &Path) -> CaptureResult<()>;

    /// Gracefully finish the in-flight write and return the recorded file.
    async fn finish_write(&mut self) -> CaptureResult<RawAsset>;
}
