//! Deterministic synthetic devices for development and tests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use mcam_models::{MotionSample, RawAsset};

use crate::device::CaptureDevice;
use crate::error::{CaptureError, CaptureResult};
use crate::monitor::MotionSource;

/// Accelerometer that replays a fixed schedule of samples at a fixed rate.
pub struct SyntheticAccelerometer {
    samples: Vec<MotionSample>,
    next: usize,
    interval: Duration,
    repeating: bool,
}

impl SyntheticAccelerometer {
    /// Replay `samples` once, one every `interval`.
    pub fn new(samples: Vec<MotionSample>, interval: Duration) -> Self {
        Self {
            samples,
            next: 0,
            interval,
            repeating: false,
        }
    }

    /// Replay `samples` forever, wrapping around at the end.
    pub fn repeating(samples: Vec<MotionSample>, interval: Duration) -> Self {
        Self {
            samples,
            next: 0,
            interval,
            repeating: true,
        }
    }
}

#[async_trait]
impl MotionSource for SyntheticAccelerometer {
    async fn next_sample(&mut self) -> Option<MotionSample> {
        if self.next >= self.samples.len() {
            if !self.repeating || self.samples.is_empty() {
                return None;
            }
            self.next = 0;
        }
        tokio::time::sleep(self.interval).await;
        let sample = self.samples[self.next];
        self.next += 1;
        Some(sample)
    }
}

/// File-backed camera device: writes a placeholder container to the
/// destination and reports the write window on the tokio clock as the
/// recorded duration, so paused-time tests get exact durations.
pub struct SyntheticCamera {
    available: bool,
    powered: bool,
    write: Option<(PathBuf, Instant)>,
}

impl SyntheticCamera {
    pub fn new() -> Self {
        Self {
            available: true,
            powered: false,
            write: None,
        }
    }

    /// A camera that fails to acquire, for failure-path tests.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            powered: false,
            write: None,
        }
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureDevice for SyntheticCamera {
    async fn acquire_input(&mut self) -> CaptureResult<()> {
        if !self.available {
            return Err(CaptureError::device_unavailable("no default video device"));
        }
        Ok(())
    }

    async fn attach_sink(&mut self) -> CaptureResult<()> {
        Ok(())
    }

    async fn power_on(&mut self) -> CaptureResult<()> {
        self.powered = true;
        debug!("synthetic camera powered on");
        Ok(())
    }

    async fn power_off(&mut self) {
        self.powered = false;
        debug!("synthetic camera powered off");
    }

    async fn begin_write(&mut self, destination: &Path) -> CaptureResult<()> {
        if !self.powered {
            return Err(CaptureError::recording("camera is not powered on"));
        }
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, b"mcam synthetic capture").await?;
        self.write = Some((destination.to_path_buf(), Instant::now()));
        Ok(())
    }

    async fn finish_write(&mut self) -> CaptureResult<RawAsset> {
        let (path, started) = self
            .write
            .take()
            .ok_or_else(|| CaptureError::recording("no write in flight"))?;
        Ok(RawAsset::new(path, started.elapsed()))
    }
}
