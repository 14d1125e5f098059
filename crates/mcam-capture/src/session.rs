//! Capture session owning one input device and one output sink.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use mcam_models::{RawAsset, RecordingToken};

use crate::device::CaptureDevice;
use crate::error::{CaptureError, CaptureResult};

/// Owns the video input and output sink for at most one recording at a time.
pub struct CaptureSession<D: CaptureDevice> {
    device: D,
    configured: bool,
    running: bool,
    active: Option<ActiveRecording>,
}

struct ActiveRecording {
    token: RecordingToken,
    destination: PathBuf,
}

impl<D: CaptureDevice> CaptureSession<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            configured: false,
            running: false,
            active: None,
        }
    }

    /// Acquire the default video input and attach one output sink.
    pub async fn configure(&mut self) -> CaptureResult<()> {
        self.device.acquire_input().await?;
        self.device.attach_sink().await?;
        self.configured = true;
        debug!("capture session configured");
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Start the underlying capture graph. No-op if already running.
    pub async fn begin(&mut self) -> CaptureResult<()> {
        if !self.configured {
            return Err(CaptureError::NotConfigured);
        }
        if self.running {
            debug!("capture graph already running");
            return Ok(());
        }
        self.device.power_on().await?;
        self.running = true;
        Ok(())
    }

    /// Begin writing to `destination` and return a token correlating the
    /// eventual completion.
    ///
    /// At most one recording may be active per session.
    pub async fn start_recording(
        &mut self,
        destination: impl AsRef<Path>,
    ) -> CaptureResult<RecordingToken> {
        if !self.running {
            return Err(CaptureError::NotConfigured);
        }
        if self.active.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }

        let destination = destination.as_ref().to_path_buf();
        self.device.begin_write(&destination).await?;

        let token = RecordingToken::new();
        info!(
            token = %token,
            destination = %destination.display(),
            "recording started"
        );
        self.active = Some(ActiveRecording { token, destination });
        Ok(token)
    }

    /// Request a graceful stop of the recording identified by `token`.
    ///
    /// Returns `Ok(None)` when no matching recording is active, so a second
    /// stop (a deadline firing after a manual stop already landed) is a
    /// no-op. The active slot is released on success and failure alike, so a
    /// failed cycle can always start fresh.
    pub async fn stop_recording(
        &mut self,
        token: RecordingToken,
    ) -> CaptureResult<Option<RawAsset>> {
        let active = match self.active.take() {
            Some(active) if active.token == token => active,
            Some(active) => {
                // Unknown token: leave the in-flight recording untouched.
                warn!(token = %token, "stop requested with stale token");
                self.active = Some(active);
                return Ok(None);
            }
            None => {
                debug!(token = %token, "stop requested with no active recording");
                return Ok(None);
            }
        };

        let asset = self.device.finish_write().await?;
        if asset.is_empty() {
            return Err(CaptureError::recording(format!(
                "empty capture at {}",
                active.destination.display()
            )));
        }

        info!(token = %token, duration = ?asset.duration, "recording finished");
        Ok(Some(asset))
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Stop the graph and release the device so a fresh `configure` can
    /// follow.
    pub async fn release(&mut self) {
        self.active = None;
        if self.running {
            self.device.power_off().await;
            self.running = false;
        }
        self.configured = false;
        debug!("capture session released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Default, Clone)]
    struct Counters {
        power_on: Arc<AtomicUsize>,
        finish: Arc<AtomicUsize>,
    }

    struct TestDevice {
        counters: Counters,
        available: bool,
        sink_ok: bool,
        duration: Duration,
        writing: Option<PathBuf>,
    }

    impl TestDevice {
        fn new(counters: Counters) -> Self {
            Self {
                counters,
                available: true,
                sink_ok: true,
                duration: Duration::from_secs(10),
                writing: None,
            }
        }
    }

    #[async_trait]
    impl CaptureDevice for TestDevice {
        async fn acquire_input(&mut self) -> CaptureResult<()> {
            if self.available {
                Ok(())
            } else {
                Err(CaptureError::device_unavailable("no default device"))
            }
        }

        async fn attach_sink(&mut self) -> CaptureResult<()> {
            if self.sink_ok {
                Ok(())
            } else {
                Err(CaptureError::output_attach("sink rejected"))
            }
        }

        async fn power_on(&mut self) -> CaptureResult<()> {
            self.counters.power_on.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn power_off(&mut self) {}

        async fn begin_write(&mut self, destination: &Path) -> CaptureResult<()> {
            self.writing = Some(destination.to_path_buf());
            Ok(())
        }

        async fn finish_write(&mut self) -> CaptureResult<RawAsset> {
            self.counters.finish.fetch_add(1, Ordering::SeqCst);
            let path = self
                .writing
                .take()
                .ok_or_else(|| CaptureError::recording("no write in flight"))?;
            Ok(RawAsset::new(path, self.duration))
        }
    }

    #[tokio::test]
    async fn test_configure_fails_without_device() {
        let counters = Counters::default();
        let mut device = TestDevice::new(counters);
        device.available = false;

        let mut session = CaptureSession::new(device);
        assert!(matches!(
            session.configure().await,
            Err(CaptureError::DeviceUnavailable(_))
        ));
        assert!(!session.is_configured());
    }

    #[tokio::test]
    async fn test_configure_fails_when_sink_rejected() {
        let counters = Counters::default();
        let mut device = TestDevice::new(counters);
        device.sink_ok = false;

        let mut session = CaptureSession::new(device);
        assert!(matches!(
            session.configure().await,
            Err(CaptureError::OutputAttach(_))
        ));
    }

    #[tokio::test]
    async fn test_begin_is_idempotent() {
        let counters = Counters::default();
        let mut session = CaptureSession::new(TestDevice::new(counters.clone()));
        session.configure().await.unwrap();

        session.begin().await.unwrap();
        session.begin().await.unwrap();
        session.begin().await.unwrap();

        assert_eq!(counters.power_on.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_recording_is_rejected() {
        let counters = Counters::default();
        let mut session = CaptureSession::new(TestDevice::new(counters));
        session.configure().await.unwrap();
        session.begin().await.unwrap();

        let _token = session.start_recording("/tmp/a.mov").await.unwrap();
        assert!(session.is_recording());
        assert!(matches!(
            session.start_recording("/tmp/b.mov").await,
            Err(CaptureError::AlreadyRecording)
        ));
    }

    #[tokio::test]
    async fn test_double_stop_is_a_noop() {
        let counters = Counters::default();
        let mut session = CaptureSession::new(TestDevice::new(counters.clone()));
        session.configure().await.unwrap();
        session.begin().await.unwrap();

        let token = session.start_recording("/tmp/a.mov").await.unwrap();
        let asset = session.stop_recording(token).await.unwrap();
        assert!(asset.is_some());

        // Second stop with the same token must not reach the device again.
        let second = session.stop_recording(token).await.unwrap();
        assert!(second.is_none());
        assert_eq!(counters.finish.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_capture_is_a_recording_error() {
        let counters = Counters::default();
        let mut device = TestDevice::new(counters);
        device.duration = Duration::ZERO;

        let mut session = CaptureSession::new(device);
        session.configure().await.unwrap();
        session.begin().await.unwrap();

        let token = session.start_recording("/tmp/a.mov").await.unwrap();
        assert!(matches!(
            session.stop_recording(token).await,
            Err(CaptureError::Recording { .. })
        ));
        // Failure released the slot.
        assert!(!session.is_recording());
    }
}
