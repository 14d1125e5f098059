//! End-to-end pipeline runs against synthetic devices and an in-memory
//! media backend, on the paused tokio clock.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use mcam_capture::{CaptureDevice, CaptureError, CaptureResult, SyntheticAccelerometer, SyntheticCamera};
use mcam_media::{backend::MediaBackend, MediaError};
use mcam_models::{
    Composition, ExportFormat, ExportJob, ExportStatus, MotionSample, RawAsset, SourceTrack,
    TrackKind,
};
use mcam_pipeline::{CapturePipeline, PipelineConfig, PipelineError, PipelineEvent, Stage};

/// Backend that copies bytes around instead of encoding.
struct FakeBackend {
    probes: AtomicUsize,
    renders: AtomicUsize,
}

impl FakeBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            probes: AtomicUsize::new(0),
            renders: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl MediaBackend for FakeBackend {
    async fn probe_tracks(&self, _source: &Path) -> Result<Vec<SourceTrack>, MediaError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(vec![SourceTrack {
            kind: TrackKind::Video,
            duration: Duration::from_secs(10),
        }])
    }

    async fn render(
        &self,
        composition: &Composition,
        output: &Path,
        _format: ExportFormat,
        _cancel: watch::Receiver<bool>,
    ) -> Result<(), MediaError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        tokio::fs::write(output, format!("rendered {:?}", composition.duration)).await?;
        Ok(())
    }

    async fn composite_overlay(
        &self,
        video: &Path,
        _image: &Path,
        output: &Path,
    ) -> Result<(), MediaError> {
        let bytes = tokio::fs::read(video).await?;
        tokio::fs::write(output, bytes).await?;
        Ok(())
    }
}

fn config(work_dir: &Path) -> PipelineConfig {
    PipelineConfig {
        work_dir: work_dir.to_path_buf(),
        ..PipelineConfig::default()
    }
}

/// Quiet samples with spikes at the given indices, 100ms apart.
fn sample_schedule(len: usize, spikes: &[usize]) -> Vec<MotionSample> {
    (0..len)
        .map(|i| {
            if spikes.contains(&i) {
                MotionSample::new(3.0, 0.0, 0.0)
            } else {
                MotionSample::new(0.0, 0.0, 0.2)
            }
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_full_cycle_from_spike_to_framed_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::new();
    let source = SyntheticAccelerometer::new(
        sample_schedule(5, &[1]),
        Duration::from_millis(100),
    );

    let (pipeline, mut events) = CapturePipeline::start(
        config(dir.path()),
        source,
        SyntheticCamera::new(),
        backend.clone(),
    )
    .unwrap();

    match events.recv().await.unwrap() {
        PipelineEvent::RecordingStarted { destination } => {
            assert!(destination.starts_with(dir.path()));
            assert_eq!(destination.file_name().unwrap(), "raw.mov");
        }
        other => panic!("expected RecordingStarted, got {other:?}"),
    }

    let job = match events.recv().await.unwrap() {
        PipelineEvent::Exported(job) => job,
        other => panic!("expected Exported, got {other:?}"),
    };
    assert_eq!(job.status, ExportStatus::Completed);
    assert_eq!(job.output.file_name().unwrap(), "edited.mp4");
    assert!(job.output.exists());
    // Ten seconds of capture stretched to twenty.
    assert_eq!(job.composition.duration, Duration::from_secs(20));
    assert_eq!(job.composition.scale_factor, 2.0);
    assert_eq!(backend.renders.load(Ordering::SeqCst), 1);

    let image = write_png(dir.path());
    let artifact = pipeline.attach_overlay(&job, &image).await.unwrap();
    assert_eq!(
        artifact.location().file_name().unwrap(),
        "edited-framed.mp4"
    );
    assert!(artifact.location().exists());

    pipeline.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_second_spike_after_cycle_starts_new_recording() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::new();
    // Spike at t=0.2s; recording runs to t=10.2s; a burst of spikes lands
    // mid-recording and must be dropped; the spike at t=13s starts cycle
    // two.
    let source = SyntheticAccelerometer::new(
        sample_schedule(140, &[1, 30, 31, 32, 129]),
        Duration::from_millis(100),
    );

    let (pipeline, mut events) = CapturePipeline::start(
        config(dir.path()),
        source,
        SyntheticCamera::new(),
        backend.clone(),
    )
    .unwrap();

    let mut destinations = Vec::new();
    let mut exports = 0;
    while let Some(event) = events.recv().await {
        match event {
            PipelineEvent::RecordingStarted { destination } => destinations.push(destination),
            PipelineEvent::Exported(job) => {
                assert_eq!(job.status, ExportStatus::Completed);
                exports += 1;
                if exports == 2 {
                    break;
                }
            }
            PipelineEvent::CycleFailed { stage, reason } => {
                panic!("cycle failed at {stage}: {reason}")
            }
        }
    }

    // Two cycles, two distinct destinations; the mid-recording burst never
    // became a cycle.
    assert_eq!(destinations.len(), 2);
    assert_ne!(destinations[0], destinations[1]);
    assert_eq!(backend.renders.load(Ordering::SeqCst), 2);

    pipeline.shutdown().await;
}

/// Device that dies when the recording is finalized.
struct BrokenCamera;

#[async_trait]
impl CaptureDevice for BrokenCamera {
    async fn acquire_input(&mut self) -> CaptureResult<()> {
        Ok(())
    }

    async fn attach_sink(&mut self) -> CaptureResult<()> {
        Ok(())
    }

    async fn power_on(&mut self) -> CaptureResult<()> {
        Ok(())
    }

    async fn power_off(&mut self) {}

    async fn begin_write(&mut self, _destination: &Path) -> CaptureResult<()> {
        Ok(())
    }

    async fn finish_write(&mut self) -> CaptureResult<RawAsset> {
        Err(CaptureError::recording("sensor disconnected"))
    }
}

#[tokio::test(start_paused = true)]
async fn test_capture_failure_surfaces_without_reaching_transform() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::new();
    let source = SyntheticAccelerometer::new(
        sample_schedule(5, &[1]),
        Duration::from_millis(100),
    );

    let (pipeline, mut events) = CapturePipeline::start(
        config(dir.path()),
        source,
        BrokenCamera,
        backend.clone(),
    )
    .unwrap();

    let _ = events.recv().await.unwrap(); // RecordingStarted

    match events.recv().await.unwrap() {
        PipelineEvent::CycleFailed { stage, reason } => {
            assert_eq!(stage, Stage::Recording);
            assert!(reason.contains("sensor disconnected"));
        }
        other => panic!("expected CycleFailed, got {other:?}"),
    }
    // The media stages never saw the failed cycle.
    assert_eq!(backend.probes.load(Ordering::SeqCst), 0);
    assert_eq!(backend.renders.load(Ordering::SeqCst), 0);

    pipeline.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_overlay_rejects_job_that_never_completed() {
    let dir = tempfile::tempdir().unwrap();
    let backend = FakeBackend::new();
    let source = SyntheticAccelerometer::new(Vec::new(), Duration::from_millis(100));

    let (pipeline, _events) = CapturePipeline::start(
        config(dir.path()),
        source,
        SyntheticCamera::new(),
        backend,
    )
    .unwrap();

    let track = mcam_models::CompositionTrack {
        kind: TrackKind::Video,
        source: dir.path().join("raw.mov"),
        source_range: mcam_models::TimeRange::from_start(Duration::from_secs(10)),
        scaled_duration: Duration::from_secs(20),
    };
    let mut job = ExportJob::new(
        Composition::single_track(track, 2.0),
        dir.path().join("edited.mp4"),
        ExportFormat::Mp4,
    );
    job.start();
    job.cancel();

    let image = write_png(dir.path());
    match pipeline.attach_overlay(&job, &image).await {
        Err(PipelineError::Media(MediaError::ArtifactNotReady(path))) => {
            assert_eq!(path, job.output)
        }
        other => panic!("expected ArtifactNotReady, got {other:?}"),
    }

    pipeline.shutdown().await;
}

fn write_png(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("frame.png");
    let still = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 0, 0, 255]));
    still.save(&path).unwrap();
    path
}
