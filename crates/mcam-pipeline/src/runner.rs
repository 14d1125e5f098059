//! End-to-end pipeline wiring: motion sampling through framed artifact.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use mcam_capture::{
    CaptureDevice, CaptureSession, ControllerHandle, CycleEvent, MotionMonitor, MotionSource,
    RecordingController,
};
use mcam_media::{ExportPipeline, MediaBackend, OverlayStage, TimeTransformEngine};
use mcam_models::{
    ExportJob, ExportStatus, FinalArtifact, MotionThreshold, RawAsset,
};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::logging::CycleLogger;

/// Pipeline stages, for failure reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Recording,
    Transform,
    Export,
    Overlay,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Recording => "recording",
            Stage::Transform => "transform",
            Stage::Export => "export",
            Stage::Overlay => "overlay",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Events surfaced to the pipeline consumer.
#[derive(Debug)]
pub enum PipelineEvent {
    /// A recording cycle started writing raw footage.
    RecordingStarted { destination: std::path::PathBuf },
    /// A cycle finished with its export in a terminal status.
    Exported(ExportJob),
    /// A cycle aborted at the named stage.
    CycleFailed { stage: Stage, reason: String },
}

/// Running capture pipeline.
///
/// Owns the motion monitor, the recording controller task, and the driver
/// task that pushes each raw asset through transform and export.
pub struct CapturePipeline {
    monitor: MotionMonitor,
    controller: ControllerHandle,
    controller_task: JoinHandle<()>,
    driver_task: JoinHandle<()>,
    overlay: OverlayStage,
}

impl CapturePipeline {
    /// Wire up and start the pipeline.
    ///
    /// Returns the pipeline and the event stream; dropping the receiver
    /// does not stop capture, only [`shutdown`](Self::shutdown) does.
    pub fn start<S, D>(
        config: PipelineConfig,
        source: S,
        device: D,
        backend: Arc<dyn MediaBackend>,
    ) -> PipelineResult<(Self, mpsc::Receiver<PipelineEvent>)>
    where
        S: MotionSource,
        D: CaptureDevice + 'static,
    {
        let threshold = MotionThreshold::new(config.motion_threshold)
            .map_err(|err| PipelineError::config(err.to_string()))?;

        let (trigger_tx, trigger_rx) = mpsc::channel(config.trigger_capacity);
        let (cycle_tx, cycle_rx) = mpsc::channel(config.trigger_capacity);
        let (event_tx, event_rx) = mpsc::channel(config.trigger_capacity);

        let monitor = MotionMonitor::start(source, threshold, trigger_tx);
        let (controller, handle) = RecordingController::new(
            CaptureSession::new(device),
            config.record_duration,
            &config.work_dir,
            trigger_rx,
            cycle_tx,
        );
        let controller_task = tokio::spawn(controller.run());

        let driver = Driver {
            transform: TimeTransformEngine::new(Arc::clone(&backend)),
            export: ExportPipeline::new(Arc::clone(&backend)),
            config: config.clone(),
            events: event_tx,
        };
        let driver_task = tokio::spawn(driver.run(cycle_rx));

        info!(
            threshold = config.motion_threshold,
            record_secs = config.record_duration.as_secs(),
            scale = config.scale_factor,
            work_dir = %config.work_dir.display(),
            "capture pipeline started"
        );

        Ok((
            Self {
                monitor,
                controller: handle,
                controller_task,
                driver_task,
                overlay: OverlayStage::new(backend),
            },
            event_rx,
        ))
    }

    /// Stop the in-flight recording early, if any.
    pub async fn stop_recording(&self) {
        self.controller.stop_recording().await;
    }

    /// Composite a still over a completed export.
    pub async fn attach_overlay(
        &self,
        job: &ExportJob,
        image: &Path,
    ) -> PipelineResult<FinalArtifact> {
        Ok(self.overlay.attach_overlay(job, image).await?)
    }

    /// Stop sampling, finish the in-flight cycle, and drain the stages.
    pub async fn shutdown(self) {
        self.monitor.stop().await;
        // The trigger channel is now closed; the controller finishes its
        // current cycle and exits, which closes the cycle channel and lets
        // the driver drain.
        let _ = self.controller_task.await;
        let _ = self.driver_task.await;
        info!("capture pipeline stopped");
    }
}

struct Driver {
    transform: TimeTransformEngine,
    export: ExportPipeline,
    config: PipelineConfig,
    events: mpsc::Sender<PipelineEvent>,
}

impl Driver {
    async fn run(self, mut cycles: mpsc::Receiver<CycleEvent>) {
        while let Some(event) = cycles.recv().await {
            match event {
                CycleEvent::RecordingStarted { cycle, destination } => {
                    CycleLogger::new(cycle, "recording").log_start("recording started");
                    let _ = self
                        .events
                        .send(PipelineEvent::RecordingStarted { destination })
                        .await;
                }
                CycleEvent::AssetReady { cycle, asset } => {
                    let logger = CycleLogger::new(cycle, "transform");
                    match self.run_post_capture(&asset, &logger).await {
                        Ok(job) => {
                            let _ = self.events.send(PipelineEvent::Exported(job)).await;
                        }
                        Err((stage, err)) => {
                            logger.stage(stage.as_str()).log_error(&err.to_string());
                            let _ = self
                                .events
                                .send(PipelineEvent::CycleFailed {
                                    stage,
                                    reason: err.to_string(),
                                })
                                .await;
                        }
                    }
                }
                CycleEvent::CycleFailed { cycle, error } => {
                    CycleLogger::new(cycle, "recording").log_warning(&error.to_string());
                    let _ = self
                        .events
                        .send(PipelineEvent::CycleFailed {
                            stage: Stage::Recording,
                            reason: error.to_string(),
                        })
                        .await;
                }
            }
        }
    }

    async fn run_post_capture(
        &self,
        asset: &RawAsset,
        logger: &CycleLogger,
    ) -> Result<ExportJob, (Stage, PipelineError)> {
        logger.log_start("building time-scaled composition");
        let composition = self
            .transform
            .transform(asset, self.config.scale_factor)
            .await
            .map_err(|err| (Stage::Transform, err.into()))?;

        let output = asset
            .location
            .with_file_name(format!("edited.{}", self.config.export_format.extension()));
        logger.stage("export").log_progress("export running");
        let handle = self
            .export
            .export(composition, &output, self.config.export_format);
        let job = handle
            .outcome()
            .await
            .map_err(|err| (Stage::Export, err.into()))?;

        match job.status {
            ExportStatus::Completed => {
                logger.stage("export").log_progress("export completed");
                Ok(job)
            }
            ExportStatus::Cancelled => Err((
                Stage::Export,
                PipelineError::Media(mcam_media::MediaError::Cancelled),
            )),
            _ => {
                let reason = job
                    .error
                    .clone()
                    .unwrap_or_else(|| "export failed".to_string());
                Err((
                    Stage::Export,
                    PipelineError::Media(mcam_media::MediaError::ExportFailed { reason }),
                ))
            }
        }
    }
}
