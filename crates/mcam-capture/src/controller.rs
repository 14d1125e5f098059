//! Bounded-duration recording orchestration.
//!
//! The controller is an owned event-loop object: it holds its session,
//! deadline bound, and work directory as fields and runs one recording
//! cycle at a time through `Idle → Armed → Recording → Finalizing → Idle`.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use mcam_models::{RawAsset, Trigger};

use crate::device::CaptureDevice;
use crate::error::{CaptureError, CaptureResult};
use crate::session::CaptureSession;

/// Controller states across one recording cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    /// Waiting for a trigger
    #[default]
    Idle,
    /// Trigger accepted, capture starting
    Armed,
    /// Writing to the destination, deadline armed
    Recording,
    /// Stop issued, waiting for the asset or an error
    Finalizing,
}

impl ControllerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerState::Idle => "idle",
            ControllerState::Armed => "armed",
            ControllerState::Recording => "recording",
            ControllerState::Finalizing => "finalizing",
        }
    }
}

/// Events emitted as a cycle progresses. Every event names the cycle it
/// belongs to, including failures that never started writing.
#[derive(Debug)]
pub enum CycleEvent {
    /// Capture started writing to the destination.
    RecordingStarted { cycle: u64, destination: PathBuf },
    /// A raw asset is ready for the transform stage.
    AssetReady { cycle: u64, asset: RawAsset },
    /// The cycle aborted; the controller is idle again.
    CycleFailed { cycle: u64, error: CaptureError },
}

/// Why a recording stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopCause {
    Deadline,
    Manual,
}

/// Cloneable handle for external stops and state observation.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    stops: mpsc::Sender<()>,
    state: watch::Receiver<ControllerState>,
}

impl ControllerHandle {
    /// Request an early stop of the in-flight recording.
    ///
    /// Safe to call at any time; a stop with no recording in flight is
    /// dropped.
    pub async fn stop_recording(&self) {
        let _ = self.stops.send(()).await;
    }

    /// Current controller state.
    pub fn state(&self) -> ControllerState {
        *self.state.borrow()
    }
}

/// Orchestrates bounded-duration recordings: at most one cycle at a time,
/// exactly one deadline timer per cycle.
pub struct RecordingController<D: CaptureDevice> {
    session: CaptureSession<D>,
    record_bound: Duration,
    work_dir: PathBuf,
    triggers: mpsc::Receiver<Trigger>,
    stops: mpsc::Receiver<()>,
    events: mpsc::Sender<CycleEvent>,
    state: watch::Sender<ControllerState>,
    cycle: u64,
}

impl<D: CaptureDevice> RecordingController<D> {
    pub fn new(
        session: CaptureSession<D>,
        record_bound: Duration,
        work_dir: impl Into<PathBuf>,
        triggers: mpsc::Receiver<Trigger>,
        events: mpsc::Sender<CycleEvent>,
    ) -> (Self, ControllerHandle) {
        let (stop_tx, stop_rx) = mpsc::channel(1);
        let (state_tx, state_rx) = watch::channel(ControllerState::Idle);
        let controller = Self {
            session,
            record_bound,
            work_dir: work_dir.into(),
            triggers,
            stops: stop_rx,
            events,
            state: state_tx,
            cycle: 0,
        };
        let handle = ControllerHandle {
            stops: stop_tx,
            state: state_rx,
        };
        (controller, handle)
    }

    /// Run cycles until the trigger channel closes.
    pub async fn run(mut self) {
        while let Some(trigger) = self.next_idle_trigger().await {
            self.run_cycle(trigger).await;
        }
        self.session.release().await;
        debug!("recording controller stopped");
    }

    /// Wait for the next trigger while idle.
    ///
    /// Triggers and stop requests queued while the previous cycle ran are
    /// dropped first: a trigger arriving while not idle never starts a
    /// cycle, and a stale stop must not cut the next recording short.
    async fn next_idle_trigger(&mut self) -> Option<Trigger> {
        while self.stops.try_recv().is_ok() {
            debug!("dropping stale stop request");
        }
        while let Ok(trigger) = self.triggers.try_recv() {
            debug!(
                peak = trigger.sample.peak_axis(),
                "dropping trigger that arrived mid-cycle"
            );
        }
        self.triggers.recv().await
    }

    fn set_state(&self, state: ControllerState) {
        let _ = self.state.send(state);
    }

    async fn run_cycle(&mut self, trigger: Trigger) {
        self.cycle += 1;
        self.set_state(ControllerState::Armed);
        info!(
            cycle = self.cycle,
            peak = trigger.sample.peak_axis(),
            "trigger accepted, arming recording"
        );

        match self.record_once().await {
            Ok(asset) => {
                info!(
                    cycle = self.cycle,
                    duration = ?asset.duration,
                    location = %asset.location.display(),
                    "cycle produced raw asset"
                );
                let _ = self
                    .events
                    .send(CycleEvent::AssetReady {
                        cycle: self.cycle,
                        asset,
                    })
                    .await;
            }
            Err(err) => {
                warn!(cycle = self.cycle, error = %err, "recording cycle failed");
                // A failed cycle fully releases the capture handle before
                // the controller goes idle again.
                self.session.release().await;
                let _ = self
                    .events
                    .send(CycleEvent::CycleFailed {
                        cycle: self.cycle,
                        error: err,
                    })
                    .await;
            }
        }

        self.set_state(ControllerState::Idle);
    }

    async fn record_once(&mut self) -> CaptureResult<RawAsset> {
        if !self.session.is_configured() {
            self.session.configure().await?;
        }
        self.session.begin().await?;

        let destination = self.next_destination().await?;
        let token = self.session.start_recording(&destination).await?;
        let _ = self
            .events
            .send(CycleEvent::RecordingStarted {
                cycle: self.cycle,
                destination: destination.clone(),
            })
            .await;
        self.set_state(ControllerState::Recording);

        // Exactly one deadline timer per cycle. The select drops whichever
        // future loses, so a deadline firing after a manual stop already
        // landed can never issue a second stop.
        let deadline = tokio::time::sleep(self.record_bound);
        tokio::pin!(deadline);
        let cause = tokio::select! {
            _ = &mut deadline => StopCause::Deadline,
            _ = manual_stop(&mut self.stops) => StopCause::Manual,
        };
        debug!(cycle = self.cycle, ?cause, "stopping recording");

        self.set_state(ControllerState::Finalizing);
        let asset = self
            .session
            .stop_recording(token)
            .await?
            .ok_or_else(|| CaptureError::recording("recording finished with no asset"))?;
        Ok(asset)
    }

    /// Pick a fresh per-cycle directory under the work dir, bumping a
    /// suffix on collision.
    async fn next_destination(&mut self) -> CaptureResult<PathBuf> {
        let stamp = chrono::Utc::now().format("%Y%m%d-%H%M%S");
        let mut dir = self.work_dir.join(format!("cycle-{stamp}-{:04}", self.cycle));
        let mut bump = 0u32;
        while tokio::fs::try_exists(&dir).await? {
            bump += 1;
            dir = self
                .work_dir
                .join(format!("cycle-{stamp}-{:04}-{bump}", self.cycle));
        }
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir.join("raw.mov"))
    }
}

/// Resolve when a manual stop arrives; pend forever once all handles are
/// gone so a closed channel is not mistaken for a stop.
async fn manual_stop(stops: &mut mpsc::Receiver<()>) {
    if stops.recv().await.is_none() {
        std::future::pending::<()>().await;
    }
}
