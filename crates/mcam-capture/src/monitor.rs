//! Motion monitoring: continuous sampling against a threshold.

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use mcam_models::{MotionSample, MotionThreshold, Trigger};

/// Continuous motion sample feed.
///
/// Returning `None` ends the stream (sensor detached).
#[async_trait]
pub trait MotionSource: Send + 'static {
    async fn next_sample(&mut self) -> Option<MotionSample>;
}

/// Watches a motion source and emits a trigger for every sample that
/// exceeds the threshold on any axis.
///
/// There is deliberately no debouncing: a burst of qualifying samples
/// produces a burst of triggers, and the recording controller drops the
/// ones that arrive mid-cycle.
pub struct MotionMonitor {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl MotionMonitor {
    /// Begin sampling. Each qualifying sample sends one [`Trigger`] on
    /// `triggers`; sampling ends when the source runs dry, the receiver is
    /// dropped, or [`stop`](Self::stop) is called.
    pub fn start<S>(
        mut source: S,
        threshold: MotionThreshold,
        triggers: mpsc::Sender<Trigger>,
    ) -> Self
    where
        S: MotionSource,
    {
        let (stop, mut stop_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            debug!("motion monitor stopped");
                            break;
                        }
                    }
                    sample = source.next_sample() => {
                        let Some(sample) = sample else {
                            debug!("motion source ended");
                            break;
                        };
                        trace!(x = sample.x, y = sample.y, z = sample.z, "motion sample");
                        if sample.exceeds(threshold) {
                            debug!(
                                peak = sample.peak_axis(),
                                threshold = threshold.value(),
                                "motion trigger"
                            );
                            if triggers.send(Trigger::new(sample)).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        });

        Self { stop, task }
    }

    /// Halt sampling. Once this returns, no further trigger is ever sent.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}
