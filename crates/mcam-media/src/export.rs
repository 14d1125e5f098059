//! Background export of compositions with cancellation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{oneshot, watch, Mutex};
use tracing::{debug, info, warn};

use mcam_models::{Composition, ExportFormat, ExportJob};

use crate::backend::{cancelled, MediaBackend};
use crate::error::{MediaError, MediaResult};

/// Runs export jobs on background tasks.
///
/// Destinations of in-flight jobs are claimed in a shared set before any
/// check or write, so two jobs racing to one path cannot both render.
pub struct ExportPipeline {
    backend: Arc<dyn MediaBackend>,
    inflight: Arc<Mutex<HashSet<PathBuf>>>,
}

/// Handle to one in-flight export: cancel it, await its terminal job.
pub struct ExportHandle {
    cancel: watch::Sender<bool>,
    outcome: oneshot::Receiver<ExportJob>,
}

impl ExportHandle {
    /// Request cancellation. Idempotent; a no-op once the job reached a
    /// terminal status.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Wait for the job to reach its terminal status.
    pub async fn outcome(self) -> MediaResult<ExportJob> {
        self.outcome
            .await
            .map_err(|_| MediaError::export_failed("export task terminated without reporting"))
    }
}

impl ExportPipeline {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        Self {
            backend,
            inflight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Start exporting `composition` to `output` and return immediately.
    ///
    /// The returned handle resolves with the job in exactly one terminal
    /// status: completed, failed, or cancelled.
    pub fn export(
        &self,
        composition: Composition,
        output: impl Into<PathBuf>,
        format: ExportFormat,
    ) -> ExportHandle {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let backend = Arc::clone(&self.backend);
        let inflight = Arc::clone(&self.inflight);
        let mut job = ExportJob::new(composition, output, format);

        tokio::spawn(async move {
            // Claim the destination before any check or write. The claim
            // is what makes the no-overwrite guarantee hold against a
            // concurrent job racing to the same path.
            let claimed = inflight.lock().await.insert(job.output.clone());
            let result = if claimed {
                run_export(backend.as_ref(), &mut job, cancel_rx).await
            } else {
                Err(MediaError::DestinationExists(job.output.clone()))
            };
            if claimed {
                inflight.lock().await.remove(&job.output);
            }
            match result {
                Ok(()) => {
                    job.complete();
                    info!(id = %job.id, output = %job.output.display(), "export completed");
                }
                Err(MediaError::Cancelled) => {
                    job.cancel();
                    info!(id = %job.id, "export cancelled");
                }
                Err(err) => {
                    warn!(id = %job.id, error = %err, "export failed");
                    job.fail(err.to_string());
                }
            }
            let _ = outcome_tx.send(job);
        });

        ExportHandle {
            cancel: cancel_tx,
            outcome: outcome_rx,
        }
    }
}

async fn run_export(
    backend: &dyn MediaBackend,
    job: &mut ExportJob,
    mut cancel: watch::Receiver<bool>,
) -> MediaResult<()> {
    // Never overwrite: an existing destination fails the job before any
    // byte is written, and the pre-existing file is left alone.
    if tokio::fs::try_exists(&job.output).await? {
        return Err(MediaError::DestinationExists(job.output.clone()));
    }
    if *cancel.borrow() {
        return Err(MediaError::Cancelled);
    }

    job.start();
    debug!(id = %job.id, output = %job.output.display(), "export running");

    let rendered = tokio::select! {
        result = backend.render(&job.composition, &job.output, job.format, cancel.clone()) => result,
        _ = cancelled(&mut cancel) => Err(MediaError::Cancelled),
    };

    match rendered {
        // A cancel that raced render completion still wins: the caller
        // observed cancel before a terminal status was reported.
        Ok(()) if *cancel.borrow() => {
            remove_partial(&job.output).await;
            Err(MediaError::Cancelled)
        }
        Ok(()) => Ok(()),
        Err(err) => {
            remove_partial(&job.output).await;
            Err(err)
        }
    }
}

/// Remove a partial output file, tolerating it never having been created.
async fn remove_partial(output: &Path) {
    match tokio::fs::remove_file(output).await {
        Ok(()) => debug!(output = %output.display(), "removed partial output"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => warn!(output = %output.display(), error = %err, "failed to remove partial output"),
    }
}
