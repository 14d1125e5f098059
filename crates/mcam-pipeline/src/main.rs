//! Motion-triggered capture pipeline binary.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mcam_capture::{SyntheticAccelerometer, SyntheticCamera};
use mcam_models::MotionSample;
use mcam_media::FfmpegBackend;
use mcam_pipeline::{CapturePipeline, PipelineConfig, PipelineEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("mcam=info".parse().context("bad log directive")?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let config = PipelineConfig::from_env();
    info!("pipeline config: {:?}", config);

    tokio::fs::create_dir_all(&config.work_dir)
        .await
        .with_context(|| format!("creating work dir {}", config.work_dir.display()))?;

    // One qualifying spike after every few seconds of quiet sampling.
    let mut samples: Vec<MotionSample> = (0..30)
        .map(|_| MotionSample::new(0.0, 0.0, 0.0))
        .collect();
    samples.push(MotionSample::new(config.motion_threshold + 1.0, 0.0, 0.0));
    let source = SyntheticAccelerometer::repeating(samples, Duration::from_millis(100));
    let device = SyntheticCamera::new();
    let backend = Arc::new(FfmpegBackend::new());

    let (pipeline, mut events) = CapturePipeline::start(config, source, device, backend)
        .context("starting capture pipeline")?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
            event = events.recv() => {
                match event {
                    Some(PipelineEvent::RecordingStarted { destination }) => {
                        info!(destination = %destination.display(), "recording");
                    }
                    Some(PipelineEvent::Exported(job)) => {
                        info!(id = %job.id, output = %job.output.display(), "export finished");
                    }
                    Some(PipelineEvent::CycleFailed { stage, reason }) => {
                        warn!(%stage, reason, "cycle failed");
                    }
                    None => break,
                }
            }
        }
    }

    pipeline.shutdown().await;
    Ok(())
}
