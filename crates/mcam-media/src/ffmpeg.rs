//! FFmpeg-backed media operations.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{debug, info};

use mcam_models::{Composition, ExportFormat, SourceTrack, TrackKind};

use crate::backend::{cancelled, MediaBackend};
use crate::error::{MediaError, MediaResult};

/// Builder for FFmpeg invocations.
///
/// Never passes `-y`: an existing output makes ffmpeg fail instead of
/// silently overwriting, which is the behavior every stage here wants.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    /// Additional inputs (e.g. overlay stills), each passed with its own -i
    extra_inputs: Vec<PathBuf>,
    output: PathBuf,
    /// Output arguments (after the inputs)
    output_args: Vec<String>,
    log_level: String,
}

impl FfmpegCommand {
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            extra_inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            log_level: "error".to_string(),
        }
    }

    pub fn extra_input(mut self, input: impl AsRef<Path>) -> Self {
        self.extra_inputs.push(input.as_ref().to_path_buf());
        self
    }

    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set filter complex (multi-input graphs).
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Drop all audio streams from the output.
    pub fn drop_audio(self) -> Self {
        self.output_arg("-an")
    }

    /// Force the output container format.
    pub fn container(self, muxer: impl Into<String>) -> Self {
        self.output_arg("-f").output_arg(muxer)
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-v".to_string(),
            self.log_level.clone(),
            "-nostdin".to_string(),
        ];

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());
        for input in &self.extra_inputs {
            args.push("-i".to_string());
            args.push(input.to_string_lossy().to_string());
        }

        args.extend(self.output_args.clone());
        args.push(self.output.to_string_lossy().to_string());
        args
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: String,
    duration: Option<String>,
}

/// Media backend that shells out to ffmpeg and ffprobe.
#[derive(Debug, Default)]
pub struct FfmpegBackend;

impl FfmpegBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    async fn probe_tracks(&self, source: &Path) -> MediaResult<Vec<SourceTrack>> {
        which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

        let output = Command::new("ffprobe")
            .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(MediaError::probe(format!(
                "ffprobe failed for {}: {}",
                source.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let probe: ProbeOutput = serde_json::from_slice(&output.stdout)?;
        let tracks = probe
            .streams
            .iter()
            .filter_map(|stream| {
                let kind = match stream.codec_type.as_str() {
                    "video" => TrackKind::Video,
                    "audio" => TrackKind::Audio,
                    _ => return None,
                };
                let duration = stream
                    .duration
                    .as_deref()
                    .and_then(|d| d.parse::<f64>().ok())
                    .map(Duration::from_secs_f64)
                    .unwrap_or_default();
                Some(SourceTrack { kind, duration })
            })
            .collect();
        Ok(tracks)
    }

    async fn render(
        &self,
        composition: &Composition,
        output: &Path,
        format: ExportFormat,
        cancel: watch::Receiver<bool>,
    ) -> MediaResult<()> {
        let track = composition
            .primary_track()
            .ok_or_else(|| MediaError::composition("composition has no tracks"))?;

        // Stretch presentation timestamps; frame content is untouched and
        // audio is dropped rather than resampled.
        let cmd = FfmpegCommand::new(&track.source, output)
            .video_filter(format!("setpts={:.6}*PTS", composition.scale_factor))
            .drop_audio()
            .container(format.muxer());

        run_ffmpeg(&cmd, Some(cancel)).await?;
        info!(
            output = %output.display(),
            duration = ?composition.duration,
            "rendered composition"
        );
        Ok(())
    }

    async fn composite_overlay(
        &self,
        video: &Path,
        image: &Path,
        output: &Path,
    ) -> MediaResult<()> {
        let cmd = FfmpegCommand::new(video, output)
            .extra_input(image)
            .filter_complex("[0:v][1:v]overlay=(W-w)/2:(H-h)/2:format=auto");

        run_ffmpeg(&cmd, None)
            .await
            .map_err(|err| match err {
                MediaError::ExportFailed { reason } => MediaError::Overlay(reason),
                other => other,
            })
    }
}

/// Run an ffmpeg command, optionally killing it when `cancel` flips.
async fn run_ffmpeg(cmd: &FfmpegCommand, cancel: Option<watch::Receiver<bool>>) -> MediaResult<()> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let args = cmd.build_args();
    debug!("running ffmpeg {}", args.join(" "));

    let mut child = Command::new("ffmpeg")
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()?;

    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| MediaError::export_failed("ffmpeg stderr not captured"))?;
    let stderr_task = tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        let mut collected = String::new();
        while let Ok(Some(line)) = lines.next_line().await {
            if !collected.is_empty() {
                collected.push('\n');
            }
            collected.push_str(&line);
        }
        collected
    });

    let status = match cancel {
        Some(mut cancel_rx) => {
            tokio::select! {
                status = child.wait() => status?,
                _ = cancelled(&mut cancel_rx) => {
                    info!("ffmpeg cancelled, killing process");
                    let _ = child.kill().await;
                    let _ = stderr_task.await;
                    return Err(MediaError::Cancelled);
                }
            }
        }
        None => child.wait().await?,
    };

    let stderr_text = stderr_task.await.unwrap_or_default();
    if status.success() {
        Ok(())
    } else {
        Err(MediaError::export_failed(format!(
            "ffmpeg exited with status {}: {}",
            status.code().map_or_else(|| "signal".to_string(), |c| c.to_string()),
            stderr_text.trim()
        )))
    }
}
