//! Media stages: probing, time transformation, export, and overlay
//! compositing.
//!
//! All stages run against a [`MediaBackend`]; the shipped implementation
//! is [`FfmpegBackend`], which shells out to ffmpeg/ffprobe.

pub mod backend;
pub mod error;
pub mod export;
pub mod ffmpeg;
pub mod overlay;
pub mod transform;

pub use backend::MediaBackend;
pub use error::{MediaError, MediaResult};
pub use export::{ExportHandle, ExportPipeline};
pub use ffmpeg::{FfmpegBackend, FfmpegCommand};
pub use overlay::OverlayStage;
pub use transform::TimeTransformEngine;
