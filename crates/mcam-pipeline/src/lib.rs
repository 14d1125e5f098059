//! Motion-triggered capture pipeline.
//!
//! Wires motion sampling, bounded recording, time-scale transform,
//! export, and overlay compositing into one event-driven loop.

pub mod config;
pub mod error;
pub mod logging;
pub mod runner;

pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use logging::CycleLogger;
pub use runner::{CapturePipeline, PipelineEvent, Stage};
