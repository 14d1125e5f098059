//! Sensor and camera side of the motion-capture pipeline.
//!
//! This crate provides:
//! - [`MotionSource`] and [`CaptureDevice`] capability traits for the
//!   physical collaborators
//! - [`MotionMonitor`] threshold detection over a continuous sample feed
//! - [`CaptureSession`] owning one input device and one output sink
//! - [`RecordingController`] bounded-duration recording state machine
//! - Deterministic synthetic devices for development and tests

pub mod controller;
pub mod device;
pub mod error;
pub mod monitor;
pub mod session;
pub mod synthetic;

pub use controller::{ControllerHandle, ControllerState, CycleEvent, RecordingController};
pub use device::CaptureDevice;
pub use error::{CaptureError, CaptureResult};
pub use monitor::{MotionMonitor, MotionSource};
pub use session::CaptureSession;
pub use synthetic::{SyntheticAccelerometer, SyntheticCamera};
