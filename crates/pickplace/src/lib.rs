//! Vision-guided pick-and-place for a planar workcell.
//!
//! A camera looks down on a work plane, color-marked objects are detected and
//! debounced into a single stable pixel coordinate, a persisted projective
//! calibration maps that pixel into robot-plane coordinates, and an open-loop
//! state machine drives the arm through a fixed pick-and-place cycle until no
//! objects remain.
//!
//! ## Quickstart
//!
//! ```no_run
//! use pickplace::core::CalibrationStore;
//! use pickplace::{ControlToken, PickPlaceConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PickPlaceConfig::default();
//! let store = CalibrationStore::new(&config.calibration_path);
//! let homography = store.load_or_estimate(&config.seed_correspondences)?;
//!
//! // Wire `PickPlaceOrchestrator::new` with your `RobotArm` and `Camera`
//! // implementations, then `run(&token)`; `token.stop()` ends the loop.
//! let token = ControlToken::new();
//! # let _ = (homography, token);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - [`core`](pickplace_core): homography estimation, calibration store,
//!   robot poses, the logger.
//! - [`vision`](pickplace_vision): color blob detector and stability filter.
//! - [`hardware`]: the `RobotArm` / `Camera` / `Clock` seams to real devices.
//! - [`config`]: fixed poses, waits and thresholds, built once and passed in.
//! - [`orchestrator`]: the scan/map/pick/place loop and its stop token.
//!
//! ## Open-loop trust model
//!
//! No acknowledgement is read back from the arm or gripper; every command is
//! followed by a fixed settle wait and assumed complete. A command that fails
//! or finishes late goes unnoticed. This is a documented limitation of the
//! design, not a guarantee.

pub use pickplace_core as core;
pub use pickplace_vision as vision;

pub mod config;
pub mod hardware;
pub mod orchestrator;

#[cfg(feature = "image")]
pub mod interop;

pub use config::{MotionConfig, PickPlaceConfig, ScanConfig, WaitConfig};
pub use hardware::{Camera, CameraConfig, CameraError, Clock, RobotArm, SystemClock};
pub use orchestrator::{ControlToken, PickPlaceCycle, PickPlaceOrchestrator, ScanOutcome};
