//! Seams to the external hardware: robot arm, gripper, camera, wall clock.
//!
//! The process is single-threaded and cooperative. Every arm command and
//! camera read is a blocking call; command completion is assumed after a
//! fixed settle wait rather than confirmed by the hardware.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use pickplace_core::RobotPose;
use pickplace_vision::RgbFrame;

#[derive(thiserror::Error, Debug)]
pub enum CameraError {
    #[error("failed to open camera device {index}")]
    Open { index: u32 },
    #[error("failed to read a frame from the camera")]
    ReadFailed,
}

/// Capture settings a concrete camera applies when opening the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub device_index: u32,
    pub width: u32,
    pub height: u32,
    /// Request the MJPG pixel format (higher frame rates on USB webcams).
    pub mjpg: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 1,
            width: 1280,
            height: 720,
            mjpg: true,
        }
    }
}

/// Blocking frame source. Device acquisition and configuration belong to the
/// implementation's constructor; a failed `read` is reported per frame and
/// absorbed by the scan loop as a skipped frame.
pub trait Camera {
    fn read(&mut self) -> Result<RgbFrame, CameraError>;
}

/// Point-to-point arm motion and gripper toggling.
///
/// Fire-and-forget: commands return no status and none is read back from the
/// firmware. The orchestrator sleeps a fixed settle time after each command
/// and trusts that it completed. A command that fails or finishes late goes
/// unnoticed; this is a known gap of the open-loop model, not a guarantee.
pub trait RobotArm {
    /// Run the arm's homing routine.
    fn home(&mut self);

    /// Point-to-point move, no trajectory shape specified.
    fn move_to(&mut self, x: f64, y: f64, z: f64, r: f64);

    /// `enable` toggles gripper power, `on` toggles closed/open.
    fn gripper(&mut self, enable: bool, on: bool);

    fn move_to_pose(&mut self, pose: RobotPose) {
        self.move_to(pose.x, pose.y, pose.z, pose.r);
    }
}

/// Time source behind the settle waits, so tests can run the control loop
/// without real sleeps.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// The real wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
