//! Runtime configuration: fixed poses, settle waits, scan budget, detector
//! tuning and calibration seeds, constructed once and passed to components.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use pickplace_core::{PointCorrespondence, RobotPose};
use pickplace_vision::{ColorDetectorParams, StabilityParams};

use crate::hardware::CameraConfig;

#[derive(thiserror::Error, Debug)]
pub enum ConfigIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Fixed poses and heights of the pick cycle, in robot units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Staging pose visited before every pick.
    pub stage: RobotPose,
    /// Fixed drop-off pose.
    pub drop: RobotPose,
    /// Height for approach and retract above the target.
    pub safe_z: f64,
    /// Height at which the gripper closes on the target.
    pub pick_z: f64,
    /// End effector rotation used for target motions.
    pub rotation: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            stage: RobotPose::new(250.0, 0.0, 50.0, 0.0),
            drop: RobotPose::new(280.0, -182.0, 100.0, 100.0),
            safe_z: 50.0,
            pick_z: -4.0,
            rotation: 0.0,
        }
    }
}

/// Fixed settle waits after each open-loop command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitConfig {
    /// After the homing routine.
    pub home: Duration,
    /// After every point-to-point move.
    pub travel: Duration,
    /// Holding the closed gripper on the target before retracting.
    pub pick_hold: Duration,
    /// After toggling the gripper.
    pub gripper: Duration,
    /// Idle between scan attempts when no target was found.
    pub retry_idle: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            home: Duration::from_secs(3),
            travel: Duration::from_millis(1500),
            pick_hold: Duration::from_secs(2),
            gripper: Duration::from_millis(500),
            retry_idle: Duration::from_secs(2),
        }
    }
}

/// Budget and debounce settings for one detection scan.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Wall-clock bound on a whole scan attempt.
    pub timeout: Duration,
    pub stability: StabilityParams,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            stability: StabilityParams::default(),
        }
    }
}

/// Complete configuration of the pick-and-place process.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PickPlaceConfig {
    pub camera: CameraConfig,
    pub detector: ColorDetectorParams,
    pub scan: ScanConfig,
    pub motion: MotionConfig,
    pub waits: WaitConfig,
    /// Where the estimated calibration matrix is persisted.
    pub calibration_path: PathBuf,
    /// Seed pixel/robot pairs used only when no calibration file exists.
    pub seed_correspondences: Vec<PointCorrespondence>,
}

impl Default for PickPlaceConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            detector: ColorDetectorParams::default(),
            scan: ScanConfig::default(),
            motion: MotionConfig::default(),
            waits: WaitConfig::default(),
            calibration_path: PathBuf::from("pixel_to_robot.json"),
            seed_correspondences: default_seed_correspondences(),
        }
    }
}

/// The workcell's measured seed pairs: four floor markers observed by the
/// camera and touched by the arm.
pub fn default_seed_correspondences() -> Vec<PointCorrespondence> {
    vec![
        PointCorrespondence::new((269.0, 268.0), (340.0, 83.0)),
        PointCorrespondence::new((376.0, 491.0), (302.0, 62.0)),
        PointCorrespondence::new((835.0, 283.0), (338.0, -17.0)),
        PointCorrespondence::new((723.0, 502.0), (300.0, 0.0)),
    ]
}

impl PickPlaceConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_reference_workcell() {
        let cfg = PickPlaceConfig::default();
        assert_eq!(cfg.motion.stage, RobotPose::new(250.0, 0.0, 50.0, 0.0));
        assert_eq!(cfg.motion.pick_z, -4.0);
        assert_eq!(cfg.scan.timeout, Duration::from_secs(3));
        assert_eq!(cfg.seed_correspondences.len(), 4);
    }

    #[test]
    fn config_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pickplace.json");
        let cfg = PickPlaceConfig::default();
        cfg.write_json(&path).unwrap();
        let loaded = PickPlaceConfig::load_json(&path).unwrap();
        assert_eq!(loaded.motion, cfg.motion);
        assert_eq!(loaded.waits, cfg.waits);
        assert_eq!(loaded.seed_correspondences, cfg.seed_correspondences);
    }
}
