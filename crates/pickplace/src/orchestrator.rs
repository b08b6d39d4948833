//! The top-level control loop: scan, map, pick, place, repeat.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pickplace_core::{Homography, RobotXy};
use pickplace_vision::{ColorObjectDetector, FilterState, StabilityFilter, StableTarget};

use crate::config::PickPlaceConfig;
use crate::hardware::{Camera, CameraError, Clock, RobotArm};

/// Run/stop control for the outer loop. The loop never exits on its own;
/// stopping it is an external decision, which this token makes explicit and
/// testable instead of relying on process signals.
#[derive(Clone, Debug)]
pub struct ControlToken {
    running: Arc<AtomicBool>,
}

impl ControlToken {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

impl Default for ControlToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one scan attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScanOutcome {
    /// A debounced target coordinate was confirmed.
    Target(StableTarget),
    /// The scan budget expired without a confirmed target. Soft outcome:
    /// the loop idles and retries.
    TimedOut,
}

/// Ordered steps of one pick+place transaction. Each step issues at most one
/// blocking command and then waits a fixed settle time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CycleStep {
    Stage,
    ApproachAboveTarget,
    DescendToPick,
    GripClose,
    Hold,
    RetractToSafeZ,
    MoveToDrop,
    GripOpen,
    ReturnHome,
    Done,
}

/// One pick+place transaction against a mapped target coordinate.
///
/// Created when a stable target is obtained, destroyed on return to home.
/// Strictly ordered and open loop: completion of each command is assumed
/// after its settle wait, never confirmed.
pub struct PickPlaceCycle {
    target: RobotXy,
}

impl PickPlaceCycle {
    pub fn new(target: RobotXy) -> Self {
        Self { target }
    }

    /// Drive the arm through the fixed command sequence.
    pub fn execute<A: RobotArm, K: Clock>(self, config: &PickPlaceConfig, arm: &mut A, clock: &K) {
        let motion = &config.motion;
        let waits = &config.waits;
        let (x, y) = (self.target.x, self.target.y);

        let mut step = CycleStep::Stage;
        while step != CycleStep::Done {
            log::debug!("cycle step {:?}", step);
            step = match step {
                CycleStep::Stage => {
                    arm.move_to_pose(motion.stage);
                    clock.sleep(waits.travel);
                    CycleStep::ApproachAboveTarget
                }
                CycleStep::ApproachAboveTarget => {
                    arm.move_to(x, y, motion.safe_z, motion.rotation);
                    clock.sleep(waits.travel);
                    CycleStep::DescendToPick
                }
                CycleStep::DescendToPick => {
                    arm.move_to(x, y, motion.pick_z, motion.rotation);
                    clock.sleep(waits.travel);
                    CycleStep::GripClose
                }
                CycleStep::GripClose => {
                    arm.gripper(true, true);
                    clock.sleep(waits.gripper);
                    CycleStep::Hold
                }
                CycleStep::Hold => {
                    // No command: give the gripper time to seat on the part.
                    clock.sleep(waits.pick_hold);
                    CycleStep::RetractToSafeZ
                }
                CycleStep::RetractToSafeZ => {
                    arm.move_to(x, y, motion.safe_z, motion.rotation);
                    clock.sleep(waits.travel);
                    CycleStep::MoveToDrop
                }
                CycleStep::MoveToDrop => {
                    arm.move_to_pose(motion.drop);
                    clock.sleep(waits.travel);
                    CycleStep::GripOpen
                }
                CycleStep::GripOpen => {
                    arm.gripper(true, false);
                    clock.sleep(waits.gripper);
                    CycleStep::ReturnHome
                }
                CycleStep::ReturnHome => {
                    arm.home();
                    clock.sleep(waits.home);
                    CycleStep::Done
                }
                CycleStep::Done => CycleStep::Done,
            };
        }
    }
}

/// Top-level controller: asks the detector/filter pair for a stable target,
/// maps it into the robot plane and drives the pick cycle.
pub struct PickPlaceOrchestrator<A, C, K> {
    arm: A,
    camera: C,
    clock: K,
    homography: Homography,
    detector: ColorObjectDetector,
    config: PickPlaceConfig,
}

impl<A: RobotArm, C: Camera, K: Clock> PickPlaceOrchestrator<A, C, K> {
    pub fn new(arm: A, camera: C, clock: K, homography: Homography, config: PickPlaceConfig) -> Self {
        let detector = ColorObjectDetector::new(config.detector.clone());
        Self {
            arm,
            camera,
            clock,
            homography,
            detector,
            config,
        }
    }

    /// One scan attempt: read frames through the stability filter until a
    /// target is confirmed or the wall-clock budget expires.
    ///
    /// A failed frame read is a skipped frame, not a fatal error; the scan
    /// continues within its timeout budget. If the budget expires without a
    /// single readable frame the camera is considered gone and the error is
    /// fatal.
    pub fn scan_for_target(&mut self) -> Result<ScanOutcome, CameraError> {
        let mut filter = StabilityFilter::new(self.config.scan.stability);
        let deadline = self.clock.now() + self.config.scan.timeout;
        let mut frames_read = 0usize;

        while self.clock.now() < deadline {
            let frame = match self.camera.read() {
                Ok(frame) => {
                    frames_read += 1;
                    frame
                }
                Err(err) => {
                    log::warn!("skipping unreadable frame: {err}");
                    continue;
                }
            };

            let primary = self.detector.detect_primary(&frame).map(|b| b.centroid);
            if filter.observe(primary) == FilterState::Stable {
                if let Some(target) = filter.stable_target() {
                    log::info!(
                        "stable target at pixel ({:.1},{:.1})",
                        target.pixel.x,
                        target.pixel.y
                    );
                    return Ok(ScanOutcome::Target(target));
                }
            }
        }

        filter.mark_timed_out();
        if frames_read == 0 {
            return Err(CameraError::ReadFailed);
        }
        Ok(ScanOutcome::TimedOut)
    }

    /// The outer process loop: home, then scan/pick/place until the token is
    /// stopped. A timed-out scan idles and retries; a target that maps to
    /// infinity skips the cycle and rescans.
    pub fn run(&mut self, token: &ControlToken) -> Result<(), CameraError> {
        log::info!("homing at startup");
        self.arm.home();
        self.clock.sleep(self.config.waits.home);

        // Gripper power on, jaws open.
        self.arm.gripper(true, false);
        self.clock.sleep(self.config.waits.gripper);

        while token.is_running() {
            match self.scan_for_target()? {
                ScanOutcome::TimedOut => {
                    log::info!("no target this scan, idling before retry");
                    self.clock.sleep(self.config.waits.retry_idle);
                }
                ScanOutcome::Target(target) => match self.homography.apply(target.pixel) {
                    Ok(robot_xy) => {
                        log::info!(
                            "pixel ({:.1},{:.1}) -> robot ({:.1},{:.1})",
                            target.pixel.x,
                            target.pixel.y,
                            robot_xy.x,
                            robot_xy.y
                        );
                        PickPlaceCycle::new(robot_xy).execute(
                            &self.config,
                            &mut self.arm,
                            &self.clock,
                        );
                    }
                    Err(err) => {
                        log::warn!("{err}; skipping this cycle and rescanning");
                    }
                },
            }
        }

        log::info!("stop requested, leaving the loop");
        Ok(())
    }
}
