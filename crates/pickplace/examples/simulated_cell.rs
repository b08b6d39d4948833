//! Runs the full pick-and-place loop against a simulated workcell: a fake
//! camera renders a yellow part on the work plane and a fake arm logs the
//! commands it receives. The part disappears once the gripper closes on it,
//! after which the loop times out, idles and the camera stops the token.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use pickplace::core::{init_with_level, CalibrationStore};
use pickplace::vision::RgbFrame;
use pickplace::{
    Camera, CameraError, ControlToken, PickPlaceConfig, PickPlaceOrchestrator, RobotArm,
    SystemClock,
};

struct LoggingArm {
    part_present: Rc<Cell<bool>>,
}

impl RobotArm for LoggingArm {
    fn home(&mut self) {
        log::info!("arm: home");
    }

    fn move_to(&mut self, x: f64, y: f64, z: f64, r: f64) {
        log::info!("arm: move_to ({x:.1}, {y:.1}, {z:.1}, r={r:.1})");
    }

    fn gripper(&mut self, enable: bool, on: bool) {
        log::info!("arm: gripper enable={enable} on={on}");
        if enable && on {
            // Closing the jaws picks the simulated part off the plane.
            self.part_present.set(false);
        }
    }
}

struct SimulatedCamera {
    part_present: Rc<Cell<bool>>,
    reads: u32,
    token: ControlToken,
}

impl Camera for SimulatedCamera {
    fn read(&mut self) -> Result<RgbFrame, CameraError> {
        self.reads += 1;
        if self.reads > 200 {
            self.token.stop();
        }
        let present = self.part_present.get();
        Ok(RgbFrame::from_fn(320, 240, |x, y| {
            if present && (120..170).contains(&x) && (90..130).contains(&y) {
                [240, 220, 30]
            } else {
                [30, 30, 30]
            }
        }))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_with_level(log::LevelFilter::Info)?;

    let mut config = PickPlaceConfig::default();
    // Shrink the settle waits so the simulation finishes quickly.
    config.waits.home = Duration::from_millis(50);
    config.waits.travel = Duration::from_millis(20);
    config.waits.pick_hold = Duration::from_millis(30);
    config.waits.gripper = Duration::from_millis(10);
    config.waits.retry_idle = Duration::from_millis(100);
    config.scan.timeout = Duration::from_millis(800);
    config.calibration_path = std::env::temp_dir().join("pickplace_sim_calibration.json");

    let store = CalibrationStore::new(&config.calibration_path);
    let homography = store.load_or_estimate(&config.seed_correspondences)?;

    let part_present = Rc::new(Cell::new(true));
    let token = ControlToken::new();
    let arm = LoggingArm {
        part_present: part_present.clone(),
    };
    let camera = SimulatedCamera {
        part_present,
        reads: 0,
        token: token.clone(),
    };

    let mut orchestrator =
        PickPlaceOrchestrator::new(arm, camera, SystemClock, homography, config);
    orchestrator.run(&token)?;

    log::info!("simulation finished");
    Ok(())
}
