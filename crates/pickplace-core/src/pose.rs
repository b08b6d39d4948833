use serde::{Deserialize, Serialize};

/// A point-to-point target for the arm: planar position, height and end
/// effector rotation, all in robot units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RobotPose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub r: f64,
}

impl RobotPose {
    pub const fn new(x: f64, y: f64, z: f64, r: f64) -> Self {
        Self { x, y, z, r }
    }

    /// Same planar position and rotation at a different height.
    pub const fn at_z(&self, z: f64) -> Self {
        Self {
            x: self.x,
            y: self.y,
            z,
            r: self.r,
        }
    }
}
