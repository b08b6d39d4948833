//! Planar calibration and robot pose types for vision-guided pick-and-place.
//!
//! This crate is intentionally small and purely geometric. It knows nothing
//! about cameras or arm firmware: it estimates the pixel-to-robot projective
//! transform, persists it, and maps single points through it.

mod homography;
mod logger;
mod pose;
mod store;

pub use homography::{
    estimate_pixel_to_robot, CalibrationError, Homography, MappingError, PixelPoint,
    PointCorrespondence, RobotXy,
};
pub use logger::init_with_level;
pub use pose::RobotPose;
pub use store::{CalibrationIoError, CalibrationSetupError, CalibrationStore};
