//! Color blob detection and target debouncing for vision-guided pick-and-place.
//!
//! The pipeline turns a noisy RGB video frame into a single trustworthy
//! target coordinate:
//!
//! frame -> Gaussian blur -> HSV threshold -> morphological cleanup ->
//! connected regions -> area filter -> [`ColorObjectDetector`] output,
//! debounced over consecutive frames by [`StabilityFilter`].

mod blobs;
mod detector;
mod frame;
mod hsv;
mod morphology;
mod preprocess;
mod stability;

pub use blobs::{extract_blobs, DetectedBlob};
pub use detector::{ColorDetectorParams, ColorObjectDetector};
pub use frame::{Mask, RgbFrame};
pub use hsv::{rgb_to_hsv, threshold_in_range, HsvBounds};
pub use morphology::{close, dilate, ellipse_kernel, erode, open};
pub use preprocess::gaussian_blur;
pub use stability::{FilterState, StabilityFilter, StabilityParams, StableTarget};
