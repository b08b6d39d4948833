//! Color object detector: noisy RGB frame in, area-filtered blobs out.

use serde::{Deserialize, Serialize};

use crate::blobs::{extract_blobs, DetectedBlob};
use crate::frame::RgbFrame;
use crate::hsv::{threshold_in_range, HsvBounds};
use crate::morphology::{close, ellipse_kernel, open};
use crate::preprocess::gaussian_blur;

/// Parameters for color-based blob detection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColorDetectorParams {
    /// HSV range of the target color.
    pub bounds: HsvBounds,
    /// Regions smaller than this many pixels are discarded.
    pub min_area: u32,
    /// Odd Gaussian kernel size for the smoothing step.
    pub blur_kernel: usize,
    /// Odd elliptical kernel size for morphological cleanup.
    pub morph_kernel: usize,
}

impl Default for ColorDetectorParams {
    /// Defaults tuned for the yellow workpieces of the reference workcell.
    fn default() -> Self {
        Self {
            bounds: HsvBounds {
                lower: [15, 100, 100],
                upper: [35, 255, 255],
            },
            min_area: 800,
            blur_kernel: 5,
            morph_kernel: 5,
        }
    }
}

/// Segments a frame for the configured color range and extracts blob
/// centroids. An empty result is a valid outcome, not an error.
pub struct ColorObjectDetector {
    params: ColorDetectorParams,
    kernel: Vec<(i32, i32)>,
}

impl ColorObjectDetector {
    pub fn new(params: ColorDetectorParams) -> Self {
        let kernel = ellipse_kernel(params.morph_kernel);
        Self { params, kernel }
    }

    pub fn params(&self) -> &ColorDetectorParams {
        &self.params
    }

    /// All surviving blobs, sorted by descending area.
    ///
    /// Equal-area ties keep mask discovery order, which is
    /// implementation-defined; callers must not rely on it.
    pub fn detect(&self, frame: &RgbFrame) -> Vec<DetectedBlob> {
        let smoothed = gaussian_blur(frame, self.params.blur_kernel);
        let mask = threshold_in_range(&smoothed, &self.params.bounds);
        let mask = open(&mask, &self.kernel, 1);
        let mask = close(&mask, &self.kernel, 2);

        let mut blobs: Vec<DetectedBlob> = extract_blobs(&mask)
            .into_iter()
            .filter(|b| b.area >= self.params.min_area)
            .collect();
        blobs.sort_by(|a, b| b.area.cmp(&a.area));
        log::debug!("{} blob(s) above min area {}", blobs.len(), self.params.min_area);
        blobs
    }

    /// Primary-target mode: the single largest surviving blob.
    pub fn detect_primary(&self, frame: &RgbFrame) -> Option<DetectedBlob> {
        self.detect(frame).into_iter().next()
    }
}
