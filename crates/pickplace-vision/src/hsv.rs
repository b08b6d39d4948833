//! Hue-based color representation and range thresholding.
//!
//! Uses the 8-bit OpenCV convention so the configured ranges stay directly
//! comparable with values tuned in common vision tooling: H in [0, 180),
//! S and V in [0, 255].

use serde::{Deserialize, Serialize};

use crate::frame::{Mask, RgbFrame};

/// Inclusive lower/upper HSV bounds for the target color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvBounds {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvBounds {
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| self.lower[c] <= hsv[c] && hsv[c] <= self.upper[c])
    }
}

/// Convert one RGB pixel to HSV (H halved to fit the 8-bit hue range).
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let r = rgb[0] as f32;
    let g = rgb[1] as f32;
    let b = rgb[2] as f32;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

    let h_deg = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let h_deg = if h_deg < 0.0 { h_deg + 360.0 } else { h_deg };

    [
        (h_deg / 2.0).round().min(179.0) as u8,
        s.round().min(255.0) as u8,
        v.round().min(255.0) as u8,
    ]
}

/// Binary mask of pixels whose HSV value falls inside the bounds.
pub fn threshold_in_range(frame: &RgbFrame, bounds: &HsvBounds) -> Mask {
    let mut mask = Mask::new(frame.width, frame.height);
    for y in 0..frame.height {
        for x in 0..frame.width {
            let hsv = rgb_to_hsv(frame.get(x, y));
            mask.set(x, y, bounds.contains(hsv));
        }
    }
    mask
}
