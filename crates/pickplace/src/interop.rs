//! Conversions between `image` buffers and the crate's own frame type.

use pickplace_vision::RgbFrame;

/// Copy an `image::RgbImage` into the detector's frame type.
pub fn rgb_frame_from_image(img: &image::RgbImage) -> RgbFrame {
    RgbFrame {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw().clone(),
    }
}
