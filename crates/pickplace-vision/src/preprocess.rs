//! Frame smoothing ahead of color thresholding.

use crate::frame::RgbFrame;

/// Sigma matching the common default for a given odd kernel size.
fn sigma_for_kernel(ksize: usize) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

fn gaussian_weights(ksize: usize) -> Vec<f32> {
    let sigma = sigma_for_kernel(ksize);
    let c = (ksize / 2) as f32;
    let mut w: Vec<f32> = (0..ksize)
        .map(|i| {
            let d = i as f32 - c;
            (-d * d / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = w.iter().sum();
    for v in &mut w {
        *v /= sum;
    }
    w
}

#[inline]
fn clamp(v: i64, max: i64) -> usize {
    v.clamp(0, max) as usize
}

/// Separable Gaussian blur over all three channels, replicated borders.
///
/// `ksize` must be odd; the sensor-noise suppression step of the detector
/// pipeline uses 5.
pub fn gaussian_blur(frame: &RgbFrame, ksize: usize) -> RgbFrame {
    debug_assert!(ksize % 2 == 1, "kernel size must be odd");
    let w = frame.width;
    let h = frame.height;
    let weights = gaussian_weights(ksize);
    let r = (ksize / 2) as i64;

    // Horizontal pass into a float buffer, then vertical pass back to u8.
    let mut tmp = vec![0f32; 3 * w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0f32; 3];
            for (k, &wk) in weights.iter().enumerate() {
                let sx = clamp(x as i64 + k as i64 - r, w as i64 - 1);
                let p = frame.get(sx, y);
                for c in 0..3 {
                    acc[c] += wk * p[c] as f32;
                }
            }
            let i = 3 * (y * w + x);
            tmp[i..i + 3].copy_from_slice(&acc);
        }
    }

    let mut out = RgbFrame::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0f32; 3];
            for (k, &wk) in weights.iter().enumerate() {
                let sy = clamp(y as i64 + k as i64 - r, h as i64 - 1);
                let i = 3 * (sy * w + x);
                for c in 0..3 {
                    acc[c] += wk * tmp[i + c];
                }
            }
            out.put(
                x,
                y,
                [
                    acc[0].round().clamp(0.0, 255.0) as u8,
                    acc[1].round().clamp(0.0, 255.0) as u8,
                    acc[2].round().clamp(0.0, 255.0) as u8,
                ],
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_frame_is_unchanged() {
        let frame = RgbFrame::from_fn(16, 12, |_, _| [90, 200, 40]);
        let blurred = gaussian_blur(&frame, 5);
        for y in 0..12 {
            for x in 0..16 {
                assert_eq!(blurred.get(x, y), [90, 200, 40]);
            }
        }
    }

    #[test]
    fn blur_spreads_an_isolated_pixel() {
        let mut frame = RgbFrame::new(9, 9);
        frame.put(4, 4, [255, 255, 255]);
        let blurred = gaussian_blur(&frame, 5);
        assert!(blurred.get(4, 4)[0] < 255);
        assert!(blurred.get(3, 4)[0] > 0);
        // Mass stays inside the kernel radius.
        assert_eq!(blurred.get(0, 0), [0, 0, 0]);
    }
}
