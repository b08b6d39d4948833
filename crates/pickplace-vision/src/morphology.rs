//! Binary morphology for mask cleanup: speckle removal (opening) and gap
//! filling (closing) with an elliptical structuring element.

use crate::frame::Mask;

/// Offsets of an elliptical structuring element of the given odd size.
pub fn ellipse_kernel(size: usize) -> Vec<(i32, i32)> {
    debug_assert!(size % 2 == 1, "kernel size must be odd");
    let r = (size / 2) as i32;
    let mut offsets = Vec::new();
    for dy in -r..=r {
        // Per-row half width of the ellipse, rounded like the usual
        // structuring-element rasterization.
        let frac = 1.0 - (dy as f64 / r as f64).powi(2);
        let half_w = (r as f64 * frac.max(0.0).sqrt() + 0.5) as i32;
        for dx in -half_w..=half_w {
            offsets.push((dx, dy));
        }
    }
    offsets
}

/// Keep a pixel only if the whole kernel fits inside the foreground.
pub fn erode(mask: &Mask, kernel: &[(i32, i32)]) -> Mask {
    let mut out = Mask::new(mask.width, mask.height);
    for y in 0..mask.height as i32 {
        for x in 0..mask.width as i32 {
            let all = kernel.iter().all(|&(dx, dy)| mask.is_set(x + dx, y + dy));
            out.set(x as usize, y as usize, all);
        }
    }
    out
}

/// Set a pixel if any kernel offset touches the foreground.
pub fn dilate(mask: &Mask, kernel: &[(i32, i32)]) -> Mask {
    let mut out = Mask::new(mask.width, mask.height);
    for y in 0..mask.height as i32 {
        for x in 0..mask.width as i32 {
            let any = kernel.iter().any(|&(dx, dy)| mask.is_set(x + dx, y + dy));
            out.set(x as usize, y as usize, any);
        }
    }
    out
}

/// Opening: `iterations` erosions followed by `iterations` dilations.
///
/// Stacking all erosions before the dilations matches the reference
/// morphology implementations, where `iterations` grows the effective
/// structuring element rather than repeating an erode/dilate pair.
pub fn open(mask: &Mask, kernel: &[(i32, i32)], iterations: usize) -> Mask {
    let mut m = mask.clone();
    for _ in 0..iterations {
        m = erode(&m, kernel);
    }
    for _ in 0..iterations {
        m = dilate(&m, kernel);
    }
    m
}

/// Closing: `iterations` dilations followed by `iterations` erosions.
///
/// See [`open`] for the iteration semantics.
pub fn close(mask: &Mask, kernel: &[(i32, i32)], iterations: usize) -> Mask {
    let mut m = mask.clone();
    for _ in 0..iterations {
        m = dilate(&m, kernel);
    }
    for _ in 0..iterations {
        m = erode(&m, kernel);
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_from_rows(rows: &[&str]) -> Mask {
        let mut m = Mask::new(rows[0].len(), rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                m.set(x, y, ch == '#');
            }
        }
        m
    }

    #[test]
    fn ellipse_kernel_shape_matches_reference() {
        // 5x5 elliptical element: full 5-wide rows except single-pixel caps.
        let k = ellipse_kernel(5);
        assert_eq!(k.len(), 17);
        assert!(k.contains(&(0, -2)));
        assert!(!k.contains(&(1, -2)));
        assert!(k.contains(&(2, -1)));
        assert!(k.contains(&(2, 0)));
    }

    #[test]
    fn opening_removes_speckle_noise() {
        let mut m = mask_from_rows(&[
            "....................",
            "....................",
            "....######..........",
            "....######..........",
            "....######..........",
            "....######..........",
            "....######..........",
            "....######..........",
            "....................",
            "....................",
        ]);
        m.set(17, 1, true); // isolated noise pixel
        let k = ellipse_kernel(3);
        let opened = open(&m, &k, 1);
        assert!(!opened.is_set(17, 1));
        assert!(opened.is_set(6, 4));
    }

    #[test]
    fn iterated_closing_bridges_gaps_wider_than_one_radius() {
        // Two 6x6 blocks separated by a 3-px gap. One pass of a 3x3
        // element cannot reach the middle gap column, but stacked
        // dilations do, so close(.., 2) must merge the blocks into a
        // single region.
        let m = mask_from_rows(&[
            "....................",
            "....................",
            "..######...######...",
            "..######...######...",
            "..######...######...",
            "..######...######...",
            "..######...######...",
            "..######...######...",
            "....................",
            "....................",
        ]);
        let k = ellipse_kernel(3);

        let single_pass = close(&m, &k, 1);
        assert_eq!(crate::blobs::extract_blobs(&single_pass).len(), 2);

        let double_pass = close(&m, &k, 2);
        assert_eq!(crate::blobs::extract_blobs(&double_pass).len(), 1);
    }

    #[test]
    fn closing_fills_small_holes() {
        let mut m = mask_from_rows(&[
            "..........",
            ".########.",
            ".########.",
            ".########.",
            ".########.",
            ".########.",
            "..........",
        ]);
        m.set(4, 3, false); // pinhole inside the region
        let k = ellipse_kernel(3);
        let closed = close(&m, &k, 1);
        assert!(closed.is_set(4, 3));
    }
}
