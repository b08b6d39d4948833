//! Connected-region extraction from a binary mask.

use nalgebra::Point2;

use crate::frame::Mask;

/// One connected region surviving color thresholding.
///
/// Created fresh for each frame and discarded after use; there is no
/// cross-frame blob identity.
#[derive(Clone, Debug)]
pub struct DetectedBlob {
    /// Region size in pixels.
    pub area: u32,
    /// Area-weighted first moment of the region.
    pub centroid: Point2<f64>,
    /// External boundary: region pixels with at least one 4-neighbor outside
    /// the region.
    pub boundary: Vec<(u32, u32)>,
}

/// Extract all connected regions (8-connectivity) in mask discovery order.
///
/// Discovery order follows the raster scan and is an implementation detail;
/// callers ordering equal-area blobs by it rely on nondeterminism.
pub fn extract_blobs(mask: &Mask) -> Vec<DetectedBlob> {
    let w = mask.width;
    let h = mask.height;
    let mut visited = vec![false; w * h];
    let mut blobs = Vec::new();
    let mut stack: Vec<(i32, i32)> = Vec::new();

    for sy in 0..h {
        for sx in 0..w {
            if visited[sy * w + sx] || !mask.is_set(sx as i32, sy as i32) {
                continue;
            }

            let mut area = 0u32;
            let mut sum_x = 0f64;
            let mut sum_y = 0f64;
            let mut boundary = Vec::new();

            visited[sy * w + sx] = true;
            stack.push((sx as i32, sy as i32));
            while let Some((x, y)) = stack.pop() {
                area += 1;
                sum_x += x as f64;
                sum_y += y as f64;

                let on_edge = [(1, 0), (-1, 0), (0, 1), (0, -1)]
                    .iter()
                    .any(|&(dx, dy)| !mask.is_set(x + dx, y + dy));
                if on_edge {
                    boundary.push((x as u32, y as u32));
                }

                for dy in -1..=1 {
                    for dx in -1..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let (nx, ny) = (x + dx, y + dy);
                        if !mask.is_set(nx, ny) {
                            continue;
                        }
                        let idx = ny as usize * w + nx as usize;
                        if !visited[idx] {
                            visited[idx] = true;
                            stack.push((nx, ny));
                        }
                    }
                }
            }

            blobs.push(DetectedBlob {
                area,
                centroid: Point2::new(sum_x / area as f64, sum_y / area as f64),
                boundary,
            });
        }
    }
    blobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn rect_mask(w: usize, h: usize, x0: usize, y0: usize, rw: usize, rh: usize) -> Mask {
        let mut m = Mask::new(w, h);
        for y in y0..y0 + rh {
            for x in x0..x0 + rw {
                m.set(x, y, true);
            }
        }
        m
    }

    #[test]
    fn single_rectangle_yields_one_blob_at_its_center() {
        let m = rect_mask(64, 48, 10, 8, 20, 12);
        let blobs = extract_blobs(&m);
        assert_eq!(blobs.len(), 1);
        let b = &blobs[0];
        assert_eq!(b.area, 20 * 12);
        assert_abs_diff_eq!(b.centroid.x, 19.5, epsilon = 1e-9);
        assert_abs_diff_eq!(b.centroid.y, 13.5, epsilon = 1e-9);
    }

    #[test]
    fn boundary_is_the_rectangle_perimeter() {
        let m = rect_mask(32, 32, 5, 5, 8, 6);
        let blobs = extract_blobs(&m);
        assert_eq!(blobs.len(), 1);
        // Perimeter pixel count of an 8x6 rectangle.
        assert_eq!(blobs[0].boundary.len(), 2 * 8 + 2 * 6 - 4);
    }

    #[test]
    fn separated_regions_are_distinct_blobs() {
        let mut m = rect_mask(64, 32, 4, 4, 6, 6);
        for y in 20..26 {
            for x in 40..50 {
                m.set(x, y, true);
            }
        }
        let blobs = extract_blobs(&m);
        assert_eq!(blobs.len(), 2);
    }

    #[test]
    fn diagonal_touch_merges_under_eight_connectivity() {
        let mut m = Mask::new(8, 8);
        m.set(2, 2, true);
        m.set(3, 3, true);
        let blobs = extract_blobs(&m);
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].area, 2);
    }
}
