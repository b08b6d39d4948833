use nalgebra::{DMatrix, Matrix3, Point2, SymmetricEigen, Vector3};
use serde::{Deserialize, Serialize};

/// A pixel coordinate in the camera image plane.
pub type PixelPoint = Point2<f64>;

/// A planar coordinate in the robot work plane (units of the robot, e.g. mm).
pub type RobotXy = Point2<f64>;

/// One calibration pair: where a point appears in the image and where the
/// robot end effector touches it in the work plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointCorrespondence {
    pub pixel: PixelPoint,
    pub robot: RobotXy,
}

impl PointCorrespondence {
    pub fn new(pixel: (f64, f64), robot: (f64, f64)) -> Self {
        Self {
            pixel: Point2::new(pixel.0, pixel.1),
            robot: Point2::new(robot.0, robot.1),
        }
    }
}

/// Errors produced while estimating the pixel-to-robot transform.
#[derive(thiserror::Error, Debug)]
pub enum CalibrationError {
    #[error("homography estimation needs at least 4 correspondences, got {got}")]
    NotEnoughCorrespondences { got: usize },

    #[error("correspondence set is degenerate (collinear or coincident points)")]
    Degenerate,
}

/// Errors produced while applying an estimated transform to a point.
#[derive(thiserror::Error, Debug)]
pub enum MappingError {
    #[error("pixel ({x:.1},{y:.1}) maps to infinity (homogeneous scale ~ 0)")]
    PointAtInfinity { x: f64, y: f64 },
}

/// Threshold on the homogeneous scale below which a mapped point is
/// considered at infinity.
const W_EPSILON: f64 = 1e-9;

/// Relative threshold on the second-smallest eigenvalue of the normal matrix.
/// With Hartley-normalized inputs a well-posed system keeps this ratio far
/// above floating-point noise.
const DEGENERACY_TOL: f64 = 1e-10;

/// 3x3 projective transform from the camera pixel plane to the robot work
/// plane. Replaced wholesale on recalibration, never mutated in place.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    pub fn from_array(rows: [[f64; 3]; 3]) -> Self {
        Self::new(Matrix3::from_row_slice(&[
            rows[0][0], rows[0][1], rows[0][2], rows[1][0], rows[1][1], rows[1][2], rows[2][0],
            rows[2][1], rows[2][2],
        ]))
    }

    pub fn to_array(&self) -> [[f64; 3]; 3] {
        [
            [self.h[(0, 0)], self.h[(0, 1)], self.h[(0, 2)]],
            [self.h[(1, 0)], self.h[(1, 1)], self.h[(1, 2)]],
            [self.h[(2, 0)], self.h[(2, 1)], self.h[(2, 2)]],
        ]
    }

    /// Map a pixel coordinate into the robot work plane.
    ///
    /// Pure and deterministic: the same matrix and pixel always yield the
    /// same output.
    pub fn apply(&self, p: PixelPoint) -> Result<RobotXy, MappingError> {
        let v = self.h * Vector3::new(p.x, p.y, 1.0);
        let w = v[2];
        if w.abs() < W_EPSILON {
            return Err(MappingError::PointAtInfinity { x: p.x, y: p.y });
        }
        Ok(Point2::new(v[0] / w, v[1] / w))
    }
}

fn hartley_normalization(cx: f64, cy: f64, mean_dist: f64) -> Matrix3<f64> {
    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };

    Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

fn normalize_points(pts: &[Point2<f64>]) -> (Vec<Point2<f64>>, Matrix3<f64>) {
    // Hartley normalization: translate to centroid, scale so mean distance = sqrt(2)
    let n = pts.len() as f64;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for p in pts {
        cx += p.x;
        cy += p.y;
    }
    cx /= n;
    cy /= n;

    let mut mean_dist = 0.0;
    for p in pts {
        let dx = p.x - cx;
        let dy = p.y - cy;
        mean_dist += (dx * dx + dy * dy).sqrt();
    }
    mean_dist /= n;

    let t = hartley_normalization(cx, cy, mean_dist);

    let mut out = Vec::with_capacity(pts.len());
    for p in pts {
        let v = t * Vector3::new(p.x, p.y, 1.0);
        out.push(Point2::new(v[0], v[1]));
    }
    (out, t)
}

fn denormalize_homography(
    hn: Matrix3<f64>,
    t_src: Matrix3<f64>,
    t_dst: Matrix3<f64>,
) -> Option<Matrix3<f64>> {
    let t_dst_inv = t_dst.try_inverse()?;
    Some(t_dst_inv * hn * t_src)
}

fn normalize_homography(h: Matrix3<f64>) -> Option<Matrix3<f64>> {
    let s = h[(2, 2)];
    if s.abs() < 1e-12 {
        return None;
    }
    Some(h / s)
}

/// Estimate H such that: robot ~ H * pixel, from >= 4 correspondences.
///
/// Per pair (x,y) <-> (X,Y) two rows are stacked into a 2Nx9 system:
/// `[x,y,1,0,0,0,-xX,-yX,-X]` and `[0,0,0,x,y,1,-xY,-yY,-Y]`. The solution
/// is the right singular vector of the smallest singular value, obtained as
/// the smallest eigenvector of A^T A. This minimizes total algebraic error
/// in a least-squares sense; the arbitrary overall scale of the homogeneous
/// solution is divided out at apply time.
pub fn estimate_pixel_to_robot(
    correspondences: &[PointCorrespondence],
) -> Result<Homography, CalibrationError> {
    let n = correspondences.len();
    if n < 4 {
        return Err(CalibrationError::NotEnoughCorrespondences { got: n });
    }

    let pix: Vec<Point2<f64>> = correspondences.iter().map(|c| c.pixel).collect();
    let rob: Vec<Point2<f64>> = correspondences.iter().map(|c| c.robot).collect();
    let (pix_n, t_pix) = normalize_points(&pix);
    let (rob_n, t_rob) = normalize_points(&rob);

    let mut a = DMatrix::<f64>::zeros(2 * n, 9);
    for k in 0..n {
        let (x, y) = (pix_n[k].x, pix_n[k].y);
        let (bx, by) = (rob_n[k].x, rob_n[k].y);

        a[(2 * k, 0)] = x;
        a[(2 * k, 1)] = y;
        a[(2 * k, 2)] = 1.0;
        a[(2 * k, 6)] = -x * bx;
        a[(2 * k, 7)] = -y * bx;
        a[(2 * k, 8)] = -bx;

        a[(2 * k + 1, 3)] = x;
        a[(2 * k + 1, 4)] = y;
        a[(2 * k + 1, 5)] = 1.0;
        a[(2 * k + 1, 6)] = -x * by;
        a[(2 * k + 1, 7)] = -y * by;
        a[(2 * k + 1, 8)] = -by;
    }

    // Eigen-decompose A^T A: eigenvectors are the right singular vectors of A,
    // eigenvalues the squared singular values. Works uniformly for the minimal
    // 4-point case (8x9 A) and the overdetermined case.
    let gram = a.transpose() * &a;
    let eigen = SymmetricEigen::new(gram);

    let mut order: Vec<usize> = (0..9).collect();
    order.sort_by(|&i, &j| {
        eigen.eigenvalues[i]
            .partial_cmp(&eigen.eigenvalues[j])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // A well-posed system has exactly one (near-)zero singular value. A second
    // one means the null space is multi-dimensional: collinear points.
    let lambda_max = eigen.eigenvalues[order[8]].abs();
    let lambda_second = eigen.eigenvalues[order[1]].abs();
    if lambda_max < 1e-12 || lambda_second <= DEGENERACY_TOL * lambda_max {
        return Err(CalibrationError::Degenerate);
    }

    let h = eigen.eigenvectors.column(order[0]);
    let hn = Matrix3::<f64>::from_row_slice(&[h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]]);

    let h_den = denormalize_homography(hn, t_pix, t_rob)
        .and_then(normalize_homography)
        .ok_or(CalibrationError::Degenerate)?;

    Ok(Homography::new(h_den))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// The workcell seed pairs: four floor markers observed by the camera and
    /// touched by the arm.
    fn seed_pairs() -> Vec<PointCorrespondence> {
        vec![
            PointCorrespondence::new((269.0, 268.0), (340.0, 83.0)),
            PointCorrespondence::new((376.0, 491.0), (302.0, 62.0)),
            PointCorrespondence::new((835.0, 283.0), (338.0, -17.0)),
            PointCorrespondence::new((723.0, 502.0), (300.0, 0.0)),
        ]
    }

    #[test]
    fn round_trips_every_correspondence() {
        let pairs = seed_pairs();
        let h = estimate_pixel_to_robot(&pairs).expect("estimate");
        for c in &pairs {
            let mapped = h.apply(c.pixel).expect("finite");
            assert_abs_diff_eq!(mapped.x, c.robot.x, epsilon = 1e-6);
            assert_abs_diff_eq!(mapped.y, c.robot.y, epsilon = 1e-6);
        }
    }

    #[test]
    fn handles_overdetermined_sets() {
        let ground_truth = Homography::new(Matrix3::new(
            0.3, 0.02, -120.0, //
            -0.01, -0.28, 260.0, //
            0.00005, -0.00002, 1.0,
        ));

        let pairs: Vec<PointCorrespondence> = (0..3)
            .flat_map(|j| (0..3).map(move |i| (100.0 + 200.0 * i as f64, 80.0 + 150.0 * j as f64)))
            .map(|(x, y)| {
                let r = ground_truth.apply(Point2::new(x, y)).unwrap();
                PointCorrespondence::new((x, y), (r.x, r.y))
            })
            .collect();

        let estimated = estimate_pixel_to_robot(&pairs).expect("estimate");
        for p in [
            Point2::new(150.0, 100.0),
            Point2::new(400.0, 300.0),
            Point2::new(620.0, 190.0),
        ] {
            let a = estimated.apply(p).unwrap();
            let b = ground_truth.apply(p).unwrap();
            assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-6);
            assert_abs_diff_eq!(a.y, b.y, epsilon = 1e-6);
        }
    }

    #[test]
    fn rejects_fewer_than_four_pairs() {
        let pairs = &seed_pairs()[..3];
        assert!(matches!(
            estimate_pixel_to_robot(pairs),
            Err(CalibrationError::NotEnoughCorrespondences { got: 3 })
        ));
    }

    #[test]
    fn rejects_collinear_pixels() {
        let pairs: Vec<PointCorrespondence> = (0..5)
            .map(|i| PointCorrespondence::new((i as f64 * 50.0, i as f64 * 25.0), (i as f64, 0.0)))
            .collect();
        assert!(matches!(
            estimate_pixel_to_robot(&pairs),
            Err(CalibrationError::Degenerate)
        ));
    }

    #[test]
    fn apply_is_deterministic() {
        let h = estimate_pixel_to_robot(&seed_pairs()).expect("estimate");
        let p = Point2::new(512.0, 384.0);
        let first = h.apply(p).unwrap();
        for _ in 0..10 {
            assert_eq!(h.apply(p).unwrap(), first);
        }
    }

    #[test]
    fn reports_points_mapped_to_infinity() {
        // Bottom row makes w vanish along the line x + y = 100.
        let h = Homography::from_array([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.01, 0.01, -1.0]]);
        assert!(matches!(
            h.apply(Point2::new(40.0, 60.0)),
            Err(MappingError::PointAtInfinity { .. })
        ));
        assert!(h.apply(Point2::new(0.0, 0.0)).is_ok());
    }

    #[test]
    fn array_conversion_round_trips() {
        let h = Homography::from_array([[1.5, 0.2, 10.0], [0.1, 0.9, -3.0], [0.001, 0.0, 1.0]]);
        assert_eq!(Homography::from_array(h.to_array()), h);
    }
}
