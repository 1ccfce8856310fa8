//! Four-point planar homography.
//!
//! With `h33` fixed to 1 the eight remaining parameters follow from the four
//! correspondences as an 8x8 linear system, solved by LU decomposition with
//! partial pivoting (Gaussian elimination). Both point sets are first moved to
//! a centroid-at-origin, mean-distance-sqrt(2) frame so the singularity test
//! does not depend on the coordinate scale.

use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HomographyError {
    /// Degenerate correspondences (e.g. three collinear points).
    #[error("homography system is singular")]
    Singular,
    /// Inputs or solution contain NaN/inf.
    #[error("homography is not finite")]
    NonFinite,
}

/// Project a point through `h`: `H * [x, y, 1]^T` dehomogenized.
///
/// Returns NaN coordinates when the point maps to infinity.
pub fn homography_project(h: &Matrix3<f64>, p: [f64; 2]) -> [f64; 2] {
    let v = h * Vector3::new(p[0], p[1], 1.0);
    if v[2].abs() < 1e-15 {
        return [f64::NAN, f64::NAN];
    }
    [v[0] / v[2], v[1] / v[2]]
}

/// Pivot threshold of the normalized system; below it the points are degenerate.
const SINGULAR_DET: f64 = 1e-12;

/// Similarity `T` mapping `pts` to centroid 0 and mean distance sqrt(2).
fn normalizing_transform(pts: &[[f64; 2]; 4]) -> Result<Matrix3<f64>, HomographyError> {
    let cx = pts.iter().map(|p| p[0]).sum::<f64>() / 4.0;
    let cy = pts.iter().map(|p| p[1]).sum::<f64>() / 4.0;
    let mean_dist = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / 4.0;
    if !(mean_dist.is_finite() && mean_dist > 0.0) {
        return Err(HomographyError::Singular);
    }
    let s = std::f64::consts::SQRT_2 / mean_dist;
    Ok(Matrix3::new(
        s, 0.0, -s * cx, //
        0.0, s, -s * cy, //
        0.0, 0.0, 1.0,
    ))
}

fn apply(t: &Matrix3<f64>, p: [f64; 2]) -> [f64; 2] {
    [
        t[(0, 0)] * p[0] + t[(0, 2)],
        t[(1, 1)] * p[1] + t[(1, 2)],
    ]
}

/// Solve the 8x8 system for already normalized correspondences.
fn solve_four_point(
    src: &[[f64; 2]; 4],
    dst: &[[f64; 2]; 4],
) -> Result<Matrix3<f64>, HomographyError> {
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();
    for i in 0..4 {
        let [x, y] = src[i];
        let [u, v] = dst[i];
        let r = 2 * i;
        // u = (h11 x + h12 y + h13) / (h31 x + h32 y + 1)
        a[(r, 0)] = x;
        a[(r, 1)] = y;
        a[(r, 2)] = 1.0;
        a[(r, 6)] = -x * u;
        a[(r, 7)] = -y * u;
        b[r] = u;
        // v = (h21 x + h22 y + h23) / (h31 x + h32 y + 1)
        a[(r + 1, 3)] = x;
        a[(r + 1, 4)] = y;
        a[(r + 1, 5)] = 1.0;
        a[(r + 1, 6)] = -x * v;
        a[(r + 1, 7)] = -y * v;
        b[r + 1] = v;
    }

    let lu = a.lu();
    if lu.determinant().abs() < SINGULAR_DET {
        return Err(HomographyError::Singular);
    }
    let hv = lu.solve(&b).ok_or(HomographyError::Singular)?;
    Ok(Matrix3::new(
        hv[0], hv[1], hv[2], //
        hv[3], hv[4], hv[5], //
        hv[6], hv[7], 1.0,
    ))
}

/// Homography `H` with `dst[i] ≈ project(H, src[i])` from exactly four pairs.
///
/// The result is scaled so that `h33 = 1`.
pub fn estimate_homography(
    src: &[[f64; 2]; 4],
    dst: &[[f64; 2]; 4],
) -> Result<Matrix3<f64>, HomographyError> {
    let all_finite = src
        .iter()
        .chain(dst.iter())
        .all(|p| p[0].is_finite() && p[1].is_finite());
    if !all_finite {
        return Err(HomographyError::NonFinite);
    }

    let t_src = normalizing_transform(src)?;
    let t_dst = normalizing_transform(dst)?;
    let src_n = src.map(|p| apply(&t_src, p));
    let dst_n = dst.map(|p| apply(&t_dst, p));
    let h_n = solve_four_point(&src_n, &dst_n)?;

    let t_dst_inv = t_dst.try_inverse().ok_or(HomographyError::Singular)?;
    let h = t_dst_inv * h_n * t_src;
    let h33 = h[(2, 2)];
    if !h33.is_finite() || h33.abs() < f64::EPSILON {
        return Err(HomographyError::Singular);
    }
    let h = h / h33;
    if h.iter().any(|v| !v.is_finite()) {
        return Err(HomographyError::NonFinite);
    }
    Ok(h)
}

/// Inverse of `h`, or [`HomographyError::Singular`].
pub fn invert_homography(h: &Matrix3<f64>) -> Result<Matrix3<f64>, HomographyError> {
    let inv = h.try_inverse().ok_or(HomographyError::Singular)?;
    if inv.iter().any(|v| !v.is_finite()) {
        return Err(HomographyError::NonFinite);
    }
    Ok(inv)
}

pub(crate) fn matrix3_to_array(m: &Matrix3<f64>) -> [[f64; 3]; 3] {
    [
        [m[(0, 0)], m[(0, 1)], m[(0, 2)]],
        [m[(1, 0)], m[(1, 1)], m[(1, 2)]],
        [m[(2, 0)], m[(2, 1)], m[(2, 2)]],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn reproj_error(h: &Matrix3<f64>, src: [f64; 2], dst: [f64; 2]) -> f64 {
        let p = homography_project(h, src);
        ((p[0] - dst[0]).powi(2) + (p[1] - dst[1]).powi(2)).sqrt()
    }

    #[test]
    fn identity_correspondences_give_identity() {
        let pts = [[0.0, 0.0], [100.0, 0.0], [0.0, 100.0], [100.0, 100.0]];
        let h = estimate_homography(&pts, &pts).unwrap();
        approx::assert_abs_diff_eq!(h, Matrix3::identity(), epsilon = 1e-9);
    }

    #[test]
    fn maps_random_quads_onto_targets() {
        let mut rng = StdRng::seed_from_u64(7);
        let dst = [[38.0, 38.0], [574.0, 38.0], [38.0, 754.0], [574.0, 754.0]];
        for _ in 0..200 {
            let src = [
                [rng.gen_range(0.0..200.0), rng.gen_range(0.0..200.0)],
                [rng.gen_range(600.0..800.0), rng.gen_range(0.0..200.0)],
                [rng.gen_range(0.0..200.0), rng.gen_range(800.0..1000.0)],
                [rng.gen_range(600.0..800.0), rng.gen_range(800.0..1000.0)],
            ];
            let h = estimate_homography(&src, &dst).unwrap();
            for i in 0..4 {
                assert!(reproj_error(&h, src[i], dst[i]) < 0.5);
            }
            let inv = invert_homography(&h).unwrap();
            for i in 0..4 {
                assert!(reproj_error(&inv, dst[i], src[i]) < 0.5);
            }
        }
    }

    #[test]
    fn collinear_points_are_singular() {
        let src = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        let dst = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        assert_eq!(
            estimate_homography(&src, &dst),
            Err(HomographyError::Singular)
        );
    }

    #[test]
    fn small_and_large_coordinates_are_not_singular() {
        let unit = [[0.0, 0.0], [1.0, 0.1], [0.05, 1.2], [1.1, 1.0]];
        let dst = [[38.0, 38.0], [574.0, 38.0], [38.0, 754.0], [574.0, 754.0]];
        for scale in [1e-4, 1e-2, 1.0, 1e4] {
            let src = unit.map(|p| [p[0] * scale, p[1] * scale]);
            let h = estimate_homography(&src, &dst).unwrap();
            approx::assert_relative_eq!(h[(2, 2)], 1.0);
            for i in 0..4 {
                assert!(reproj_error(&h, src[i], dst[i]) < 1e-6, "scale {scale}");
            }
            let back = estimate_homography(&dst, &src).unwrap();
            for i in 0..4 {
                assert!(reproj_error(&back, dst[i], src[i]) < 1e-6 * scale.max(1.0));
            }
        }
    }

    #[test]
    fn repeated_point_is_singular() {
        let src = [[5.0, 5.0]; 4];
        let dst = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        assert_eq!(
            estimate_homography(&src, &dst),
            Err(HomographyError::Singular)
        );
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let src = [[f64::NAN, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let dst = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        assert_eq!(
            estimate_homography(&src, &dst),
            Err(HomographyError::NonFinite)
        );
    }
}
