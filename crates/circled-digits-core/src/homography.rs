//! Planar homography estimation: direct linear transform plus a
//! RANSAC wrapper for outlier-contaminated correspondence sets.

use nalgebra::{DMatrix, Matrix3, Point2, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 3x3 projective transform mapping reference-plane points to photo-plane
/// points: `p_photo ~ H * p_ref`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

/// Parameters of the robust fit.
#[derive(Clone, Copy, Debug)]
pub struct RansacParams {
    pub iterations: usize,
    /// Max reprojection error in pixels for a correspondence to count as an
    /// inlier.
    pub inlier_threshold: f32,
    /// Seed for the sampling RNG. Fixed by default so a given input always
    /// produces the same estimate.
    pub seed: u64,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            iterations: 500,
            inlier_threshold: 3.0,
            seed: 0x00d1_6175,
        }
    }
}

/// Similarity transform centering points at the origin with mean distance
/// sqrt(2) (Hartley normalization), for numerical conditioning of the DLT.
fn conditioning_transform(pts: &[Point2<f32>]) -> Matrix3<f64> {
    let n = pts.len() as f64;
    let (mut cx, mut cy) = (0.0f64, 0.0f64);
    for p in pts {
        cx += p.x as f64;
        cy += p.y as f64;
    }
    cx /= n;
    cy /= n;

    let mut mean_dist = 0.0f64;
    for p in pts {
        let dx = p.x as f64 - cx;
        let dy = p.y as f64 - cy;
        mean_dist += (dx * dx + dy * dy).sqrt();
    }
    mean_dist /= n;

    let s = if mean_dist > 1e-12 {
        2.0_f64.sqrt() / mean_dist
    } else {
        1.0
    };
    Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

fn transform_point(t: &Matrix3<f64>, p: Point2<f32>) -> Point2<f64> {
    let v = t * Vector3::new(p.x as f64, p.y as f64, 1.0);
    Point2::new(v[0] / v[2], v[1] / v[2])
}

/// Least-squares DLT fit of `dst ~ H * src` over all correspondences.
///
/// Needs at least 4 point pairs; returns `None` when the system cannot be
/// solved or the projective scale vanishes.
pub fn fit_homography(src: &[Point2<f32>], dst: &[Point2<f32>]) -> Option<Homography> {
    if src.len() != dst.len() || src.len() < 4 {
        return None;
    }

    let t_src = conditioning_transform(src);
    let t_dst = conditioning_transform(dst);

    let n = src.len();
    let mut a = DMatrix::<f64>::zeros(2 * n, 9);
    for k in 0..n {
        let p = transform_point(&t_src, src[k]);
        let q = transform_point(&t_dst, dst[k]);
        let (x, y) = (p.x, p.y);
        let (u, v) = (q.x, q.y);

        a[(2 * k, 0)] = -x;
        a[(2 * k, 1)] = -y;
        a[(2 * k, 2)] = -1.0;
        a[(2 * k, 6)] = u * x;
        a[(2 * k, 7)] = u * y;
        a[(2 * k, 8)] = u;

        a[(2 * k + 1, 3)] = -x;
        a[(2 * k + 1, 4)] = -y;
        a[(2 * k + 1, 5)] = -1.0;
        a[(2 * k + 1, 6)] = v * x;
        a[(2 * k + 1, 7)] = v * y;
        a[(2 * k + 1, 8)] = v;
    }

    // Null vector of A = right singular vector of the smallest singular value.
    let svd = a.svd(true, true);
    let vt = svd.v_t?;
    let h = vt.row(vt.nrows().checked_sub(1)?);
    let hn = Matrix3::from_row_slice(&[h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]]);

    // Undo the conditioning and fix the projective scale.
    let h_full = t_dst.try_inverse()? * hn * t_src;
    let scale = h_full[(2, 2)];
    if scale.abs() < 1e-12 {
        return None;
    }
    Some(Homography::new(h_full / scale))
}

/// Robust homography fit: repeated 4-point minimal samples, inlier counting
/// under the reprojection threshold, then a final DLT refit over the best
/// consensus set.
pub fn ransac_homography(
    src: &[Point2<f32>],
    dst: &[Point2<f32>],
    params: &RansacParams,
) -> Option<Homography> {
    if src.len() != dst.len() || src.len() < 4 {
        return None;
    }
    let n = src.len();
    let thr_sq = params.inlier_threshold * params.inlier_threshold;
    let mut rng = StdRng::seed_from_u64(params.seed);

    let mut best_inliers: Vec<usize> = Vec::new();
    for _ in 0..params.iterations {
        let sample = pick_distinct4(&mut rng, n);
        let s = sample.map(|i| src[i]);
        let d = sample.map(|i| dst[i]);
        let Some(h) = fit_homography(&s, &d) else {
            continue;
        };

        let inliers: Vec<usize> = (0..n)
            .filter(|&i| {
                let q = h.apply(src[i]);
                let dx = q.x - dst[i].x;
                let dy = q.y - dst[i].y;
                dx * dx + dy * dy <= thr_sq
            })
            .collect();

        if inliers.len() > best_inliers.len() {
            best_inliers = inliers;
            if best_inliers.len() == n {
                break;
            }
        }
    }

    if best_inliers.len() < 4 {
        return None;
    }
    let refit = |indices: &[usize]| {
        let s: Vec<Point2<f32>> = indices.iter().map(|&i| src[i]).collect();
        let d: Vec<Point2<f32>> = indices.iter().map(|&i| dst[i]).collect();
        fit_homography(&s, &d)
    };
    let mut h = refit(&best_inliers)?;

    // The refit can pull borderline correspondences back under the
    // threshold; growing the consensus and refitting settles the estimate.
    for _ in 0..2 {
        let grown: Vec<usize> = (0..n)
            .filter(|&i| {
                let q = h.apply(src[i]);
                let dx = q.x - dst[i].x;
                let dy = q.y - dst[i].y;
                dx * dx + dy * dy <= thr_sq
            })
            .collect();
        if grown.len() <= best_inliers.len() {
            break;
        }
        best_inliers = grown;
        h = refit(&best_inliers)?;
    }
    Some(h)
}

fn pick_distinct4(rng: &mut StdRng, n: usize) -> [usize; 4] {
    let mut out = [0usize; 4];
    let mut filled = 0;
    while filled < 4 {
        let c = rng.gen_range(0..n);
        if !out[..filled].contains(&c) {
            out[filled] = c;
            filled += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point2<f32>, b: Point2<f32>, tol: f32) {
        assert!(
            (a.x - b.x).abs() < tol && (a.y - b.y).abs() < tol,
            "expected ({},{}) ~ ({},{})",
            a.x,
            a.y,
            b.x,
            b.y
        );
    }

    fn ground_truth() -> Homography {
        Homography::new(Matrix3::new(
            0.9, 0.08, 40.0, //
            -0.04, 1.05, 25.0, //
            0.0007, -0.0003, 1.0,
        ))
    }

    #[test]
    fn dlt_recovers_projective_transform() {
        let truth = ground_truth();
        let src: Vec<Point2<f32>> = (0..4)
            .flat_map(|j| (0..4).map(move |i| Point2::new(i as f32 * 35.0, j as f32 * 28.0)))
            .collect();
        let dst: Vec<Point2<f32>> = src.iter().map(|&p| truth.apply(p)).collect();

        let h = fit_homography(&src, &dst).expect("fit");
        for p in [
            Point2::new(0.0_f32, 0.0),
            Point2::new(70.0, 50.0),
            Point2::new(105.0, 84.0),
        ] {
            assert_close(h.apply(p), truth.apply(p), 1e-3);
        }
    }

    #[test]
    fn ransac_survives_outlier_contamination() {
        let truth = ground_truth();
        let mut src: Vec<Point2<f32>> = (0..5)
            .flat_map(|j| (0..5).map(move |i| Point2::new(i as f32 * 30.0, j as f32 * 24.0)))
            .collect();
        let mut dst: Vec<Point2<f32>> = src.iter().map(|&p| truth.apply(p)).collect();

        // 30% gross outliers.
        for k in 0..8 {
            src.push(Point2::new(10.0 + k as f32 * 13.0, 7.0 * k as f32));
            dst.push(Point2::new(500.0 - k as f32 * 31.0, 400.0 + k as f32 * 17.0));
        }

        let h = ransac_homography(&src, &dst, &RansacParams::default()).expect("robust fit");
        for p in [Point2::new(15.0_f32, 20.0), Point2::new(110.0, 90.0)] {
            assert_close(h.apply(p), truth.apply(p), 0.1);
        }
    }

    #[test]
    fn ransac_needs_four_correspondences() {
        let pts = [Point2::new(0.0_f32, 0.0); 3];
        assert!(ransac_homography(&pts, &pts, &RansacParams::default()).is_none());
    }

    #[test]
    fn inverse_round_trips() {
        let h = ground_truth();
        let inv = h.inverse().expect("invertible");
        let p = Point2::new(33.0_f32, 71.0);
        assert_close(inv.apply(h.apply(p)), p, 1e-3);
    }
}
