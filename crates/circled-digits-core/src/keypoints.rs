//! Scale- and rotation-invariant blob keypoints with gradient descriptors.
//!
//! Detection thresholds on the determinant of the Hessian of the
//! Gaussian-smoothed image across a small scale stack. Each keypoint gets a
//! dominant gradient orientation and a 64-float descriptor built from
//! oriented gradient sums over a 4x4 subregion grid, so descriptors can be
//! compared by plain Euclidean distance.

use crate::filter::gaussian_blur_f32;
use crate::image::{sample_bilinear_f32, FloatImage, GrayImageView};

pub const DESCRIPTOR_LEN: usize = 64;
pub type Descriptor = [f32; DESCRIPTOR_LEN];

#[derive(Clone, Copy, Debug)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
    pub response: f32,
    /// Dominant gradient orientation, radians.
    pub orientation: f32,
}

/// Keypoints and their descriptors, in detection order.
#[derive(Clone, Debug, Default)]
pub struct KeypointSet {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl KeypointSet {
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// One correspondence between a reference keypoint and a photo keypoint.
/// Smaller distance means a better match.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchPair {
    pub reference_idx: usize,
    pub photo_idx: usize,
    pub distance: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct DetectorParams {
    /// Minimum scale-normalized Hessian determinant for a blob to count.
    pub response_threshold: f32,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            response_threshold: 400.0,
        }
    }
}

const SCALE_SIGMAS: [f32; 4] = [1.6, 2.4, 3.6, 5.4];
// SURF-style damping of the mixed second derivative in the determinant.
const HESSIAN_XY_WEIGHT: f32 = 0.81;

/// Detect blob keypoints and compute their descriptors.
pub fn detect_and_describe(img: &GrayImageView<'_>, params: &DetectorParams) -> KeypointSet {
    let mut set = KeypointSet::default();
    if img.width < 8 || img.height < 8 {
        return set;
    }

    let plane = FloatImage::from_gray(img);
    for &sigma in &SCALE_SIGMAS {
        let smoothed = gaussian_blur_f32(&plane, sigma);
        let response = hessian_response(&smoothed, sigma);
        for (x, y, r) in local_maxima(&response, params.response_threshold) {
            let (fx, fy) = refine_peak(&response, x, y);
            let orientation = dominant_orientation(&smoothed, fx, fy, sigma);
            let kp = Keypoint {
                x: fx,
                y: fy,
                scale: sigma,
                response: r,
                orientation,
            };
            let desc = describe(&smoothed, &kp);
            set.keypoints.push(kp);
            set.descriptors.push(desc);
        }
    }
    set
}

/// For every reference descriptor, its single nearest photo descriptor.
/// No mutual cross-check: one pair per reference keypoint.
pub fn match_nearest(reference: &KeypointSet, photo: &KeypointSet) -> Vec<MatchPair> {
    let mut out = Vec::with_capacity(reference.len());
    if photo.is_empty() {
        return out;
    }
    for (ri, rd) in reference.descriptors.iter().enumerate() {
        let mut best_idx = 0usize;
        let mut best_dist = f32::INFINITY;
        for (pi, pd) in photo.descriptors.iter().enumerate() {
            let d = descriptor_distance(rd, pd);
            if d < best_dist {
                best_dist = d;
                best_idx = pi;
            }
        }
        out.push(MatchPair {
            reference_idx: ri,
            photo_idx: best_idx,
            distance: best_dist,
        });
    }
    out
}

#[inline]
fn descriptor_distance(a: &Descriptor, b: &Descriptor) -> f32 {
    let mut acc = 0.0f32;
    for i in 0..DESCRIPTOR_LEN {
        let d = a[i] - b[i];
        acc += d * d;
    }
    acc.sqrt()
}

/// Scale-normalized determinant of the Hessian at every interior pixel.
fn hessian_response(smoothed: &FloatImage, sigma: f32) -> FloatImage {
    let mut out = FloatImage::new(smoothed.width, smoothed.height);
    let norm = sigma * sigma * sigma * sigma;
    for y in 1..smoothed.height - 1 {
        for x in 1..smoothed.width - 1 {
            let c = smoothed.at(x, y);
            let hxx = smoothed.at(x + 1, y) - 2.0 * c + smoothed.at(x - 1, y);
            let hyy = smoothed.at(x, y + 1) - 2.0 * c + smoothed.at(x, y - 1);
            let hxy = (smoothed.at(x + 1, y + 1) - smoothed.at(x - 1, y + 1)
                - smoothed.at(x + 1, y - 1)
                + smoothed.at(x - 1, y - 1))
                / 4.0;
            let det = hxx * hyy - HESSIAN_XY_WEIGHT * hxy * hxy;
            out.set(x, y, norm * det);
        }
    }
    out
}

/// Parabolic sub-pixel refinement of a local maximum along each axis.
/// `(x, y)` is an interior pixel, so the four neighbors always exist.
fn refine_peak(response: &FloatImage, x: usize, y: usize) -> (f32, f32) {
    let c = response.at(x, y);
    let dx = parabola_offset(response.at(x - 1, y), c, response.at(x + 1, y));
    let dy = parabola_offset(response.at(x, y - 1), c, response.at(x, y + 1));
    (x as f32 + dx, y as f32 + dy)
}

#[inline]
fn parabola_offset(prev: f32, center: f32, next: f32) -> f32 {
    let denom = prev - 2.0 * center + next;
    if denom.abs() < 1e-12 {
        return 0.0;
    }
    (0.5 * (prev - next) / denom).clamp(-0.5, 0.5)
}

/// Pixels that beat the threshold and all eight spatial neighbors.
/// Scan order (row-major) keeps detection order deterministic.
fn local_maxima(response: &FloatImage, threshold: f32) -> Vec<(usize, usize, f32)> {
    let mut out = Vec::new();
    for y in 1..response.height - 1 {
        for x in 1..response.width - 1 {
            let v = response.at(x, y);
            if v <= threshold {
                continue;
            }
            let is_max = (-1..=1).all(|dy: i32| {
                (-1..=1).all(|dx: i32| {
                    (dx == 0 && dy == 0)
                        || v > response.at((x as i32 + dx) as usize, (y as i32 + dy) as usize)
                })
            });
            if is_max {
                out.push((x, y, v));
            }
        }
    }
    out
}

#[inline]
fn gradient_at(smoothed: &FloatImage, x: f32, y: f32) -> (f32, f32) {
    let gx = sample_bilinear_f32(smoothed, x + 1.0, y) - sample_bilinear_f32(smoothed, x - 1.0, y);
    let gy = sample_bilinear_f32(smoothed, x, y + 1.0) - sample_bilinear_f32(smoothed, x, y - 1.0);
    (gx, gy)
}

const ORIENTATION_BINS: usize = 36;

/// Peak of a magnitude-weighted gradient orientation histogram in a
/// circular neighborhood of radius 6*sigma.
fn dominant_orientation(smoothed: &FloatImage, cx: f32, cy: f32, sigma: f32) -> f32 {
    let radius = (6.0 * sigma).ceil() as i32;
    let mut hist = [0.0f32; ORIENTATION_BINS];
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if (dx * dx + dy * dy) as f32 > (radius * radius) as f32 {
                continue;
            }
            let (gx, gy) = gradient_at(smoothed, cx + dx as f32, cy + dy as f32);
            let mag = (gx * gx + gy * gy).sqrt();
            if mag <= 1e-6 {
                continue;
            }
            let angle = gy.atan2(gx);
            let mut bin =
                ((angle + std::f32::consts::PI) / std::f32::consts::TAU * ORIENTATION_BINS as f32)
                    as usize;
            if bin >= ORIENTATION_BINS {
                bin = ORIENTATION_BINS - 1;
            }
            hist[bin] += mag;
        }
    }
    let mut best = 0usize;
    for (i, &v) in hist.iter().enumerate() {
        if v > hist[best] {
            best = i;
        }
    }
    (best as f32 + 0.5) / ORIENTATION_BINS as f32 * std::f32::consts::TAU - std::f32::consts::PI
}

const DESC_GRID: usize = 20; // samples per side
const DESC_CELLS: usize = 4; // subregions per side

/// 64-float descriptor: per 4x4 subregion the sums (dx, dy, |dx|, |dy|) of
/// oriented gradients over a rotated 20x20 sample grid, normalized to unit
/// length.
fn describe(smoothed: &FloatImage, kp: &Keypoint) -> Descriptor {
    let (sin_o, cos_o) = kp.orientation.sin_cos();
    let step = kp.scale;
    let half = DESC_GRID as f32 / 2.0;

    let mut desc = [0.0f32; DESCRIPTOR_LEN];
    let samples_per_cell = DESC_GRID / DESC_CELLS;

    for gy in 0..DESC_GRID {
        for gx in 0..DESC_GRID {
            // Sample position in the keypoint frame, then rotated to image.
            let u = (gx as f32 + 0.5 - half) * step;
            let v = (gy as f32 + 0.5 - half) * step;
            let ix = kp.x + u * cos_o - v * sin_o;
            let iy = kp.y + u * sin_o + v * cos_o;

            let (raw_gx, raw_gy) = gradient_at(smoothed, ix, iy);
            // Rotate the gradient back into the keypoint frame.
            let dx = raw_gx * cos_o + raw_gy * sin_o;
            let dy = -raw_gx * sin_o + raw_gy * cos_o;

            // Gaussian falloff toward the patch border.
            let r2 = u * u + v * v;
            let w = (-r2 / (2.0 * (half * step) * (half * step))).exp();

            let cell = (gy / samples_per_cell) * DESC_CELLS + gx / samples_per_cell;
            let base = cell * 4;
            desc[base] += w * dx;
            desc[base + 1] += w * dy;
            desc[base + 2] += w * dx.abs();
            desc[base + 3] += w * dy.abs();
        }
    }

    let norm: f32 = desc.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 1e-6 {
        for v in &mut desc {
            *v /= norm;
        }
    }
    desc
}
