//! Gradient-voting circle detection for the annotation ring.
//!
//! Edge pixels vote along their gradient direction at every radius in the
//! configured range; accumulator peaks become circle candidates, which are
//! then scored by ring contrast sampled around the candidate (annulus versus
//! its surroundings). The best-confidence candidate wins.

use log::debug;

use circled_digits_core::{sample_bilinear, sobel_x, sobel_y, GrayImageView, Rect};

use crate::error::ExtractError;

/// Minimum Sobel magnitude for a pixel to cast votes.
const EDGE_MAGNITUDE_MIN: f32 = 120.0;
/// A candidate must collect at least this fraction of the theoretical
/// perimeter vote count (one vote per perimeter edge pixel).
const MIN_SUPPORT: f32 = 0.35;
/// Minimum gray-level contrast between the ring and its surroundings.
const MIN_CONTRAST: f32 = 12.0;
const RING_SAMPLES: usize = 48;
/// Angular bins for the ring-coverage check.
const COVERAGE_BINS: usize = 36;
/// Fraction of angular bins that must hold a radially-aligned edge pixel at
/// ring distance. Straight strokes and off-radius arcs only cover a narrow
/// angular window around any candidate center, so they fall well short.
const MIN_RING_COVERAGE: f32 = 0.7;
/// Minimum |cos| between an edge gradient and the radial direction for the
/// pixel to count toward coverage.
const RADIAL_ALIGNMENT_MIN: f32 = 0.7;
/// Half-width of the radial band around the candidate circle.
const RING_BAND: f32 = 2.0;

#[derive(Clone, Copy, Debug)]
struct Candidate {
    cx: usize,
    cy: usize,
    radius: u32,
    support: f32,
    contrast: f32,
}

impl Candidate {
    fn confidence(&self) -> f32 {
        self.support * (self.contrast / 255.0)
    }
}

/// Configured by a radius range only; no reference artwork involved.
pub struct CircleDetector {
    min_radius: u32,
    max_radius: u32,
}

impl CircleDetector {
    pub fn new(min_radius: u32, max_radius: u32) -> Self {
        Self {
            min_radius: min_radius.max(2),
            max_radius: max_radius.max(min_radius.max(2)),
        }
    }

    /// Bounding rectangle of the top-ranked circle, directly usable as the
    /// annotation crop rectangle.
    pub fn locate(&self, photo: &GrayImageView<'_>) -> Result<Rect, ExtractError> {
        if photo.width == 0 || photo.height == 0 {
            return Err(ExtractError::EmptyImage);
        }

        let gx = sobel_x(photo);
        let gy = sobel_y(photo);

        // Strong-edge pixels with their unit gradient directions.
        let mut edges: Vec<(usize, usize, f32, f32)> = Vec::new();
        for y in 0..photo.height {
            for x in 0..photo.width {
                let dx = gx.at(x, y);
                let dy = gy.at(x, y);
                let mag = (dx * dx + dy * dy).sqrt();
                if mag >= EDGE_MAGNITUDE_MIN {
                    edges.push((x, y, dx / mag, dy / mag));
                }
            }
        }

        let mut best: Option<Candidate> = None;
        let mut accumulator = vec![0u32; photo.width * photo.height];

        for radius in self.min_radius..=self.max_radius {
            accumulator.iter_mut().for_each(|v| *v = 0);
            let r = radius as f32;

            // Vote both along and against the gradient so circle polarity
            // does not matter.
            for &(x, y, ux, uy) in &edges {
                for sign in [-1.0f32, 1.0] {
                    let vx = (x as f32 + sign * r * ux).round() as i32;
                    let vy = (y as f32 + sign * r * uy).round() as i32;
                    if vx >= 0
                        && vy >= 0
                        && (vx as usize) < photo.width
                        && (vy as usize) < photo.height
                    {
                        accumulator[vy as usize * photo.width + vx as usize] += 1;
                    }
                }
            }

            let Some(candidate) = self.peak_candidate(photo, &accumulator, radius) else {
                continue;
            };
            if candidate.support < MIN_SUPPORT || candidate.contrast < MIN_CONTRAST {
                continue;
            }
            let coverage =
                ring_coverage(&edges, candidate.cx as f32, candidate.cy as f32, r);
            if coverage < MIN_RING_COVERAGE {
                continue;
            }
            debug!(
                "circle candidate r={} at ({}, {}): support {:.2}, coverage {:.2}, contrast {:.1}",
                radius, candidate.cx, candidate.cy, candidate.support, coverage, candidate.contrast
            );
            if best
                .map(|b| candidate.confidence() > b.confidence())
                .unwrap_or(true)
            {
                best = Some(candidate);
            }
        }

        let best = best.ok_or(ExtractError::NoCircleFound)?;
        let r = best.radius as i32;
        Ok(Rect::new(
            best.cx as i32 - r,
            best.cy as i32 - r,
            best.radius * 2,
            best.radius * 2,
        ))
    }

    /// The strongest accumulator cell for this radius, with vote mass summed
    /// over a 3x3 neighborhood to absorb rounding spread.
    fn peak_candidate(
        &self,
        photo: &GrayImageView<'_>,
        accumulator: &[u32],
        radius: u32,
    ) -> Option<Candidate> {
        let w = photo.width;
        let h = photo.height;
        let mut best_votes = 0u32;
        let mut best_xy = None;

        for y in 1..h.saturating_sub(1) {
            for x in 1..w.saturating_sub(1) {
                let mut votes = 0u32;
                for dy in 0..3 {
                    let row = (y + dy - 1) * w + x - 1;
                    votes += accumulator[row] + accumulator[row + 1] + accumulator[row + 2];
                }
                if votes > best_votes {
                    best_votes = votes;
                    best_xy = Some((x, y));
                }
            }
        }

        let (cx, cy) = best_xy?;
        let perimeter = std::f32::consts::TAU * radius as f32;
        let support = best_votes as f32 / perimeter;
        let contrast = ring_contrast(photo, cx as f32, cy as f32, radius as f32);
        Some(Candidate {
            cx,
            cy,
            radius,
            support,
            contrast,
        })
    }
}

/// Fraction of angular bins around the candidate center that contain a
/// strong edge pixel at ring distance whose gradient points radially.
///
/// Accumulator votes alone cannot tell a circle of the candidate radius from
/// the dense edges of a much larger circle nearby; those edges sit at ring
/// distance only over a short arc, so their angular coverage stays low.
fn ring_coverage(edges: &[(usize, usize, f32, f32)], cx: f32, cy: f32, r: f32) -> f32 {
    let mut bins = [false; COVERAGE_BINS];
    for &(x, y, ux, uy) in edges {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let dist = (dx * dx + dy * dy).sqrt();
        if (dist - r).abs() > RING_BAND || dist <= f32::EPSILON {
            continue;
        }
        let alignment = (ux * dx + uy * dy) / dist;
        if alignment.abs() < RADIAL_ALIGNMENT_MIN {
            continue;
        }
        let angle = dy.atan2(dx) + std::f32::consts::PI;
        let mut bin = (angle / std::f32::consts::TAU * COVERAGE_BINS as f32) as usize;
        if bin >= COVERAGE_BINS {
            bin = COVERAGE_BINS - 1;
        }
        bins[bin] = true;
    }
    bins.iter().filter(|&&hit| hit).count() as f32 / COVERAGE_BINS as f32
}

/// Absolute difference between the mean intensity on the ring itself and the
/// mean on its inner/outer surroundings (0.7r and 1.3r).
fn ring_contrast(photo: &GrayImageView<'_>, cx: f32, cy: f32, r: f32) -> f32 {
    let mut on_ring = 0.0f32;
    let mut around = 0.0f32;
    let step = std::f32::consts::TAU / RING_SAMPLES as f32;
    for k in 0..RING_SAMPLES {
        let (sin_t, cos_t) = (k as f32 * step).sin_cos();
        on_ring += sample_bilinear(photo, cx + r * cos_t, cy + r * sin_t);
        around += sample_bilinear(photo, cx + 0.7 * r * cos_t, cy + 0.7 * r * sin_t);
        around += sample_bilinear(photo, cx + 1.3 * r * cos_t, cy + 1.3 * r * sin_t);
    }
    let n = RING_SAMPLES as f32;
    (around / (2.0 * n) - on_ring / n).abs()
}
