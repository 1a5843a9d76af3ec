//! Integer rectangles and bounds-checked cropping.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::image::{GrayImage, GrayImageView};

/// Axis-aligned integer rectangle in pixel coordinates.
///
/// A rectangle may be computed outside image bounds; validity is checked only
/// by [`crop`], never clamped implicitly.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest axis-aligned rectangle containing all points.
    ///
    /// The top-left corner is floored and the bottom-right ceiled so every
    /// point lies inside. Returns `None` for an empty point set, for
    /// non-finite coordinates, or when the extent does not fit the integer
    /// representation (points mapped through a near-degenerate transform).
    pub fn bounding(points: &[Point2<f32>]) -> Option<Self> {
        let first = points.first()?;
        let mut min_x = first.x;
        let mut min_y = first.y;
        let mut max_x = first.x;
        let mut max_y = first.y;
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        if !(min_x.is_finite() && min_y.is_finite() && max_x.is_finite() && max_y.is_finite()) {
            return None;
        }
        let x = min_x.floor() as i64;
        let y = min_y.floor() as i64;
        let w = (max_x.ceil() as i64 - x).max(0);
        let h = (max_y.ceil() as i64 - y).max(0);
        if x < i32::MIN as i64
            || y < i32::MIN as i64
            || x > i32::MAX as i64
            || y > i32::MAX as i64
            || w > u32::MAX as i64
            || h > u32::MAX as i64
        {
            return None;
        }
        Some(Self::new(x as i32, y as i32, w as u32, h as u32))
    }

    /// True when the whole rectangle lies inside a `width` x `height` image.
    pub fn fits_within(&self, width: usize, height: usize) -> bool {
        self.x >= 0
            && self.y >= 0
            && (self.x as i64 + self.width as i64) <= width as i64
            && (self.y as i64 + self.height as i64) <= height as i64
    }
}

/// Copy the pixels under `rect` out of `src`.
///
/// Returns `None` when the rectangle reaches outside the image or has zero
/// extent. Out-of-bounds rectangles are a caller-visible failure, not
/// something to clamp away silently.
pub fn crop(src: &GrayImageView<'_>, rect: &Rect) -> Option<GrayImage> {
    if rect.width == 0 || rect.height == 0 || !rect.fits_within(src.width, src.height) {
        return None;
    }
    let w = rect.width as usize;
    let h = rect.height as usize;
    let mut data = Vec::with_capacity(w * h);
    for row in 0..h {
        let y = rect.y as usize + row;
        let start = y * src.width + rect.x as usize;
        data.extend_from_slice(&src.data[start..start + w]);
    }
    Some(GrayImage {
        width: w,
        height: h,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::GrayImage;

    #[test]
    fn crop_copies_expected_pixels() {
        let img = GrayImage::from_fn(4, 4, |x, y| (y * 4 + x) as u8);
        let out = crop(&img.as_view(), &Rect::new(1, 2, 2, 2)).expect("in bounds");
        assert_eq!(out.data, vec![9, 10, 13, 14]);
    }

    #[test]
    fn crop_rejects_out_of_bounds() {
        let img = GrayImage::from_fn(4, 4, |_, _| 0);
        assert!(crop(&img.as_view(), &Rect::new(3, 3, 2, 2)).is_none());
        assert!(crop(&img.as_view(), &Rect::new(-1, 0, 2, 2)).is_none());
        assert!(crop(&img.as_view(), &Rect::new(0, 0, 0, 2)).is_none());
    }

    #[test]
    fn bounding_rect_covers_all_points() {
        let pts = [
            Point2::new(3.2_f32, 1.9),
            Point2::new(-0.5, 4.0),
            Point2::new(2.0, 7.3),
        ];
        let r = Rect::bounding(&pts).expect("non-empty");
        assert_eq!(r, Rect::new(-1, 1, 5, 7));
    }

    #[test]
    fn bounding_rejects_non_finite_points() {
        let pts = [
            Point2::new(0.0_f32, 0.0),
            Point2::new(f32::INFINITY, 4.0),
        ];
        assert!(Rect::bounding(&pts).is_none());
        let pts = [Point2::new(f32::NAN, 0.0_f32), Point2::new(1.0, 1.0)];
        assert!(Rect::bounding(&pts).is_none());
    }

    #[test]
    fn bounding_rejects_unrepresentable_extents() {
        // Corners of a near-degenerate projective map blow up to huge but
        // finite coordinates; the extent no longer fits the integer rect.
        let pts = [Point2::new(-3.0e9_f32, 0.0), Point2::new(3.0e9, 1.0)];
        assert!(Rect::bounding(&pts).is_none());
    }
}
