//! Deterministic shift/resize from a matched rectangle to the crop
//! rectangle containing the digit annotation.

use circled_digits_core::Rect;

/// Turns the rectangle matched against the reference artwork into the final
/// annotation crop rectangle. Used after the homography and edge-template
/// methods only; circle detection targets the annotation directly.
#[derive(Clone, Copy, Debug)]
pub struct RegionLocalizer {
    ref_width: u32,
    ref_height: u32,
    dx: i32,
    dy: i32,
    out_width: u32,
    out_height: u32,
}

impl RegionLocalizer {
    pub fn new(
        ref_width: u32,
        ref_height: u32,
        dx: i32,
        dy: i32,
        out_width: u32,
        out_height: u32,
    ) -> Self {
        Self {
            ref_width,
            ref_height,
            dx,
            dy,
            out_width,
            out_height,
        }
    }

    /// Pure geometry, floor division throughout, no bounds clamping.
    ///
    /// The center is computed with the *reference* dimensions rather than the
    /// matched rectangle's, consistent with the reference's own geometry at
    /// construction time. An out-of-bounds result surfaces at crop time.
    pub fn shift_and_resize(&self, match_rect: &Rect) -> Rect {
        let center_x = (match_rect.x * 2 + self.ref_width as i32).div_euclid(2) + self.dx;
        let center_y = (match_rect.y * 2 + self.ref_height as i32).div_euclid(2) + self.dy;

        let top_left_x = center_x - (self.out_width as i32).div_euclid(2);
        let top_left_y = center_y - (self.out_height as i32).div_euclid(2);

        Rect::new(top_left_x, top_left_y, self.out_width, self.out_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_and_resize_is_pure() {
        let loc = RegionLocalizer::new(200, 120, 0, 55, 80, 60);
        let rect = Rect::new(17, 31, 444, 333); // matched size is ignored
        let a = loc.shift_and_resize(&rect);
        let b = loc.shift_and_resize(&rect);
        assert_eq!(a, b);
        assert_eq!(a, Rect::new(17 + 100 - 40, 31 + 60 + 55 - 30, 80, 60));
    }

    #[test]
    fn uses_reference_dimensions_not_match_rect() {
        let loc = RegionLocalizer::new(100, 50, 0, 0, 10, 10);
        let narrow = loc.shift_and_resize(&Rect::new(0, 0, 1, 1));
        let wide = loc.shift_and_resize(&Rect::new(0, 0, 999, 999));
        assert_eq!(narrow, wide);
    }

    #[test]
    fn floor_division_for_odd_sizes() {
        let loc = RegionLocalizer::new(7, 5, 0, 0, 9, 3);
        let out = loc.shift_and_resize(&Rect::new(0, 0, 7, 5));
        // center = (3, 2); top-left = (3 - 4, 2 - 1)
        assert_eq!(out, Rect::new(-1, 1, 9, 3));
    }

    #[test]
    fn floor_division_for_negative_centers() {
        let loc = RegionLocalizer::new(3, 3, 0, 0, 4, 4);
        let out = loc.shift_and_resize(&Rect::new(-10, -10, 3, 3));
        // center = floor(-17/2) = -9, top-left = -9 - 2 = -11
        assert_eq!(out, Rect::new(-11, -11, 4, 4));
    }
}
