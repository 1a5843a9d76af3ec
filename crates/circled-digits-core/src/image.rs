//! Row-major image buffers shared by all pipeline stages.
//!
//! Coordinates are (row, col) with the origin at the top-left corner, and
//! every stage preserves that convention.

/// Borrowed 8-bit grayscale image.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

/// Owned 8-bit grayscale image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width * height],
        }
    }

    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> u8) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn as_view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Owned single-channel f32 plane (edge responses, correlation surfaces).
#[derive(Clone, Debug)]
pub struct FloatImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl FloatImage {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        self.data[y * self.width + x] = v;
    }

    pub fn from_gray(src: &GrayImageView<'_>) -> Self {
        Self {
            width: src.width,
            height: src.height,
            data: src.data.iter().map(|&v| v as f32).collect(),
        }
    }

    /// (min, max) over the plane, or `None` when it has zero extent.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        let mut it = self.data.iter();
        let first = *it.next()?;
        let mut lo = first;
        let mut hi = first;
        for &v in it {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        Some((lo, hi))
    }
}

#[inline]
fn get_gray(src: &GrayImageView<'_>, x: i32, y: i32) -> u8 {
    if x < 0 || y < 0 || x >= src.width as i32 || y >= src.height as i32 {
        return 0;
    }
    src.data[y as usize * src.width + x as usize]
}

#[inline]
pub fn sample_bilinear(src: &GrayImageView<'_>, x: f32, y: f32) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_gray(src, x0, y0) as f32;
    let p10 = get_gray(src, x0 + 1, y0) as f32;
    let p01 = get_gray(src, x0, y0 + 1) as f32;
    let p11 = get_gray(src, x0 + 1, y0 + 1) as f32;

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

#[inline]
pub fn sample_bilinear_u8(src: &GrayImageView<'_>, x: f32, y: f32) -> u8 {
    sample_bilinear(src, x, y).clamp(0.0, 255.0) as u8
}

#[inline]
fn get_f32(src: &FloatImage, x: i32, y: i32) -> f32 {
    if src.width == 0 || src.height == 0 {
        return 0.0;
    }
    // Clamp to the nearest edge pixel: descriptor sampling near an image
    // border must not see a phantom step down to zero that the other image
    // of a matched pair does not have.
    let x = x.clamp(0, src.width as i32 - 1);
    let y = y.clamp(0, src.height as i32 - 1);
    src.data[y as usize * src.width + x as usize]
}

/// Bilinear sample of an f32 plane; coordinates outside the plane clamp to
/// the nearest edge pixel.
#[inline]
pub fn sample_bilinear_f32(src: &FloatImage, x: f32, y: f32) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let p00 = get_f32(src, x0, y0);
    let p10 = get_f32(src, x0 + 1, y0);
    let p01 = get_f32(src, x0, y0 + 1);
    let p11 = get_f32(src, x0 + 1, y0 + 1);

    let a = p00 + fx * (p10 - p00);
    let b = p01 + fx * (p11 - p01);
    a + fy * (b - a)
}

/// (min, max) intensity of a grayscale image, or `None` on zero extent.
pub fn gray_min_max(src: &GrayImageView<'_>) -> Option<(u8, u8)> {
    let mut it = src.data.iter();
    let first = *it.next()?;
    let mut lo = first;
    let mut hi = first;
    for &v in it {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    Some((lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bilinear_interpolates_between_pixels() {
        let img = GrayImage::from_fn(2, 1, |x, _| if x == 0 { 0 } else { 100 });
        let v = sample_bilinear(&img.as_view(), 0.5, 0.0);
        assert!((v - 50.0).abs() < 1e-5);
    }

    #[test]
    fn bilinear_outside_reads_zero() {
        let img = GrayImage::from_fn(2, 2, |_, _| 200);
        assert_eq!(sample_bilinear_u8(&img.as_view(), -5.0, -5.0), 0);
    }

    #[test]
    fn min_max_of_gray() {
        let img = GrayImage::from_fn(3, 1, |x, _| [7, 3, 9][x]);
        assert_eq!(gray_min_max(&img.as_view()), Some((3, 9)));
    }
}
