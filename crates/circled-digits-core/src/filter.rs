//! Separable Gaussian smoothing and saturating weighted sums.

use crate::image::{FloatImage, GrayImage, GrayImageView};

/// Normalized 1-D Gaussian taps. The radius is derived from sigma
/// (3 standard deviations per side), so callers never pick a kernel size.
pub fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (3.0 * sigma).round().max(1.0) as usize;
    let mut taps = Vec::with_capacity(2 * radius + 1);
    let denom = 2.0 * sigma * sigma;
    let mut sum = 0.0f32;
    for i in 0..=(2 * radius) {
        let d = i as f32 - radius as f32;
        let w = (-d * d / denom).exp();
        taps.push(w);
        sum += w;
    }
    for w in &mut taps {
        *w /= sum;
    }
    taps
}

#[inline]
fn reflect(i: i32, n: i32) -> i32 {
    // reflect-101: -1 -> 1, n -> n-2
    if n == 1 {
        return 0;
    }
    let mut i = i;
    while i < 0 || i >= n {
        if i < 0 {
            i = -i;
        }
        if i >= n {
            i = 2 * (n - 1) - i;
        }
    }
    i
}

fn convolve_rows(src: &FloatImage, taps: &[f32]) -> FloatImage {
    let radius = (taps.len() / 2) as i32;
    let mut out = FloatImage::new(src.width, src.height);
    let w = src.width as i32;
    for y in 0..src.height {
        for x in 0..src.width {
            let mut acc = 0.0f32;
            for (k, &t) in taps.iter().enumerate() {
                let sx = reflect(x as i32 + k as i32 - radius, w);
                acc += t * src.at(sx as usize, y);
            }
            out.set(x, y, acc);
        }
    }
    out
}

fn convolve_cols(src: &FloatImage, taps: &[f32]) -> FloatImage {
    let radius = (taps.len() / 2) as i32;
    let mut out = FloatImage::new(src.width, src.height);
    let h = src.height as i32;
    for y in 0..src.height {
        for x in 0..src.width {
            let mut acc = 0.0f32;
            for (k, &t) in taps.iter().enumerate() {
                let sy = reflect(y as i32 + k as i32 - radius, h);
                acc += t * src.at(x, sy as usize);
            }
            out.set(x, y, acc);
        }
    }
    out
}

/// Separable Gaussian blur of an f32 plane.
pub fn gaussian_blur_f32(src: &FloatImage, sigma: f32) -> FloatImage {
    let taps = gaussian_kernel(sigma);
    convolve_cols(&convolve_rows(src, &taps), &taps)
}

/// Separable Gaussian blur of a grayscale image, rounded back to u8.
pub fn gaussian_blur(src: &GrayImageView<'_>, sigma: f32) -> GrayImage {
    let blurred = gaussian_blur_f32(&FloatImage::from_gray(src), sigma);
    GrayImage {
        width: src.width,
        height: src.height,
        data: blurred
            .data
            .iter()
            .map(|&v| v.round().clamp(0.0, 255.0) as u8)
            .collect(),
    }
}

/// `alpha * a + beta * b`, rounded and saturated to u8 per pixel.
///
/// Both inputs must share dimensions; the caller guarantees that.
pub fn add_weighted(a: &GrayImageView<'_>, alpha: f32, b: &GrayImageView<'_>, beta: f32) -> GrayImage {
    debug_assert_eq!(a.width, b.width);
    debug_assert_eq!(a.height, b.height);
    let data = a
        .data
        .iter()
        .zip(b.data.iter())
        .map(|(&pa, &pb)| {
            (alpha * pa as f32 + beta * pb as f32)
                .round()
                .clamp(0.0, 255.0) as u8
        })
        .collect();
    GrayImage {
        width: a.width,
        height: a.height,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::GrayImage;

    #[test]
    fn kernel_is_normalized_and_symmetric() {
        let taps = gaussian_kernel(3.0);
        assert_eq!(taps.len(), 19); // radius 9
        let sum: f32 = taps.iter().sum();
        approx::assert_abs_diff_eq!(sum, 1.0, epsilon = 1e-5);
        for i in 0..taps.len() / 2 {
            assert!((taps[i] - taps[taps.len() - 1 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn blur_preserves_constant_images() {
        let img = GrayImage::from_fn(16, 12, |_, _| 128);
        let out = gaussian_blur(&img.as_view(), 3.0);
        assert_eq!(out.data, img.data);
    }

    #[test]
    fn add_weighted_saturates() {
        let a = GrayImage::from_fn(2, 1, |_, _| 200);
        let b = GrayImage::from_fn(2, 1, |_, _| 200);
        let out = add_weighted(&a.as_view(), 1.0, &b.as_view(), 1.0);
        assert_eq!(out.data, vec![255, 255]);
        let out = add_weighted(&a.as_view(), 0.5, &b.as_view(), -1.0);
        assert_eq!(out.data, vec![0, 0]);
    }

    #[test]
    fn reflect_101_border() {
        assert_eq!(reflect(-1, 5), 1);
        assert_eq!(reflect(-2, 5), 2);
        assert_eq!(reflect(5, 5), 3);
        assert_eq!(reflect(6, 5), 2);
        assert_eq!(reflect(2, 5), 2);
    }
}
