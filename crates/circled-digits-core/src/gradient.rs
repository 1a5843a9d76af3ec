//! First-order derivative responses.

use crate::image::{FloatImage, GrayImageView};

#[inline]
fn px(src: &GrayImageView<'_>, x: i32, y: i32) -> f32 {
    // reflect-101 border
    let rx = if x < 0 {
        -x
    } else if x >= src.width as i32 {
        2 * (src.width as i32 - 1) - x
    } else {
        x
    };
    let ry = if y < 0 {
        -y
    } else if y >= src.height as i32 {
        2 * (src.height as i32 - 1) - y
    } else {
        y
    };
    src.data[ry as usize * src.width + rx as usize] as f32
}

/// Combined horizontal+vertical first-order response: the 3x3 cross
/// derivative, the separable product of a [-1, 0, 1] tap in each direction.
/// Fires on corners and diagonal structure, which is what makes the edge
/// template discriminative.
pub fn cross_derivative(src: &GrayImageView<'_>) -> FloatImage {
    let mut out = FloatImage::new(src.width, src.height);
    for y in 0..src.height as i32 {
        for x in 0..src.width as i32 {
            let v = px(src, x + 1, y + 1) - px(src, x - 1, y + 1) - px(src, x + 1, y - 1)
                + px(src, x - 1, y - 1);
            out.set(x as usize, y as usize, v);
        }
    }
    out
}

/// Sobel horizontal derivative (smoothing [1,2,1] across rows).
pub fn sobel_x(src: &GrayImageView<'_>) -> FloatImage {
    let mut out = FloatImage::new(src.width, src.height);
    for y in 0..src.height as i32 {
        for x in 0..src.width as i32 {
            let v = (px(src, x + 1, y - 1) - px(src, x - 1, y - 1))
                + 2.0 * (px(src, x + 1, y) - px(src, x - 1, y))
                + (px(src, x + 1, y + 1) - px(src, x - 1, y + 1));
            out.set(x as usize, y as usize, v);
        }
    }
    out
}

/// Sobel vertical derivative (smoothing [1,2,1] across columns).
pub fn sobel_y(src: &GrayImageView<'_>) -> FloatImage {
    let mut out = FloatImage::new(src.width, src.height);
    for y in 0..src.height as i32 {
        for x in 0..src.width as i32 {
            let v = (px(src, x - 1, y + 1) - px(src, x - 1, y - 1))
                + 2.0 * (px(src, x, y + 1) - px(src, x, y - 1))
                + (px(src, x + 1, y + 1) - px(src, x + 1, y - 1));
            out.set(x as usize, y as usize, v);
        }
    }
    out
}
