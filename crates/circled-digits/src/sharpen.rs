//! Unsharp-mask preprocessing, applied to every image before any geometric
//! or correlation step.

use circled_digits_core::{add_weighted, gaussian_blur, GrayImage, GrayImageView};

use crate::error::ExtractError;

const SHARPEN_SIGMA: f32 = 3.0;

/// Unsharp masking: `out = 1.5*img - 0.5*blurred`, computed as two weighted
/// sums so the intermediate never overflows u8:
/// `t = 1.0*img - 0.5*blurred`, then `out = 0.5*img + 1.0*t`.
pub fn sharpen(img: &GrayImageView<'_>) -> Result<GrayImage, ExtractError> {
    if img.width == 0 || img.height == 0 {
        return Err(ExtractError::EmptyImage);
    }
    let blurred = gaussian_blur(img, SHARPEN_SIGMA);
    let t = add_weighted(img, 1.0, &blurred.as_view(), -0.5);
    Ok(add_weighted(img, 0.5, &t.as_view(), 1.0))
}
