//! Crop binarization ahead of template classification.

use circled_digits_core::{gray_min_max, sample_bilinear_u8, GrayImage, GrayImageView};

use crate::error::ExtractError;

/// Fraction of the intensity span above the minimum used as the global
/// threshold.
const THRESHOLD_FRACTION: f32 = 0.3;

/// Rescale the crop by `scale_factor` (bilinear), then apply a global
/// inverted threshold at `min + 0.3 * (max - min)`: dark glyphs map to 255,
/// background to 0. Deterministic for a fixed input.
pub fn binarize(scale_factor: f32, crop: &GrayImageView<'_>) -> Result<GrayImage, ExtractError> {
    if crop.width == 0 || crop.height == 0 || !(scale_factor > 0.0) {
        return Err(ExtractError::EmptyImage);
    }

    let out_w = ((crop.width as f32 * scale_factor).round() as usize).max(1);
    let out_h = ((crop.height as f32 * scale_factor).round() as usize).max(1);

    let scaled = if out_w == crop.width && out_h == crop.height {
        GrayImage {
            width: crop.width,
            height: crop.height,
            data: crop.data.to_vec(),
        }
    } else {
        let sx = crop.width as f32 / out_w as f32;
        let sy = crop.height as f32 / out_h as f32;
        GrayImage::from_fn(out_w, out_h, |x, y| {
            let src_x = (x as f32 + 0.5) * sx - 0.5;
            let src_y = (y as f32 + 0.5) * sy - 0.5;
            sample_bilinear_u8(crop, src_x, src_y)
        })
    };

    let (lo, hi) = gray_min_max(&scaled.as_view()).ok_or(ExtractError::EmptyImage)?;
    let threshold = lo as f32 + THRESHOLD_FRACTION * (hi - lo) as f32;

    Ok(GrayImage {
        width: scaled.width,
        height: scaled.height,
        data: scaled
            .data
            .iter()
            .map(|&v| if (v as f32) > threshold { 0 } else { 255 })
            .collect(),
    })
}
