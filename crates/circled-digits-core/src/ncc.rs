//! Sliding-window normalized cross-correlation.
//!
//! Correlation is computed on zero-mean patches (the `CCOEFF_NORMED`
//! formulation), so scores live in [-1, 1] and a pixel-identical window
//! scores 1.0.

use crate::image::FloatImage;

/// Correlation surface of `templ` slid over every valid offset of `src`.
///
/// The surface has size `(src.w - templ.w + 1, src.h - templ.h + 1)`.
/// Returns `None` when the template does not fit inside the source or either
/// input has zero extent. Windows or templates with zero variance score 0.
pub fn match_template(src: &FloatImage, templ: &FloatImage) -> Option<FloatImage> {
    if templ.width == 0 || templ.height == 0 {
        return None;
    }
    if src.width < templ.width || src.height < templ.height {
        return None;
    }

    let tw = templ.width;
    let th = templ.height;
    let n = (tw * th) as f64;

    let t_mean = templ.data.iter().map(|&v| v as f64).sum::<f64>() / n;
    let t_centered: Vec<f64> = templ.data.iter().map(|&v| v as f64 - t_mean).collect();
    let t_sq: f64 = t_centered.iter().map(|v| v * v).sum();

    let out_w = src.width - tw + 1;
    let out_h = src.height - th + 1;
    let mut out = FloatImage::new(out_w, out_h);

    for oy in 0..out_h {
        for ox in 0..out_w {
            let mut w_sum = 0.0f64;
            let mut w_sq = 0.0f64;
            let mut dot = 0.0f64;
            for ty in 0..th {
                let row = (oy + ty) * src.width + ox;
                let trow = ty * tw;
                for tx in 0..tw {
                    let w = src.data[row + tx] as f64;
                    w_sum += w;
                    w_sq += w * w;
                    // sum(T' * W) == sum(T' * (W - meanW)) because sum(T') = 0
                    dot += t_centered[trow + tx] * w;
                }
            }
            let w_var = w_sq - w_sum * w_sum / n;
            let denom = (t_sq * w_var).sqrt();
            let score = if denom > 1e-12 { dot / denom } else { 0.0 };
            out.set(ox, oy, score as f32);
        }
    }
    Some(out)
}

/// Location and value of the global maximum of a score surface.
pub fn max_loc(surface: &FloatImage) -> Option<(usize, usize, f32)> {
    let mut best: Option<(usize, usize, f32)> = None;
    for y in 0..surface.height {
        for x in 0..surface.width {
            let v = surface.at(x, y);
            if best.map(|(_, _, b)| v > b).unwrap_or(true) {
                best = Some((x, y, v));
            }
        }
    }
    best
}

/// Min-max rescale of a surface into [0, 1] in place. A constant surface
/// collapses to all zeros.
pub fn normalize_to_unit(surface: &mut FloatImage) {
    let Some((lo, hi)) = surface.min_max() else {
        return;
    };
    let span = hi - lo;
    if span <= f32::EPSILON {
        surface.data.iter_mut().for_each(|v| *v = 0.0);
        return;
    }
    for v in &mut surface.data {
        *v = (*v - lo) / span;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plane(w: usize, h: usize, f: impl Fn(usize, usize) -> f32) -> FloatImage {
        let mut img = FloatImage::new(w, h);
        for y in 0..h {
            for x in 0..w {
                img.set(x, y, f(x, y));
            }
        }
        img
    }

    #[test]
    fn exact_copy_peaks_at_its_offset() {
        let templ = plane(4, 3, |x, y| ((x * 7 + y * 13) % 29) as f32);
        let src = plane(12, 10, |x, y| {
            if (3..7).contains(&x) && (2..5).contains(&y) {
                templ.at(x - 3, y - 2)
            } else {
                100.0 + ((x + y) % 2) as f32
            }
        });

        let surface = match_template(&src, &templ).expect("fits");
        let (x, y, v) = max_loc(&surface).expect("non-empty");
        assert_eq!((x, y), (3, 2));
        assert!((v - 1.0).abs() < 1e-4, "peak score {v}");
    }

    #[test]
    fn oversized_template_is_rejected() {
        let src = plane(3, 3, |_, _| 1.0);
        let templ = plane(4, 2, |_, _| 1.0);
        assert!(match_template(&src, &templ).is_none());
    }

    #[test]
    fn flat_window_scores_zero() {
        let src = plane(6, 6, |_, _| 42.0);
        let templ = plane(2, 2, |x, _| x as f32);
        let surface = match_template(&src, &templ).expect("fits");
        assert!(surface.data.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn rescale_maps_extremes_to_unit_range() {
        let mut s = plane(2, 1, |x, _| if x == 0 { -3.0 } else { 5.0 });
        normalize_to_unit(&mut s);
        assert_eq!(s.at(0, 0), 0.0);
        assert_eq!(s.at(1, 0), 1.0);
    }
}
