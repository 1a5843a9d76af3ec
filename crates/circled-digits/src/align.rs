//! Alignment strategies: locate the reference-match rectangle in a photo.
//!
//! One enum case per method; each case owns the state precomputed from the
//! reference artwork exactly once, at construction. Queries borrow that
//! state read-only.

use log::debug;
use nalgebra::Point2;

use circled_digits_core::{
    cross_derivative, detect_and_describe, match_nearest, match_template, max_loc,
    normalize_to_unit, ransac_homography, DetectorParams, FloatImage, GrayImage, GrayImageView,
    KeypointSet, MatchPair, RansacParams, Rect,
};

use crate::circles::CircleDetector;
use crate::config::{ExtractConfig, Method};
use crate::error::ExtractError;
use crate::sharpen::sharpen;

const MIN_GOOD_MATCHES: usize = 5;
const MAX_GOOD_MATCHES: usize = 50;
const GOOD_MATCH_FRACTION: f64 = 0.3;

/// Tagged variant over the three localization methods.
pub enum Aligner {
    FeatureHomography(FeatureHomographyAligner),
    EdgeTemplateMatch(EdgeTemplateAligner),
    CircleDetect(CircleDetector),
}

impl Aligner {
    /// Build the strategy selected by the configuration string.
    ///
    /// The reference artwork is required for the homography and edge-template
    /// methods and ignored by circle detection.
    pub fn from_config(
        config: &ExtractConfig,
        reference: Option<&GrayImageView<'_>>,
    ) -> Result<Self, ExtractError> {
        let method = Method::parse(&config.method)?;
        match method {
            Method::FeatureHomography => {
                let reference = require_reference(reference)?;
                Ok(Self::FeatureHomography(FeatureHomographyAligner::new(
                    reference,
                )?))
            }
            Method::EdgeTemplateMatch => {
                let reference = require_reference(reference)?;
                Ok(Self::EdgeTemplateMatch(EdgeTemplateAligner::new(reference)?))
            }
            Method::CircleDetect => Ok(Self::CircleDetect(CircleDetector::new(
                config.min_radius,
                config.max_radius,
            ))),
        }
    }

    /// Locate the match rectangle in an already-sharpened photo.
    pub fn locate(&self, photo: &GrayImageView<'_>) -> Result<Rect, ExtractError> {
        match self {
            Self::FeatureHomography(a) => a.locate(photo),
            Self::EdgeTemplateMatch(a) => a.locate(photo),
            Self::CircleDetect(d) => d.locate(photo),
        }
    }

    /// Circle detection returns the annotation rectangle directly; the other
    /// methods need the shift/resize step afterwards.
    pub fn targets_annotation_directly(&self) -> bool {
        matches!(self, Self::CircleDetect(_))
    }

    /// Reference dimensions, when the method carries a reference.
    pub fn reference_size(&self) -> Option<(u32, u32)> {
        match self {
            Self::FeatureHomography(a) => Some((a.ref_width, a.ref_height)),
            Self::EdgeTemplateMatch(a) => Some((a.ref_width, a.ref_height)),
            Self::CircleDetect(_) => None,
        }
    }
}

fn require_reference<'a, 'b>(
    reference: Option<&'a GrayImageView<'b>>,
) -> Result<&'a GrayImageView<'b>, ExtractError> {
    let reference = reference.ok_or(ExtractError::MissingOrUnreadableImage {
        path: "<reference artwork>".to_string(),
    })?;
    if reference.width == 0 || reference.height == 0 {
        return Err(ExtractError::EmptyImage);
    }
    Ok(reference)
}

/// Keypoint matching + robust homography against the reference artwork.
pub struct FeatureHomographyAligner {
    ref_keypoints: KeypointSet,
    /// Reference corners, clockwise from top-left.
    ref_corners: [Point2<f32>; 4],
    ref_width: u32,
    ref_height: u32,
    detector: DetectorParams,
    ransac: RansacParams,
}

impl FeatureHomographyAligner {
    pub fn new(reference: &GrayImageView<'_>) -> Result<Self, ExtractError> {
        let detector = DetectorParams::default();
        let sharpened = sharpen(reference)?;
        let ref_keypoints = detect_and_describe(&sharpened.as_view(), &detector);
        debug!(
            "reference artwork: {} keypoints at threshold {}",
            ref_keypoints.len(),
            detector.response_threshold
        );

        let w = reference.width as f32;
        let h = reference.height as f32;
        let ref_corners = [
            Point2::new(0.0, 0.0),
            Point2::new(w - 1.0, 0.0),
            Point2::new(w - 1.0, h - 1.0),
            Point2::new(0.0, h - 1.0),
        ];

        Ok(Self {
            ref_keypoints,
            ref_corners,
            ref_width: reference.width as u32,
            ref_height: reference.height as u32,
            detector,
            ransac: RansacParams::default(),
        })
    }

    pub fn locate(&self, photo: &GrayImageView<'_>) -> Result<Rect, ExtractError> {
        let photo_keypoints = detect_and_describe(photo, &self.detector);

        let mut matches = match_nearest(&self.ref_keypoints, &photo_keypoints);
        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        let good = select_good_matches(&matches)?;

        let mut ref_points = Vec::with_capacity(good.len());
        let mut photo_points = Vec::with_capacity(good.len());
        for m in good {
            let rk = &self.ref_keypoints.keypoints[m.reference_idx];
            let pk = &photo_keypoints.keypoints[m.photo_idx];
            ref_points.push(Point2::new(rk.x, rk.y));
            photo_points.push(Point2::new(pk.x, pk.y));
        }

        let homography = ransac_homography(&ref_points, &photo_points, &self.ransac)
            .ok_or(ExtractError::DegenerateHomography)?;

        let transformed = self.ref_corners.map(|c| homography.apply(c));
        Rect::bounding(&transformed).ok_or(ExtractError::DegenerateHomography)
    }
}

/// The "good" prefix of distance-sorted matches:
/// `min(50, floor(0.3 * total))`, at least 5 of them.
fn select_good_matches(sorted: &[MatchPair]) -> Result<&[MatchPair], ExtractError> {
    let count = MAX_GOOD_MATCHES.min((sorted.len() as f64 * GOOD_MATCH_FRACTION).floor() as usize);
    if count < MIN_GOOD_MATCHES {
        return Err(ExtractError::InsufficientFeatureMatches { found: count });
    }
    Ok(&sorted[..count])
}

/// Normalized cross-correlation of the reference's edge response against the
/// photo's.
pub struct EdgeTemplateAligner {
    edge_template: FloatImage,
    ref_width: u32,
    ref_height: u32,
}

impl EdgeTemplateAligner {
    pub fn new(reference: &GrayImageView<'_>) -> Result<Self, ExtractError> {
        let sharpened = sharpen(reference)?;
        let edge_template = cross_derivative(&sharpened.as_view());
        Ok(Self {
            edge_template,
            ref_width: reference.width as u32,
            ref_height: reference.height as u32,
        })
    }

    pub fn locate(&self, photo: &GrayImageView<'_>) -> Result<Rect, ExtractError> {
        let photo_edges = cross_derivative(photo);
        let mut surface = match_template(&photo_edges, &self.edge_template).ok_or(
            ExtractError::out_of_bounds(
                Rect::new(0, 0, self.ref_width, self.ref_height),
                photo.width,
                photo.height,
            ),
        )?;
        normalize_to_unit(&mut surface);
        let (x, y, score) = max_loc(&surface).ok_or(ExtractError::EmptyImage)?;
        debug!("edge template peak {score:.3} at ({x}, {y})");
        Ok(Rect::new(x as i32, y as i32, self.ref_width, self.ref_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circled_digits_core::GrayImage;

    fn pair(i: usize, d: f32) -> MatchPair {
        MatchPair {
            reference_idx: i,
            photo_idx: i,
            distance: d,
        }
    }

    #[test]
    fn sixteen_matches_give_four_good_and_fail() {
        let matches: Vec<MatchPair> = (0..16).map(|i| pair(i, i as f32)).collect();
        let err = select_good_matches(&matches).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::InsufficientFeatureMatches { found: 4 }
        ));
    }

    #[test]
    fn seventeen_matches_give_five_good_and_proceed() {
        let matches: Vec<MatchPair> = (0..17).map(|i| pair(i, i as f32)).collect();
        let good = select_good_matches(&matches).unwrap();
        assert_eq!(good.len(), 5);
        // Best-distance prefix.
        assert_eq!(good[0].distance, 0.0);
        assert_eq!(good[4].distance, 4.0);
    }

    #[test]
    fn good_subset_caps_at_fifty() {
        let matches: Vec<MatchPair> = (0..400).map(|i| pair(i, i as f32)).collect();
        let good = select_good_matches(&matches).unwrap();
        assert_eq!(good.len(), 50);
    }

    #[test]
    fn factory_rejects_unknown_method() {
        let config = ExtractConfig {
            method: "sift".to_string(),
            ..ExtractConfig::default()
        };
        let reference = GrayImage::from_fn(32, 32, |x, y| ((x + y) % 256) as u8);
        let err = Aligner::from_config(&config, Some(&reference.as_view()))
            .err()
            .unwrap();
        assert!(matches!(err, ExtractError::UnsupportedMethod { .. }));
    }

    #[test]
    fn factory_requires_reference_for_homography() {
        let config = ExtractConfig::default();
        let err = Aligner::from_config(&config, None).err().unwrap();
        assert!(matches!(err, ExtractError::MissingOrUnreadableImage { .. }));
    }

    #[test]
    fn circle_detect_needs_no_reference() {
        let config = ExtractConfig {
            method: "circleDetect".to_string(),
            ..ExtractConfig::default()
        };
        let aligner = Aligner::from_config(&config, None).unwrap();
        assert!(aligner.targets_annotation_directly());
        assert_eq!(aligner.reference_size(), None);
    }
}
