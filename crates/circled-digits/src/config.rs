//! Extraction configuration.

use serde::Deserialize;

use crate::error::ExtractError;

/// How the annotation region is located in a photo.
///
/// Parsed from a configuration string exactly once, at construction; nothing
/// downstream branches on raw strings.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    FeatureHomography,
    EdgeTemplateMatch,
    CircleDetect,
}

impl Method {
    /// Case-insensitive parse; unknown names fail fast with
    /// [`ExtractError::UnsupportedMethod`] before any image is touched.
    pub fn parse(name: &str) -> Result<Self, ExtractError> {
        match name.to_ascii_lowercase().as_str() {
            "homography" => Ok(Self::FeatureHomography),
            "edgetemplate" => Ok(Self::EdgeTemplateMatch),
            "circledetect" => Ok(Self::CircleDetect),
            _ => Err(ExtractError::UnsupportedMethod {
                name: name.to_string(),
            }),
        }
    }
}

/// Engine configuration surface.
///
/// The displacement and region fields apply to the homography and
/// edge-template methods; the radius fields apply only to circle detection.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractConfig {
    pub method: String,
    pub center_displacement_x: i32,
    pub center_displacement_y: i32,
    pub region_width: u32,
    pub region_height: u32,
    pub min_radius: u32,
    pub max_radius: u32,
    /// Rescale applied to the crop before thresholding.
    pub binarize_scale: f32,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            method: "homography".to_string(),
            center_displacement_x: 0,
            center_displacement_y: 55,
            region_width: 80,
            region_height: 60,
            min_radius: 10,
            max_radius: 30,
            binarize_scale: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_known_methods_any_case() {
        assert_eq!(
            Method::parse("homography").unwrap(),
            Method::FeatureHomography
        );
        assert_eq!(
            Method::parse("edgeTemplate").unwrap(),
            Method::EdgeTemplateMatch
        );
        assert_eq!(Method::parse("CIRCLEDETECT").unwrap(), Method::CircleDetect);
    }

    #[test]
    fn parse_rejects_unknown_method() {
        let err = Method::parse("hough").unwrap_err();
        assert!(matches!(
            err,
            ExtractError::UnsupportedMethod { name } if name == "hough"
        ));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: ExtractConfig =
            serde_json::from_str(r#"{"method": "edgeTemplate", "centerDisplacementY": 40}"#)
                .unwrap();
        assert_eq!(cfg.method, "edgeTemplate");
        assert_eq!(cfg.center_displacement_y, 40);
        assert_eq!(cfg.region_width, 80);
        assert_eq!(cfg.min_radius, 10);
    }
}
