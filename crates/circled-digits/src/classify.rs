//! Brute-force template scoring over a labeled template set.

use log::warn;
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use circled_digits_core::{match_template, max_loc, FloatImage, GrayImage, GrayImageView};

use crate::error::ExtractError;

/// A labeled single-channel digit template.
#[derive(Clone, Debug)]
pub struct Template {
    pub label: String,
    pub image: GrayImage,
}

/// Classification outcome: the winning label plus the full per-label score
/// map in template load order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OcrResult {
    pub evaluated_digits: String,
    scores: Vec<(String, f32)>,
}

impl OcrResult {
    /// Insert a score, overwriting the value of an already-present label
    /// while keeping its original position.
    fn insert_score(&mut self, label: &str, score: f32) {
        if let Some(entry) = self.scores.iter_mut().find(|(l, _)| l == label) {
            entry.1 = score;
        } else {
            self.scores.push((label.to_string(), score));
        }
    }

    pub fn score(&self, label: &str) -> Option<f32> {
        self.scores
            .iter()
            .find(|(l, _)| l == label)
            .map(|&(_, s)| s)
    }

    pub fn scores(&self) -> impl Iterator<Item = (&str, f32)> {
        self.scores.iter().map(|(l, s)| (l.as_str(), *s))
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

struct ScoreMap<'a>(&'a [(String, f32)]);

impl Serialize for ScoreMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, score) in self.0 {
            map.serialize_entry(label, score)?;
        }
        map.end()
    }
}

impl Serialize for OcrResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("OcrResult", 2)?;
        s.serialize_field("evaluatedDigits", &self.evaluated_digits)?;
        s.serialize_field("digits2MatchResMap", &ScoreMap(&self.scores))?;
        s.end()
    }
}

/// Classifies a crop by normalized cross-correlation against every template
/// in load order. Templates are immutable after construction; order is
/// significant for tie-breaking.
pub struct DigitClassifier {
    templates: Vec<Template>,
}

impl DigitClassifier {
    pub fn new(templates: Vec<Template>) -> Self {
        Self { templates }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Score every template against the crop.
    ///
    /// Per template the score is the global maximum of its correlation
    /// surface. The running maximum uses strict `>`, so the first template
    /// reaching the top score wins ties. A duplicate label overwrites the
    /// earlier score. A template larger than the crop scores 0.
    pub fn ocr(&self, crop: &GrayImageView<'_>) -> Result<OcrResult, ExtractError> {
        if self.templates.is_empty() {
            return Err(ExtractError::NoTemplatesLoaded);
        }

        let crop_plane = FloatImage::from_gray(crop);
        let mut res = OcrResult::default();
        let mut best = -1.0f32;

        for template in &self.templates {
            let templ_plane = FloatImage::from_gray(&template.image.as_view());
            let score = match match_template(&crop_plane, &templ_plane) {
                Some(surface) => max_loc(&surface).map(|(_, _, v)| v).unwrap_or(0.0),
                None => {
                    warn!(
                        "template '{}' ({}x{}) does not fit in crop ({}x{}), score 0",
                        template.label,
                        template.image.width,
                        template.image.height,
                        crop.width,
                        crop.height
                    );
                    0.0
                }
            };

            res.insert_score(&template.label, score);
            if score > best {
                best = score;
                res.evaluated_digits = template.label.clone();
            }
        }

        Ok(res)
    }
}
