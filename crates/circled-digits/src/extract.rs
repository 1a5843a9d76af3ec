//! End-to-end extraction pipeline: sharpen, locate, localize, crop,
//! binarize, classify.

use circled_digits_core::{crop, GrayImage, GrayImageView, Rect};

use crate::align::Aligner;
use crate::binarize::binarize;
use crate::classify::{DigitClassifier, OcrResult, Template};
use crate::config::ExtractConfig;
use crate::error::ExtractError;
use crate::localize::RegionLocalizer;
use crate::sharpen::sharpen;

/// Per-photo pipeline output, owned by the caller.
#[derive(Clone, Debug)]
pub struct Extraction {
    /// Final annotation rectangle in photo coordinates.
    pub region: Rect,
    /// Grayscale annotation crop (as written next to the results).
    pub crop: GrayImage,
    /// Two-level crop handed to the classifier.
    pub binarized: GrayImage,
    pub ocr: OcrResult,
}

/// The extraction engine. Construction precomputes all reference-derived
/// state; `process` borrows it read-only, so the engine can serve queries
/// concurrently even though the batch driver stays sequential.
pub struct Extractor {
    aligner: Aligner,
    localizer: Option<RegionLocalizer>,
    binarize_scale: f32,
    classifier: DigitClassifier,
}

impl Extractor {
    /// Build the engine for the configured method.
    ///
    /// Fails before any photo is processed when the method name is unknown,
    /// the reference is missing or empty, or (via the first `process` call's
    /// classifier) no templates were supplied.
    pub fn new(
        config: &ExtractConfig,
        reference: Option<&GrayImageView<'_>>,
        templates: Vec<Template>,
    ) -> Result<Self, ExtractError> {
        let aligner = Aligner::from_config(config, reference)?;
        let localizer = aligner.reference_size().map(|(w, h)| {
            RegionLocalizer::new(
                w,
                h,
                config.center_displacement_x,
                config.center_displacement_y,
                config.region_width,
                config.region_height,
            )
        });
        Ok(Self {
            aligner,
            localizer,
            binarize_scale: config.binarize_scale,
            classifier: DigitClassifier::new(templates),
        })
    }

    pub fn has_templates(&self) -> bool {
        !self.classifier.is_empty()
    }

    /// Run the full pipeline on one photo.
    pub fn process(&self, photo: &GrayImageView<'_>) -> Result<Extraction, ExtractError> {
        let sharpened = sharpen(photo)?;
        let sharpened_view = sharpened.as_view();

        let match_rect = self.aligner.locate(&sharpened_view)?;
        let region = match &self.localizer {
            Some(localizer) => localizer.shift_and_resize(&match_rect),
            None => match_rect,
        };

        let crop_img = crop(&sharpened_view, &region)
            .ok_or_else(|| ExtractError::out_of_bounds(region, photo.width, photo.height))?;

        let binarized = binarize(self.binarize_scale, &crop_img.as_view())?;
        let ocr = self.classifier.ocr(&binarized.as_view())?;

        Ok(Extraction {
            region,
            crop: crop_img,
            binarized,
            ocr,
        })
    }
}
