//! Locate and classify a circled numeric annotation on book-cover photos.
//!
//! A photo is aligned against a known reference artwork image (the series
//! title block), the matched rectangle is shifted and resized onto the
//! circled-digits annotation, and the cropped glyphs are classified against
//! a labeled template set by normalized cross-correlation.
//!
//! ## Quickstart
//!
//! ```no_run
//! use circled_digits::{ExtractConfig, Extractor, Template};
//! use circled_digits_core::GrayImage;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let reference = GrayImage::new(320, 200); // load the title artwork here
//! let templates: Vec<Template> = Vec::new(); // load labeled digit templates
//!
//! let config = ExtractConfig::default();
//! let engine = Extractor::new(&config, Some(&reference.as_view()), templates)?;
//!
//! let photo = GrayImage::new(1024, 768); // load a book cover photo
//! let extraction = engine.process(&photo.as_view())?;
//! println!("digits: {}", extraction.ocr.evaluated_digits);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - [`ExtractConfig`] / [`Method`]: configuration surface and method
//!   selection (parsed once, fails fast on unknown names).
//! - [`Aligner`]: the three localization strategies.
//! - [`RegionLocalizer`]: match rectangle to annotation rectangle.
//! - [`binarize`]: two-level crop for classification.
//! - [`DigitClassifier`] / [`OcrResult`]: template scoring.
//! - [`Extractor`]: the end-to-end pipeline.

mod align;
mod binarize;
mod circles;
mod classify;
mod config;
mod error;
mod extract;
mod localize;
mod sharpen;

pub use align::{Aligner, EdgeTemplateAligner, FeatureHomographyAligner};
pub use binarize::binarize;
pub use circles::CircleDetector;
pub use classify::{DigitClassifier, OcrResult, Template};
pub use config::{ExtractConfig, Method};
pub use error::ExtractError;
pub use extract::{Extraction, Extractor};
pub use localize::RegionLocalizer;
pub use sharpen::sharpen;
