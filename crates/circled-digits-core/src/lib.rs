//! Pixel and geometry primitives for circled-digits annotation extraction.
//!
//! This crate is intentionally small and purely pixel/geometry level. It does
//! *not* know about extraction strategies, configuration, or file I/O; those
//! live in the `circled-digits` engine crate.

mod filter;
mod gradient;
mod homography;
mod image;
mod keypoints;
mod logger;
mod ncc;
mod rect;

pub use filter::{add_weighted, gaussian_blur, gaussian_blur_f32, gaussian_kernel};
pub use gradient::{cross_derivative, sobel_x, sobel_y};
pub use homography::{fit_homography, ransac_homography, Homography, RansacParams};
pub use image::{
    gray_min_max, sample_bilinear, sample_bilinear_f32, sample_bilinear_u8, FloatImage, GrayImage,
    GrayImageView,
};
pub use keypoints::{
    detect_and_describe, match_nearest, Descriptor, DetectorParams, Keypoint, KeypointSet,
    MatchPair, DESCRIPTOR_LEN,
};
pub use logger::init_with_level;
pub use ncc::{match_template, max_loc, normalize_to_unit};
pub use rect::{crop, Rect};
