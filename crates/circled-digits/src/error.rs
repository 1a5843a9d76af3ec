use circled_digits_core::Rect;

/// Everything the extraction pipeline can fail with.
///
/// Setup failures (unreadable reference, unsupported method, missing
/// templates) abort a run before any photo is processed; per-photo failures
/// are reported by the caller and the batch continues.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error("image has zero extent")]
    EmptyImage,

    #[error("cannot load or read image {path}")]
    MissingOrUnreadableImage { path: String },

    #[error("unable to find enough ({found} < 5) good matches for computing the homography")]
    InsufficientFeatureMatches { found: usize },

    #[error("homography estimation failed or produced a singular transform")]
    DegenerateHomography,

    #[error("no circle candidate cleared the confidence threshold")]
    NoCircleFound,

    #[error("rectangle ({x}, {y}, {width}x{height}) exceeds source extents {src_width}x{src_height}")]
    OutOfBoundsCrop {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        src_width: usize,
        src_height: usize,
    },

    #[error("no digit templates loaded")]
    NoTemplatesLoaded,

    #[error("unsupported extraction method '{name}'")]
    UnsupportedMethod { name: String },
}

impl ExtractError {
    pub(crate) fn out_of_bounds(rect: Rect, src_width: usize, src_height: usize) -> Self {
        Self::OutOfBoundsCrop {
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            src_width,
            src_height,
        }
    }
}
