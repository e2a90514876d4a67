use thiserror::Error;

use crate::catalog::Phase;

pub type Result<T> = std::result::Result<T, ScanError>;

/// Failures raised by the extraction core. All of them are local to one
/// image or one cell; none of them should abort a batch.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScanError {
    #[error("invalid grid geometry: {0}")]
    InvalidGeometry(String),

    #[error("{axis} index {index} out of bounds for {len} boundaries")]
    DescriptorOutOfBounds {
        axis: &'static str,
        index: usize,
        len: usize,
    },

    #[error("empty {axis} range: end index {end} must exceed start index {start}")]
    EmptyRange {
        axis: &'static str,
        start: usize,
        end: usize,
    },

    #[error("crop {height}x{width} at ({top}, {left}) exceeds image of {image_height}x{image_width}")]
    CropOutOfImage {
        top: u32,
        left: u32,
        height: u32,
        width: u32,
        image_height: u32,
        image_width: u32,
    },

    #[error("no candidate pixels in corner mask")]
    EmptyMask,

    #[error("invalid angle range [{min}, {max}): bounds must be finite with min below max")]
    InvalidAngleRange { min: f64, max: f64 },

    #[error("angle step must be positive, got {0}")]
    InvalidStep(f64),

    #[error("duplicate catalog cell '{0}'")]
    DuplicateCell(String),

    #[error("unknown cell '{name}'{}", .phase.map(|p| format!(" (phase {p})")).unwrap_or_default())]
    UnknownCell { name: String, phase: Option<Phase> },

    #[error("unknown phase '{0}'")]
    UnknownPhase(String),

    #[error("cannot sample {requested} images from a batch of {available}")]
    SampleTooLarge { requested: usize, available: usize },
}
