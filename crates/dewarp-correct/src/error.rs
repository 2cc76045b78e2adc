//! Error types for dewarp-correct

use crate::session::SessionState;
use dewarp_io::IoError;
use dewarp_transform::TransformError;
use thiserror::Error;

/// Errors surfaced by the correction engine
#[derive(Debug, Error)]
pub enum CorrectionError {
    /// The drawn segment has no slope (vertical or zero-length)
    #[error("degenerate segment: endpoints share an x coordinate or the slope is not finite")]
    DegenerateSegment,

    /// Finalize was requested with too few committed lines
    #[error("insufficient lines: {found} committed, {required} required")]
    InsufficientLines { found: usize, required: usize },

    /// Homography estimation or warping failed
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// The source image could not be read
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] IoError),

    /// The operation is not valid in the current state
    #[error("{operation} is not valid while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// Invalid or unreadable configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// Raster error while rendering
    #[error("core error: {0}")]
    Core(#[from] dewarp_core::Error),

    /// A background finalize ended without sending a result
    #[error("finalize worker exited without a result")]
    WorkerDisconnected,
}

/// Result type for correction operations
pub type CorrectionResult<T> = Result<T, CorrectionError>;
