//! Error types for dewarp-transform

use thiserror::Error;

/// Errors that can occur during estimation and warping
#[derive(Debug, Error)]
pub enum TransformError {
    /// Core library error
    #[error("core error: {0}")]
    Core(#[from] dewarp_core::Error),

    /// Invalid transformation parameters
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Fewer than four correspondences
    #[error("insufficient points: need at least 4 correspondences, got {got}")]
    InsufficientPoints { got: usize },

    /// The correspondences do not determine a unique non-singular homography
    #[error("singular system: correspondences are degenerate")]
    SingularSystem,

    /// Singular matrix (non-invertible)
    #[error("singular transformation matrix")]
    SingularMatrix,

    /// The warp could not be performed
    #[error("warp failed: {0}")]
    WarpFailure(String),

    /// The operation was cancelled
    #[error("operation cancelled")]
    Cancelled,
}

/// Result type for transform operations
pub type TransformResult<T> = Result<T, TransformError>;
