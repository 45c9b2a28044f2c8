//! Error types for the motion core.
//!
//! Nothing on the per-tick path returns these: not-ready frames, size
//! changes and out-of-range offsets are absorbed by the detector.  They are
//! raised while building configuration and loading frames from disk.

use std::path::PathBuf;

/// Result alias for motion-core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A pixel buffer whose length is not `width × height × 4`.
    #[error("frame buffer of {len} bytes does not match {width}x{height} RGBA")]
    FrameShape { width: usize, height: usize, len: usize },

    /// A mapping curve whose saturation point does not lie above the floor.
    #[error("invalid mapping curve: {0}")]
    InvalidCurve(String),

    /// A sampling stride of zero.
    #[error("sampling stride must be at least 1")]
    ZeroStride,

    #[error("failed to load image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
