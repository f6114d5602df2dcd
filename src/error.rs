//! Error types for animwebp

use crate::surface::SurfaceFormat;

/// Error type for animwebp bridge operations
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// libwebp refused to build a decoder over the encoded data
    #[error("Invalid WebP source: {0}")]
    InvalidSource(&'static str),

    /// Handle was never issued, or its decoder was already deleted
    #[error("Invalid decoder handle {0:#x}")]
    InvalidHandle(u64),

    /// Surface pixel format is not 4 bytes per pixel RGBA
    #[error("Unsupported surface format: {0:?}")]
    UnsupportedFormat(SurfaceFormat),

    /// Surface dimensions differ from the animation canvas
    #[error("Surface is {width}x{height}, canvas is {expected_width}x{expected_height}")]
    DimensionMismatch {
        /// Canvas width
        expected_width: u32,
        /// Canvas height
        expected_height: u32,
        /// Surface width
        width: u32,
        /// Surface height
        height: u32,
    },

    /// Row stride cannot hold a full row of pixels
    #[error("Stride {stride} is smaller than a {min}-byte row")]
    StrideTooSmall {
        /// Surface row stride in bytes
        stride: usize,
        /// Bytes in one tightly packed row
        min: usize,
    },

    /// Destination pixel memory is shorter than the frame needs
    #[error("Surface buffer too small: need {needed} bytes, have {actual}")]
    BufferTooSmall {
        /// Bytes required
        needed: usize,
        /// Bytes available
        actual: usize,
    },

    /// Platform surface lock, unlock or info query failed
    #[error("Surface lock failed: {0}")]
    SurfaceLock(String),
}

/// Result type for animwebp operations with location tracking
pub type Result<T, E = whereat::At<Error>> = core::result::Result<T, E>;
