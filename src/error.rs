//! # Error Types
//!
//! This module defines error types used throughout the etiqueta library.
//!
//! Device-level failures are recovered by the session into state changes and
//! boolean results, so [`EtiquetaError::Transport`] rarely reaches a caller.
//! [`CompositingError`] is the one failure that aborts a user action outright.

use thiserror::Error;

/// Main error type for etiqueta operations
#[derive(Debug, Error)]
pub enum EtiquetaError {
    /// Transport-level errors (device unreachable, I/O, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// An operation was requested while its guard state was not satisfied
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// Canvas could not be flattened into an image
    #[error("Compositing error: {0}")]
    Compositing(#[from] CompositingError),

    /// Image decoding or encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// Invalid configuration (device table, target, layout file)
    #[error("Config error: {0}")]
    Config(String),

    /// The session task is gone
    #[error("Session closed")]
    SessionClosed,

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the compositing pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositingError {
    /// No bounding region with this id exists on the canvas
    #[error("Bounding region '{0}' not found")]
    RegionNotFound(String),

    /// The bounding region has no area once truncated
    #[error("Bounding region '{id}' is degenerate ({width}x{height})")]
    DegenerateRegion { id: String, width: u32, height: u32 },

    /// Coordinates are not finite or the region is too large to export
    #[error("Bounding region '{0}' is out of range")]
    RegionOutOfRange(String),
}

impl From<image::ImageError> for EtiquetaError {
    fn from(e: image::ImageError) -> Self {
        EtiquetaError::Image(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compositing_error_wraps() {
        let err: EtiquetaError = CompositingError::RegionNotFound("label".into()).into();
        assert_eq!(
            err.to_string(),
            "Compositing error: Bounding region 'label' not found"
        );
    }

    #[test]
    fn test_degenerate_message() {
        let err = CompositingError::DegenerateRegion {
            id: "bbox".into(),
            width: 0,
            height: 12,
        };
        assert_eq!(err.to_string(), "Bounding region 'bbox' is degenerate (0x12)");
    }
}
