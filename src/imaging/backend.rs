//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations every backend must
//! support: identify, render, and optimize.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate plus libwebp for lossy WebP.

use super::params::{OptimizeParams, RenderParams};
use crate::types::SourceImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("Failed to encode {path}: {reason}")]
    Encode { path: String, reason: String },
}

impl BackendError {
    pub(crate) fn decode(path: &Path, reason: impl ToString) -> Self {
        Self::Decode {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn encode(path: &Path, reason: impl ToString) -> Self {
        Self::Encode {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Trait for image processing backends.
///
/// Operation logic in [`operations`](super::operations) is written against
/// this trait, so tests can record the planned work with a mock instead of
/// encoding real pixels.
pub trait ImageBackend {
    /// Read dimensions, color mode and format of a source image.
    fn identify(&self, path: &Path) -> Result<SourceImage, BackendError>;

    /// Decode `params.source` once and write every target.
    fn render(&self, params: &RenderParams) -> Result<(), BackendError>;

    /// Downscale-to-fit and re-encode a single image.
    fn optimize(&self, params: &OptimizeParams) -> Result<(), BackendError>;
}
