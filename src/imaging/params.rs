//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides which files to write) and the [`backend`](super::backend)
//! (which does the pixel work). Tests swap in a mock backend and assert on
//! these values without encoding anything.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100). Clamped on construction.
//! - [`PngCompression`]: Lossless PNG effort level (0–9).
//! - [`Encoding`]: Output codec plus its parameters.
//! - [`RenderTarget`] / [`RenderParams`]: every output to derive from one source.
//! - [`OptimizeParams`]: one in-place style re-encode bounded by a max box.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// PNG compression level, 0 (fastest) to 9 (smallest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngCompression(u8);

impl PngCompression {
    pub fn new(level: u8) -> Self {
        Self(level.min(9))
    }

    pub fn level(self) -> u8 {
        self.0
    }
}

impl Default for PngCompression {
    fn default() -> Self {
        Self(6)
    }
}

/// Codec and parameters for one output file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Encoding {
    /// Lossy WebP. `method` is libwebp's effort setting (0 fast … 6 slowest/best).
    WebP { quality: Quality, method: u8 },
    /// Progressive JPEG. Alpha is composited onto `background` first.
    Jpeg {
        quality: Quality,
        background: [u8; 3],
    },
    /// Lossless PNG, alpha preserved.
    Png { compression: PngCompression },
}

/// One output derived from a source: exact pixel size plus encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTarget {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub encoding: Encoding,
}

/// All outputs to derive from a single decode of `source`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    pub source: PathBuf,
    pub targets: Vec<RenderTarget>,
}

/// Downscale-to-fit and re-encode, used by the optimize workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    /// Final dimensions (equal to the source when it already fits the box).
    pub width: u32,
    pub height: u32,
    pub encoding: Encoding,
}
