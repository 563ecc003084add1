//! Shared types describing source images.
//!
//! A [`SourceImage`] is produced by the backend's identify step and handed to
//! both the variant generator and the optimizer. It is immutable: every run
//! identifies each file fresh.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk format of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Jpeg,
    Png,
}

impl SourceFormat {
    /// Detect the format from a file extension (case-insensitive).
    ///
    /// Returns `None` for anything other than `.jpg`, `.jpeg` and `.png`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }
}

/// Whether the decoded pixels carry an alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Opaque,
    Alpha,
}

impl ColorMode {
    pub fn has_alpha(self) -> bool {
        self == Self::Alpha
    }
}

/// Identity of a loaded source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceImage {
    pub width: u32,
    pub height: u32,
    pub color: ColorMode,
    pub format: SourceFormat,
}

impl SourceImage {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
