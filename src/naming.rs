//! File naming for generated outputs.
//!
//! Every variant is identified by `(base name, width, format)` and written as
//! `{base}-{width}.{ext}`:
//! - `David.jpg` at 480px → `David-480.webp`, `David-480.jpg`
//! - `hero banner.png` at 768px → `hero banner-768.webp`, `hero banner-768.jpg`
//!
//! Spaces in base names are kept as-is; HTML attributes are quoted.

use std::path::Path;

/// Output format of a generated variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariantFormat {
    /// Lossy WebP, keeps alpha.
    WebP,
    /// Progressive JPEG fallback, always opaque.
    Jpeg,
}

impl VariantFormat {
    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::WebP => "webp",
            Self::Jpeg => "jpg",
        }
    }

    /// Both sibling formats, in encoding order.
    pub fn siblings() -> [Self; 2] {
        [Self::WebP, Self::Jpeg]
    }
}

/// Base name of a source file: the file stem with the extension stripped.
///
/// Returns `None` for paths without a UTF-8 stem.
pub fn base_name(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

/// File name of one variant: `{base}-{width}.{ext}`.
pub fn variant_file_name(base: &str, width: u32, format: VariantFormat) -> String {
    format!("{}-{}.{}", base, width, format.extension())
}

/// Build a `srcset` attribute value from `(file name, width)` pairs.
///
/// ```
/// # use responsive_images::naming::srcset;
/// let set = srcset([("a-480.webp", 480), ("a-600.webp", 600)]);
/// assert_eq!(set, "a-480.webp 480w, a-600.webp 600w");
/// ```
pub fn srcset<'a>(entries: impl IntoIterator<Item = (&'a str, u32)>) -> String {
    entries
        .into_iter()
        .map(|(name, width)| format!("{} {}w", name, width))
        .collect::<Vec<_>>()
        .join(", ")
}
