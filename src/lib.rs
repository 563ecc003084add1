//! # Responsive Images
//!
//! Derives responsive image variants from a directory of JPEG and PNG
//! originals, and optimizes the originals themselves without ever losing one.
//!
//! # Two Workflows
//!
//! ```text
//! variants   images/  →  images/responsive/   (WebP + JPEG per width, manifest.json)
//! optimize   images/  →  images_backup/ + images_optimized/
//! apply      images_optimized/  →  images/    (explicitly confirmed)
//! ```
//!
//! Variant generation is purely additive: it only writes files that do not
//! exist yet, and never touches a source. Optimization is split in two so the
//! destructive half (`apply`) is a separate, confirmed step that only runs
//! over files that have a verified backup.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Lists the supported images of the input directory |
//! | [`variants`] | Variants run: per-file generation, progress events, manifest |
//! | [`optimize`] | Backup + staged optimization, and the confirmed `apply` step |
//! | [`backup`] | Verified, never-overwritten backups of originals |
//! | [`imaging`] | Width planning, the backend trait, and the `image`/libwebp backend |
//! | [`naming`] | Variant file names and `srcset` strings |
//! | [`config`] | `config.toml` loading, merging, validation |
//! | [`output`] | CLI output formatting |
//! | [`types`] | Shared source image types |
//!
//! # Design Decisions
//!
//! ## Existence Is the Completion Marker
//!
//! There is no cache database. A variant file that exists is complete, because
//! every output is written to a hidden `.partial` file and renamed into place.
//! An interrupted run is resumed by simply running again. Planning takes the
//! existence check as a predicate, so tests drive it without a filesystem.
//!
//! ## Never Upscale
//!
//! Requested widths at or above the source width collapse into a single
//! native-width variant. No variant is ever wider than its source, and no
//! width is encoded twice.
//!
//! ## Two Siblings per Width
//!
//! Every width gets a lossy WebP (alpha kept) and a JPEG fallback (alpha
//! flattened onto a background color) for browsers without WebP support.
//!
//! ## Backend Trait
//!
//! Pixel work sits behind [`imaging::ImageBackend`]. Operation logic is tested
//! against a recording mock; the real backend is tested with small synthetic
//! images.

pub mod backup;
pub mod config;
pub mod imaging;
pub mod naming;
pub mod optimize;
pub mod output;
pub mod scan;
pub mod types;
pub mod variants;

#[cfg(test)]
pub(crate) mod test_helpers;
