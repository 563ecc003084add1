//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.
//! Whether an output already exists is answered by an injected predicate,
//! so planning can be tested without a filesystem.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{VariantSize, calculate_variant_sizes, fit_within};
use super::params::{Encoding, OptimizeParams, PngCompression, Quality, RenderParams, RenderTarget};
use crate::naming::{VariantFormat, variant_file_name};
use crate::types::{SourceFormat, SourceImage};
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Configuration for responsive variant generation.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantConfig {
    pub widths: Vec<u32>,
    pub webp_quality: Quality,
    /// libwebp effort, 0–6.
    pub webp_method: u8,
    pub jpeg_quality: Quality,
    /// Flatten color for the JPEG fallback of transparent sources.
    pub background: [u8; 3],
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self {
            widths: vec![480, 768, 1200, 1600],
            webp_quality: Quality::new(80),
            webp_method: 6,
            jpeg_quality: Quality::new(85),
            background: [255, 255, 255],
        }
    }
}

impl VariantConfig {
    fn encoding(&self, format: VariantFormat) -> Encoding {
        match format {
            VariantFormat::WebP => Encoding::WebP {
                quality: self.webp_quality,
                method: self.webp_method,
            },
            VariantFormat::Jpeg => Encoding::Jpeg {
                quality: self.jpeg_quality,
                background: self.background,
            },
        }
    }
}

/// What happened to one output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStatus {
    /// Newly written by this run.
    Encoded,
    /// Already on disk; left untouched.
    Existing,
}

/// One file of a variant (a WebP or a JPEG at some width).
#[derive(Debug, Clone, PartialEq)]
pub struct VariantOutput {
    pub format: VariantFormat,
    pub file_name: String,
    pub path: PathBuf,
    pub status: OutputStatus,
}

/// A planned or generated variant: one width, both sibling files.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedVariant {
    pub width: u32,
    pub height: u32,
    pub outputs: Vec<VariantOutput>,
}

impl GeneratedVariant {
    /// File name of the sibling in `format`.
    pub fn file_name(&self, format: VariantFormat) -> Option<&str> {
        self.outputs
            .iter()
            .find(|o| o.format == format)
            .map(|o| o.file_name.as_str())
    }

    fn pending(&self) -> impl Iterator<Item = &VariantOutput> {
        self.outputs
            .iter()
            .filter(|o| o.status == OutputStatus::Encoded)
    }
}

/// Plan every variant of a source without touching the backend.
///
/// Outputs the `exists` predicate reports as present are marked
/// [`OutputStatus::Existing`]; everything else is marked as to be encoded.
pub fn plan_variants(
    output_dir: &Path,
    base_name: &str,
    source: &SourceImage,
    config: &VariantConfig,
    exists: &impl Fn(&Path) -> bool,
) -> Vec<GeneratedVariant> {
    calculate_variant_sizes(source.dimensions(), &config.widths)
        .into_iter()
        .map(|VariantSize { width, height }| {
            let outputs = VariantFormat::siblings()
                .into_iter()
                .map(|format| {
                    let file_name = variant_file_name(base_name, width, format);
                    let path = output_dir.join(&file_name);
                    let status = if exists(&path) {
                        OutputStatus::Existing
                    } else {
                        OutputStatus::Encoded
                    };
                    VariantOutput {
                        format,
                        file_name,
                        path,
                        status,
                    }
                })
                .collect();
            GeneratedVariant {
                width,
                height,
                outputs,
            }
        })
        .collect()
}

/// Create the responsive variants of one source image.
///
/// Widths are clamped to the source width and deduplicated; outputs already
/// on disk are skipped. The backend is called at most once, with every
/// missing output, so the source is decoded a single time. When nothing is
/// missing the backend is not called at all.
pub fn create_variants(
    backend: &impl ImageBackend,
    source_path: &Path,
    output_dir: &Path,
    base_name: &str,
    source: &SourceImage,
    config: &VariantConfig,
    exists: &impl Fn(&Path) -> bool,
) -> Result<Vec<GeneratedVariant>> {
    let variants = plan_variants(output_dir, base_name, source, config, exists);

    let targets: Vec<RenderTarget> = variants
        .iter()
        .flat_map(|variant| {
            variant.pending().map(move |output| RenderTarget {
                output: output.path.clone(),
                width: variant.width,
                height: variant.height,
                encoding: config.encoding(output.format),
            })
        })
        .collect();

    if !targets.is_empty() {
        backend.render(&RenderParams {
            source: source_path.to_path_buf(),
            targets,
        })?;
    }

    Ok(variants)
}

/// Configuration for full-corpus optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizeConfig {
    /// Bounding box (width, height); larger images are shrunk to fit.
    pub max_box: (u32, u32),
    pub jpeg_quality: Quality,
    pub png_compression: PngCompression,
    pub background: [u8; 3],
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            max_box: (1920, 1920),
            jpeg_quality: Quality::new(85),
            png_compression: PngCompression::default(),
            background: [255, 255, 255],
        }
    }
}

/// Plan an optimize operation without executing it.
///
/// The output keeps the source's own format: JPEG stays JPEG at the
/// configured quality, PNG stays PNG at the configured compression level.
pub fn plan_optimize(
    source_path: &Path,
    output_path: &Path,
    source: &SourceImage,
    config: &OptimizeConfig,
) -> OptimizeParams {
    let (width, height) = fit_within(source.dimensions(), config.max_box);
    let encoding = match source.format {
        SourceFormat::Jpeg => Encoding::Jpeg {
            quality: config.jpeg_quality,
            background: config.background,
        },
        SourceFormat::Png => Encoding::Png {
            compression: config.png_compression,
        },
    };

    OptimizeParams {
        source: source_path.to_path_buf(),
        output: output_path.to_path_buf(),
        width,
        height,
        encoding,
    }
}

/// Optimize one image into `output_path`. Returns the written dimensions.
pub fn optimize_image(
    backend: &impl ImageBackend,
    source_path: &Path,
    output_path: &Path,
    source: &SourceImage,
    config: &OptimizeConfig,
) -> Result<(u32, u32)> {
    let params = plan_optimize(source_path, output_path, source, config);
    backend.optimize(&params)?;
    Ok((params.width, params.height))
}
