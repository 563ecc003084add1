//! Responsive variant generation for a directory of images.
//!
//! Takes every supported image in the source directory and writes its
//! width/format variants to the variants directory.
//!
//! ## Output Structure
//!
//! ```text
//! images/
//! ├── David.jpg                 # 800x1599 source
//! ├── logo.png
//! └── responsive/
//!     ├── manifest.json         # Variants + srcset strings per source
//!     ├── David-480.webp        # 480x959
//!     ├── David-480.jpg
//!     ├── David-768.webp
//!     ├── David-768.jpg
//!     ├── David-800.webp        # 1200 and 1600 clamp to the native width
//!     ├── David-800.jpg
//!     └── ...
//! ```
//!
//! ## Re-runs
//!
//! Every output that already exists is left untouched, so an interrupted
//! run is resumed by running again, and a run over a complete directory
//! writes nothing. The manifest is only rewritten when its content changes.
//!
//! ## Failures
//!
//! A source that cannot be decoded or encoded is reported and skipped; the
//! batch carries on with the next file. Two sources sharing a base name
//! (`a.jpg`, `a.png`) would write the same variant files, so only the first
//! in name order is processed and the others are reported as failures. A missing input directory, an empty
//! one, or a variants directory that cannot be written aborts the run before
//! any image is touched.

use crate::imaging::{
    BackendError, GeneratedVariant, ImageBackend, OutputStatus, RustBackend, VariantConfig,
    create_variants,
};
use crate::naming::{VariantFormat, base_name, srcset};
use crate::scan::{ScanError, list_images};
use crate::types::SourceImage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Name of the manifest file within the variants directory.
pub const MANIFEST_FILENAME: &str = "manifest.json";

#[derive(Error, Debug)]
pub enum VariantsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Input directory not found: {0}")]
    MissingInputDir(PathBuf),
    #[error("No .jpg, .jpeg or .png images found in {0}")]
    NoImages(PathBuf),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a single source was skipped.
#[derive(Error, Debug)]
enum FileError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("base name `{base}` is already used by {first}")]
    DuplicateBaseName { base: String, first: String },
}

impl From<ScanError> for VariantsError {
    fn from(e: ScanError) -> Self {
        match e {
            ScanError::Io(e) => Self::Io(e),
            ScanError::MissingInputDir(p) => Self::MissingInputDir(p),
            ScanError::NoImages(p) => Self::NoImages(p),
        }
    }
}

/// Progress events emitted while a run is in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantEvent {
    Started {
        image_count: usize,
        output_dir: String,
    },
    ImageProcessed {
        /// 1-based position in the run.
        index: usize,
        file_name: String,
        dimensions: (u32, u32),
        variants: Vec<VariantInfo>,
    },
    ImageFailed {
        index: usize,
        file_name: String,
        error: String,
    },
}

/// Per-width status for progress display.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantInfo {
    pub width: u32,
    pub height: u32,
    pub webp: OutputStatus,
    pub jpeg: OutputStatus,
}

impl VariantInfo {
    fn from_variant(variant: &GeneratedVariant) -> Self {
        let status = |format| {
            variant
                .outputs
                .iter()
                .find(|o| o.format == format)
                .map(|o| o.status)
                .unwrap_or(OutputStatus::Existing)
        };
        Self {
            width: variant.width,
            height: variant.height,
            webp: status(VariantFormat::WebP),
            jpeg: status(VariantFormat::Jpeg),
        }
    }
}

/// Written to `manifest.json`: what exists for each source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantManifest {
    pub sources: Vec<SourceEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    /// Source file name within the input directory.
    pub source: String,
    pub image: SourceImage,
    pub variants: Vec<VariantEntry>,
    /// `srcset` value for a `<source type="image/webp">`.
    pub webp_srcset: String,
    /// `srcset` value for the `<img>` fallback.
    pub jpeg_srcset: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantEntry {
    pub width: u32,
    pub height: u32,
    pub webp: String,
    pub jpeg: String,
}

impl SourceEntry {
    fn new(source: String, image: SourceImage, variants: &[GeneratedVariant]) -> Self {
        let entries: Vec<VariantEntry> = variants
            .iter()
            .map(|v| VariantEntry {
                width: v.width,
                height: v.height,
                webp: v.file_name(VariantFormat::WebP).unwrap_or_default().to_string(),
                jpeg: v.file_name(VariantFormat::Jpeg).unwrap_or_default().to_string(),
            })
            .collect();
        let webp_srcset = srcset(entries.iter().map(|e| (e.webp.as_str(), e.width)));
        let jpeg_srcset = srcset(entries.iter().map(|e| (e.jpeg.as_str(), e.width)));
        Self {
            source,
            image,
            variants: entries,
            webp_srcset,
            jpeg_srcset,
        }
    }
}

/// Counters for a variants run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Output files written by this run.
    pub encoded: u32,
    /// Output files that already existed.
    pub existing: u32,
    /// Sources skipped because of an error.
    pub failed: u32,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} encoded, {} already present",
            self.encoded, self.existing
        )?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        Ok(())
    }
}

/// Outcome of [`run`].
#[derive(Debug)]
pub struct VariantsResult {
    pub manifest: VariantManifest,
    pub stats: RunStats,
}

/// Generate variants for every image in `source_dir` with the production backend.
pub fn run(
    source_dir: &Path,
    output_dir: &Path,
    config: &VariantConfig,
    events: Option<Sender<VariantEvent>>,
) -> Result<VariantsResult, VariantsError> {
    run_with_backend(&RustBackend::new(), source_dir, output_dir, config, events)
}

/// Generate variants using a specific backend (allows testing with mock).
pub fn run_with_backend(
    backend: &impl ImageBackend,
    source_dir: &Path,
    output_dir: &Path,
    config: &VariantConfig,
    events: Option<Sender<VariantEvent>>,
) -> Result<VariantsResult, VariantsError> {
    let images = list_images(source_dir)?;

    fs::create_dir_all(output_dir)?;
    ensure_writable(output_dir)?;

    let emit = |event: VariantEvent| {
        if let Some(tx) = &events {
            tx.send(event).ok();
        }
    };

    emit(VariantEvent::Started {
        image_count: images.len(),
        output_dir: output_dir.display().to_string(),
    });

    let mut manifest = VariantManifest::default();
    let mut stats = RunStats::default();
    let exists = |p: &Path| p.exists();
    let mut claimed: HashMap<String, String> = HashMap::new();

    for (i, path) in images.iter().enumerate() {
        let index = i + 1;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let outcome = claim_base_name(&mut claimed, path, &file_name)
            .and_then(|base| {
                generate_one(backend, path, output_dir, base, config, &exists)
                    .map_err(FileError::from)
            });
        match outcome {
            Ok((image, variants)) => {
                for output in variants.iter().flat_map(|v| &v.outputs) {
                    match output.status {
                        OutputStatus::Encoded => stats.encoded += 1,
                        OutputStatus::Existing => stats.existing += 1,
                    }
                }
                emit(VariantEvent::ImageProcessed {
                    index,
                    file_name: file_name.clone(),
                    dimensions: image.dimensions(),
                    variants: variants.iter().map(VariantInfo::from_variant).collect(),
                });
                manifest
                    .sources
                    .push(SourceEntry::new(file_name, image, &variants));
            }
            Err(e) => {
                stats.failed += 1;
                emit(VariantEvent::ImageFailed {
                    index,
                    file_name,
                    error: e.to_string(),
                });
            }
        }
    }

    write_manifest(output_dir, &manifest)?;
    Ok(VariantsResult { manifest, stats })
}

/// Reserve the base name of `path` for this file, or name the file that
/// already holds it.
fn claim_base_name<'a>(
    claimed: &mut HashMap<String, String>,
    path: &'a Path,
    file_name: &str,
) -> Result<&'a str, FileError> {
    let base = base_name(path)
        .ok_or_else(|| BackendError::decode(path, "file name is not valid UTF-8"))?;
    if let Some(first) = claimed.get(base) {
        return Err(FileError::DuplicateBaseName {
            base: base.to_string(),
            first: first.clone(),
        });
    }
    claimed.insert(base.to_string(), file_name.to_string());
    Ok(base)
}

fn generate_one(
    backend: &impl ImageBackend,
    path: &Path,
    output_dir: &Path,
    base: &str,
    config: &VariantConfig,
    exists: &impl Fn(&Path) -> bool,
) -> Result<(SourceImage, Vec<GeneratedVariant>), BackendError> {
    let image = backend.identify(path)?;
    let variants = create_variants(backend, path, output_dir, base, &image, config, exists)?;
    Ok((image, variants))
}

/// Fail fast when the variants directory exists but cannot be written to.
fn ensure_writable(dir: &Path) -> std::io::Result<()> {
    let scratch = dir.join(".write-check");
    fs::write(&scratch, b"")?;
    fs::remove_file(&scratch)
}

/// Write `manifest.json`, leaving the file untouched when nothing changed.
fn write_manifest(output_dir: &Path, manifest: &VariantManifest) -> Result<(), VariantsError> {
    let path = output_dir.join(MANIFEST_FILENAME);
    let json = serde_json::to_string_pretty(manifest)?;
    if fs::read_to_string(&path).is_ok_and(|existing| existing == json) {
        return Ok(());
    }
    fs::write(path, json)?;
    Ok(())
}

/// Read a previously written manifest.
pub fn load_manifest(output_dir: &Path) -> Result<VariantManifest, VariantsError> {
    let content = fs::read_to_string(output_dir.join(MANIFEST_FILENAME))?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp, jpeg_source, png_alpha_source};
    use crate::imaging::{Encoding, Quality};
    use std::sync::mpsc;
    use tempfile::TempDir;

    fn create_dummy_sources(dir: &Path, names: &[&str]) {
        fs::create_dir_all(dir).unwrap();
        for name in names {
            // The mock backend never reads the bytes
            fs::write(dir.join(name), b"").unwrap();
        }
    }

    fn config(widths: &[u32]) -> VariantConfig {
        VariantConfig {
            widths: widths.to_vec(),
            ..VariantConfig::default()
        }
    }

    #[test]
    fn run_generates_variants_for_every_image() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("images");
        let output = source.join("responsive");
        create_dummy_sources(&source, &["a.jpg", "b.png"]);

        let backend = MockBackend::with_sources(&[
            ("a.jpg", jpeg_source(1000, 500)),
            ("b.png", png_alpha_source(600, 600)),
        ]);

        let result =
            run_with_backend(&backend, &source, &output, &config(&[480, 768]), None).unwrap();

        assert_eq!(result.manifest.sources.len(), 2);
        let a = &result.manifest.sources[0];
        assert_eq!(a.source, "a.jpg");
        assert_eq!(
            a.variants.iter().map(|v| v.width).collect::<Vec<_>>(),
            vec![480, 768]
        );
        let b = &result.manifest.sources[1];
        assert_eq!(
            b.variants.iter().map(|v| v.width).collect::<Vec<_>>(),
            vec![480, 600]
        );
        assert_eq!(b.jpeg_srcset, "b-480.jpg 480w, b-600.jpg 600w");
        assert_eq!(result.stats.encoded, 8);
        assert_eq!(result.stats.failed, 0);
    }

    #[test]
    fn run_writes_manifest() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("images");
        let output = source.join("responsive");
        create_dummy_sources(&source, &["David.jpg"]);
        let backend = MockBackend::with_sources(&[("David.jpg", jpeg_source(800, 1599))]);

        let result =
            run_with_backend(&backend, &source, &output, &VariantConfig::default(), None).unwrap();

        let loaded = load_manifest(&output).unwrap();
        assert_eq!(loaded, result.manifest);
        let entry = &loaded.sources[0];
        assert_eq!(entry.variants[0].height, 959);
        assert_eq!(
            entry.webp_srcset,
            "David-480.webp 480w, David-768.webp 768w, David-800.webp 800w"
        );
    }

    #[test]
    fn run_continues_after_failed_image() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("images");
        let output = tmp.path().join("out");
        create_dummy_sources(&source, &["a.jpg", "broken.jpg", "c.jpg"]);
        let backend = MockBackend::with_sources(&[
            ("a.jpg", jpeg_source(500, 500)),
            ("c.jpg", jpeg_source(500, 500)),
        ]);

        let (tx, rx) = mpsc::channel();
        let result =
            run_with_backend(&backend, &source, &output, &config(&[480]), Some(tx)).unwrap();

        assert_eq!(result.stats.failed, 1);
        assert_eq!(
            result
                .manifest
                .sources
                .iter()
                .map(|s| s.source.as_str())
                .collect::<Vec<_>>(),
            vec!["a.jpg", "c.jpg"]
        );

        let events: Vec<VariantEvent> = rx.iter().collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(
            &events[2],
            VariantEvent::ImageFailed { index: 2, file_name, .. } if file_name == "broken.jpg"
        ));
    }

    #[test]
    fn run_rejects_second_source_with_same_base_name() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("images");
        let output = tmp.path().join("out");
        create_dummy_sources(&source, &["a.jpg", "a.png", "b.jpg"]);
        let backend = MockBackend::with_sources(&[
            ("a.jpg", jpeg_source(500, 500)),
            ("a.png", png_alpha_source(500, 500)),
            ("b.jpg", jpeg_source(500, 500)),
        ]);

        let (tx, rx) = mpsc::channel();
        let result =
            run_with_backend(&backend, &source, &output, &config(&[480]), Some(tx)).unwrap();

        assert_eq!(result.stats.failed, 1);
        assert_eq!(
            result
                .manifest
                .sources
                .iter()
                .map(|s| s.source.as_str())
                .collect::<Vec<_>>(),
            vec!["a.jpg", "b.jpg"]
        );
        // a.png never reaches the backend
        let identified: Vec<RecordedOp> = backend
            .get_operations()
            .into_iter()
            .filter(|op| matches!(op, RecordedOp::Identify(_)))
            .collect();
        assert_eq!(identified.len(), 2);

        let events: Vec<VariantEvent> = rx.iter().collect();
        assert!(matches!(
            &events[2],
            VariantEvent::ImageFailed { index: 2, file_name, error }
                if file_name == "a.png" && error.contains("a.jpg")
        ));
    }

    #[test]
    fn run_missing_input_dir_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("images");
        let output = tmp.path().join("responsive");

        let err = run_with_backend(
            &MockBackend::new(),
            &source,
            &output,
            &VariantConfig::default(),
            None,
        )
        .unwrap_err();

        assert!(matches!(err, VariantsError::MissingInputDir(_)));
        assert!(!output.exists());
    }

    #[test]
    fn run_without_images_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("images");
        let output = tmp.path().join("responsive");
        create_dummy_sources(&source, &["notes.txt"]);

        let err = run_with_backend(
            &MockBackend::new(),
            &source,
            &output,
            &VariantConfig::default(),
            None,
        )
        .unwrap_err();

        assert!(matches!(err, VariantsError::NoImages(_)));
        assert!(!output.exists());
    }

    #[test]
    fn run_output_dir_blocked_by_file_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("images");
        create_dummy_sources(&source, &["a.jpg"]);
        let output = tmp.path().join("responsive");
        fs::write(&output, b"not a directory").unwrap();

        let backend = MockBackend::with_sources(&[("a.jpg", jpeg_source(500, 500))]);
        let result = run_with_backend(&backend, &source, &output, &config(&[480]), None);

        assert!(matches!(result, Err(VariantsError::Io(_))));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn run_skips_outputs_already_on_disk() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("images");
        let output = source.join("responsive");
        create_dummy_sources(&source, &["a.jpg"]);
        fs::create_dir_all(&output).unwrap();
        fs::write(output.join("a-480.webp"), b"done").unwrap();
        fs::write(output.join("a-480.jpg"), b"done").unwrap();

        let backend = MockBackend::with_sources(&[("a.jpg", jpeg_source(1000, 500))]);
        let result =
            run_with_backend(&backend, &source, &output, &config(&[480, 768]), None).unwrap();

        assert_eq!(result.stats.existing, 2);
        assert_eq!(result.stats.encoded, 2);
        let targets = backend.rendered_targets();
        assert!(targets.iter().all(|t| t.width == 768));
        assert_eq!(fs::read(output.join("a-480.webp")).unwrap(), b"done");
    }

    #[test]
    fn run_passes_configured_encodings() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("images");
        create_dummy_sources(&source, &["a.jpg"]);
        let backend = MockBackend::with_sources(&[("a.jpg", jpeg_source(1000, 500))]);

        run_with_backend(
            &backend,
            &source,
            &tmp.path().join("out"),
            &config(&[480]),
            None,
        )
        .unwrap();

        let targets = backend.rendered_targets();
        assert_eq!(
            targets[0].encoding,
            Encoding::WebP {
                quality: Quality::new(80),
                method: 6
            }
        );
    }

    #[test]
    fn manifest_unchanged_is_not_rewritten() {
        let tmp = TempDir::new().unwrap();
        let manifest = VariantManifest::default();
        write_manifest(tmp.path(), &manifest).unwrap();
        let path = tmp.path().join(MANIFEST_FILENAME);
        let before = fs::metadata(&path).unwrap().modified().unwrap();

        std::thread::sleep(std::time::Duration::from_millis(20));
        write_manifest(tmp.path(), &manifest).unwrap();

        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), before);
    }

    #[test]
    fn run_stats_display() {
        let stats = RunStats {
            encoded: 6,
            existing: 2,
            failed: 0,
        };
        assert_eq!(stats.to_string(), "6 encoded, 2 already present");

        let stats = RunStats {
            failed: 1,
            ..stats
        };
        assert_eq!(stats.to_string(), "6 encoded, 2 already present, 1 failed");
    }
}
