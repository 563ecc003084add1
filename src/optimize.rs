//! Backup-then-replace optimization.
//!
//! Two separate steps, so nothing destructive happens by accident:
//!
//! 1. [`optimize`] backs up every original verbatim, then writes a
//!    downscaled, re-encoded copy into a staging directory. Originals are
//!    never written.
//! 2. [`apply`] copies the staged files over the originals. It needs an
//!    explicit [`Confirmation`] and skips any file whose original has no
//!    backup, or has changed since the backup was taken.
//!
//! ```text
//! site/
//! ├── images/              # originals (replaced by apply)
//! ├── images_backup/       # verbatim copies, written once
//! └── images_optimized/    # staging, rewritten by every optimize run
//! ```

use crate::backup::{
    BackupError, BackupOutcome, backup_path, covered_by_backup, ensure_backup, is_backed_up,
};
use crate::imaging::{BackendError, ImageBackend, OptimizeConfig, RustBackend, optimize_image};
use crate::scan::{ScanError, list_images};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Input directory not found: {0}")]
    MissingInputDir(PathBuf),
    #[error("No .jpg, .jpeg or .png images found in {0}")]
    NoImages(PathBuf),
    #[error("Output directory must differ from the input directory: {0}")]
    SameAsInput(PathBuf),
}

impl From<ScanError> for OptimizeError {
    fn from(e: ScanError) -> Self {
        match e {
            ScanError::Io(e) => Self::Io(e),
            ScanError::MissingInputDir(p) => Self::MissingInputDir(p),
            ScanError::NoImages(p) => Self::NoImages(p),
        }
    }
}

/// Per-file failure inside an optimize run.
#[derive(Error, Debug)]
enum FileError {
    #[error(transparent)]
    Backup(#[from] BackupError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptimizeEvent {
    Started {
        image_count: usize,
        optimized_dir: String,
        backup_dir: String,
    },
    ImageOptimized {
        /// 1-based position in the run.
        index: usize,
        file_name: String,
        backup: BackupOutcome,
        original_dims: (u32, u32),
        optimized_dims: (u32, u32),
        original_size: u64,
        optimized_size: u64,
    },
    ImageFailed {
        index: usize,
        file_name: String,
        error: String,
    },
}

/// Byte totals across an optimize run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeTotals {
    pub optimized: u32,
    pub failed: u32,
    pub original_bytes: u64,
    pub optimized_bytes: u64,
}

impl OptimizeTotals {
    /// Size reduction in percent; negative when the output grew.
    pub fn reduction_percent(&self) -> f64 {
        reduction_percent(self.original_bytes, self.optimized_bytes)
    }
}

impl fmt::Display for OptimizeTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} optimized, {} -> {} ({:.1}% smaller)",
            self.optimized,
            human_size(self.original_bytes),
            human_size(self.optimized_bytes),
            self.reduction_percent()
        )?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        Ok(())
    }
}

/// Percentage saved going from `original` to `optimized` bytes.
pub fn reduction_percent(original: u64, optimized: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - optimized as f64) / original as f64 * 100.0
}

/// Render a byte count as `512 B`, `12.3 KB` or `4.56 MB`.
pub fn human_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    let b = bytes as f64;
    if b >= MB {
        format!("{:.2} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

/// Back up and optimize every image in `input_dir` with the production backend.
pub fn optimize(
    input_dir: &Path,
    optimized_dir: &Path,
    backup_dir: &Path,
    config: &OptimizeConfig,
    events: Option<Sender<OptimizeEvent>>,
) -> Result<OptimizeTotals, OptimizeError> {
    optimize_with_backend(
        &RustBackend::new(),
        input_dir,
        optimized_dir,
        backup_dir,
        config,
        events,
    )
}

/// Compare resolved paths so `images/../images` still counts as `images`.
/// Paths that do not exist yet fall back to a literal comparison.
fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Back up and optimize using a specific backend.
pub fn optimize_with_backend(
    backend: &impl ImageBackend,
    input_dir: &Path,
    optimized_dir: &Path,
    backup_dir: &Path,
    config: &OptimizeConfig,
    events: Option<Sender<OptimizeEvent>>,
) -> Result<OptimizeTotals, OptimizeError> {
    for dir in [optimized_dir, backup_dir] {
        if same_dir(dir, input_dir) {
            return Err(OptimizeError::SameAsInput(dir.to_path_buf()));
        }
    }
    let images = list_images(input_dir)?;

    fs::create_dir_all(optimized_dir)?;
    fs::create_dir_all(backup_dir)?;

    let emit = |event: OptimizeEvent| {
        if let Some(tx) = &events {
            tx.send(event).ok();
        }
    };

    emit(OptimizeEvent::Started {
        image_count: images.len(),
        optimized_dir: optimized_dir.display().to_string(),
        backup_dir: backup_dir.display().to_string(),
    });

    let mut totals = OptimizeTotals::default();
    for (i, path) in images.iter().enumerate() {
        let index = i + 1;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = optimized_dir.join(&file_name);

        match optimize_one(backend, path, &output, backup_dir, config) {
            Ok(done) => {
                totals.optimized += 1;
                totals.original_bytes += done.original_size;
                totals.optimized_bytes += done.optimized_size;
                emit(OptimizeEvent::ImageOptimized {
                    index,
                    file_name,
                    backup: done.backup,
                    original_dims: done.original_dims,
                    optimized_dims: done.optimized_dims,
                    original_size: done.original_size,
                    optimized_size: done.optimized_size,
                });
            }
            Err(e) => {
                totals.failed += 1;
                emit(OptimizeEvent::ImageFailed {
                    index,
                    file_name,
                    error: e.to_string(),
                });
            }
        }
    }

    Ok(totals)
}

struct Optimized {
    backup: BackupOutcome,
    original_dims: (u32, u32),
    optimized_dims: (u32, u32),
    original_size: u64,
    optimized_size: u64,
}

fn optimize_one(
    backend: &impl ImageBackend,
    path: &Path,
    output: &Path,
    backup_dir: &Path,
    config: &OptimizeConfig,
) -> Result<Optimized, FileError> {
    let backup = ensure_backup(path, backup_dir, output)?;
    let source = backend.identify(path)?;
    let optimized_dims = optimize_image(backend, path, output, &source, config)?;
    Ok(Optimized {
        backup,
        original_dims: source.dimensions(),
        optimized_dims,
        original_size: fs::metadata(path)?.len(),
        optimized_size: fs::metadata(output)?.len(),
    })
}

/// Whether the user agreed to overwrite the originals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Replacement declined; no files were changed")]
    Declined,
    #[error("Optimized directory not found: {0} (run optimize first)")]
    MissingStagingDir(PathBuf),
    #[error("No optimized images found in {0}")]
    NoImages(PathBuf),
}

/// Whether a staged file may be copied over its original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementState {
    /// The original matches its backup (or was already replaced).
    Ready,
    /// No backup exists; the original is left alone.
    MissingBackup,
    /// The original matches neither its backup nor the staged copy, so the
    /// backup does not hold its bytes; the original is left alone.
    OriginalChanged,
}

/// One staged file and the original it would replace.
#[derive(Debug, Clone, PartialEq)]
pub struct Replacement {
    pub file_name: String,
    pub optimized: PathBuf,
    pub original: PathBuf,
    pub state: ReplacementState,
}

/// What [`apply`] did with one staged file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Replaced { bytes: u64 },
    MissingBackup,
    OriginalChanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApplyEvent {
    pub index: usize,
    pub file_name: String,
    pub outcome: ApplyOutcome,
}

/// Counters for an apply run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ApplyReport {
    pub replaced: u32,
    pub missing_backup: u32,
    pub original_changed: u32,
}

impl fmt::Display for ApplyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} replaced", self.replaced)?;
        if self.missing_backup > 0 {
            write!(f, ", {} skipped (no backup)", self.missing_backup)?;
        }
        if self.original_changed > 0 {
            write!(
                f,
                ", {} skipped (changed since backup)",
                self.original_changed
            )?;
        }
        Ok(())
    }
}

/// List what [`apply`] would do, without touching anything.
pub fn plan_apply(
    optimized_dir: &Path,
    input_dir: &Path,
    backup_dir: &Path,
    exists: &impl Fn(&Path) -> bool,
) -> Result<Vec<Replacement>, ApplyError> {
    let staged = list_images(optimized_dir).map_err(|e| match e {
        ScanError::Io(e) => ApplyError::Io(e),
        ScanError::MissingInputDir(p) => ApplyError::MissingStagingDir(p),
        ScanError::NoImages(p) => ApplyError::NoImages(p),
    })?;

    let mut plan = Vec::with_capacity(staged.len());
    for optimized in staged {
        let Some(file_name) = optimized
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
        else {
            continue;
        };
        let original = input_dir.join(&file_name);
        let state = if !is_backed_up(&original, backup_dir, exists) {
            ReplacementState::MissingBackup
        } else if original.is_file()
            && covered_by_backup(&original, &backup_path(backup_dir, &original), &optimized)?
        {
            ReplacementState::Ready
        } else {
            ReplacementState::OriginalChanged
        };
        plan.push(Replacement {
            file_name,
            optimized,
            original,
            state,
        });
    }
    Ok(plan)
}

/// Replace originals in `input_dir` with their staged optimized copies.
///
/// Does nothing unless `confirmation` is [`Confirmation::Confirmed`]. Files
/// whose original has no backup in `backup_dir`, or no longer matches it,
/// are skipped.
pub fn apply(
    optimized_dir: &Path,
    input_dir: &Path,
    backup_dir: &Path,
    confirmation: Confirmation,
    events: Option<Sender<ApplyEvent>>,
) -> Result<ApplyReport, ApplyError> {
    if confirmation == Confirmation::Declined {
        return Err(ApplyError::Declined);
    }

    let replacements = plan_apply(optimized_dir, input_dir, backup_dir, &|p: &Path| p.exists())?;
    let mut report = ApplyReport::default();

    for (i, replacement) in replacements.iter().enumerate() {
        let outcome = match replacement.state {
            ReplacementState::Ready => {
                let bytes = replace_file(&replacement.optimized, &replacement.original)?;
                report.replaced += 1;
                ApplyOutcome::Replaced { bytes }
            }
            ReplacementState::MissingBackup => {
                report.missing_backup += 1;
                ApplyOutcome::MissingBackup
            }
            ReplacementState::OriginalChanged => {
                report.original_changed += 1;
                ApplyOutcome::OriginalChanged
            }
        };

        if let Some(tx) = &events {
            tx.send(ApplyEvent {
                index: i + 1,
                file_name: replacement.file_name.clone(),
                outcome,
            })
            .ok();
        }
    }

    Ok(report)
}

/// Copy `from` over `to` through a hidden partial file in `to`'s directory.
fn replace_file(from: &Path, to: &Path) -> io::Result<u64> {
    let name = to
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let partial = to.with_file_name(format!(".{name}.partial"));
    let bytes = fs::copy(from, &partial)?;
    if let Err(e) = fs::rename(&partial, to) {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }
    Ok(bytes)
}
