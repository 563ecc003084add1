//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Each source image leads with its positional index and file name, followed
//! by indented context lines: dimensions, per-width status, sizes. Paths of
//! output directories appear once, in the header of a run.
//!
//! # Output Format
//!
//! ## Variants
//!
//! ```text
//! Variants for 2 images -> images/responsive
//! 001 David.jpg (800x1599)
//!     480w (480x959): encoded
//!     768w (768x1535): encoded
//!     800w (800x1599): encoded
//! 002 broken.png
//!     Error: Failed to decode images/broken.png: ...
//!
//! 6 encoded, 0 already present, 1 failed
//! ```
//!
//! A width whose two siblings differ (one already present, one written) shows
//! both: `480w (480x959): webp existing, jpg encoded`.
//!
//! ## Optimize
//!
//! ```text
//! Optimizing 1 image -> images_optimized (backups in images_backup)
//! 001 hero.jpg
//!     4000x3000 -> 1920x1440
//!     2.31 MB -> 412.5 KB (82.6% smaller)
//!     Backup: created
//! ```
//!
//! ## Apply
//!
//! ```text
//! 001 hero.jpg: replaced (412.5 KB)
//! 002 logo.png: skipped, no backup
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::backup::BackupOutcome;
use crate::imaging::OutputStatus;
use crate::optimize::{
    ApplyEvent, ApplyOutcome, OptimizeEvent, Replacement, ReplacementState, human_size,
    reduction_percent,
};
use crate::variants::{VariantEvent, VariantInfo};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn status_label(status: OutputStatus) -> &'static str {
    match status {
        OutputStatus::Encoded => "encoded",
        OutputStatus::Existing => "existing",
    }
}

fn variant_line(variant: &VariantInfo) -> String {
    let status = if variant.webp == variant.jpeg {
        status_label(variant.webp).to_string()
    } else {
        format!(
            "webp {}, jpg {}",
            status_label(variant.webp),
            status_label(variant.jpeg)
        )
    };
    format!(
        "    {}w ({}x{}): {}",
        variant.width, variant.width, variant.height, status
    )
}

// ============================================================================
// Variants
// ============================================================================

/// Format a single variants progress event.
pub fn format_variant_event(event: &VariantEvent) -> Vec<String> {
    match event {
        VariantEvent::Started {
            image_count,
            output_dir,
        } => vec![format!(
            "Variants for {} -> {}",
            plural(*image_count, "image"),
            output_dir
        )],
        VariantEvent::ImageProcessed {
            index,
            file_name,
            dimensions: (w, h),
            variants,
        } => {
            let mut lines = vec![format!("{} {} ({}x{})", format_index(*index), file_name, w, h)];
            lines.extend(variants.iter().map(variant_line));
            lines
        }
        VariantEvent::ImageFailed {
            index,
            file_name,
            error,
        } => vec![
            format!("{} {}", format_index(*index), file_name),
            format!("    Error: {}", error),
        ],
    }
}

pub fn print_variant_event(event: &VariantEvent) {
    for line in format_variant_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Optimize
// ============================================================================

/// Format a single optimize progress event.
pub fn format_optimize_event(event: &OptimizeEvent) -> Vec<String> {
    match event {
        OptimizeEvent::Started {
            image_count,
            optimized_dir,
            backup_dir,
        } => vec![format!(
            "Optimizing {} -> {} (backups in {})",
            plural(*image_count, "image"),
            optimized_dir,
            backup_dir
        )],
        OptimizeEvent::ImageOptimized {
            index,
            file_name,
            backup,
            original_dims,
            optimized_dims,
            original_size,
            optimized_size,
        } => {
            let mut lines = vec![format!("{} {}", format_index(*index), file_name)];
            if original_dims == optimized_dims {
                lines.push(format!(
                    "    {}x{} (within bounds)",
                    original_dims.0, original_dims.1
                ));
            } else {
                lines.push(format!(
                    "    {}x{} -> {}x{}",
                    original_dims.0, original_dims.1, optimized_dims.0, optimized_dims.1
                ));
            }
            lines.push(format!(
                "    {} -> {} ({:.1}% smaller)",
                human_size(*original_size),
                human_size(*optimized_size),
                reduction_percent(*original_size, *optimized_size)
            ));
            let backup = match backup {
                BackupOutcome::Created => "created",
                BackupOutcome::AlreadyPresent => "already present",
            };
            lines.push(format!("    Backup: {}", backup));
            lines
        }
        OptimizeEvent::ImageFailed {
            index,
            file_name,
            error,
        } => vec![
            format!("{} {}", format_index(*index), file_name),
            format!("    Error: {}", error),
        ],
    }
}

pub fn print_optimize_event(event: &OptimizeEvent) {
    for line in format_optimize_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Apply
// ============================================================================

/// Format the list of pending replacements shown before confirmation.
pub fn format_apply_plan(plan: &[Replacement]) -> Vec<String> {
    let mut lines = vec![format!(
        "{} will be overwritten with their optimized copies:",
        plural(plan.len(), "original")
    )];
    for (i, replacement) in plan.iter().enumerate() {
        let suffix = match replacement.state {
            ReplacementState::Ready => "",
            ReplacementState::MissingBackup => " (no backup, will be skipped)",
            ReplacementState::OriginalChanged => " (changed since backup, will be skipped)",
        };
        lines.push(format!(
            "{} {}{}",
            format_index(i + 1),
            replacement.original.display(),
            suffix
        ));
    }
    lines
}

pub fn print_apply_plan(plan: &[Replacement]) {
    for line in format_apply_plan(plan) {
        println!("{}", line);
    }
}

/// Format a single apply event.
pub fn format_apply_event(event: &ApplyEvent) -> Vec<String> {
    let detail = match event.outcome {
        ApplyOutcome::Replaced { bytes } => format!("replaced ({})", human_size(bytes)),
        ApplyOutcome::MissingBackup => "skipped, no backup".to_string(),
        ApplyOutcome::OriginalChanged => "skipped, changed since backup".to_string(),
    };
    vec![format!(
        "{} {}: {}",
        format_index(event.index),
        event.file_name,
        detail
    )]
}

pub fn print_apply_event(event: &ApplyEvent) {
    for line in format_apply_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
