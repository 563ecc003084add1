//! Backups taken before any destructive write.
//!
//! Every original is copied byte-for-byte to the backup directory before the
//! optimizer touches it, and `apply` refuses to overwrite an original that
//! has no backup.
//!
//! # Idempotency
//!
//! A backup that is already present is never replaced. Without this, running
//! the optimizer again after `apply` would "back up" the optimized files over
//! the real originals. Presence is answered by [`is_backed_up`], which takes
//! the existence check as a predicate so callers and tests decide what
//! "present" means.
//!
//! An existing backup only counts when the original still matches it, or
//! matches the staged copy that `apply` put in its place. Any other original
//! is new content the backup does not hold: [`ensure_backup`] refuses it with
//! [`BackupError::Conflict`] rather than let it be optimized and replaced.
//!
//! # Integrity
//!
//! New backups are copied to a hidden `.partial` file, compared against the
//! original by SHA-256, and only then renamed into place. A file under its
//! final backup name is therefore always a complete, verified copy.

use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Backup of {0} does not match the original")]
    Mismatch(PathBuf),
    #[error(
        "{original} changed since {backup} was taken; move the old backup aside to back up the new file"
    )]
    Conflict { original: PathBuf, backup: PathBuf },
}

/// Result of [`ensure_backup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupOutcome {
    /// A new verified copy was written.
    Created,
    /// A backup already existed and was left alone.
    AlreadyPresent,
}

/// Where the backup of `original` lives: same file name, inside `backup_dir`.
pub fn backup_path(backup_dir: &Path, original: &Path) -> PathBuf {
    match original.file_name() {
        Some(name) => backup_dir.join(name),
        None => backup_dir.to_path_buf(),
    }
}

/// Whether `original` already has a backup in `backup_dir`.
pub fn is_backed_up(original: &Path, backup_dir: &Path, exists: &impl Fn(&Path) -> bool) -> bool {
    exists(&backup_path(backup_dir, original))
}

/// Whether `original` is covered by its existing `backup`: it is either the
/// backed-up bytes or the staged copy `apply` already wrote over them.
pub fn covered_by_backup(original: &Path, backup: &Path, staged: &Path) -> io::Result<bool> {
    if same_contents(original, backup)? {
        return Ok(true);
    }
    Ok(staged.is_file() && same_contents(original, staged)?)
}

/// Copy `original` into `backup_dir` unless a backup is already present.
///
/// `staged` is where the optimized copy of `original` lives. An existing
/// backup is accepted when the original matches it or matches `staged`;
/// otherwise the original changed after the backup was taken and
/// [`BackupError::Conflict`] is returned. The backup directory must exist.
pub fn ensure_backup(
    original: &Path,
    backup_dir: &Path,
    staged: &Path,
) -> Result<BackupOutcome, BackupError> {
    let target = backup_path(backup_dir, original);
    if is_backed_up(original, backup_dir, &|p: &Path| p.exists()) {
        if covered_by_backup(original, &target, staged)? {
            return Ok(BackupOutcome::AlreadyPresent);
        }
        return Err(BackupError::Conflict {
            original: original.to_path_buf(),
            backup: target,
        });
    }

    let partial = backup_dir.join(format!(
        ".{}.partial",
        target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    ));

    fs::copy(original, &partial)?;
    if let Ok(modified) = fs::metadata(original).and_then(|m| m.modified()) {
        // Best effort: keep the original timestamp on the copy.
        let _ = fs::File::options()
            .write(true)
            .open(&partial)
            .and_then(|f| f.set_modified(modified));
    }

    if hash_file(&partial)? != hash_file(original)? {
        let _ = fs::remove_file(&partial);
        return Err(BackupError::Mismatch(original.to_path_buf()));
    }
    fs::rename(&partial, &target)?;
    Ok(BackupOutcome::Created)
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{:x}", digest))
}

/// Whether two files have byte-identical contents.
pub fn same_contents(a: &Path, b: &Path) -> io::Result<bool> {
    if fs::metadata(a)?.len() != fs::metadata(b)?.len() {
        return Ok(false);
    }
    Ok(hash_file(a)? == hash_file(b)?)
}
