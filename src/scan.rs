//! Source discovery.
//!
//! Input is a flat directory of `.jpg`, `.jpeg` and `.png` files (extension
//! matched case-insensitively). Subdirectories are not descended into, which
//! keeps the variants directory (usually inside the input) out of the listing.
//! Everything else is ignored. Results are sorted by file name so runs
//! are deterministic.
//!
//! Both failure modes are detected before anything is written, so a run that
//! fails here leaves no side effects.

use crate::types::SourceFormat;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Input directory not found: {0}")]
    MissingInputDir(PathBuf),
    #[error("No .jpg, .jpeg or .png images found in {0}")]
    NoImages(PathBuf),
}

/// Whether a path names a supported source image.
pub fn is_supported_image(path: &Path) -> bool {
    SourceFormat::from_path(path).is_some()
}

/// List the supported images directly inside `dir`, sorted by file name.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !dir.is_dir() {
        return Err(ScanError::MissingInputDir(dir.to_path_buf()));
    }

    let mut images = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            e.into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed"))
        })?;
        if entry.file_type().is_file() && is_supported_image(entry.path()) {
            images.push(entry.into_path());
        }
    }

    if images.is_empty() {
        return Err(ScanError::NoImages(dir.to_path_buf()));
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn lists_supported_images_sorted() {
        let tmp = TempDir::new().unwrap();
        for name in ["b.png", "a.jpg", "C.JPEG", "notes.txt", "anim.gif"] {
            fs::write(tmp.path().join(name), b"x").unwrap();
        }

        let images = list_images(tmp.path()).unwrap();
        assert_eq!(names(&images), vec!["C.JPEG", "a.jpg", "b.png"]);
    }

    #[test]
    fn ignores_subdirectories() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("top.jpg"), b"x").unwrap();
        let nested = tmp.path().join("responsive");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("top-480.jpg"), b"x").unwrap();
        fs::create_dir(tmp.path().join("folder.png")).unwrap();

        let images = list_images(tmp.path()).unwrap();
        assert_eq!(names(&images), vec!["top.jpg"]);
    }

    #[test]
    fn missing_directory_is_reported() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("images");

        let err = list_images(&missing).unwrap_err();
        assert!(matches!(err, ScanError::MissingInputDir(p) if p == missing));
    }

    #[test]
    fn empty_directory_has_no_images() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("readme.md"), b"x").unwrap();

        let err = list_images(tmp.path()).unwrap_err();
        assert!(matches!(err, ScanError::NoImages(_)));
    }

    #[test]
    fn supported_image_check() {
        assert!(is_supported_image(Path::new("a.JPG")));
        assert!(!is_supported_image(Path::new("a.webp")));
    }
}
