//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use image::{Rgb, RgbImage, Rgba, RgbaImage};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Opaque gradient JPEG.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 96])
    })
    .save(path)
    .unwrap();
}

/// PNG: left half fully transparent, right half opaque blue.
pub fn write_alpha_png(path: &Path, width: u32, height: u32) {
    RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([0, 0, 255, 255])
        }
    })
    .save(path)
    .unwrap();
}

/// File name -> (contents, mtime) for every file directly inside `dir`.
pub fn snapshot(dir: &Path) -> BTreeMap<String, (Vec<u8>, SystemTime)> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.is_file())
        .map(|p| {
            let name = p.file_name().unwrap().to_string_lossy().into_owned();
            let modified = fs::metadata(&p).unwrap().modified().unwrap();
            (name, (fs::read(&p).unwrap(), modified))
        })
        .collect()
}
