//! Backup, optimize, and apply against real files.

mod common;

use common::{snapshot, write_alpha_png, write_jpeg};
use image::GenericImageView;
use responsive_images::config::resolve_config;
use responsive_images::optimize::{self, ApplyError, Confirmation};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct Site {
    _tmp: TempDir,
    images: PathBuf,
    optimized: PathBuf,
    backup: PathBuf,
}

fn site() -> Site {
    let tmp = TempDir::new().unwrap();
    let images = tmp.path().join("images");
    fs::create_dir_all(&images).unwrap();
    write_jpeg(&images.join("wide.jpg"), 400, 100);
    write_alpha_png(&images.join("logo.png"), 60, 40);

    let config = resolve_config(None).unwrap();
    Site {
        optimized: config.optimized_dir(&images),
        backup: config.backup_dir(&images),
        images,
        _tmp: tmp,
    }
}

fn small_box() -> responsive_images::imaging::OptimizeConfig {
    responsive_images::imaging::OptimizeConfig {
        max_box: (200, 200),
        ..Default::default()
    }
}

#[test]
fn directories_sit_next_to_source() {
    let s = site();
    let parent = s.images.parent().unwrap();
    assert_eq!(s.optimized, parent.join("images_optimized"));
    assert_eq!(s.backup, parent.join("images_backup"));
}

#[test]
fn optimize_then_apply() {
    let s = site();
    let originals = snapshot(&s.images);

    let totals = optimize::optimize(&s.images, &s.optimized, &s.backup, &small_box(), None).unwrap();
    assert_eq!(totals.optimized, 2);
    assert_eq!(totals.failed, 0);

    // Optimize alone never touches the originals
    assert_eq!(snapshot(&s.images), originals);
    for (name, (bytes, _)) in &originals {
        assert_eq!(&fs::read(s.backup.join(name)).unwrap(), bytes);
    }
    let staged = image::open(s.optimized.join("wide.jpg")).unwrap();
    assert_eq!(staged.dimensions(), (200, 50));
    let logo = image::open(s.optimized.join("logo.png")).unwrap();
    assert_eq!(logo.dimensions(), (60, 40));
    assert!(logo.color().has_alpha());

    let report = optimize::apply(
        &s.optimized,
        &s.images,
        &s.backup,
        Confirmation::Confirmed,
        None,
    )
    .unwrap();
    assert_eq!(report.replaced, 2);
    for name in originals.keys() {
        assert_eq!(
            fs::read(s.images.join(name)).unwrap(),
            fs::read(s.optimized.join(name)).unwrap()
        );
    }
}

#[test]
fn second_optimize_after_apply_keeps_real_originals() {
    let s = site();
    let originals = snapshot(&s.images);
    optimize::optimize(&s.images, &s.optimized, &s.backup, &small_box(), None).unwrap();
    optimize::apply(
        &s.optimized,
        &s.images,
        &s.backup,
        Confirmation::Confirmed,
        None,
    )
    .unwrap();

    optimize::optimize(&s.images, &s.optimized, &s.backup, &small_box(), None).unwrap();

    for (name, (bytes, _)) in &originals {
        assert_eq!(&fs::read(s.backup.join(name)).unwrap(), bytes);
    }
}

#[test]
fn replaced_original_is_never_lost() {
    let s = site();
    let photo = s.images.join("wide.jpg");
    let first = fs::read(&photo).unwrap();
    optimize::optimize(&s.images, &s.optimized, &s.backup, &small_box(), None).unwrap();

    write_jpeg(&photo, 300, 300);
    let second = fs::read(&photo).unwrap();
    let totals = optimize::optimize(&s.images, &s.optimized, &s.backup, &small_box(), None).unwrap();
    assert_eq!(totals.failed, 1);
    assert_eq!(totals.optimized, 1);

    let report = optimize::apply(
        &s.optimized,
        &s.images,
        &s.backup,
        Confirmation::Confirmed,
        None,
    )
    .unwrap();

    assert_eq!(report.original_changed, 1);
    assert_eq!(report.replaced, 1);
    assert_eq!(fs::read(&photo).unwrap(), second);
    assert_eq!(fs::read(s.backup.join("wide.jpg")).unwrap(), first);
}

#[test]
fn declined_apply_changes_nothing() {
    let s = site();
    optimize::optimize(&s.images, &s.optimized, &s.backup, &small_box(), None).unwrap();
    let before = snapshot(&s.images);

    let err = optimize::apply(
        &s.optimized,
        &s.images,
        &s.backup,
        Confirmation::Declined,
        None,
    )
    .unwrap_err();

    assert!(matches!(err, ApplyError::Declined));
    assert_eq!(snapshot(&s.images), before);
}

#[test]
fn apply_before_optimize_is_an_error() {
    let s = site();
    let err = optimize::apply(
        &s.optimized,
        &s.images,
        &s.backup,
        Confirmation::Confirmed,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, ApplyError::MissingStagingDir(_)));
}
