//! Tool configuration.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults are
//! overridden by the user's file, key by key; anything left out keeps its
//! default.
//!
//! ## Config File Location
//!
//! `config.toml` in the source directory is picked up automatically. Another
//! file can be named with `--config`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [variants]
//! widths = [480, 768, 1200, 1600]  # Target widths; never upscaled
//! output_dir = "responsive"        # Relative to the source directory
//! webp_quality = 80                # Lossy WebP quality (1-100)
//! webp_method = 6                  # WebP effort (0 fast - 6 best)
//! jpeg_quality = 85                # JPEG fallback quality (1-100)
//! background = [255, 255, 255]     # Flatten color for transparent sources
//!
//! [optimize]
//! max_width = 1920                 # Larger images are shrunk to fit
//! max_height = 1920
//! jpeg_quality = 85
//! png_compression = 6              # 0-9
//! output_dir = "images_optimized"  # Relative to the source's parent
//! backup_dir = "images_backup"     # Relative to the source's parent
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{OptimizeConfig, PngCompression, Quality, VariantConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the source directory.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Responsive variant generation.
    pub variants: VariantsSection,
    /// Backup-first full-corpus optimization.
    pub optimize: OptimizeSection,
}

/// `[variants]` settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VariantsSection {
    /// Target widths in pixels. Order does not matter.
    pub widths: Vec<u32>,
    /// Where variants are written, relative to the source directory.
    pub output_dir: String,
    pub webp_quality: u32,
    pub webp_method: u8,
    pub jpeg_quality: u32,
    /// RGB color transparent sources are flattened onto for the JPEG fallback.
    pub background: [u8; 3],
}

impl Default for VariantsSection {
    fn default() -> Self {
        Self {
            widths: vec![480, 768, 1200, 1600],
            output_dir: "responsive".to_string(),
            webp_quality: 80,
            webp_method: 6,
            jpeg_quality: 85,
            background: [255, 255, 255],
        }
    }
}

/// `[optimize]` settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizeSection {
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u32,
    pub png_compression: u8,
    /// Staging directory for optimized copies, relative to the source's parent.
    pub output_dir: String,
    /// Verbatim originals, relative to the source's parent.
    pub backup_dir: String,
}

impl Default for OptimizeSection {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1920,
            jpeg_quality: 85,
            png_compression: 6,
            output_dir: "images_optimized".to_string(),
            backup_dir: "images_backup".to_string(),
        }
    }
}

fn check_quality(name: &str, value: u32) -> Result<(), ConfigError> {
    if (1..=100).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!("{name} must be 1-100")))
    }
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.variants;
        if v.widths.is_empty() {
            return Err(ConfigError::Validation(
                "variants.widths must not be empty".into(),
            ));
        }
        if v.widths.contains(&0) {
            return Err(ConfigError::Validation(
                "variants.widths values must be non-zero".into(),
            ));
        }
        check_quality("variants.webp_quality", v.webp_quality)?;
        check_quality("variants.jpeg_quality", v.jpeg_quality)?;
        if v.webp_method > 6 {
            return Err(ConfigError::Validation(
                "variants.webp_method must be 0-6".into(),
            ));
        }

        let o = &self.optimize;
        if o.max_width == 0 || o.max_height == 0 {
            return Err(ConfigError::Validation(
                "optimize.max_width and optimize.max_height must be non-zero".into(),
            ));
        }
        check_quality("optimize.jpeg_quality", o.jpeg_quality)?;
        if o.png_compression > 9 {
            return Err(ConfigError::Validation(
                "optimize.png_compression must be 0-9".into(),
            ));
        }
        Ok(())
    }

    /// Encoding settings for the variant generator.
    pub fn variant_config(&self) -> VariantConfig {
        let v = &self.variants;
        VariantConfig {
            widths: v.widths.clone(),
            webp_quality: Quality::new(v.webp_quality),
            webp_method: v.webp_method,
            jpeg_quality: Quality::new(v.jpeg_quality),
            background: v.background,
        }
    }

    /// Encoding settings for the optimizer.
    pub fn optimize_config(&self) -> OptimizeConfig {
        let o = &self.optimize;
        OptimizeConfig {
            max_box: (o.max_width, o.max_height),
            jpeg_quality: Quality::new(o.jpeg_quality),
            png_compression: PngCompression::new(o.png_compression),
            background: self.variants.background,
        }
    }

    /// Variants directory for a source directory.
    pub fn variants_dir(&self, source: &Path) -> PathBuf {
        source.join(&self.variants.output_dir)
    }

    /// Optimized staging directory, next to the source directory.
    pub fn optimized_dir(&self, source: &Path) -> PathBuf {
        sibling_of(source, &self.optimize.output_dir)
    }

    /// Backup directory, next to the source directory.
    pub fn backup_dir(&self, source: &Path) -> PathBuf {
        sibling_of(source, &self.optimize.backup_dir)
    }
}

/// Resolve `dir` against the parent of `source` (absolute paths pass through).
fn sibling_of(source: &Path, dir: &str) -> PathBuf {
    let parent = source.parent().unwrap_or_else(|| Path::new(""));
    parent.join(dir)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ToolConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value. `Ok(None)` if it does not exist.
pub fn load_raw_config(config_path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<ToolConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `config.toml` from the source directory, falling back to defaults.
pub fn load_config(source_dir: &Path) -> Result<ToolConfig, ConfigError> {
    resolve_config(load_raw_config(&source_dir.join(CONFIG_FILENAME))?)
}

/// Load an explicitly named config file. A missing file is an error.
pub fn load_config_file(path: &Path) -> Result<ToolConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    resolve_config(Some(toml::from_str(&content)?))
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# responsive-images configuration
# ===============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Responsive variants: one lossy WebP plus one JPEG fallback per width.
# Widths at or above the source width collapse into a single native-width
# variant; images are never upscaled. Existing outputs are never re-encoded.
# ---------------------------------------------------------------------------
[variants]
widths = [480, 768, 1200, 1600]

# Written as {name}-{width}.webp and {name}-{width}.jpg.
# Relative to the source directory.
output_dir = "responsive"

# Lossy WebP quality (1-100) and effort (0 = fastest, 6 = smallest files).
webp_quality = 80
webp_method = 6

# JPEG fallback quality (1-100).
jpeg_quality = 85

# Transparent sources are composited onto this RGB color for the JPEG
# fallback only; the WebP keeps its alpha channel.
background = [255, 255, 255]

# ---------------------------------------------------------------------------
# Optimize: back up originals, then write shrunk/re-encoded copies to a
# staging directory. `apply --yes` copies them over the originals.
# ---------------------------------------------------------------------------
[optimize]
# Bounding box; larger images are shrunk to fit, aspect ratio preserved.
max_width = 1920
max_height = 1920

# JPEG sources stay JPEG at this quality (1-100).
jpeg_quality = 85

# PNG sources stay PNG at this compression level (0-9).
png_compression = 6

# Both relative to the parent of the source directory.
output_dir = "images_optimized"
backup_dir = "images_backup"
"##
}
