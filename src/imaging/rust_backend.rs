//! Production image backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify (size, alpha, format) | `image::ImageReader` + `ImageDecoder` header read |
//! | Decode (JPEG, PNG) | `image` crate |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → WebP (lossy) | `webp::Encoder` with a `libwebp_sys::WebPConfig` (quality, method) |
//! | Encode → JPEG | `jpeg_encoder::Encoder` (progressive, optimized Huffman tables) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//!
//! Every output is written to a hidden `.partial` sibling and renamed into
//! place once fully encoded, so a file that exists under its final name is
//! always complete. The variant generator relies on this: existence is its
//! completion marker.

use super::backend::{BackendError, ImageBackend};
use super::params::{Encoding, OptimizeParams, PngCompression, RenderParams};
use crate::types::{ColorMode, SourceFormat, SourceImage};
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader, RgbImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Backend built on the `image` crate, with libwebp for lossy WebP.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk, sniffing the format from its bytes.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| BackendError::decode(path, e))
}

/// Canonical working layout: RGBA8 when the source carries alpha, RGB8 otherwise.
///
/// Also folds 16-bit, grayscale and palette sources into 8-bit color, so the
/// resampler and encoders only ever see two layouts.
fn normalize(img: DynamicImage) -> DynamicImage {
    if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.into_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.into_rgb8())
    }
}

fn resample(img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    if (img.width(), img.height()) == (width, height) {
        img.clone()
    } else {
        img.resize_exact(width, height, FilterType::Lanczos3)
    }
}

/// Composite onto an opaque background. Opaque images pass through unchanged.
pub(crate) fn flatten(img: &DynamicImage, background: [u8; 3]) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let a = a as u32;
        let blend = |c: u8, bg: u8| ((c as u32 * a + bg as u32 * (255 - a) + 127) / 255) as u8;
        image::Rgb([
            blend(r, background[0]),
            blend(g, background[1]),
            blend(b, background[2]),
        ])
    })
}

fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.partial", name))
}

/// Write through a `.partial` sibling, renaming into place on success.
fn write_output(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> Result<(), BackendError>,
) -> Result<(), BackendError> {
    let partial = partial_path(path);
    let result = File::create(&partial)
        .map_err(BackendError::Io)
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            write(&mut writer)?;
            writer.flush()?;
            Ok(())
        });
    match result {
        Ok(()) => {
            std::fs::rename(&partial, path)?;
            Ok(())
        }
        Err(e) => {
            let _ = std::fs::remove_file(&partial);
            Err(e)
        }
    }
}

fn save_image(img: &DynamicImage, path: &Path, encoding: Encoding) -> Result<(), BackendError> {
    match encoding {
        Encoding::WebP { quality, method } => save_webp(img, path, quality.value(), method),
        Encoding::Jpeg {
            quality,
            background,
        } => save_jpeg(&flatten(img, background), path, quality.value()),
        Encoding::Png { compression } => save_png(img, path, compression),
    }
}

/// Lossy WebP through libwebp. Alpha is kept when the frame has it.
fn save_webp(img: &DynamicImage, path: &Path, quality: u32, method: u8) -> Result<(), BackendError> {
    let (width, height) = (img.width(), img.height());
    let rgba;
    let encoder = match img {
        DynamicImage::ImageRgb8(buf) => webp::Encoder::from_rgb(buf.as_raw(), width, height),
        DynamicImage::ImageRgba8(buf) => webp::Encoder::from_rgba(buf.as_raw(), width, height),
        other => {
            rgba = other.to_rgba8();
            webp::Encoder::from_rgba(rgba.as_raw(), width, height)
        }
    };

    let mut config = libwebp_sys::WebPConfig::new()
        .map_err(|_| BackendError::encode(path, "libwebp rejected its default config"))?;
    config.lossless = 0;
    config.quality = quality as f32;
    config.method = i32::from(method.min(6));

    let memory = encoder
        .encode_advanced(&config)
        .map_err(|e| BackendError::encode(path, format!("{e:?}")))?;
    write_output(path, |w| Ok(w.write_all(&memory)?))
}

/// Progressive JPEG with optimized Huffman tables.
fn save_jpeg(img: &RgbImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let (Ok(width), Ok(height)) = (u16::try_from(img.width()), u16::try_from(img.height()))
    else {
        return Err(BackendError::encode(
            path,
            format!("{}x{} exceeds the JPEG size limit", img.width(), img.height()),
        ));
    };
    write_output(path, |w| {
        let mut encoder = jpeg_encoder::Encoder::new(w, quality.clamp(1, 100) as u8);
        encoder.set_progressive(true);
        encoder.set_optimized_huffman_tables(true);
        encoder
            .encode(img.as_raw(), width, height, jpeg_encoder::ColorType::Rgb)
            .map_err(|e| BackendError::encode(path, e))
    })
}

fn png_compression_type(compression: PngCompression) -> CompressionType {
    match compression.level() {
        0..=2 => CompressionType::Fast,
        3..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

fn save_png(
    img: &DynamicImage,
    path: &Path,
    compression: PngCompression,
) -> Result<(), BackendError> {
    write_output(path, |w| {
        let encoder =
            PngEncoder::new_with_quality(w, png_compression_type(compression), PngFilter::Adaptive);
        img.write_with_encoder(encoder)
            .map_err(|e| BackendError::encode(path, e))
    })
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<SourceImage, BackendError> {
        let reader = ImageReader::open(path)?.with_guessed_format()?;
        let format = match reader.format() {
            Some(ImageFormat::Jpeg) => SourceFormat::Jpeg,
            Some(ImageFormat::Png) => SourceFormat::Png,
            Some(other) => {
                return Err(BackendError::decode(
                    path,
                    format!("unsupported format {other:?}"),
                ));
            }
            None => return Err(BackendError::decode(path, "unrecognized image data")),
        };
        let decoder = reader
            .into_decoder()
            .map_err(|e| BackendError::decode(path, e))?;
        let (width, height) = decoder.dimensions();
        let color = if decoder.color_type().has_alpha() {
            ColorMode::Alpha
        } else {
            ColorMode::Opaque
        };
        Ok(SourceImage {
            width,
            height,
            color,
            format,
        })
    }

    fn render(&self, params: &RenderParams) -> Result<(), BackendError> {
        let img = normalize(load_image(&params.source)?);

        // Targets arrive grouped by size; both siblings share one resample.
        let mut current: Option<((u32, u32), DynamicImage)> = None;
        for target in &params.targets {
            let size = (target.width, target.height);
            let frame = match current.take() {
                Some((s, frame)) if s == size => frame,
                _ => resample(&img, target.width, target.height),
            };
            save_image(&frame, &target.output, target.encoding)?;
            current = Some((size, frame));
        }
        Ok(())
    }

    fn optimize(&self, params: &OptimizeParams) -> Result<(), BackendError> {
        let img = normalize(load_image(&params.source)?);
        let frame = resample(&img, params.width, params.height);
        save_image(&frame, &params.output, params.encoding)
    }
}
