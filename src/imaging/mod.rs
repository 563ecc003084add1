//! Image processing.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader` header decode |
//! | **Resize** | Lanczos3 (`image::imageops`) |
//! | **Variants** | lossy WebP (libwebp) + JPEG fallback |
//! | **Optimize** | fit-to-box resize, re-encode in the source format |
//!
//! Layers, from pure to effectful:
//! - `calculations`: width clamping, height rounding, fit-to-box
//! - `params`: what a backend is asked to write (sizes, encodings, paths)
//! - [`backend`]: the [`ImageBackend`] trait, with [`RustBackend`] doing the pixels
//! - [`operations`]: planning against an existence predicate, then one backend call per source

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend};
pub use calculations::{VariantSize, calculate_variant_sizes, fit_within, scaled_height};
pub use operations::{
    GeneratedVariant, OptimizeConfig, OutputStatus, VariantConfig, VariantOutput,
    create_variants, optimize_image, plan_optimize, plan_variants,
};
pub use params::{Encoding, OptimizeParams, PngCompression, Quality, RenderParams, RenderTarget};
pub use rust_backend::RustBackend;
