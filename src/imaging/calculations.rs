//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Height that preserves the source aspect ratio at `target_width`.
///
/// `round(source_height * target_width / source_width)`, never below 1.
///
/// ```text
/// 800x1599 at 480 wide → 959   (1599 * 480 / 800 = 959.4)
/// 1000x750 at 480 wide → 360
/// ```
pub fn scaled_height(source: (u32, u32), target_width: u32) -> u32 {
    let (src_w, src_h) = source;
    let h = (src_h as f64 * target_width as f64 / src_w as f64).round() as u32;
    h.max(1)
}

/// A single variant size to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantSize {
    pub width: u32,
    pub height: u32,
}

/// Clamp, order and deduplicate the requested widths for one source.
///
/// Widths are processed in ascending order. Any width at or above the source
/// width becomes the source width itself, so however many requests exceed
/// the source, at most one native-width entry is produced. Zero widths are
/// ignored.
///
/// # Arguments
/// * `original` - Source dimensions (width, height)
/// * `widths` - Requested target widths, in any order
///
/// # Returns
/// * Distinct sizes in ascending width order; the native entry keeps the
///   source height exactly
pub fn calculate_variant_sizes(original: (u32, u32), widths: &[u32]) -> Vec<VariantSize> {
    let (orig_w, orig_h) = original;
    if orig_w == 0 || orig_h == 0 {
        return Vec::new();
    }

    let mut clamped: Vec<u32> = widths
        .iter()
        .filter(|&&w| w > 0)
        .map(|&w| w.min(orig_w))
        .collect();
    clamped.sort_unstable();
    clamped.dedup();

    clamped
        .into_iter()
        .map(|width| VariantSize {
            width,
            height: if width == orig_w {
                orig_h
            } else {
                scaled_height(original, width)
            },
        })
        .collect()
}

/// Dimensions that fit inside `max_box`, preserving aspect ratio.
///
/// Only ever shrinks: an image already inside the box keeps its size. Both
/// edges are scaled by the same factor, picked so the tighter bound is met.
pub fn fit_within(original: (u32, u32), max_box: (u32, u32)) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    let (max_w, max_h) = max_box;

    if orig_w <= max_w && orig_h <= max_h {
        return original;
    }

    let scale = (max_w as f64 / orig_w as f64).min(max_h as f64 / orig_h as f64);
    let w = ((orig_w as f64 * scale).round() as u32).clamp(1, max_w);
    let h = ((orig_h as f64 * scale).round() as u32).clamp(1, max_h);
    (w, h)
}
