//! Heuristic subject segmentation used when the external capability fails.
//!
//! Degraded-mode substitute only: subjects are assumed to sit near the
//! center of the frame and to be neither near-black nor blown out. The
//! output mask is binary.

use crate::foundation::core::{ImageDimensions, RgbaImage, SubjectMask};
use crate::foundation::error::{DepthTextError, DepthTextResult};

const MIN_CENTER_WEIGHT: f64 = 0.2;
const MIN_BRIGHTNESS: f64 = 30.0;
const MAX_BRIGHTNESS: f64 = 220.0;
const MIN_CHANNEL_SUM: u32 = 90;
const MAJORITY: u8 = 5;

/// Estimate a binary subject mask from pixel statistics alone.
///
/// Deterministic; the only failure is an empty raster.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(width = image.width(), height = image.height())
)]
pub fn fallback(image: &RgbaImage) -> DepthTextResult<SubjectMask> {
    let dims = ImageDimensions::of(image).map_err(|e| {
        DepthTextError::image_processing("fallback segmentation needs a non-empty image")
            .with_technical(e.technical().to_owned())
    })?;

    let marks = mark_candidates(image);
    let smoothed = majority_smooth(&marks, dims.width, dims.height);

    let mask = RgbaImage::from_fn(dims.width, dims.height, |x, y| {
        if smoothed[(y as usize) * (dims.width as usize) + (x as usize)] {
            image::Rgba([255, 255, 255, 255])
        } else {
            image::Rgba([0, 0, 0, 0])
        }
    });
    tracing::debug!(
        candidates = marks.iter().filter(|&&m| m).count(),
        kept = smoothed.iter().filter(|&&m| m).count(),
        "heuristic mask computed"
    );
    Ok(SubjectMask::from_image(mask))
}

/// First pass: center weighting plus a brightness window.
pub(crate) fn mark_candidates(image: &RgbaImage) -> Vec<bool> {
    let cx = f64::from(image.width()) / 2.0;
    let cy = f64::from(image.height()) / 2.0;
    let max_distance = (cx * cx + cy * cy).sqrt();

    image
        .enumerate_pixels()
        .map(|(x, y, px)| {
            let dx = f64::from(x) - cx;
            let dy = f64::from(y) - cy;
            let center_weight = 1.0 - (dx * dx + dy * dy).sqrt() / max_distance;

            let sum = u32::from(px[0]) + u32::from(px[1]) + u32::from(px[2]);
            let brightness = f64::from(sum) / 3.0;

            center_weight > MIN_CENTER_WEIGHT
                && brightness > MIN_BRIGHTNESS
                && brightness < MAX_BRIGHTNESS
                && sum > MIN_CHANNEL_SUM
        })
        .collect()
}

/// Second pass: an interior mark survives only when at least five cells of
/// its 3x3 window are marked. Border pixels keep their first-pass value.
pub(crate) fn majority_smooth(marks: &[bool], width: u32, height: u32) -> Vec<bool> {
    let (w, h) = (width as usize, height as usize);
    let mut out = marks.to_vec();
    if w < 3 || h < 3 {
        return out;
    }
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let idx = y * w + x;
            if !marks[idx] {
                continue;
            }
            let mut count = 0u8;
            for ny in y - 1..=y + 1 {
                for nx in x - 1..=x + 1 {
                    count += u8::from(marks[ny * w + nx]);
                }
            }
            out[idx] = count >= MAJORITY;
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/segment/fallback.rs"]
mod tests;
