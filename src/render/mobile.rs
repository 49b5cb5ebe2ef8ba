//! Lightweight compositor for constrained devices.
//!
//! Text is drawn straight over the subject-only raster with a strong drop
//! shadow. No mask is involved, so the text sits in front of the subject.

use crate::assets::fonts::FontBook;
use crate::effects::composite::{
    demultiply_rgba8_in_place, over_in_place, premultiply_rgba8_in_place,
};
use crate::foundation::core::{ImageDimensions, RgbaImage};
use crate::foundation::error::{DepthTextError, DepthTextResult};
use crate::render::text::{ShadowStyle, TextRenderOptions, render_text_layer};

/// Draw `text` with the mobile shadow on top of `subject`.
#[tracing::instrument(level = "debug", skip_all)]
pub fn compose_simple(
    subject: &RgbaImage,
    text: &TextRenderOptions,
    fonts: &FontBook,
) -> DepthTextResult<RgbaImage> {
    let dims = ImageDimensions::of(subject)?;
    let layer = render_text_layer(
        text,
        dims.width,
        dims.height,
        fonts,
        Some(ShadowStyle::mobile()),
    )?;
    overlay_text(subject, &layer)
}

pub(crate) fn overlay_text(subject: &RgbaImage, text_layer: &[u8]) -> DepthTextResult<RgbaImage> {
    let mut surface = subject.as_raw().clone();
    premultiply_rgba8_in_place(&mut surface);
    over_in_place(&mut surface, text_layer, 1.0)?;
    demultiply_rgba8_in_place(&mut surface);
    RgbaImage::from_raw(subject.width(), subject.height(), surface)
        .ok_or_else(|| DepthTextError::canvas("mobile surface has the wrong size"))
}

#[cfg(test)]
#[path = "../../tests/unit/render/mobile.rs"]
mod tests;
