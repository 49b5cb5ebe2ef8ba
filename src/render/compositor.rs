//! Desktop compositor: puts text behind the subject.
//!
//! The output is built in four ordered steps over one premultiplied surface:
//!
//! 1. the original photo is copied in as the base,
//! 2. the text layer is drawn over it,
//! 3. the surface is erased under the mask (`destination-out`, soft edges
//!    give soft erasure),
//! 4. the subject-only raster is drawn over the hole.
//!
//! Reordering any of these breaks the depth illusion.

use crate::assets::fonts::FontBook;
use crate::effects::composite::{
    demultiply_rgba8_in_place, destination_out_in_place, over_in_place,
    premultiply_rgba8_in_place,
};
use crate::foundation::core::{ImageDimensions, RgbaImage, SubjectMask};
use crate::foundation::error::{DepthTextError, DepthTextResult};
use crate::render::text::{ShadowStyle, TextRenderOptions, render_text_layer};

/// Composite `text` between the background of `original` and `subject`.
///
/// `original`, `subject` and `mask` must share the same non-zero
/// dimensions, otherwise an image processing error is returned.
#[tracing::instrument(level = "debug", skip_all)]
pub fn compose(
    original: &RgbaImage,
    subject: &RgbaImage,
    mask: &SubjectMask,
    text: &TextRenderOptions,
    fonts: &FontBook,
) -> DepthTextResult<RgbaImage> {
    let dims = check_shapes(original, subject, mask)?;
    let text_layer = render_text_layer(
        text,
        dims.width,
        dims.height,
        fonts,
        Some(ShadowStyle::desktop()),
    )?;
    compose_layers(original, subject, mask, &text_layer)
}

/// Same as [`compose`] with an already rasterized premultiplied text layer.
pub fn compose_layers(
    original: &RgbaImage,
    subject: &RgbaImage,
    mask: &SubjectMask,
    text_layer: &[u8],
) -> DepthTextResult<RgbaImage> {
    let dims = check_shapes(original, subject, mask)?;
    if text_layer.len() != original.as_raw().len() {
        return Err(DepthTextError::image_processing(format!(
            "text layer holds {} bytes, expected {} for {dims}",
            text_layer.len(),
            original.as_raw().len()
        )));
    }

    let mut surface = original.as_raw().clone();
    premultiply_rgba8_in_place(&mut surface);

    over_in_place(&mut surface, text_layer, 1.0)?;

    destination_out_in_place(&mut surface, mask.image().as_raw())?;

    {
        let mut subject_premul = subject.as_raw().clone();
        premultiply_rgba8_in_place(&mut subject_premul);
        over_in_place(&mut surface, &subject_premul, 1.0)?;
    }

    demultiply_rgba8_in_place(&mut surface);
    tracing::debug!(%dims, "composited text behind subject");
    RgbaImage::from_raw(dims.width, dims.height, surface)
        .ok_or_else(|| DepthTextError::canvas("composited surface has the wrong size"))
}

fn check_shapes(
    original: &RgbaImage,
    subject: &RgbaImage,
    mask: &SubjectMask,
) -> DepthTextResult<ImageDimensions> {
    let shapes = [
        ("original", original.dimensions()),
        ("subject", subject.dimensions()),
        ("mask", (mask.width(), mask.height())),
    ];
    let (_, (w, h)) = shapes[0];
    if let Some((name, (ow, oh))) = shapes.iter().find(|(_, d)| *d != (w, h)) {
        return Err(DepthTextError::image_processing(format!(
            "compositor inputs differ in size: original is {w}x{h}, {name} is {ow}x{oh}"
        )));
    }
    ImageDimensions::new(w, h).map_err(|_| {
        DepthTextError::image_processing(format!("compositor inputs are empty ({w}x{h})"))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
