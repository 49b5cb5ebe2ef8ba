use crate::foundation::core::{RgbaImage, SubjectMask};
use crate::foundation::error::{DepthTextError, DepthTextResult};
use crate::foundation::math::mul_div255_u8;

/// Convert a subject-only raster into a mask.
///
/// Alpha is copied as-is so antialiased edges stay soft: `a > 0` becomes
/// `(255, 255, 255, a)`, `a == 0` becomes `(0, 0, 0, 0)`.
pub fn to_mask(subject: &RgbaImage) -> SubjectMask {
    let mut out = RgbaImage::new(subject.width(), subject.height());
    for (dst, src) in out.pixels_mut().zip(subject.pixels()) {
        let a = src[3];
        if a > 0 {
            dst.0 = [255, 255, 255, a];
        }
    }
    SubjectMask::from_image(out)
}

/// Cut the subject out of `image`: its alpha is multiplied by the mask alpha.
pub fn apply_mask(image: &RgbaImage, mask: &SubjectMask) -> DepthTextResult<RgbaImage> {
    if image.dimensions() != (mask.width(), mask.height()) {
        return Err(DepthTextError::image_processing(format!(
            "mask is {}x{} but image is {}x{}",
            mask.width(),
            mask.height(),
            image.width(),
            image.height()
        )));
    }
    let mut out = image.clone();
    for (px, m) in out.pixels_mut().zip(mask.image().pixels()) {
        px[3] = mul_div255_u8(u16::from(px[3]), u16::from(m[3]));
        if px[3] == 0 {
            px.0 = [0, 0, 0, 0];
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/segment/mask.rs"]
mod tests;
