use crate::foundation::error::{DepthTextError, DepthTextResult};
use crate::foundation::math::mul_div255_u8;

pub type PremulRgba8 = [u8; 4];

pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = add_sat_u8(sa, mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = add_sat_u8(sc, dc);
    }
    out
}

/// Erase `dst` where the cutter is opaque: every channel is scaled by
/// `1 - cutter_alpha`.
pub fn destination_out(dst: PremulRgba8, cutter_alpha: u8) -> PremulRgba8 {
    if cutter_alpha == 0 {
        return dst;
    }
    let keep = 255u16 - u16::from(cutter_alpha);
    dst.map(|c| mul_div255(u16::from(c), keep))
}

pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> DepthTextResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(DepthTextError::image_processing(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// `dst = dst * (1 - mask.alpha)` per pixel; only the mask's alpha channel is read.
pub fn destination_out_in_place(dst: &mut [u8], mask: &[u8]) -> DepthTextResult<()> {
    if dst.len() != mask.len() || !dst.len().is_multiple_of(4) {
        return Err(DepthTextError::image_processing(
            "destination_out_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, m) in dst.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let out = destination_out([d[0], d[1], d[2], d[3]], m[3]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Multiply every premultiplied channel by `opacity`.
pub fn scale_in_place(buf: &mut [u8], opacity: f32) {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity >= 1.0 {
        return;
    }
    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    for c in buf.iter_mut() {
        *c = mul_div255(u16::from(*c), op);
    }
}

pub fn premultiply_rgba8_in_place(buf: &mut [u8]) {
    for px in buf.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = mul_div255(u16::from(*c), a);
        }
    }
}

pub fn demultiply_rgba8_in_place(buf: &mut [u8]) {
    for px in buf.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        match a {
            255 => {}
            0 => px[..3].fill(0),
            _ => {
                for c in &mut px[..3] {
                    let v = (u32::from(*c) * 255 + a / 2) / a;
                    *c = v.min(255) as u8;
                }
            }
        }
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    mul_div255_u8(x, y)
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}

#[cfg(test)]
#[path = "../../tests/unit/effects/composite.rs"]
mod tests;
