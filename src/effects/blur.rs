use crate::foundation::error::{DepthTextError, DepthTextResult};
use crate::foundation::math::rgba_len;

/// Kernel radius covering three standard deviations. Saturates at `u32::MAX`.
pub fn radius_for_sigma(sigma: f32) -> u32 {
    if !sigma.is_finite() || sigma <= 0.0 {
        return 0;
    }
    (sigma * 3.0).ceil() as u32
}

/// Gaussian blur of a premultiplied layer, where `sigma` is the standard
/// deviation in pixels (the CSS `blur(<length>)` convention).
///
/// Non-finite `sigma` is rejected. The radius never exceeds the longest
/// side of the layer, since taps past the edge only resample clamped pixels.
pub fn gaussian_blur_premul(
    src: &[u8],
    width: u32,
    height: u32,
    sigma: f32,
) -> DepthTextResult<Vec<u8>> {
    if !sigma.is_finite() {
        return Err(DepthTextError::image_processing(format!(
            "blur sigma must be finite, got {sigma}"
        )));
    }
    blur_rgba8_premul(src, width, height, radius_for_sigma(sigma), sigma)
}

pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> DepthTextResult<Vec<u8>> {
    let expected_len = rgba_len(width, height)
        .ok_or_else(|| DepthTextError::memory("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(DepthTextError::image_processing(
            "blur_rgba8_premul expects src matching width*height*4",
        ));
    }
    let radius = radius.min(width.max(height));
    if radius == 0 {
        return Ok(src.to_vec());
    }

    let kernel = gaussian_kernel_q16(radius, sigma)?;
    let mut tmp = vec![0u8; expected_len];
    let mut out = vec![0u8; expected_len];

    // Horizontal pass steps one pixel, vertical pass steps one row.
    convolve_axis(src, &mut tmp, width, height, &kernel, Axis::Horizontal);
    convolve_axis(&tmp, &mut out, width, height, &kernel, Axis::Vertical);
    Ok(out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> DepthTextResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(DepthTextError::image_processing("blur sigma must be > 0"));
    }

    let r = i32::try_from(radius)
        .map_err(|_| DepthTextError::image_processing(format!("blur radius {radius} too large")))?;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(DepthTextError::image_processing("gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();

    // Push the rounding residue into the centre tap so the kernel sums to 1.0.
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

fn convolve_axis(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], axis: Axis) {
    let radius = (k.len() / 2) as i64;
    let (w, h) = (i64::from(width), i64::from(height));
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as i64 - radius;
                let (sx, sy) = match axis {
                    Axis::Horizontal => ((x + d).clamp(0, w - 1), y),
                    Axis::Vertical => (x, (y + d).clamp(0, h - 1)),
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for (c, a) in acc.iter_mut().enumerate() {
                    *a += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for (c, a) in acc.iter().enumerate() {
                dst[out_idx + c] = q16_to_u8(*a);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    v.min(255) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blur.rs"]
mod tests;
