use image::ImageEncoder as _;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};

use crate::foundation::config::PipelineConfig;
use crate::foundation::core::{ImageDimensions, RgbaImage};
use crate::foundation::error::{DepthTextError, DepthTextResult};

/// Decode user-supplied image bytes into a straight-alpha RGBA8 raster.
///
/// The MIME type must start with `image/`. Buffers larger than
/// `config.hard_max_file_size` are refused before decoding.
pub fn decode_image(bytes: &[u8], mime: &str, config: &PipelineConfig) -> DepthTextResult<RgbaImage> {
    if !mime.trim().to_ascii_lowercase().starts_with("image/") {
        return Err(DepthTextError::invalid_format(format!(
            "unsupported MIME type '{mime}', expected image/*"
        )));
    }
    if bytes.is_empty() {
        return Err(DepthTextError::invalid_format("input image data is empty"));
    }
    let len = bytes.len() as u64;
    if len > config.hard_max_file_size {
        return Err(DepthTextError::memory(format!(
            "input is {len} bytes, above the hard limit of {} bytes",
            config.hard_max_file_size
        )));
    }

    let dyn_img = image::load_from_memory(bytes).map_err(|e| {
        DepthTextError::invalid_format("could not decode image").with_technical(e.to_string())
    })?;
    let rgba = dyn_img.to_rgba8();
    ImageDimensions::of(&rgba)?;
    tracing::debug!(
        width = rgba.width(),
        height = rgba.height(),
        bytes = len,
        "decoded input image"
    );
    Ok(rgba)
}

/// Encode a raster as PNG, the only exported format.
///
/// PNG is lossless in every case; `quality` in `[0, 1]` only trades
/// encoding speed for output size.
pub fn export_png(image: &RgbaImage, quality: f32) -> DepthTextResult<Vec<u8>> {
    let compression = if quality >= 0.95 {
        CompressionType::Best
    } else if quality >= 0.5 {
        CompressionType::Default
    } else {
        CompressionType::Fast
    };

    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buf, compression, FilterType::Adaptive);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| DepthTextError::canvas("failed to encode PNG").with_technical(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
