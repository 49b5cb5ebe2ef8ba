use fast_image_resize as fr;

use crate::assets::decode::export_png;
use crate::foundation::config::OptimizationConfig;
use crate::foundation::core::{ImageDimensions, RgbaImage};
use crate::foundation::error::{DepthTextError, DepthTextResult};
use crate::foundation::math::rgba_len;

/// Output of [`optimize`].
#[derive(Clone, Debug)]
pub struct OptimizedImage {
    /// Raster to feed into segmentation.
    pub image: RgbaImage,
    /// Dimensions before optimization.
    pub original_dims: ImageDimensions,
    /// Dimensions of `image`.
    pub optimized_dims: ImageDimensions,
    /// `true` when the raster was resized.
    pub was_optimized: bool,
    /// Lossless PNG re-encoding of a resized raster, handed to callers that
    /// persist or upload the optimized input; `None` when untouched.
    pub encoded_png: Option<Vec<u8>>,
}

impl OptimizedImage {
    /// `optimized / original` along the longest side (`1.0` when untouched).
    pub fn scale_factor(&self) -> f32 {
        self.optimized_dims.max_side() as f32 / self.original_dims.max_side() as f32
    }
}

/// Size that fits `dims` within `max_dimension` on its longest side,
/// preserving aspect ratio. Returns `dims` when it already fits.
pub fn target_dimensions(dims: ImageDimensions, max_dimension: u32) -> ImageDimensions {
    let max_dimension = max_dimension.max(1);
    if dims.max_side() <= max_dimension {
        return dims;
    }
    let scale = f64::from(max_dimension) / f64::from(dims.max_side());
    let side = |v: u32| ((f64::from(v) * scale).round() as u32).clamp(1, max_dimension);
    ImageDimensions {
        width: side(dims.width),
        height: side(dims.height),
    }
}

/// Downscale `image` so its longest side is at most `config.max_dimension`.
///
/// Resampling uses a Catmull-Rom convolution with alpha-aware filtering.
/// The resized raster is re-encoded as PNG so alpha survives bit-exact. The
/// encoding uses the fastest compression level regardless of the config.
#[tracing::instrument(level = "debug", skip_all, fields(max_dimension = config.max_dimension))]
pub fn optimize(image: RgbaImage, config: &OptimizationConfig) -> DepthTextResult<OptimizedImage> {
    let original_dims = ImageDimensions::of(&image)?;
    let target = target_dimensions(original_dims, config.max_dimension);
    if target == original_dims {
        tracing::debug!(dims = %original_dims, "image within limits, not resized");
        return Ok(OptimizedImage {
            image,
            original_dims,
            optimized_dims: original_dims,
            was_optimized: false,
            encoded_png: None,
        });
    }

    let resized = resize_rgba(&image, target)?;
    drop(image);

    // Fastest deflate level; the output stays lossless.
    let encoded = export_png(&resized, 0.0).map_err(|e| {
        DepthTextError::canvas("failed to re-encode optimized image")
            .with_technical(e.technical().to_owned())
    })?;

    tracing::info!(
        from = %original_dims,
        to = %target,
        encoded_bytes = encoded.len(),
        "optimized input image"
    );

    Ok(OptimizedImage {
        image: resized,
        original_dims,
        optimized_dims: target,
        was_optimized: true,
        encoded_png: Some(encoded),
    })
}

pub(crate) fn resize_rgba(src: &RgbaImage, target: ImageDimensions) -> DepthTextResult<RgbaImage> {
    let len = rgba_len(target.width, target.height)
        .ok_or_else(|| DepthTextError::memory(format!("resize target {target} overflows")))?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|e| {
        DepthTextError::memory(format!("cannot allocate {len} bytes for a {target} raster"))
            .with_technical(e.to_string())
    })?;
    buf.resize(len, 0);

    let src_view = fr::images::ImageRef::new(
        src.width(),
        src.height(),
        src.as_raw(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| {
        DepthTextError::image_processing("source raster rejected by resizer")
            .with_technical(e.to_string())
    })?;
    let mut dst =
        fr::images::Image::from_vec_u8(target.width, target.height, buf, fr::PixelType::U8x4)
            .map_err(|e| {
                DepthTextError::memory("destination raster rejected by resizer")
                    .with_technical(e.to_string())
            })?;

    let mut resizer = fr::Resizer::new();
    let options = fr::ResizeOptions::new()
        .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::CatmullRom))
        .use_alpha(true);
    resizer
        .resize(&src_view, &mut dst, Some(&options))
        .map_err(|e| {
            DepthTextError::image_processing("resize failed").with_technical(e.to_string())
        })?;

    RgbaImage::from_raw(target.width, target.height, dst.into_vec())
        .ok_or_else(|| DepthTextError::canvas("resized buffer has the wrong length"))
}

#[cfg(test)]
#[path = "../../tests/unit/prepare/optimize.rs"]
mod tests;
