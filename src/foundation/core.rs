use std::fmt;
use std::str::FromStr;

use crate::foundation::error::{DepthTextError, DepthTextResult};

/// Re-export so callers can build rasters without depending on `image` directly.
pub use image::RgbaImage;

/// Owned RGBA8 raster, straight (non-premultiplied) alpha, row-major.
pub type RasterImage = RgbaImage;

/// Pixel dimensions of a decoded raster. Both sides are strictly positive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ImageDimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ImageDimensions {
    /// Create validated dimensions; zero on either axis is a load failure.
    pub fn new(width: u32, height: u32) -> DepthTextResult<Self> {
        if width == 0 || height == 0 {
            return Err(DepthTextError::invalid_format(format!(
                "image has zero dimensions ({width}x{height})"
            )));
        }
        Ok(Self { width, height })
    }

    /// Dimensions of an existing raster.
    pub fn of(image: &RgbaImage) -> DepthTextResult<Self> {
        Self::new(image.width(), image.height())
    }

    /// Longest side in pixels.
    pub fn max_side(self) -> u32 {
        self.width.max(self.height)
    }

    /// `width * height`.
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Bytes needed for one RGBA8 buffer of this size.
    pub fn rgba_bytes(self) -> u64 {
        self.pixel_count() * 4
    }

    /// `width / height`.
    pub fn aspect_ratio(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

impl fmt::Display for ImageDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Coarse device classification, decided once per pipeline run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceTier {
    /// Unconstrained device; runs the full mask-subtraction compositor.
    #[default]
    Desktop,
    /// Constrained device; smaller limits and the lightweight compositor.
    Mobile,
}

impl fmt::Display for DeviceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Desktop => "desktop",
            Self::Mobile => "mobile",
        })
    }
}

impl FromStr for DeviceTier {
    type Err = DepthTextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(Self::Desktop),
            "mobile" => Ok(Self::Mobile),
            other => Err(DepthTextError::image_processing(format!(
                "unknown device tier '{other}'"
            ))),
        }
    }
}

/// Output quality requested from the external segmentation capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    /// Maximum output quality; tried first.
    High,
    /// Cheaper pass used for the one-shot retry under resource pressure.
    Reduced,
}

impl QualityLevel {
    /// Numeric quality in `[0, 1]` handed to the external capability.
    ///
    /// `Reduced` maps to the configured quality threshold.
    pub fn value(self, quality_threshold: f32) -> f32 {
        match self {
            Self::High => 1.0,
            Self::Reduced => quality_threshold.clamp(0.0, 1.0),
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "high",
            Self::Reduced => "reduced",
        })
    }
}

/// Raster whose alpha encodes subject membership.
///
/// RGB is white where a pixel belongs to the subject and black elsewhere;
/// alpha carries confidence, so soft edges survive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubjectMask(RgbaImage);

impl SubjectMask {
    pub(crate) fn from_image(image: RgbaImage) -> Self {
        Self(image)
    }

    /// Borrow the underlying raster.
    pub fn image(&self) -> &RgbaImage {
        &self.0
    }

    /// Take ownership of the underlying raster.
    pub fn into_image(self) -> RgbaImage {
        self.0
    }

    /// Mask width in pixels.
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    /// Mask height in pixels.
    pub fn height(&self) -> u32 {
        self.0.height()
    }

    /// Subject membership of one pixel (`0` = background, `255` = subject).
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.0.get_pixel(x, y)[3]
    }

    /// Number of pixels with non-zero membership.
    pub fn subject_pixel_count(&self) -> usize {
        self.0.pixels().filter(|p| p[3] > 0).count()
    }

    /// Returns `true` when every alpha value is either `0` or `255`.
    pub fn is_binary(&self) -> bool {
        self.0.pixels().all(|p| p[3] == 0 || p[3] == 255)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
