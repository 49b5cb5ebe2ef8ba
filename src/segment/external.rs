//! Boundary to the subject-segmentation capability.
//!
//! The capability is opaque: given a raster it eventually yields a raster of
//! the same size holding only the subject on a transparent background, or an
//! error. Errors are plain `anyhow` errors whose text is classified by the
//! orchestrator.

use std::future::Future;

use anyhow::bail;

use crate::foundation::core::{ImageDimensions, QualityLevel, RgbaImage};
use crate::prepare::optimize::resize_rgba;

/// Asynchronous subject segmentation.
///
/// Implementations may ignore cancellation: when a call loses the timeout
/// race its future is dropped, but work it already started elsewhere may
/// keep running.
pub trait SubjectSegmenter {
    /// Produce a subject-only raster with the same dimensions as `image`.
    fn segment(
        &self,
        image: &RgbaImage,
        quality: QualityLevel,
    ) -> impl Future<Output = anyhow::Result<RgbaImage>> + Send;
}

/// No segmentation capability; every call fails and the heuristic fallback runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unavailable;

impl SubjectSegmenter for Unavailable {
    async fn segment(
        &self,
        _image: &RgbaImage,
        _quality: QualityLevel,
    ) -> anyhow::Result<RgbaImage> {
        bail!("segmentation capability unavailable")
    }
}

/// A cutout computed ahead of time (for example by an external tool).
///
/// The cutout is resampled to the requested size when the pipeline has
/// downscaled the input.
#[derive(Clone, Debug)]
pub struct StaticCutout {
    cutout: RgbaImage,
}

impl StaticCutout {
    /// Wrap a subject-only raster.
    pub fn new(cutout: RgbaImage) -> Self {
        Self { cutout }
    }
}

impl SubjectSegmenter for StaticCutout {
    async fn segment(
        &self,
        image: &RgbaImage,
        quality: QualityLevel,
    ) -> anyhow::Result<RgbaImage> {
        if self.cutout.dimensions() == image.dimensions() {
            return Ok(self.cutout.clone());
        }
        let target = ImageDimensions::of(image)?;
        let source = ImageDimensions::of(&self.cutout)?;
        if (source.aspect_ratio() - target.aspect_ratio()).abs() > 0.02 {
            bail!("cutout aspect ratio does not match the input ({source} vs {target})");
        }
        tracing::debug!(from = %source, to = %target, %quality, "resampling precomputed cutout");
        Ok(resize_rgba(&self.cutout, target)?)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/segment/external.rs"]
mod tests;
