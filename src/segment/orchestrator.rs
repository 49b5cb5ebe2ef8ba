//! Segmentation orchestration.
//!
//! One [`SegmentationOrchestrator::segment`] call runs:
//!
//! 1. input validation and optimization,
//! 2. a quality-first external attempt raced against the tier timeout,
//! 3. on a resource-pressure failure, one reduced-quality retry with its own
//!    fixed budget,
//! 4. otherwise (or if the retry fails) the heuristic fallback,
//! 5. mask conversion and metrics finalization.
//!
//! The timeout race drops the losing future. Dropping is the only
//! cancellation offered; a collaborator may keep working after it loses.

use std::sync::Arc;
use std::time::Duration;

use crate::foundation::config::PipelineConfig;
use crate::foundation::core::{ImageDimensions, QualityLevel, RgbaImage, SubjectMask};
use crate::foundation::error::{DepthTextError, DepthTextResult, is_resource_pressure};
use crate::metrics::memory::{MemoryProbe, default_probe};
use crate::metrics::tracker::{PerformanceTracker, ProcessingMetrics};
use crate::prepare::optimize::{OptimizedImage, optimize};
use crate::segment::external::SubjectSegmenter;
use crate::segment::fallback::fallback;
use crate::segment::mask::{apply_mask, to_mask};
use crate::segment::progress::ProgressReporter;

/// Which path produced the subject.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "quality")]
pub enum SegmentationSource {
    /// External capability at the given quality.
    External(QualityLevel),
    /// Heuristic fallback (binary mask).
    Fallback,
}

/// Result of one orchestrated segmentation.
#[derive(Clone, Debug)]
pub struct Segmentation {
    /// The optimized input; the compositor draws on this.
    pub optimized: OptimizedImage,
    /// Subject-only raster, same size as `optimized.image`.
    pub subject: RgbaImage,
    /// Mask derived from `subject`.
    pub mask: SubjectMask,
    /// Frozen run metrics.
    pub metrics: ProcessingMetrics,
    /// Path that produced `subject`.
    pub source: SegmentationSource,
}

/// Drives an external [`SubjectSegmenter`] with timeouts, retry and fallback.
pub struct SegmentationOrchestrator<S> {
    segmenter: S,
    config: PipelineConfig,
    probe: Arc<dyn MemoryProbe>,
}

#[derive(Debug)]
enum AttemptError {
    TimedOut(Duration),
    Failed(anyhow::Error),
}

impl AttemptError {
    fn is_resource_pressure(&self) -> bool {
        match self {
            Self::TimedOut(_) => false,
            Self::Failed(e) => is_resource_pressure(&format!("{e:#}")),
        }
    }
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TimedOut(budget) => write!(f, "no result within {} ms", budget.as_millis()),
            Self::Failed(e) => write!(f, "{e:#}"),
        }
    }
}

impl<S: SubjectSegmenter> SegmentationOrchestrator<S> {
    /// Orchestrator using the platform's default memory probe.
    pub fn new(segmenter: S, config: PipelineConfig) -> Self {
        Self {
            segmenter,
            config,
            probe: default_probe(),
        }
    }

    /// Replace the memory probe used for metrics and headroom checks.
    pub fn with_memory_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Configuration this orchestrator was built with.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Segment `image`, reporting `(step, percent)` to `on_progress`.
    ///
    /// Percentages never decrease and end at 100 on success. External
    /// failures are absorbed by the heuristic fallback; an error is returned
    /// only for invalid input or when the fallback itself fails.
    #[tracing::instrument(skip_all, fields(tier = %self.config.device_tier))]
    pub async fn segment(
        &self,
        image: RgbaImage,
        on_progress: &mut dyn FnMut(&str, u8),
    ) -> DepthTextResult<Segmentation> {
        let mut progress = ProgressReporter::new(on_progress);

        progress.report("Validating image", 0);
        let original_dims = ImageDimensions::of(&image)?;
        let mut tracker = PerformanceTracker::start(
            original_dims,
            Arc::clone(&self.probe),
            self.config.sample_interval,
        );

        progress.report("Optimizing image", 5);
        let optimized = optimize(image, &self.config.optimization)?;
        tracker.update_processed_dimensions(optimized.optimized_dims);
        self.check_headroom(optimized.optimized_dims);

        progress.report("Preparing segmentation", 15);
        let (subject, mask, source) = match self.run_external(&optimized.image, &mut progress).await {
            Ok((subject, quality)) => {
                progress.report("Creating mask", 85);
                let mask = to_mask(&subject);
                (subject, mask, SegmentationSource::External(quality))
            }
            Err(reason) => {
                tracing::warn!(%reason, "external segmentation failed, using heuristic fallback");
                progress.report("Using fallback segmentation", 60);
                let mask = fallback(&optimized.image).map_err(|e| {
                    DepthTextError::image_processing("fallback segmentation failed")
                        .with_technical(format!("external: {reason}; fallback: {}", e.technical()))
                })?;
                progress.report("Creating mask", 85);
                let subject = apply_mask(&optimized.image, &mask)?;
                (subject, mask, SegmentationSource::Fallback)
            }
        };

        progress.report("Finalizing", 95);
        tracker.sample_now();
        let metrics = tracker.finish();
        tracing::info!(
            ?source,
            duration_ms = metrics.duration_ms,
            subject_pixels = mask.subject_pixel_count(),
            "segmentation complete"
        );
        progress.report("Complete", 100);

        Ok(Segmentation {
            optimized,
            subject,
            mask,
            metrics,
            source,
        })
    }

    async fn run_external(
        &self,
        image: &RgbaImage,
        progress: &mut ProgressReporter<'_>,
    ) -> Result<(RgbaImage, QualityLevel), AttemptError> {
        progress.report("Removing background (high quality)", 20);
        let first = self
            .attempt(image, QualityLevel::High, self.config.primary_timeout)
            .await;
        let err = match first {
            Ok(subject) => {
                progress.report("Background removed", 80);
                return Ok((subject, QualityLevel::High));
            }
            Err(err) => err,
        };

        if !err.is_resource_pressure() {
            return Err(err);
        }

        tracing::warn!(reason = %err, "resource pressure, retrying at reduced quality");
        progress.report("Retrying at reduced quality", 40);
        let subject = self
            .attempt(image, QualityLevel::Reduced, self.config.retry_timeout)
            .await?;
        progress.report("Background removed", 80);
        Ok((subject, QualityLevel::Reduced))
    }

    async fn attempt(
        &self,
        image: &RgbaImage,
        quality: QualityLevel,
        budget: Duration,
    ) -> Result<RgbaImage, AttemptError> {
        tracing::debug!(
            %quality,
            value = quality.value(self.config.optimization.quality_threshold),
            budget_ms = budget.as_millis() as u64,
            "external segmentation attempt"
        );
        let call = self.segmenter.segment(image, quality);
        let subject = match tokio::time::timeout(budget, call).await {
            Err(_) => return Err(AttemptError::TimedOut(budget)),
            Ok(Err(e)) => return Err(AttemptError::Failed(e)),
            Ok(Ok(subject)) => subject,
        };
        if subject.dimensions() != image.dimensions() {
            let (w, h) = subject.dimensions();
            return Err(AttemptError::Failed(anyhow::anyhow!(
                "segmenter returned a {w}x{h} raster for a {}x{} input",
                image.width(),
                image.height()
            )));
        }
        Ok(subject)
    }

    fn check_headroom(&self, dims: ImageDimensions) {
        // Input, subject, mask and output buffers are alive together.
        let needed = dims.rgba_bytes().saturating_mul(4);
        let in_use = self.probe.current_bytes().unwrap_or(0);
        let threshold = self.config.optimization.memory_threshold_bytes();
        if in_use.saturating_add(needed) > threshold {
            tracing::warn!(
                needed_mb = needed / (1024 * 1024),
                in_use_mb = in_use / (1024 * 1024),
                threshold_mb = self.config.optimization.memory_threshold_mb,
                "memory may be tight for this image"
            );
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/segment/orchestrator.rs"]
mod tests;
