use crate::assets::decode::{decode_image, export_png};
use crate::assets::fonts::FontBook;
use crate::foundation::config::PipelineConfig;
use crate::foundation::core::{DeviceTier, ImageDimensions, RgbaImage};
use crate::foundation::error::DepthTextResult;
use crate::metrics::tracker::ProcessingMetrics;
use crate::prepare::validate::{ValidationReport, validate};
use crate::render::compositor::compose;
use crate::render::mobile::compose_simple;
use crate::render::text::TextRenderOptions;
use crate::segment::external::SubjectSegmenter;
use crate::segment::orchestrator::{SegmentationOrchestrator, SegmentationSource};

/// Serializable summary of one pipeline run.
#[derive(Clone, Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineReport {
    /// Tier the run was configured for.
    pub device_tier: DeviceTier,
    /// Advisory validation of the input.
    pub validation: ValidationReport,
    /// Path that produced the subject.
    pub source: SegmentationSource,
    /// Whether the input was downscaled.
    pub was_optimized: bool,
    /// Size of the exported image.
    pub output: ImageDimensions,
    /// Timing and memory diagnostics.
    pub metrics: ProcessingMetrics,
}

/// Final raster, its PNG encoding and the run summary.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    /// Composited raster.
    pub image: RgbaImage,
    /// PNG encoding of `image`.
    pub png: Vec<u8>,
    /// Run summary.
    pub report: PipelineReport,
}

/// Decode, segment, composite and export one photo.
///
/// `text` positions are given in the coordinates of the decoded input and
/// are rescaled when the input is downscaled. Desktop runs put the text
/// behind the subject; mobile runs draw it over the subject-only raster.
#[tracing::instrument(skip_all, fields(tier = %config.device_tier, bytes = bytes.len()))]
pub async fn run_pipeline<S: SubjectSegmenter>(
    bytes: &[u8],
    mime: &str,
    text: &TextRenderOptions,
    segmenter: S,
    config: &PipelineConfig,
    fonts: &FontBook,
    on_progress: &mut dyn FnMut(&str, u8),
) -> DepthTextResult<PipelineOutput> {
    let decoded = decode_image(bytes, mime, config)?;
    let validation = validate(
        bytes.len() as u64,
        ImageDimensions::of(&decoded)?,
        &config.optimization,
    );

    let orchestrator = SegmentationOrchestrator::new(segmenter, config.clone());
    let seg = orchestrator.segment(decoded, on_progress).await?;

    let text = text.scaled(seg.optimized.scale_factor());
    let image = match config.device_tier {
        DeviceTier::Desktop => compose(&seg.optimized.image, &seg.subject, &seg.mask, &text, fonts)?,
        DeviceTier::Mobile => compose_simple(&seg.subject, &text, fonts)?,
    };
    let png = export_png(&image, 1.0)?;
    tracing::info!(png_bytes = png.len(), source = ?seg.source, "pipeline finished");

    Ok(PipelineOutput {
        report: PipelineReport {
            device_tier: config.device_tier,
            validation,
            source: seg.source,
            was_optimized: seg.optimized.was_optimized,
            output: ImageDimensions::of(&image)?,
            metrics: seg.metrics,
        },
        image,
        png,
    })
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
