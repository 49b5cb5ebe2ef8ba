//! depthtext places text *behind* the subject of a photo.
//!
//! A photo is segmented into a subject-only raster and a soft-edged mask,
//! then composited so the text sits between the background and the subject.
//!
//! # Pipeline overview
//!
//! 1. **Decode**: bytes + MIME type -> straight-alpha RGBA8 raster ([`decode_image`])
//! 2. **Validate**: advisory size, dimension and memory checks ([`validate`])
//! 3. **Segment**: optimize, race the external [`SubjectSegmenter`] against a
//!    timeout, retry at reduced quality under resource pressure, fall back to
//!    a heuristic mask ([`SegmentationOrchestrator`])
//! 4. **Composite**: base, text, `destination-out` by mask, subject
//!    ([`compose`]), or text over the subject on constrained devices
//!    ([`compose_simple`])
//! 5. **Export**: lossless PNG ([`export_png`])
//!
//! [`run_pipeline`] chains all of the above for one photo.
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Explicit configuration**: a [`PipelineConfig`] (device tier, limits,
//!   timeouts) is chosen once per run and passed down, never probed mid-run.
//! - **Owned rasters**: every stage takes or returns owned buffers; temporary
//!   surfaces are scoped to the function that uses them.
//! - **Logging** goes through `tracing`; the library never installs a subscriber.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod effects;
mod foundation;
mod metrics;
mod pipeline;
mod prepare;
mod render;
mod segment;

pub use crate::assets::decode::{decode_image, export_png};
pub use crate::assets::fonts::FontBook;
pub use crate::foundation::config::{OptimizationConfig, PipelineConfig};
pub use crate::foundation::core::{
    DeviceTier, ImageDimensions, QualityLevel, RasterImage, RgbaImage, SubjectMask,
};
pub use crate::foundation::error::{
    DepthTextError, DepthTextResult, ErrorKind, is_resource_pressure,
};
#[cfg(feature = "alloc-track")]
pub use crate::metrics::memory::AllocTrackProbe;
pub use crate::metrics::memory::{MemoryProbe, NoMemoryProbe, ProcStatusProbe, default_probe};
pub use crate::metrics::tracker::{
    ImageSizes, MemoryUsage, PerformanceTracker, ProcessingMetrics,
};
pub use crate::pipeline::{PipelineOutput, PipelineReport, run_pipeline};
pub use crate::prepare::optimize::{OptimizedImage, optimize, target_dimensions};
pub use crate::prepare::validate::{ValidationReport, validate};
pub use crate::render::compositor::{compose, compose_layers};
pub use crate::render::mobile::compose_simple;
pub use crate::render::text::{ShadowStyle, TextColor, TextRenderOptions, render_text_layer};
pub use crate::segment::external::{StaticCutout, SubjectSegmenter, Unavailable};
pub use crate::segment::fallback::fallback;
pub use crate::segment::mask::{apply_mask, to_mask};
pub use crate::segment::orchestrator::{
    Segmentation, SegmentationOrchestrator, SegmentationSource,
};
pub use crate::segment::progress::ProgressReporter;
