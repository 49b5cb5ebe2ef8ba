use std::sync::Mutex;

use super::*;
use crate::foundation::error::ErrorKind;
use crate::metrics::memory::NoMemoryProbe;
use image::Rgba;

#[derive(Clone, Copy)]
enum Behavior {
    SoftCutout,
    Fail(&'static str),
    FailFirst(&'static str),
    Hang,
    WrongSize,
}

struct Scripted {
    behavior: Behavior,
    calls: Mutex<Vec<QualityLevel>>,
}

impl Scripted {
    fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<QualityLevel> {
        self.calls.lock().unwrap().clone()
    }
}

impl SubjectSegmenter for &Scripted {
    async fn segment(
        &self,
        image: &RgbaImage,
        quality: QualityLevel,
    ) -> anyhow::Result<RgbaImage> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(quality);
            calls.len()
        };
        let cutout = || {
            let mut out = image.clone();
            for p in out.pixels_mut() {
                p[3] = 128;
            }
            out
        };
        match self.behavior {
            Behavior::SoftCutout => Ok(cutout()),
            Behavior::Fail(msg) => Err(anyhow::anyhow!(msg)),
            Behavior::FailFirst(msg) if attempt == 1 => Err(anyhow::anyhow!(msg)),
            Behavior::FailFirst(_) => Ok(cutout()),
            Behavior::Hang => std::future::pending().await,
            Behavior::WrongSize => Ok(RgbaImage::new(1, 1)),
        }
    }
}

fn orchestrator(seg: &Scripted) -> SegmentationOrchestrator<&Scripted> {
    SegmentationOrchestrator::new(seg, PipelineConfig::default())
        .with_memory_probe(Arc::new(NoMemoryProbe))
}

fn photo() -> RgbaImage {
    RgbaImage::from_pixel(16, 12, Rgba([120, 110, 100, 255]))
}

async fn run(
    seg: &Scripted,
    image: RgbaImage,
) -> (DepthTextResult<Segmentation>, Vec<(String, u8)>) {
    let mut events = Vec::new();
    let mut sink = |step: &str, p: u8| events.push((step.to_owned(), p));
    let out = orchestrator(seg).segment(image, &mut sink).await;
    (out, events)
}

fn assert_monotone_to_100(events: &[(String, u8)]) {
    assert!(events.windows(2).all(|w| w[0].1 <= w[1].1), "{events:?}");
    assert_eq!(events.last().map(|e| e.1), Some(100));
}

#[tokio::test(start_paused = true)]
async fn external_success_keeps_soft_alpha() {
    let seg = Scripted::new(Behavior::SoftCutout);
    let (out, events) = run(&seg, photo()).await;
    let out = out.unwrap();

    assert_eq!(out.source, SegmentationSource::External(QualityLevel::High));
    assert_eq!(seg.calls(), vec![QualityLevel::High]);
    assert_eq!(out.mask.alpha_at(3, 3), 128);
    assert!(!out.mask.is_binary());
    assert_eq!(out.subject.dimensions(), (16, 12));
    assert!(!out.optimized.was_optimized);
    assert_monotone_to_100(&events);
}

#[tokio::test(start_paused = true)]
async fn memory_pressure_retries_once_at_reduced_quality() {
    let seg = Scripted::new(Behavior::FailFirst("out of memory while running model"));
    let (out, events) = run(&seg, photo()).await;
    let out = out.unwrap();

    assert_eq!(out.source, SegmentationSource::External(QualityLevel::Reduced));
    assert_eq!(seg.calls(), vec![QualityLevel::High, QualityLevel::Reduced]);
    assert!(events.iter().any(|(step, p)| step.contains("reduced") && *p == 40));
    assert_monotone_to_100(&events);
}

#[tokio::test(start_paused = true)]
async fn failed_retry_falls_back() {
    let seg = Scripted::new(Behavior::Fail("request timed out"));
    let (out, events) = run(&seg, photo()).await;
    let out = out.unwrap();

    assert_eq!(out.source, SegmentationSource::Fallback);
    assert_eq!(seg.calls().len(), 2);
    assert!(out.mask.is_binary());
    assert_monotone_to_100(&events);
}

#[tokio::test(start_paused = true)]
async fn generic_failure_skips_the_retry() {
    let seg = Scripted::new(Behavior::Fail("model produced garbage"));
    let (out, _) = run(&seg, photo()).await;
    assert_eq!(out.unwrap().source, SegmentationSource::Fallback);
    assert_eq!(seg.calls(), vec![QualityLevel::High]);
}

#[tokio::test(start_paused = true)]
async fn lost_race_goes_straight_to_fallback() {
    let seg = Scripted::new(Behavior::Hang);
    let started = tokio::time::Instant::now();
    let (out, events) = run(&seg, photo()).await;

    assert_eq!(out.unwrap().source, SegmentationSource::Fallback);
    assert_eq!(seg.calls(), vec![QualityLevel::High]);
    assert!(started.elapsed() >= PipelineConfig::default().primary_timeout);
    assert_monotone_to_100(&events);
}

#[tokio::test(start_paused = true)]
async fn wrong_sized_result_is_treated_as_failure() {
    let seg = Scripted::new(Behavior::WrongSize);
    let (out, _) = run(&seg, photo()).await;
    let out = out.unwrap();
    assert_eq!(out.source, SegmentationSource::Fallback);
    assert_eq!(out.mask.width(), 16);
}

#[tokio::test(start_paused = true)]
async fn empty_input_is_rejected_before_segmentation() {
    let seg = Scripted::new(Behavior::SoftCutout);
    let (out, events) = run(&seg, RgbaImage::new(0, 5)).await;
    assert_eq!(out.unwrap_err().kind(), ErrorKind::InvalidFormat);
    assert!(seg.calls().is_empty());
    assert_eq!(events.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn large_input_is_optimized_before_segmentation() {
    let seg = Scripted::new(Behavior::SoftCutout);
    let cfg = PipelineConfig {
        optimization: crate::foundation::config::OptimizationConfig {
            max_dimension: 8,
            ..Default::default()
        },
        ..PipelineConfig::default()
    };
    let orch = SegmentationOrchestrator::new(&seg, cfg).with_memory_probe(Arc::new(NoMemoryProbe));
    let out = orch.segment(photo(), &mut |_: &str, _: u8| {}).await.unwrap();
    assert!(out.optimized.was_optimized);
    assert_eq!(out.subject.dimensions(), (8, 6));
    assert_eq!(out.metrics.image_size.processed, ImageDimensions::new(8, 6).unwrap());
    assert_eq!(out.metrics.image_size.original, ImageDimensions::new(16, 12).unwrap());
}
