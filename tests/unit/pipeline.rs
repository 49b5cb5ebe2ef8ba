use super::*;
use crate::foundation::core::QualityLevel;
use crate::foundation::error::ErrorKind;
use crate::segment::external::{StaticCutout, Unavailable};
use image::Rgba;

fn png(img: &RgbaImage) -> Vec<u8> {
    export_png(img, 0.0).unwrap()
}

fn no_fonts() -> FontBook {
    FontBook::from_font_data(Vec::<Vec<u8>>::new())
}

#[tokio::test(start_paused = true)]
async fn desktop_run_with_cutout_uses_external_source() {
    let photo = RgbaImage::from_pixel(20, 10, Rgba([50, 60, 70, 255]));
    let mut cutout = RgbaImage::new(20, 10);
    cutout.put_pixel(10, 5, Rgba([200, 0, 0, 255]));

    let out = run_pipeline(
        &png(&photo),
        "image/png",
        &TextRenderOptions::new("", 10.0, 5.0),
        StaticCutout::new(cutout),
        &PipelineConfig::default(),
        &no_fonts(),
        &mut |_: &str, _: u8| {},
    )
    .await
    .unwrap();

    assert_eq!(out.report.source, SegmentationSource::External(QualityLevel::High));
    assert_eq!(out.image.get_pixel(10, 5).0, [200, 0, 0, 255]);
    assert_eq!(out.image.get_pixel(0, 0).0, [50, 60, 70, 255]);
    assert_eq!(image::load_from_memory(&out.png).unwrap().to_rgba8(), out.image);
    assert!(out.report.validation.is_valid);
}

#[tokio::test(start_paused = true)]
async fn mobile_run_returns_subject_only_raster() {
    let photo = RgbaImage::from_pixel(8, 8, Rgba([50, 60, 70, 255]));
    let out = run_pipeline(
        &png(&photo),
        "image/png",
        &TextRenderOptions::new("", 4.0, 4.0),
        StaticCutout::new(RgbaImage::new(8, 8)),
        &PipelineConfig::for_tier(DeviceTier::Mobile),
        &no_fonts(),
        &mut |_: &str, _: u8| {},
    )
    .await
    .unwrap();

    assert_eq!(out.report.device_tier, DeviceTier::Mobile);
    assert!(out.image.pixels().all(|p| p[3] == 0));
}

#[tokio::test(start_paused = true)]
async fn unavailable_capability_degrades_to_fallback() {
    let photo = RgbaImage::from_pixel(12, 12, Rgba([128, 128, 128, 255]));
    let mut last = 0;
    let out = run_pipeline(
        &png(&photo),
        "image/png",
        &TextRenderOptions::new("", 6.0, 6.0),
        Unavailable,
        &PipelineConfig::default(),
        &no_fonts(),
        &mut |_: &str, p: u8| last = p,
    )
    .await
    .unwrap();
    assert_eq!(out.report.source, SegmentationSource::Fallback);
    assert_eq!(last, 100);

    let json = serde_json::to_value(&out.report).unwrap();
    assert_eq!(json["source"]["kind"], "fallback");
}

#[tokio::test(start_paused = true)]
async fn bad_input_surfaces_invalid_format() {
    let err = run_pipeline(
        b"not an image",
        "image/png",
        &TextRenderOptions::default(),
        Unavailable,
        &PipelineConfig::default(),
        &no_fonts(),
        &mut |_: &str, _: u8| {},
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidFormat);
}
