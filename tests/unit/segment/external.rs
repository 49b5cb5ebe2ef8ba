use super::*;
use image::Rgba;

#[tokio::test]
async fn unavailable_always_fails_with_initialization_signature() {
    let err = Unavailable
        .segment(&RgbaImage::new(2, 2), QualityLevel::High)
        .await
        .unwrap_err();
    let kind = crate::foundation::error::ErrorKind::classify(&err.to_string());
    assert_eq!(kind, crate::foundation::error::ErrorKind::LibraryInitialization);
}

#[tokio::test]
async fn static_cutout_is_returned_as_is_when_sizes_match() {
    let cutout = RgbaImage::from_pixel(4, 2, Rgba([1, 2, 3, 200]));
    let seg = StaticCutout::new(cutout.clone());
    let out = seg.segment(&RgbaImage::new(4, 2), QualityLevel::High).await.unwrap();
    assert_eq!(out, cutout);
}

#[tokio::test]
async fn static_cutout_follows_a_downscaled_input() {
    let seg = StaticCutout::new(RgbaImage::from_pixel(40, 20, Rgba([9, 9, 9, 255])));
    let out = seg.segment(&RgbaImage::new(10, 5), QualityLevel::Reduced).await.unwrap();
    assert_eq!(out.dimensions(), (10, 5));
}

#[tokio::test]
async fn static_cutout_rejects_another_shape() {
    let seg = StaticCutout::new(RgbaImage::new(40, 20));
    assert!(seg.segment(&RgbaImage::new(10, 10), QualityLevel::High).await.is_err());
}
