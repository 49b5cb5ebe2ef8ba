use super::*;

#[test]
fn zero_dimensions_are_a_load_failure() {
    let err = ImageDimensions::new(0, 10).unwrap_err();
    assert_eq!(
        err.kind(),
        crate::foundation::error::ErrorKind::InvalidFormat
    );
    assert!(ImageDimensions::new(10, 0).is_err());
    assert!(ImageDimensions::new(1, 1).is_ok());
}

#[test]
fn dimension_helpers() {
    let d = ImageDimensions::new(3000, 2000).unwrap();
    assert_eq!(d.max_side(), 3000);
    assert_eq!(d.pixel_count(), 6_000_000);
    assert_eq!(d.rgba_bytes(), 24_000_000);
    assert!((d.aspect_ratio() - 1.5).abs() < 1e-12);
    assert_eq!(d.to_string(), "3000x2000");
}

#[test]
fn device_tier_parses_case_insensitively() {
    assert_eq!("Mobile".parse::<DeviceTier>().unwrap(), DeviceTier::Mobile);
    assert_eq!(" desktop ".parse::<DeviceTier>().unwrap(), DeviceTier::Desktop);
    assert!("tablet".parse::<DeviceTier>().is_err());
}

#[test]
fn reduced_quality_uses_threshold() {
    assert_eq!(QualityLevel::High.value(0.7), 1.0);
    assert_eq!(QualityLevel::Reduced.value(0.7), 0.7);
    assert_eq!(QualityLevel::Reduced.value(4.0), 1.0);
}

#[test]
fn subject_mask_counts_and_binary_check() {
    let mut img = RgbaImage::new(2, 1);
    img.put_pixel(0, 0, image::Rgba([255, 255, 255, 128]));
    let mask = SubjectMask::from_image(img);
    assert_eq!(mask.subject_pixel_count(), 1);
    assert_eq!(mask.alpha_at(0, 0), 128);
    assert!(!mask.is_binary());
}
