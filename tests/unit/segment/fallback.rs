use super::*;
use image::Rgba;
use proptest::prelude::*;

fn gray(v: u8) -> Rgba<u8> {
    Rgba([v, v, v, 255])
}

#[test]
fn mid_gray_center_is_subject_and_corners_are_not() {
    let img = RgbaImage::from_pixel(21, 21, gray(128));
    let mask = fallback(&img).unwrap();
    assert_eq!(mask.alpha_at(10, 10), 255);
    assert_eq!(mask.image().get_pixel(10, 10).0, [255, 255, 255, 255]);
    assert_eq!(mask.alpha_at(0, 0), 0);
    assert_eq!(mask.image().get_pixel(20, 20).0, [0, 0, 0, 0]);
    assert!(mask.is_binary());
}

#[test]
fn dark_and_blown_out_pixels_are_background() {
    for v in [0u8, 25, 30, 220, 255] {
        let img = RgbaImage::from_pixel(9, 9, gray(v));
        let mask = fallback(&img).unwrap();
        assert_eq!(mask.subject_pixel_count(), 0, "brightness {v}");
    }
}

#[test]
fn brightness_window_is_exclusive() {
    let img = RgbaImage::from_pixel(3, 3, Rgba([93, 0, 0, 255]));
    assert!(mark_candidates(&img)[4]);
    let img = RgbaImage::from_pixel(3, 3, Rgba([90, 0, 0, 255]));
    assert!(!mark_candidates(&img)[4]);
}

#[test]
fn isolated_mark_is_removed() {
    let (w, h) = (5u32, 5u32);
    let mut marks = vec![false; 25];
    marks[12] = true;
    let out = majority_smooth(&marks, w, h);
    assert!(out.iter().all(|&m| !m));
}

#[test]
fn smoothing_never_adds_marks() {
    let (w, h) = (3u32, 3u32);
    let mut marks = vec![true; 9];
    marks[4] = false;
    let out = majority_smooth(&marks, w, h);
    assert!(!out[4]);
    assert_eq!(out.iter().filter(|&&m| m).count(), 8);
}

#[test]
fn border_pixels_keep_first_pass_value() {
    let mut marks = vec![false; 16];
    marks[0] = true;
    let out = majority_smooth(&marks, 4, 4);
    assert!(out[0]);
}

#[test]
fn empty_image_is_image_processing_error() {
    let err = fallback(&RgbaImage::new(0, 0)).unwrap_err();
    assert_eq!(err.kind(), crate::foundation::error::ErrorKind::ImageProcessing);
}

fn arb_image() -> impl Strategy<Value = RgbaImage> {
    (1u32..24, 1u32..24).prop_flat_map(|(w, h)| {
        proptest::collection::vec(any::<u8>(), (w * h * 4) as usize)
            .prop_map(move |buf| RgbaImage::from_raw(w, h, buf).unwrap())
    })
}

proptest! {
    #[test]
    fn fallback_is_deterministic(img in arb_image()) {
        prop_assert_eq!(fallback(&img).unwrap(), fallback(&img).unwrap());
    }

    #[test]
    fn smoothing_is_monotone(img in arb_image()) {
        let first = mark_candidates(&img);
        let second = majority_smooth(&first, img.width(), img.height());
        let before = first.iter().filter(|&&m| m).count();
        let after = second.iter().filter(|&&m| m).count();
        prop_assert!(after <= before);
        for (a, b) in first.iter().zip(&second) {
            prop_assert!(!*b || *a);
        }
    }
}
