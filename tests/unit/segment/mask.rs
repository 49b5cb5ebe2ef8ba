use super::*;
use image::Rgba;
use proptest::prelude::*;

#[test]
fn soft_edges_survive_conversion() {
    let mut subject = RgbaImage::new(3, 1);
    subject.put_pixel(0, 0, Rgba([10, 20, 30, 255]));
    subject.put_pixel(1, 0, Rgba([10, 20, 30, 37]));
    subject.put_pixel(2, 0, Rgba([10, 20, 30, 0]));

    let mask = to_mask(&subject);
    assert_eq!(mask.image().get_pixel(0, 0).0, [255, 255, 255, 255]);
    assert_eq!(mask.image().get_pixel(1, 0).0, [255, 255, 255, 37]);
    assert_eq!(mask.image().get_pixel(2, 0).0, [0, 0, 0, 0]);
    assert!(!mask.is_binary());
}

#[test]
fn apply_mask_cuts_background() {
    let image = RgbaImage::from_pixel(2, 1, Rgba([100, 150, 200, 255]));
    let mut m = RgbaImage::new(2, 1);
    m.put_pixel(0, 0, Rgba([255, 255, 255, 255]));
    let out = apply_mask(&image, &SubjectMask::from_image(m)).unwrap();
    assert_eq!(out.get_pixel(0, 0).0, [100, 150, 200, 255]);
    assert_eq!(out.get_pixel(1, 0).0, [0, 0, 0, 0]);
}

#[test]
fn apply_mask_rejects_other_sizes() {
    let image = RgbaImage::new(2, 2);
    let mask = SubjectMask::from_image(RgbaImage::new(2, 3));
    let err = apply_mask(&image, &mask).unwrap_err();
    assert_eq!(err.kind(), crate::foundation::error::ErrorKind::ImageProcessing);
}

proptest! {
    #[test]
    fn mask_alpha_round_trips(w in 1u32..16, h in 1u32..16, seed in proptest::collection::vec(any::<u8>(), 1024)) {
        let subject = RgbaImage::from_fn(w, h, |x, y| {
            let i = ((y * w + x) as usize * 4) % seed.len();
            Rgba([seed[i], seed[(i + 1) % seed.len()], seed[(i + 2) % seed.len()], seed[(i + 3) % seed.len()]])
        });
        let mask = to_mask(&subject);
        prop_assert_eq!(mask.image().dimensions(), subject.dimensions());
        for (m, s) in mask.image().pixels().zip(subject.pixels()) {
            prop_assert_eq!(m[3], s[3]);
            let rgb = if s[3] > 0 { 255 } else { 0 };
            prop_assert_eq!(&m.0[..3], &[rgb, rgb, rgb][..]);
        }
    }
}
