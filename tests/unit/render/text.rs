use super::*;

#[test]
fn color_parsing_accepts_short_long_and_alpha_forms() {
    assert_eq!("#fff".parse::<TextColor>().unwrap(), TextColor::WHITE);
    assert_eq!(
        "#FF8000".parse::<TextColor>().unwrap(),
        TextColor::rgb(255, 128, 0)
    );
    assert_eq!(
        "#00000080".parse::<TextColor>().unwrap(),
        TextColor { r: 0, g: 0, b: 0, a: 128 }
    );
    for bad in ["", "fff", "#ff", "#gggggg", "#12345", "#ééé"] {
        assert!(bad.parse::<TextColor>().is_err(), "{bad:?} should not parse");
    }
}

#[test]
fn color_serde_uses_hex_strings() {
    let c = TextColor { r: 1, g: 2, b: 3, a: 4 };
    let json = serde_json::to_string(&c).unwrap();
    assert_eq!(json, "\"#01020304\"");
    let back: TextColor = serde_json::from_str(&json).unwrap();
    assert_eq!(back, c);
    assert!(serde_json::from_str::<TextColor>("\"red\"").is_err());
}

#[test]
fn options_deserialize_with_defaults() {
    let opts: TextRenderOptions =
        serde_json::from_str(r##"{ "content": "Hi", "fontSize": 20, "color": "#000" }"##).unwrap();
    assert_eq!(opts.content, "Hi");
    assert_eq!(opts.font_size, 20.0);
    assert_eq!(opts.color, TextColor::rgb(0, 0, 0));
    assert_eq!(opts.opacity_percent, 100.0);
}

#[test]
fn scaled_moves_geometry_only() {
    let mut opts = TextRenderOptions::new("A", 100.0, 50.0);
    opts.blur_radius = 4.0;
    opts.rotation_degrees = 30.0;
    opts.opacity_percent = 40.0;
    let half = opts.scaled(0.5);
    assert_eq!((half.x, half.y), (50.0, 25.0));
    assert_eq!(half.font_size, opts.font_size * 0.5);
    assert_eq!(half.blur_radius, 2.0);
    assert_eq!(half.rotation_degrees, 30.0);
    assert_eq!(half.opacity_percent, 40.0);
}

#[test]
fn svg_escapes_content_and_family() {
    let mut opts = TextRenderOptions::new("a<b & \"c\"", 10.0, 10.0);
    opts.font_family = "Tom's".to_owned();
    opts.bold = true;
    opts.underline = true;
    let svg = text_svg(&opts, 20, 20);
    assert!(svg.contains("a&lt;b &amp; &quot;c&quot;"));
    assert!(svg.contains("Tom&apos;s"));
    assert!(svg.contains(r#"font-weight="700""#));
    assert!(svg.contains(r#"text-decoration="underline""#));
    assert!(svg.contains(r#"text-anchor="middle""#));
}

#[test]
fn blank_or_invisible_text_renders_an_empty_layer() {
    let fonts = FontBook::from_font_data(Vec::<Vec<u8>>::new());
    let blank = render_text_layer(&TextRenderOptions::new("   ", 2.0, 2.0), 4, 4, &fonts, None).unwrap();
    assert_eq!(blank, vec![0u8; 4 * 4 * 4]);

    let mut hidden = TextRenderOptions::new("X", 2.0, 2.0);
    hidden.opacity_percent = 0.0;
    let layer = render_text_layer(&hidden, 4, 4, &fonts, Some(ShadowStyle::desktop())).unwrap();
    assert!(layer.iter().all(|&b| b == 0));
}

#[test]
fn shadow_is_offset_and_tinted() {
    let (w, h) = (8u32, 8u32);
    let mut glyphs = vec![0u8; (w * h * 4) as usize];
    let idx = ((2 * w + 2) * 4) as usize;
    glyphs[idx..idx + 4].copy_from_slice(&[255, 255, 255, 255]);

    let style = ShadowStyle {
        offset_x: 3.0,
        offset_y: 1.0,
        blur: 0.0,
        color: TextColor { r: 0, g: 0, b: 0, a: 128 },
    };
    let shadow = shadow_layer(&glyphs, w, h, style).unwrap();
    let moved = ((3 * w + 5) * 4) as usize;
    assert_eq!(&shadow[moved..moved + 4], &[0, 0, 0, 128]);
    assert_eq!(shadow.iter().filter(|&&b| b != 0).count(), 1);
}

#[test]
fn glyphs_render_when_fonts_are_available() {
    let fonts = FontBook::system();
    if fonts.is_empty() {
        return;
    }
    let mut opts = TextRenderOptions::new("HELLO", 100.0, 50.0);
    opts.font_size = 40.0;
    opts.color = TextColor::rgb(255, 0, 0);
    let layer = render_text_layer(&opts, 200, 100, &fonts, None).unwrap();
    let covered = layer.chunks_exact(4).filter(|px| px[3] > 0).count();
    assert!(covered > 0);
    assert!(layer.chunks_exact(4).all(|px| px[1] == 0 && px[2] == 0));
}
