//! Text layer rasterization.
//!
//! Text is laid out as a one-element SVG document and rasterized through
//! `usvg`/`resvg`, which shapes glyphs from the [`FontBook`]. The result is a
//! full-canvas premultiplied RGBA8 layer ready for compositing.

use std::fmt;
use std::fmt::Write as _;
use std::str::FromStr;

use crate::assets::fonts::FontBook;
use crate::effects::blur::gaussian_blur_premul;
use crate::effects::composite::{over_in_place, scale_in_place};
use crate::foundation::error::{DepthTextError, DepthTextResult};
use crate::foundation::math::{mul_div255_u8, rgba_len};

/// Straight-alpha text color, parsed from `#rgb`, `#rrggbb` or `#rrggbbaa`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TextColor {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl TextColor {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Opaque color from RGB components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl Default for TextColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for TextColor {
    type Err = DepthTextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || {
            DepthTextError::invalid_format(format!(
                "invalid color '{s}', expected #rgb, #rrggbb or #rrggbbaa"
            ))
        };
        let hex = s.trim().strip_prefix('#').ok_or_else(bad)?;
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(bad());
        }
        let nibble = |i: usize| u8::from_str_radix(&hex[i..=i], 16).map(|v| v * 17);
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
        let parsed = match hex.len() {
            3 => (nibble(0), nibble(1), nibble(2), Ok(255)),
            6 => (byte(0), byte(2), byte(4), Ok(255)),
            8 => (byte(0), byte(2), byte(4), byte(6)),
            _ => return Err(bad()),
        };
        match parsed {
            (Ok(r), Ok(g), Ok(b), Ok(a)) => Ok(Self { r, g, b, a }),
            _ => Err(bad()),
        }
    }
}

impl TryFrom<String> for TextColor {
    type Error = DepthTextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TextColor> for String {
    fn from(c: TextColor) -> Self {
        c.to_string()
    }
}

impl fmt::Display for TextColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

/// Everything needed to draw one text overlay. Built fresh for each render.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextRenderOptions {
    /// Text to draw. Empty or whitespace-only text draws nothing.
    pub content: String,
    /// Font size in pixels.
    pub font_size: f32,
    /// Requested font family; missing families fall back to a generic face.
    pub font_family: String,
    /// Fill color.
    pub color: TextColor,
    /// Layer opacity, `0..=100`.
    pub opacity_percent: f32,
    /// Horizontal position of the text center, in pixels.
    pub x: f32,
    /// Vertical position of the text center, in pixels.
    pub y: f32,
    /// Clockwise rotation about `(x, y)`, in degrees.
    pub rotation_degrees: f32,
    /// Gaussian blur standard deviation applied to the glyphs, in pixels.
    pub blur_radius: f32,
    /// Bold weight (700) instead of regular (400).
    pub bold: bool,
    /// Italic style.
    pub italic: bool,
    /// Underline decoration.
    pub underline: bool,
}

impl Default for TextRenderOptions {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_size: 64.0,
            font_family: "sans-serif".to_owned(),
            color: TextColor::WHITE,
            opacity_percent: 100.0,
            x: 0.0,
            y: 0.0,
            rotation_degrees: 0.0,
            blur_radius: 0.0,
            bold: false,
            italic: false,
            underline: false,
        }
    }
}

impl TextRenderOptions {
    /// Options for `content` centered at `(x, y)`, everything else default.
    pub fn new(content: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            content: content.into(),
            x,
            y,
            ..Self::default()
        }
    }

    /// Same options expressed in a raster scaled by `factor`.
    ///
    /// Position, size and blur follow the image; color, opacity and rotation
    /// do not change.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            font_size: self.font_size * factor,
            x: self.x * factor,
            y: self.y * factor,
            blur_radius: self.blur_radius * factor,
            ..self.clone()
        }
    }

    fn opacity(&self) -> f32 {
        (self.opacity_percent / 100.0).clamp(0.0, 1.0)
    }
}

/// Drop shadow drawn under the glyphs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowStyle {
    /// Horizontal offset in pixels.
    pub offset_x: f32,
    /// Vertical offset in pixels.
    pub offset_y: f32,
    /// Canvas-style shadow blur; the Gaussian sigma is half of it.
    pub blur: f32,
    /// Shadow color.
    pub color: TextColor,
}

impl ShadowStyle {
    /// Soft shadow used behind text on the desktop compositor.
    pub const fn desktop() -> Self {
        Self {
            offset_x: 2.0,
            offset_y: 2.0,
            blur: 4.0,
            color: TextColor { r: 0, g: 0, b: 0, a: 128 },
        }
    }

    /// Stronger shadow for the mobile path, where text sits on the subject.
    pub const fn mobile() -> Self {
        Self {
            offset_x: 3.0,
            offset_y: 3.0,
            blur: 6.0,
            color: TextColor { r: 0, g: 0, b: 0, a: 179 },
        }
    }
}

/// Rasterize `opts` into a `width * height` premultiplied RGBA8 layer.
///
/// Layer order, bottom to top: optional shadow, glyphs (blurred when
/// `blur_radius > 0`). The layer opacity is applied last.
#[tracing::instrument(level = "debug", skip(opts, fonts, shadow))]
pub fn render_text_layer(
    opts: &TextRenderOptions,
    width: u32,
    height: u32,
    fonts: &FontBook,
    shadow: Option<ShadowStyle>,
) -> DepthTextResult<Vec<u8>> {
    let len = rgba_len(width, height)
        .ok_or_else(|| DepthTextError::memory("text layer size overflow"))?;
    if opts.content.trim().is_empty() || opts.opacity() <= 0.0 {
        return Ok(vec![0u8; len]);
    }

    let svg = text_svg(opts, width, height);
    let tree = usvg::Tree::from_str(&svg, &fonts.usvg_options()).map_err(|e| {
        DepthTextError::canvas("failed to lay out text").with_technical(e.to_string())
    })?;

    let mut glyphs = {
        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| DepthTextError::canvas("failed to allocate text pixmap"))?;
        resvg::render(&tree, resvg::tiny_skia::Transform::identity(), &mut pixmap.as_mut());
        pixmap.take()
    };

    if opts.blur_radius > 0.0 {
        glyphs = gaussian_blur_premul(&glyphs, width, height, opts.blur_radius)?;
    }

    let mut layer = match shadow {
        Some(style) => {
            let mut layer = shadow_layer(&glyphs, width, height, style)?;
            over_in_place(&mut layer, &glyphs, 1.0)?;
            layer
        }
        None => glyphs,
    };

    scale_in_place(&mut layer, opts.opacity());
    Ok(layer)
}

/// Tinted copy of the glyph coverage, shifted by the shadow offset and blurred.
fn shadow_layer(
    glyphs: &[u8],
    width: u32,
    height: u32,
    style: ShadowStyle,
) -> DepthTextResult<Vec<u8>> {
    let mut out = vec![0u8; glyphs.len()];
    let dx = style.offset_x.round() as i64;
    let dy = style.offset_y.round() as i64;
    let (w, h) = (i64::from(width), i64::from(height));
    let tint = style.color;
    let shadow_alpha = u16::from(tint.a);

    for y in 0..h {
        let sy = y - dy;
        if sy < 0 || sy >= h {
            continue;
        }
        for x in 0..w {
            let sx = x - dx;
            if sx < 0 || sx >= w {
                continue;
            }
            let coverage = glyphs[((sy * w + sx) as usize) * 4 + 3];
            if coverage == 0 {
                continue;
            }
            let a = mul_div255_u8(u16::from(coverage), shadow_alpha);
            let idx = ((y * w + x) as usize) * 4;
            out[idx] = mul_div255_u8(u16::from(tint.r), u16::from(a));
            out[idx + 1] = mul_div255_u8(u16::from(tint.g), u16::from(a));
            out[idx + 2] = mul_div255_u8(u16::from(tint.b), u16::from(a));
            out[idx + 3] = a;
        }
    }

    gaussian_blur_premul(&out, width, height, style.blur / 2.0)
}

fn text_svg(opts: &TextRenderOptions, width: u32, height: u32) -> String {
    let c = opts.color;
    let mut svg = String::with_capacity(512 + opts.content.len());
    // Writing into a String cannot fail.
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    let _ = write!(
        svg,
        r#"<text x="{x:.3}" y="{y:.3}" transform="rotate({rot:.3} {x:.3} {y:.3})" text-anchor="middle" dominant-baseline="central" font-family="{family}" font-size="{size:.3}" font-weight="{weight}" font-style="{style}" fill="rgb({r},{g},{b})" fill-opacity="{fa:.4}""#,
        x = opts.x,
        y = opts.y,
        rot = opts.rotation_degrees,
        family = xml_escape(&opts.font_family),
        size = opts.font_size.max(0.0),
        weight = if opts.bold { 700 } else { 400 },
        style = if opts.italic { "italic" } else { "normal" },
        r = c.r,
        g = c.g,
        b = c.b,
        fa = f32::from(c.a) / 255.0,
    );
    if opts.underline {
        svg.push_str(r#" text-decoration="underline""#);
    }
    svg.push('>');
    svg.push_str(&xml_escape(&opts.content));
    svg.push_str("</text></svg>");
    svg
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/text.rs"]
mod tests;
