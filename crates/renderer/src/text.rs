//! Text drawing for titles and colorbar labels.
//!
//! Two backends: a built-in stroke font that needs no assets, and an optional
//! TrueType font loaded at runtime through rusttype. Both draw straight into
//! a tiny-skia pixmap.

use std::fmt;
use std::path::Path;

use map_common::{MapError, MapResult};
use rusttype::{point, Font, Scale};
use tiny_skia::{LineCap, LineJoin, Paint, PathBuilder, Pixmap, PremultipliedColorU8, Stroke, Transform};

use crate::style::Color;

/// Stroke glyphs live on a grid 8 units wide and 12 units tall (cap height),
/// y growing downwards from the cap line.
const GRID_HEIGHT: f32 = 12.0;
/// Gap between glyphs in grid units.
const GLYPH_SPACING: f32 = 3.0;
/// Cap height as a fraction of the nominal font size.
const CAP_RATIO: f32 = 0.7;

type Polyline = &'static [(u8, u8)];

struct Glyph {
    width: u8,
    strokes: &'static [Polyline],
}

const fn g(width: u8, strokes: &'static [Polyline]) -> Glyph {
    Glyph { width, strokes }
}

const O_RING: Polyline = &[(2, 0), (6, 0), (8, 2), (8, 10), (6, 12), (2, 12), (0, 10), (0, 2), (2, 0)];
const P_BOWL: Polyline = &[(0, 12), (0, 0), (6, 0), (8, 2), (8, 4), (6, 6), (0, 6)];

fn glyph(ch: char) -> Glyph {
    match ch.to_ascii_uppercase() {
        'A' => g(8, &[&[(0, 12), (0, 4), (4, 0), (8, 4), (8, 12)], &[(0, 8), (8, 8)]]),
        'B' => g(8, &[
            &[(0, 0), (0, 12), (6, 12), (8, 10), (8, 8), (6, 6), (0, 6)],
            &[(0, 0), (6, 0), (8, 2), (8, 4), (6, 6)],
        ]),
        'C' => g(8, &[&[(8, 2), (6, 0), (2, 0), (0, 2), (0, 10), (2, 12), (6, 12), (8, 10)]]),
        'D' => g(8, &[&[(0, 0), (0, 12), (4, 12), (8, 8), (8, 4), (4, 0), (0, 0)]]),
        'E' => g(8, &[&[(8, 0), (0, 0), (0, 12), (8, 12)], &[(0, 6), (6, 6)]]),
        'F' => g(8, &[&[(8, 0), (0, 0), (0, 12)], &[(0, 6), (6, 6)]]),
        'G' => g(8, &[&[(8, 2), (6, 0), (2, 0), (0, 2), (0, 10), (2, 12), (6, 12), (8, 10), (8, 6), (4, 6)]]),
        'H' => g(8, &[&[(0, 0), (0, 12)], &[(8, 0), (8, 12)], &[(0, 6), (8, 6)]]),
        'I' => g(4, &[&[(0, 0), (4, 0)], &[(2, 0), (2, 12)], &[(0, 12), (4, 12)]]),
        'J' => g(8, &[&[(8, 0), (8, 10), (6, 12), (2, 12), (0, 10)]]),
        'K' => g(8, &[&[(0, 0), (0, 12)], &[(8, 0), (0, 8)], &[(2, 6), (8, 12)]]),
        'L' => g(8, &[&[(0, 0), (0, 12), (8, 12)]]),
        'M' => g(10, &[&[(0, 12), (0, 0), (5, 6), (10, 0), (10, 12)]]),
        'N' => g(8, &[&[(0, 12), (0, 0), (8, 12), (8, 0)]]),
        'O' => g(8, &[O_RING]),
        'P' => g(8, &[P_BOWL]),
        'Q' => g(8, &[O_RING, &[(4, 8), (8, 12)]]),
        'R' => g(8, &[P_BOWL, &[(4, 6), (8, 12)]]),
        'S' => g(8, &[&[
            (8, 2), (6, 0), (2, 0), (0, 2), (0, 4), (2, 6), (6, 6), (8, 8), (8, 10), (6, 12), (2, 12), (0, 10),
        ]]),
        'T' => g(8, &[&[(0, 0), (8, 0)], &[(4, 0), (4, 12)]]),
        'U' => g(8, &[&[(0, 0), (0, 10), (2, 12), (6, 12), (8, 10), (8, 0)]]),
        'V' => g(8, &[&[(0, 0), (4, 12), (8, 0)]]),
        'W' => g(10, &[&[(0, 0), (2, 12), (5, 6), (8, 12), (10, 0)]]),
        'X' => g(8, &[&[(0, 0), (8, 12)], &[(8, 0), (0, 12)]]),
        'Y' => g(8, &[&[(0, 0), (4, 6), (8, 0)], &[(4, 6), (4, 12)]]),
        'Z' => g(8, &[&[(0, 0), (8, 0), (0, 12), (8, 12)]]),
        '0' => g(8, &[O_RING, &[(7, 2), (1, 10)]]),
        '1' => g(6, &[&[(1, 2), (3, 0), (3, 12)], &[(0, 12), (6, 12)]]),
        '2' => g(8, &[&[(0, 2), (2, 0), (6, 0), (8, 2), (8, 4), (0, 12), (8, 12)]]),
        '3' => g(8, &[
            &[(0, 2), (2, 0), (6, 0), (8, 2), (8, 4), (6, 6), (8, 8), (8, 10), (6, 12), (2, 12), (0, 10)],
            &[(2, 6), (6, 6)],
        ]),
        '4' => g(8, &[&[(6, 12), (6, 0), (0, 8), (8, 8)]]),
        '5' => g(8, &[&[(8, 0), (0, 0), (0, 6), (6, 6), (8, 8), (8, 10), (6, 12), (0, 12)]]),
        '6' => g(8, &[&[(6, 0), (2, 0), (0, 2), (0, 10), (2, 12), (6, 12), (8, 10), (8, 8), (6, 6), (0, 6)]]),
        '7' => g(8, &[&[(0, 0), (8, 0), (2, 12)]]),
        '8' => g(8, &[
            &[(2, 0), (6, 0), (8, 2), (8, 4), (6, 6), (2, 6), (0, 8), (0, 10), (2, 12), (6, 12), (8, 10), (8, 8), (6, 6)],
            &[(2, 6), (0, 4), (0, 2), (2, 0)],
        ]),
        '9' => g(8, &[&[(8, 6), (2, 6), (0, 4), (0, 2), (2, 0), (6, 0), (8, 2), (8, 10), (6, 12), (2, 12)]]),
        ' ' => g(5, &[]),
        '-' => g(6, &[&[(1, 6), (5, 6)]]),
        '+' => g(8, &[&[(0, 6), (8, 6)], &[(4, 2), (4, 10)]]),
        '%' => g(8, &[
            &[(0, 12), (8, 0)],
            &[(0, 0), (2, 0), (2, 2), (0, 2), (0, 0)],
            &[(6, 10), (8, 10), (8, 12), (6, 12), (6, 10)],
        ]),
        '(' => g(4, &[&[(4, 0), (1, 3), (1, 9), (4, 12)]]),
        ')' => g(4, &[&[(0, 0), (3, 3), (3, 9), (0, 12)]]),
        '\'' => g(1, &[&[(0, 0), (0, 3)]]),
        '.' => g(1, &[&[(0, 11), (0, 12)]]),
        ',' => g(2, &[&[(2, 11), (0, 14)]]),
        ':' => g(1, &[&[(0, 3), (0, 4)], &[(0, 11), (0, 12)]]),
        '/' => g(8, &[&[(0, 12), (8, 0)]]),
        _ => g(8, &[&[(0, 0), (8, 0), (8, 12), (0, 12), (0, 0)]]),
    }
}

/// Size, color and weight of a run of text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Nominal font size in pixels.
    pub size: f32,
    pub color: Color,
    pub bold: bool,
}

impl TextStyle {
    pub fn new(size: f32, color: Color) -> Self {
        Self {
            size,
            color,
            bold: false,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }
}

/// Draws text with the built-in stroke font or a TrueType font.
#[derive(Clone, Default)]
pub enum TextRenderer {
    #[default]
    Stroke,
    TrueType(Font<'static>),
}

impl fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextRenderer::Stroke => f.write_str("TextRenderer::Stroke"),
            TextRenderer::TrueType(_) => f.write_str("TextRenderer::TrueType"),
        }
    }
}

impl TextRenderer {
    /// Load a TrueType/OpenType font from disk.
    pub fn from_font_file(path: impl AsRef<Path>) -> MapResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| MapError::file_access(path, e))?;
        Font::try_from_vec(data)
            .map(TextRenderer::TrueType)
            .ok_or_else(|| MapError::Config(format!("{} is not a usable font file", path.display())))
    }

    /// Width and height in pixels of `text` at `style`.
    pub fn measure(&self, text: &str, style: &TextStyle) -> (f32, f32) {
        match self {
            TextRenderer::Stroke => {
                let unit = stroke_unit(style.size);
                let width: f32 = text
                    .chars()
                    .map(|ch| glyph(ch).width as f32 + GLYPH_SPACING)
                    .sum::<f32>();
                let width = (width - GLYPH_SPACING).max(0.0) * unit;
                (width, GRID_HEIGHT * unit)
            }
            TextRenderer::TrueType(font) => {
                let scale = Scale::uniform(style.size);
                let v_metrics = font.v_metrics(scale);
                let width = font
                    .layout(text, scale, point(0.0, 0.0))
                    .last()
                    .map(|glyph| glyph.position().x + glyph.unpositioned().h_metrics().advance_width)
                    .unwrap_or(0.0);
                (width, v_metrics.ascent - v_metrics.descent)
            }
        }
    }

    /// Draw `text` horizontally centered on `center_x` with its top at `top`.
    pub fn draw_centered(&self, pixmap: &mut Pixmap, text: &str, center_x: f32, top: f32, style: &TextStyle) {
        let (width, _) = self.measure(text, style);
        self.draw(pixmap, text, center_x - width / 2.0, top, style);
    }

    /// Draw `text` with its top-left corner at (`left`, `top`).
    pub fn draw(&self, pixmap: &mut Pixmap, text: &str, left: f32, top: f32, style: &TextStyle) {
        match self {
            TextRenderer::Stroke => draw_stroke_text(pixmap, text, left, top, style),
            TextRenderer::TrueType(font) => {
                draw_truetype_text(pixmap, font, text, left, top, style);
                if style.bold {
                    let offset = (style.size / 30.0).max(1.0);
                    draw_truetype_text(pixmap, font, text, left + offset, top, style);
                }
            }
        }
    }
}

fn stroke_unit(size: f32) -> f32 {
    size * CAP_RATIO / GRID_HEIGHT
}

fn draw_stroke_text(pixmap: &mut Pixmap, text: &str, left: f32, top: f32, style: &TextStyle) {
    let unit = stroke_unit(style.size);
    let weight = if style.bold { 0.16 } else { 0.1 };

    let mut stroke = Stroke::default();
    stroke.width = (style.size * CAP_RATIO * weight).max(1.0);
    stroke.line_cap = LineCap::Round;
    stroke.line_join = LineJoin::Round;

    let mut paint = Paint::default();
    paint.set_color_rgba8(style.color.r, style.color.g, style.color.b, style.color.a);
    paint.anti_alias = true;

    let mut pb = PathBuilder::new();
    let mut cursor = left;
    for ch in text.chars() {
        let glyph = glyph(ch);
        for polyline in glyph.strokes {
            for (i, &(gx, gy)) in polyline.iter().enumerate() {
                let x = cursor + gx as f32 * unit;
                let y = top + gy as f32 * unit;
                if i == 0 {
                    pb.move_to(x, y);
                } else {
                    pb.line_to(x, y);
                }
            }
        }
        cursor += (glyph.width as f32 + GLYPH_SPACING) * unit;
    }

    if let Some(path) = pb.finish() {
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
}

fn draw_truetype_text(pixmap: &mut Pixmap, font: &Font<'static>, text: &str, left: f32, top: f32, style: &TextStyle) {
    let scale = Scale::uniform(style.size);
    let ascent = font.v_metrics(scale).ascent;
    let width = pixmap.width() as i32;
    let height = pixmap.height() as i32;
    let color = style.color;

    for glyph in font.layout(text, scale, point(left, top + ascent)) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        let pixels = pixmap.pixels_mut();
        glyph.draw(|gx, gy, coverage| {
            let x = bb.min.x + gx as i32;
            let y = bb.min.y + gy as i32;
            if x < 0 || y < 0 || x >= width || y >= height {
                return;
            }
            let idx = (y * width + x) as usize;
            pixels[idx] = blend(pixels[idx], color, coverage);
        });
    }
}

/// Source-over blend of `color` at `coverage` onto a premultiplied pixel.
fn blend(dst: PremultipliedColorU8, color: Color, coverage: f32) -> PremultipliedColorU8 {
    let alpha = (color.a as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    let inv = 1.0 - alpha;
    let mix = |src: u8, dst: u8| (src as f32 * alpha + dst as f32 * inv).round().min(255.0) as u8;
    let out_a = (255.0 * alpha + dst.alpha() as f32 * inv).round().min(255.0) as u8;
    let r = mix(color.r, dst.red()).min(out_a);
    let g = mix(color.g, dst.green()).min(out_a);
    let b = mix(color.b, dst.blue()).min(out_a);
    PremultipliedColorU8::from_rgba(r, g, b, out_a).unwrap_or(dst)
}
