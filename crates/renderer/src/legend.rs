//! Horizontal colorbar with percent tick labels.

use tiny_skia::{Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

use crate::layout::PixelRect;
use crate::style::{Color, ColorScale, Normalize};
use crate::text::{TextRenderer, TextStyle};

/// Upper bound on the number of labelled ticks.
pub const MAX_TICKS: usize = 6;

const OUTLINE: Color = Color::new(64, 64, 64, 255);

/// Round `x` up to 1, 2 or 5 times a power of ten.
fn nice_step(x: f64) -> f64 {
    if x <= 0.0 || !x.is_finite() {
        return 1.0;
    }
    let base = 10f64.powf(x.log10().floor());
    let mant = x / base;
    let nice = if mant <= 1.0 {
        1.0
    } else if mant <= 2.0 {
        2.0
    } else if mant <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * base
}

/// Evenly spaced round values inside [min, max], at most `max_ticks + 1` of them.
pub fn nice_ticks(min: f64, max: f64, max_ticks: usize) -> Vec<f64> {
    if !min.is_finite() || !max.is_finite() || max < min {
        return Vec::new();
    }
    if max == min {
        return vec![normalize_zero(min)];
    }

    let step = nice_step((max - min) / max_ticks.max(1) as f64);
    let first = (min / step).ceil() * step;
    let tolerance = step * 1e-9;

    (0..)
        .map(|i| first + i as f64 * step)
        .take_while(|v| *v <= max + tolerance)
        .map(|v| normalize_zero((v / step).round() * step))
        .collect()
}

fn normalize_zero(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else {
        v
    }
}

/// Whole-number percent label, e.g. `"-25%"`.
pub fn format_percent(value: f64) -> String {
    let rounded = normalize_zero(value.round());
    format!("{:.0}%", rounded)
}

/// Draw the gradient bar in `rect` with ticks and labels underneath.
pub fn draw_colorbar(
    pixmap: &mut Pixmap,
    rect: PixelRect,
    scale: &ColorScale,
    norm: Normalize,
    text: &TextRenderer,
    label_size: f32,
) {
    let columns = rect.width.round().max(1.0) as u32;
    let mut paint = Paint::default();
    paint.anti_alias = false;

    for i in 0..columns {
        let t = if columns > 1 {
            i as f64 / (columns - 1) as f64
        } else {
            0.0
        };
        let c = scale.color_at(t);
        paint.set_color_rgba8(c.r, c.g, c.b, c.a);
        if let Some(column) = Rect::from_xywh(rect.x + i as f32, rect.y, 1.0, rect.height) {
            pixmap.fill_rect(column, &paint, Transform::identity(), None);
        }
    }

    let mut line = Paint::default();
    line.set_color_rgba8(OUTLINE.r, OUTLINE.g, OUTLINE.b, OUTLINE.a);
    line.anti_alias = true;
    let mut stroke = Stroke::default();
    stroke.width = 1.0;

    if let Some(outline) = Rect::from_xywh(rect.x, rect.y, columns as f32, rect.height) {
        let path = PathBuilder::from_rect(outline);
        pixmap.stroke_path(&path, &line, &stroke, Transform::identity(), None);
    }

    let tick_len = (label_size * 0.4).max(2.0);
    let bottom = rect.y + rect.height;
    let style = TextStyle::new(label_size, OUTLINE);

    for value in nice_ticks(norm.vmin, norm.vmax, MAX_TICKS) {
        let x = rect.x + norm.apply(value) as f32 * (columns.saturating_sub(1)) as f32 + 0.5;

        let mut pb = PathBuilder::new();
        pb.move_to(x, bottom);
        pb.line_to(x, bottom + tick_len);
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &line, &stroke, Transform::identity(), None);
        }

        text.draw_centered(pixmap, &format_percent(value), x, bottom + tick_len + 2.0, &style);
    }
}
