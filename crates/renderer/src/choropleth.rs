//! Choropleth rendering of joined state records.
//!
//! State outlines are stroked first, then each state is filled with the color
//! its percent change maps to on the configured scale. A title and a
//! horizontal colorbar complete the image.

use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use boundaries::JoinedTable;
use geo::{LineString, MultiPolygon};
use map_common::{MapError, MapResult, Viewport};
use rayon::prelude::*;
use tiny_skia::{FillRule, LineJoin, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};
use tracing::{debug, warn};

use crate::layout::Layout;
use crate::legend::draw_colorbar;
use crate::png::encode_pixmap;
use crate::style::{Color, ColorScale, Normalize};
use crate::text::{TextRenderer, TextStyle};

pub const DEFAULT_TITLE: &str = "Percent Change in Alzheimer's Fatalities (2014-2019)";

/// Everything that controls how a table is drawn.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub color_scale: ColorScale,
    /// Fixed (vmin, vmax); the data range is used when `None`.
    pub value_range: Option<(f64, f64)>,
    pub boundary_color: Color,
    pub boundary_width: f32,
    pub background: Color,
    pub text: TextRenderer,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
            title: DEFAULT_TITLE.to_string(),
            color_scale: ColorScale::default(),
            value_range: None,
            boundary_color: Color::WHITE,
            boundary_width: 0.4,
            background: Color::WHITE,
            text: TextRenderer::Stroke,
        }
    }
}

/// A rendered PNG image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMap {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RenderedMap {
    /// Standard base64 (with padding) of the PNG bytes.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.png)
    }
}

/// Renders [`JoinedTable`]s into PNG choropleth maps.
#[derive(Debug, Clone)]
pub struct ChoroplethRenderer {
    options: RenderOptions,
    layout: Layout,
}

impl ChoroplethRenderer {
    pub fn new(options: RenderOptions) -> MapResult<Self> {
        let layout = Layout::new(options.width, options.height)?;
        if let Some((vmin, vmax)) = options.value_range {
            if !vmin.is_finite() || !vmax.is_finite() {
                return Err(MapError::Config(format!(
                    "color range must be finite, got {}..{}",
                    vmin, vmax
                )));
            }
        }
        if options.boundary_width.is_nan() || options.boundary_width < 0.0 {
            return Err(MapError::Config(format!(
                "boundary width must be non-negative, got {}",
                options.boundary_width
            )));
        }
        Ok(Self { options, layout })
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Value range mapped onto the color scale for `table`.
    pub fn normalize(&self, table: &JoinedTable) -> Normalize {
        match self.options.value_range.or_else(|| table.value_range()) {
            Some((vmin, vmax)) => Normalize::new(vmin, vmax),
            None => Normalize::EMPTY,
        }
    }

    /// Projection of `table`'s extent into the map area, `None` for an empty table.
    pub fn viewport(&self, table: &JoinedTable) -> Option<Viewport> {
        let bounds = table.bounds()?;
        let area = self.layout.map;
        Viewport::fit(
            bounds,
            area.x as f64,
            area.y as f64,
            area.width as f64,
            area.height as f64,
            bounds.geographic_aspect(),
        )
    }

    /// Render `table` and encode it as PNG.
    pub fn render(&self, table: &JoinedTable) -> MapResult<RenderedMap> {
        let start = Instant::now();
        let pixmap = self.render_pixmap(table)?;
        let png = encode_pixmap(&pixmap)?;

        debug!(
            states = table.len(),
            bytes = png.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Rendered choropleth"
        );

        Ok(RenderedMap {
            png,
            width: self.options.width,
            height: self.options.height,
        })
    }

    /// Render `table` and return the PNG as standard base64.
    pub fn render_base64(&self, table: &JoinedTable) -> MapResult<String> {
        self.render(table).map(|map| map.to_base64())
    }

    /// Render `table` into a pixmap without encoding.
    pub fn render_pixmap(&self, table: &JoinedTable) -> MapResult<Pixmap> {
        let opts = &self.options;
        let mut pixmap = Pixmap::new(opts.width, opts.height).ok_or_else(|| {
            MapError::Render(format!("cannot allocate {}x{} image", opts.width, opts.height))
        })?;
        let bg = opts.background;
        pixmap.fill(tiny_skia::Color::from_rgba8(bg.r, bg.g, bg.b, bg.a));

        let norm = self.normalize(table);

        match self.viewport(table) {
            Some(viewport) => self.draw_states(&mut pixmap, table, &viewport, norm),
            None if table.is_empty() => debug!("No states to draw"),
            None => warn!(states = table.len(), "State geometry has no drawable extent"),
        }

        draw_colorbar(
            &mut pixmap,
            self.layout.colorbar,
            &opts.color_scale,
            norm,
            &opts.text,
            self.layout.label_size,
        );

        let title_style = TextStyle::new(self.layout.title_size, Color::BLACK).bold();
        opts.text.draw_centered(
            &mut pixmap,
            &opts.title,
            self.layout.title.center_x(),
            self.layout.title.y,
            &title_style,
        );

        Ok(pixmap)
    }

    fn draw_states(&self, pixmap: &mut Pixmap, table: &JoinedTable, viewport: &Viewport, norm: Normalize) {
        let opts = &self.options;
        let scale = &opts.color_scale;

        // Path building is independent per state; drawing stays in table order.
        let shapes: Vec<(Path, Color)> = table
            .records()
            .par_iter()
            .filter_map(|record| {
                let path = build_path(&record.geometry, viewport)?;
                let color = scale.color_at(norm.apply(record.percent_change));
                Some((path, color))
            })
            .collect();

        // Outlines go down first and the fills are painted over them.
        if opts.boundary_width > 0.0 {
            let edge = opts.boundary_color;
            let mut paint = Paint::default();
            paint.set_color_rgba8(edge.r, edge.g, edge.b, edge.a);
            paint.anti_alias = true;

            let mut stroke = Stroke::default();
            stroke.width = opts.boundary_width;
            stroke.line_join = LineJoin::Round;

            for (path, _) in &shapes {
                pixmap.stroke_path(path, &paint, &stroke, Transform::identity(), None);
            }
        }

        let mut fill = Paint::default();
        fill.anti_alias = true;
        for (path, color) in &shapes {
            fill.set_color_rgba8(color.r, color.g, color.b, color.a);
            pixmap.fill_path(path, &fill, FillRule::EvenOdd, Transform::identity(), None);
        }
    }
}

/// One closed subpath per ring, exterior and holes alike.
fn build_path(geometry: &MultiPolygon<f64>, viewport: &Viewport) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for polygon in &geometry.0 {
        push_ring(&mut pb, polygon.exterior(), viewport);
        for interior in polygon.interiors() {
            push_ring(&mut pb, interior, viewport);
        }
    }
    pb.finish()
}

fn push_ring(pb: &mut PathBuilder, ring: &LineString<f64>, viewport: &Viewport) {
    let mut coords = ring.coords();
    let Some(first) = coords.next() else {
        return;
    };
    let (x, y) = viewport.project(first.x, first.y);
    pb.move_to(x, y);
    for coord in coords {
        let (x, y) = viewport.project(coord.x, coord.y);
        pb.line_to(x, y);
    }
    pb.close();
}
