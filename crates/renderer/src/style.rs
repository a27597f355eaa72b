//! Continuous color scales for choropleth fills and the colorbar.
//!
//! Scales are lists of color stops. Built-in scales follow the matplotlib
//! colormaps of the same name; custom scales are read from a style JSON file
//! in the same layout as the built-ins:
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "styles": {
//!     "warm": {
//!       "name": "Warm",
//!       "default": true,
//!       "stops": [
//!         {"value": 0, "color": "#FFFFCC"},
//!         {"value": 100, "color": "#BD0026"}
//!       ]
//!     }
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use map_common::{MapError, MapResult};
use serde::{Deserialize, Serialize};

/// Names accepted by [`ColorScale::builtin`].
pub const BUILTIN_SCALES: [&str; 3] = ["viridis", "plasma", "greys"];

const VIRIDIS: [(f32, &str); 9] = [
    (0.0, "#440154"),
    (0.125, "#482878"),
    (0.25, "#3E4989"),
    (0.375, "#31688E"),
    (0.5, "#26828E"),
    (0.625, "#1F9E89"),
    (0.75, "#35B779"),
    (0.875, "#6ECE58"),
    (1.0, "#FDE725"),
];

const PLASMA: [(f32, &str); 9] = [
    (0.0, "#0D0887"),
    (0.125, "#4C02A1"),
    (0.25, "#7E03A8"),
    (0.375, "#A92395"),
    (0.5, "#CC4778"),
    (0.625, "#E56B5D"),
    (0.75, "#F89540"),
    (0.875, "#FDC527"),
    (1.0, "#F0F921"),
];

const GREYS: [(f32, &str); 2] = [(0.0, "#FFFFFF"), (1.0, "#000000")];

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::new(255, 255, 255, 255);
    pub const BLACK: Color = Color::new(0, 0, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (the `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            6 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }

    /// Linear interpolation, `t` clamped to [0, 1].
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Color::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

/// Style file loaded from JSON
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StyleConfig {
    pub version: String,
    pub styles: HashMap<String, StyleDefinition>,
}

/// A single named scale definition
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StyleDefinition {
    pub name: String,
    #[serde(default)]
    pub default: bool,
    pub description: Option<String>,
    pub stops: Vec<ColorStop>,
}

/// Color stop for gradient
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ColorStop {
    pub value: f32,
    pub color: String,
}

impl StyleConfig {
    /// Load style configuration from JSON string
    pub fn from_json(json_str: &str) -> MapResult<Self> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Load style configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> MapResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| MapError::file_access(path, e))?;
        serde_json::from_str(&content)
            .map_err(|e| MapError::parse(format!("style file {}", path.display()), e))
    }

    /// Get a specific style definition
    pub fn get_style(&self, name: &str) -> Option<&StyleDefinition> {
        self.styles.get(name)
    }

    /// The style flagged `"default": true`, falling back to the only style.
    pub fn get_default_style(&self) -> Option<(&String, &StyleDefinition)> {
        self.styles
            .iter()
            .find(|(_, style)| style.default)
            .or_else(|| {
                if self.styles.len() == 1 {
                    self.styles.iter().next()
                } else {
                    None
                }
            })
    }
}

/// A continuous scale over [0, 1], built from sorted color stops.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    name: String,
    stops: Vec<(f32, Color)>,
}

impl Default for ColorScale {
    fn default() -> Self {
        Self::from_table("viridis", &VIRIDIS)
    }
}

impl ColorScale {
    /// One of [`BUILTIN_SCALES`], case-insensitive.
    pub fn builtin(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "viridis" => Some(Self::from_table("viridis", &VIRIDIS)),
            "plasma" => Some(Self::from_table("plasma", &PLASMA)),
            "greys" | "grays" => Some(Self::from_table("greys", &GREYS)),
            _ => None,
        }
    }

    fn from_table(name: &str, table: &[(f32, &str)]) -> Self {
        let stops = table
            .iter()
            .filter_map(|(pos, hex)| Color::from_hex(hex).map(|c| (*pos, c)))
            .collect();
        Self {
            name: name.to_string(),
            stops,
        }
    }

    /// Build a scale from a style definition.
    ///
    /// Stop values may be in any units; they are rescaled so the smallest
    /// maps to 0 and the largest to 1.
    pub fn from_definition(style: &StyleDefinition) -> MapResult<Self> {
        if style.stops.len() < 2 {
            return Err(MapError::Config(format!(
                "color scale '{}' needs at least two stops",
                style.name
            )));
        }

        let mut stops = Vec::with_capacity(style.stops.len());
        for stop in &style.stops {
            let color = Color::from_hex(&stop.color).ok_or_else(|| {
                MapError::Config(format!(
                    "color scale '{}' has invalid color '{}'",
                    style.name, stop.color
                ))
            })?;
            if !stop.value.is_finite() {
                return Err(MapError::Config(format!(
                    "color scale '{}' has a non-finite stop value",
                    style.name
                )));
            }
            stops.push((stop.value, color));
        }
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));

        let lo = stops[0].0;
        let hi = stops[stops.len() - 1].0;
        if hi - lo <= f32::EPSILON {
            return Err(MapError::Config(format!(
                "color scale '{}' stops all share one value",
                style.name
            )));
        }
        for stop in &mut stops {
            stop.0 = (stop.0 - lo) / (hi - lo);
        }

        Ok(Self {
            name: style.name.clone(),
            stops,
        })
    }

    /// Load a named scale (or the default one when `name` is `None`) from a
    /// style file.
    pub fn from_style_file(path: impl AsRef<Path>, name: Option<&str>) -> MapResult<Self> {
        let path = path.as_ref();
        let config = StyleConfig::from_file(path)?;
        let style = match name {
            Some(name) => config.get_style(name),
            None => config.get_default_style().map(|(_, s)| s),
        }
        .ok_or_else(|| {
            MapError::Config(format!(
                "style '{}' not found in {}",
                name.unwrap_or("default"),
                path.display()
            ))
        })?;
        Self::from_definition(style)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Color at position `t` in [0, 1]. Out-of-range values clamp to the
    /// ends; NaN maps to the low end.
    pub fn color_at(&self, t: f64) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) as f32 };

        let first = self.stops[0];
        if t <= first.0 {
            return first.1;
        }
        for pair in self.stops.windows(2) {
            let (lo_pos, lo_color) = pair[0];
            let (hi_pos, hi_color) = pair[1];
            if t <= hi_pos {
                let span = hi_pos - lo_pos;
                if span <= f32::EPSILON {
                    return hi_color;
                }
                return lo_color.lerp(hi_color, (t - lo_pos) / span);
            }
        }
        self.stops[self.stops.len() - 1].1
    }
}

/// Maps data values onto the [0, 1] domain of a color scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    pub vmin: f64,
    pub vmax: f64,
}

impl Normalize {
    /// Range used when there is no data to derive one from.
    pub const EMPTY: Normalize = Normalize {
        vmin: 0.0,
        vmax: 100.0,
    };

    /// A degenerate range (vmin == vmax) is widened by one unit each side.
    pub fn new(vmin: f64, vmax: f64) -> Self {
        let (vmin, vmax) = if vmin <= vmax { (vmin, vmax) } else { (vmax, vmin) };
        if vmax - vmin < 1e-9 {
            Self {
                vmin: vmin - 1.0,
                vmax: vmax + 1.0,
            }
        } else {
            Self { vmin, vmax }
        }
    }

    pub fn apply(&self, value: f64) -> f64 {
        ((value - self.vmin) / (self.vmax - self.vmin)).clamp(0.0, 1.0)
    }
}
