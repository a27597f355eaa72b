//! Service configuration loaded from YAML, with CLI/env overrides applied in `main`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use boundaries::{ExclusionSet, DEFAULT_NAME_PROPERTY};
use map_common::{MapError, MapResult};
use mortality::{ColumnMapping, YearPair};
use renderer::{Color, ColorScale, RenderOptions, TextRenderer, BUILTIN_SCALES};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CSV_PATH: &str =
    "data/Weekly_Counts_of_Deaths_by_State_and_Select_Causes__2014-2019.csv";
pub const DEFAULT_BOUNDARY_PATH: &str = "data/cb_2023_us_state_500k.geojson";

/// Everything the startup pipeline and renderer need. Every field is optional
/// in the YAML file.
///
/// ```yaml
/// csv_path: data/deaths.csv
/// years: { start: 2014, end: 2019 }
/// exclude: [Alaska, Hawaii, Puerto Rico]
/// render:
///   color_scale: plasma
///   cache: true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub csv_path: PathBuf,
    pub boundary_path: PathBuf,
    pub columns: ColumnMapping,
    pub years: YearPair,
    pub exclude: ExclusionSet,
    /// GeoJSON feature property holding the state name.
    pub name_property: String,
    pub render: RenderConfig,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            boundary_path: PathBuf::from(DEFAULT_BOUNDARY_PATH),
            columns: ColumnMapping::default(),
            years: YearPair::default(),
            exclude: ExclusionSet::default(),
            name_property: DEFAULT_NAME_PROPERTY.to_string(),
            render: RenderConfig::default(),
        }
    }
}

/// Image settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Defaults to a title naming the configured years.
    pub title: Option<String>,
    /// Built-in scale name, or a style name inside `style_file`.
    pub color_scale: Option<String>,
    /// JSON style file with custom color scales.
    pub style_file: Option<PathBuf>,
    pub vmin: Option<f64>,
    pub vmax: Option<f64>,
    pub boundary_color: String,
    pub boundary_width: f32,
    /// TrueType font for the title and labels; the built-in stroke font is
    /// used when unset or unreadable.
    pub font_file: Option<PathBuf>,
    /// Keep the rendered page image for the life of the process.
    pub cache: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 600,
            title: None,
            color_scale: None,
            style_file: None,
            vmin: None,
            vmax: None,
            boundary_color: "#FFFFFF".to_string(),
            boundary_width: 0.4,
            font_file: None,
            cache: false,
        }
    }
}

impl MapConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: MapConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MapResult<()> {
        self.years.validate()?;
        if self.name_property.is_empty() {
            return Err(MapError::Config("name_property must not be empty".to_string()));
        }
        if let (Some(vmin), Some(vmax)) = (self.render.vmin, self.render.vmax) {
            if vmin >= vmax {
                return Err(MapError::Config(format!(
                    "render.vmin ({}) must be below render.vmax ({})",
                    vmin, vmax
                )));
            }
        }
        Ok(())
    }

    /// Title shown above the map.
    pub fn title(&self) -> String {
        self.render.title.clone().unwrap_or_else(|| {
            format!(
                "Percent Change in Alzheimer's Fatalities ({})",
                self.years.label()
            )
        })
    }

    /// Resolve the color scale, fixed range, colors and font into renderer options.
    ///
    /// `data_range` fills in whichever of `vmin`/`vmax` is unset when only one
    /// is configured.
    pub fn render_options(&self, data_range: Option<(f64, f64)>) -> MapResult<RenderOptions> {
        let render = &self.render;

        let color_scale = match &render.style_file {
            Some(file) => ColorScale::from_style_file(file, render.color_scale.as_deref())?,
            None => {
                let name = render.color_scale.as_deref().unwrap_or("viridis");
                ColorScale::builtin(name).ok_or_else(|| {
                    MapError::Config(format!(
                        "unknown color scale '{}' (built-in: {})",
                        name,
                        BUILTIN_SCALES.join(", ")
                    ))
                })?
            }
        };

        let value_range = match (render.vmin, render.vmax) {
            (Some(vmin), Some(vmax)) => Some((vmin, vmax)),
            (Some(vmin), None) => data_range.map(|(_, hi)| (vmin, hi)),
            (None, Some(vmax)) => data_range.map(|(lo, _)| (lo, vmax)),
            (None, None) => None,
        };

        let boundary_color = Color::from_hex(&render.boundary_color).ok_or_else(|| {
            MapError::Config(format!(
                "render.boundary_color '{}' is not a hex color",
                render.boundary_color
            ))
        })?;

        let text = match &render.font_file {
            Some(path) => TextRenderer::from_font_file(path).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to built-in stroke font");
                TextRenderer::Stroke
            }),
            None => TextRenderer::Stroke,
        };

        Ok(RenderOptions {
            width: render.width,
            height: render.height,
            title: self.title(),
            color_scale,
            value_range,
            boundary_color,
            boundary_width: render.boundary_width,
            text,
            ..RenderOptions::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_gives_defaults() {
        let config = MapConfig::from_yaml("{}").unwrap();
        assert_eq!(config, MapConfig::default());
        assert_eq!(
            config.title(),
            "Percent Change in Alzheimer's Fatalities (2014-2019)"
        );
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
years: { start: 2015, end: 2018 }
exclude: [Alaska]
render:
  color_scale: plasma
  cache: true
"#;
        let config = MapConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.years, YearPair { start: 2015, end: 2018 });
        assert_eq!(config.exclude.len(), 1);
        assert!(config.render.cache);
        assert_eq!(config.render.width, 1000);
        assert_eq!(config.name_property, "NAME");
        assert_eq!(config.title(), "Percent Change in Alzheimer's Fatalities (2015-2018)");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(MapConfig::from_yaml("years: { start: 2019, end: 2019 }").is_err());
        assert!(MapConfig::from_yaml("render: { vmin: 10, vmax: 5 }").is_err());
        assert!(MapConfig::from_yaml("name_property: ''").is_err());
    }

    #[test]
    fn test_half_open_range_uses_data() {
        let mut config = MapConfig::default();
        config.render.vmin = Some(-20.0);
        let options = config.render_options(Some((0.0, 80.0))).unwrap();
        assert_eq!(options.value_range, Some((-20.0, 80.0)));

        let options = config.render_options(None).unwrap();
        assert_eq!(options.value_range, None);
    }

    #[test]
    fn test_unknown_scale_and_bad_color() {
        let mut config = MapConfig::default();
        config.render.color_scale = Some("rainbow".to_string());
        let err = config.render_options(None).unwrap_err();
        assert!(err.to_string().contains("viridis"));

        let mut config = MapConfig::default();
        config.render.boundary_color = "white".to_string();
        assert_eq!(config.render_options(None).unwrap_err().kind(), "config");
    }

    #[test]
    fn test_unreadable_font_falls_back() {
        let mut config = MapConfig::default();
        config.render.font_file = Some(PathBuf::from("/nonexistent/font.ttf"));
        let options = config.render_options(None).unwrap();
        assert!(matches!(options.text, TextRenderer::Stroke));
    }
}
