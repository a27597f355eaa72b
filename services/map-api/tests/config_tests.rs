//! Configuration file loading and render option resolution.

use map_api::MapConfig;
use renderer::{Color, TextRenderer};
use std::path::PathBuf;
use test_utils::{missing_path, write_temp_file};

const STYLES: &str = r##"{
    "version": "1.0",
    "styles": {
        "warm": {
            "name": "Warm",
            "default": true,
            "stops": [
                {"value": 0, "color": "#FFFFCC"},
                {"value": 1, "color": "#BD0026"}
            ]
        }
    }
}"##;

#[test]
fn test_load_full_file() {
    let yaml = r##"
csv_path: /data/deaths.csv
boundary_path: /data/states.geojson
columns:
  state: Jurisdiction
  year: Year
  deaths: Alzheimer
years:
  start: 2015
  end: 2019
exclude: [Alaska, Hawaii]
name_property: STATE_NAME
render:
  width: 800
  height: 480
  title: Alzheimer's deaths
  color_scale: plasma
  vmin: -50
  vmax: 150
  boundary_color: "#333333"
  boundary_width: 1.0
  cache: true
"##;
    let file = write_temp_file(yaml, ".yaml");
    let config = MapConfig::load(file.path()).unwrap();

    assert_eq!(config.csv_path, PathBuf::from("/data/deaths.csv"));
    assert_eq!(config.columns.state, "Jurisdiction");
    assert_eq!(config.name_property, "STATE_NAME");
    assert!(config.exclude.contains("Hawaii"));
    assert!(!config.exclude.contains("Puerto Rico"));
    assert_eq!(config.title(), "Alzheimer's deaths");

    let options = config.render_options(Some((0.0, 10.0))).unwrap();
    assert_eq!((options.width, options.height), (800, 480));
    assert_eq!(options.color_scale.name(), "plasma");
    assert_eq!(options.value_range, Some((-50.0, 150.0)));
    assert_eq!(options.boundary_color, Color::from_hex("#333333").unwrap());
    assert_eq!(options.boundary_width, 1.0);
}

#[test]
fn test_style_file_scale() {
    let styles = write_temp_file(STYLES, ".json");
    let mut config = MapConfig::default();
    config.render.style_file = Some(styles.path().to_path_buf());

    let options = config.render_options(None).unwrap();
    assert_eq!(options.color_scale.name(), "Warm");
    assert_eq!(options.color_scale.color_at(0.0).to_hex(), "#FFFFCC");

    config.render.color_scale = Some("absent".to_string());
    assert!(config.render_options(None).is_err());
}

#[test]
fn test_default_options_match_renderer_defaults() {
    let options = MapConfig::default().render_options(None).unwrap();
    assert_eq!((options.width, options.height), (1000, 600));
    assert_eq!(options.color_scale.name(), "viridis");
    assert_eq!(options.value_range, None);
    assert_eq!(options.boundary_color, Color::WHITE);
    assert!(matches!(options.text, TextRenderer::Stroke));
    assert_eq!(options.title, renderer::DEFAULT_TITLE);
}

#[test]
fn test_load_errors_name_the_file() {
    let (_dir, path) = missing_path("map.yaml");
    let err = MapConfig::load(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("map.yaml"));

    let file = write_temp_file("render: [not, a, map]", ".yaml");
    let err = MapConfig::load(file.path()).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse config"));
}
