//! GeoJSON boundary loading.

use std::path::Path;

use geo::{BoundingRect, MultiPolygon, Polygon};
use geojson::{Feature, GeoJson, JsonValue};
use map_common::{BoundingBox, MapError, MapResult};
use tracing::info;

/// Feature property holding the state name in Census cartographic boundary files.
pub const DEFAULT_NAME_PROPERTY: &str = "NAME";

/// A named state outline. Single polygons are stored as one-member multipolygons.
#[derive(Debug, Clone, PartialEq)]
pub struct StateBoundary {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

impl StateBoundary {
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.geometry.bounding_rect().map(|rect| {
            BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
        })
    }
}

/// Load state boundaries from a GeoJSON file.
pub fn load_boundaries(path: impl AsRef<Path>, name_property: &str) -> MapResult<Vec<StateBoundary>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| MapError::file_access(path, e))?;

    let boundaries = parse_boundaries(&content, name_property)
        .map_err(|e| match e {
            MapError::Parse { context, message } => MapError::Parse {
                context: format!("{} ({})", context, path.display()),
                message,
            },
            other => other,
        })?;

    info!(
        path = %path.display(),
        features = boundaries.len(),
        "Loaded state boundaries"
    );

    Ok(boundaries)
}

/// Parse a GeoJSON FeatureCollection (or a single Feature) into boundaries.
pub fn parse_boundaries(content: &str, name_property: &str) -> MapResult<Vec<StateBoundary>> {
    let geojson: GeoJson = content
        .parse()
        .map_err(|e: geojson::Error| MapError::parse("GeoJSON", e))?;

    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(MapError::parse(
                "GeoJSON",
                "expected a FeatureCollection, found a bare Geometry",
            ))
        }
    };

    features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| feature_to_boundary(feature, index, name_property))
        .collect()
}

fn feature_to_boundary(feature: Feature, index: usize, name_property: &str) -> MapResult<StateBoundary> {
    let context = format!("feature {index}");

    let name = match feature.property(name_property) {
        Some(JsonValue::String(name)) => name.clone(),
        Some(other) => {
            return Err(MapError::parse(
                context,
                format!("property '{name_property}' is not a string: {other}"),
            ))
        }
        None => {
            return Err(MapError::parse(
                context,
                format!("missing property '{name_property}'"),
            ))
        }
    };

    let value = match feature.geometry {
        Some(geometry) => geometry.value,
        None => return Err(MapError::parse(context, format!("'{name}' has no geometry"))),
    };

    let geometry = match value {
        geojson::Value::Polygon(_) => {
            let polygon = Polygon::<f64>::try_from(value)
                .map_err(|e| MapError::parse(context.clone(), e))?;
            MultiPolygon::new(vec![polygon])
        }
        geojson::Value::MultiPolygon(_) => {
            MultiPolygon::<f64>::try_from(value).map_err(|e| MapError::parse(context.clone(), e))?
        }
        other => {
            return Err(MapError::parse(
                context,
                format!(
                    "'{name}' has unsupported geometry type {}",
                    geometry_type_name(&other)
                ),
            ))
        }
    };

    Ok(StateBoundary { name, geometry })
}

fn geometry_type_name(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}
