//! Common test fixtures for mortality-map tests.
//!
//! This module provides builders for the two input files (the weekly
//! mortality CSV and the GeoJSON state boundaries) and a small scenario that
//! exercises every rule of the pipeline.

use serde_json::{json, Value};

/// Header of the weekly deaths CSV, with the Alzheimer column at index 9.
pub const MORTALITY_HEADER: [&str; 12] = [
    "Jurisdiction of Occurrence",
    "MMWR Year",
    "MMWR Week",
    "Week Ending Date",
    "All  Cause",
    "Natural Cause",
    "Septicemia (A40-A41)",
    "Malignant neoplasms (C00-C97)",
    "Diabetes mellitus (E10-E14)",
    "Alzheimer disease (G30)",
    "Influenza and pneumonia (J10-J18)",
    "Chronic lower respiratory diseases (J40-J47)",
];

/// Builds a weekly mortality CSV in the source dataset's column layout.
#[derive(Debug, Clone, Default)]
pub struct MortalityCsvBuilder {
    rows: Vec<(String, i32, Option<u64>)>,
}

impl MortalityCsvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one weekly row. `None` leaves the Alzheimer cell empty.
    pub fn week(mut self, state: &str, year: i32, deaths: Option<u64>) -> Self {
        self.rows.push((state.to_string(), year, deaths));
        self
    }

    pub fn build(&self) -> String {
        let mut csv = MORTALITY_HEADER.join(",");
        csv.push('\n');
        for (week, (state, year, deaths)) in self.rows.iter().enumerate() {
            let deaths = deaths.map(|d| d.to_string()).unwrap_or_default();
            let week = week % 52 + 1;
            csv.push_str(&format!(
                "{state},{year},{week},{year}-01-{day:02},1000,900,20,200,30,{deaths},15,45\n",
                day = week % 28 + 1,
            ));
        }
        csv
    }
}

/// A closed square ring with its lower-left corner at (`x`, `y`).
pub fn square_ring(x: f64, y: f64, size: f64) -> Vec<[f64; 2]> {
    vec![
        [x, y],
        [x + size, y],
        [x + size, y + size],
        [x, y + size],
        [x, y],
    ]
}

/// A GeoJSON Polygon feature named `name`.
pub fn polygon_feature(name: &str, ring: Vec<[f64; 2]>) -> Value {
    json!({
        "type": "Feature",
        "properties": { "NAME": name, "STUSPS": name.chars().take(2).collect::<String>() },
        "geometry": { "type": "Polygon", "coordinates": [ring] }
    })
}

/// A GeoJSON MultiPolygon feature named `name`, one polygon per ring.
pub fn multipolygon_feature(name: &str, rings: Vec<Vec<[f64; 2]>>) -> Value {
    let polygons: Vec<Value> = rings.into_iter().map(|ring| json!([ring])).collect();
    json!({
        "type": "Feature",
        "properties": { "NAME": name },
        "geometry": { "type": "MultiPolygon", "coordinates": polygons }
    })
}

/// Wraps features into a FeatureCollection document.
pub fn feature_collection(features: Vec<Value>) -> String {
    json!({ "type": "FeatureCollection", "features": features }).to_string()
}

/// Weekly rows for the standard scenario.
///
/// | State | 2014 | 2019 | Percent change |
/// |---|---|---|---|
/// | Ohio | 40+60 | 70+80 | 50 |
/// | Texas | 0 | 0 | 0 |
/// | Nevada | 0 | 20 | 100 |
/// | Hawaii | 10 | 20 | 100 (excluded) |
/// | Alaska | 5 | 10 | 100 (excluded) |
/// | Puerto Rico | 4 | 2 | -50 (excluded) |
/// | Florida | 30 | - | missing |
/// | New York City | 7 | 9 | no boundary |
pub fn scenario_csv() -> String {
    MortalityCsvBuilder::new()
        .week("Ohio", 2014, Some(40))
        .week("Ohio", 2014, Some(60))
        .week("Ohio", 2019, Some(70))
        .week("Ohio", 2019, Some(80))
        .week("Texas", 2014, Some(0))
        .week("Texas", 2019, Some(0))
        .week("Nevada", 2014, Some(0))
        .week("Nevada", 2019, Some(20))
        .week("Nevada", 2016, Some(3))
        .week("Hawaii", 2014, Some(10))
        .week("Hawaii", 2019, Some(20))
        .week("Alaska", 2014, Some(5))
        .week("Alaska", 2019, Some(10))
        .week("Puerto Rico", 2014, Some(4))
        .week("Puerto Rico", 2019, Some(2))
        .week("Florida", 2014, Some(30))
        .week("New York City", 2014, Some(7))
        .week("New York City", 2019, Some(9))
        .build()
}

/// Boundary features for the standard scenario, laid out roughly where the
/// states are. Guam has a boundary but no data.
pub fn scenario_geojson() -> String {
    feature_collection(vec![
        polygon_feature("Ohio", square_ring(-84.0, 38.5, 3.0)),
        polygon_feature("Texas", square_ring(-104.0, 26.0, 10.0)),
        polygon_feature("Nevada", square_ring(-120.0, 35.0, 5.0)),
        polygon_feature("Hawaii", square_ring(-160.0, 19.0, 4.0)),
        multipolygon_feature(
            "Alaska",
            vec![square_ring(-165.0, 55.0, 20.0), square_ring(-175.0, 52.0, 2.0)],
        ),
        polygon_feature("Puerto Rico", square_ring(-67.0, 18.0, 1.5)),
        polygon_feature("Florida", square_ring(-87.0, 25.0, 6.0)),
        polygon_feature("Guam", square_ring(144.0, 13.0, 0.5)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_places_deaths_in_alzheimer_column() {
        let csv = MortalityCsvBuilder::new()
            .week("Ohio", 2014, Some(12))
            .week("Ohio", 2015, None)
            .build();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);

        let first: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(first.len(), MORTALITY_HEADER.len());
        assert_eq!(first[0], "Ohio");
        assert_eq!(first[9], "12");

        let second: Vec<&str> = lines[2].split(',').collect();
        assert_eq!(second[9], "");
    }

    #[test]
    fn test_feature_collection_is_valid_json() {
        let doc = scenario_geojson();
        let value: Value = serde_json::from_str(&doc).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
        assert_eq!(value["features"].as_array().unwrap().len(), 8);
    }
}
