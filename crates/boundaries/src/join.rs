//! Left join of state boundaries onto the mortality pivot.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use geo::MultiPolygon;
use map_common::BoundingBox;
use mortality::PivotTable;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::loader::StateBoundary;

/// State names never drawn on the map (non-contiguous states and territories).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExclusionSet(BTreeSet<String>);

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::new(["Alaska", "Hawaii", "Puerto Rico"])
    }
}

impl ExclusionSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Exact, case-sensitive membership.
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A boundary with its matched percent change.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
    pub percent_change: f64,
    pub start_count: u64,
    pub end_count: u64,
}

/// Joined, filtered records in boundary-file order, ready for rendering.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct JoinedTable {
    records: Vec<JoinedRecord>,
}

impl JoinedTable {
    pub fn new(records: Vec<JoinedRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[JoinedRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record with the given name.
    pub fn get(&self, name: &str) -> Option<&JoinedRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Combined extent of every geometry, `None` when the table is empty.
    pub fn bounds(&self) -> Option<BoundingBox> {
        let points = self.records.iter().flat_map(|record| {
            record.geometry.0.iter().flat_map(|polygon| {
                polygon
                    .exterior()
                    .coords()
                    .map(|c| (c.x, c.y))
            })
        });
        BoundingBox::from_points(points)
    }

    /// Smallest and largest percent change, `None` when the table is empty.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.records.iter().map(|r| r.percent_change).fold(None, |range, v| {
            Some(match range {
                None => (v, v),
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
            })
        })
    }

    /// Stable hash of names, values and vertices.
    ///
    /// Two tables built from the same inputs always share a fingerprint within
    /// a process.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.records.len().hash(&mut hasher);
        for record in &self.records {
            record.name.hash(&mut hasher);
            record.percent_change.to_bits().hash(&mut hasher);
            for polygon in &record.geometry.0 {
                for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                    ring.0.len().hash(&mut hasher);
                    for coord in &ring.0 {
                        coord.x.to_bits().hash(&mut hasher);
                        coord.y.to_bits().hash(&mut hasher);
                    }
                }
            }
        }
        hasher.finish()
    }
}

/// Left-join `table` onto `boundaries` by exact state name, then drop rows
/// without a percent change and rows whose name is excluded.
///
/// Boundary order is preserved. An empty result is valid and renders as an
/// empty map.
pub fn join_and_filter(
    boundaries: Vec<StateBoundary>,
    table: &PivotTable,
    excluded: &ExclusionSet,
) -> JoinedTable {
    let years = table.years();
    let total = boundaries.len();
    let mut unmatched = 0usize;
    let mut undefined = 0usize;
    let mut dropped_excluded = 0usize;

    let mut records = Vec::with_capacity(total);
    for boundary in boundaries {
        let Some(row) = table.get(&boundary.name) else {
            unmatched += 1;
            continue;
        };
        let Some(percent_change) = row.percent_change else {
            undefined += 1;
            continue;
        };
        if excluded.contains(&boundary.name) {
            dropped_excluded += 1;
            continue;
        }

        records.push(JoinedRecord {
            name: boundary.name,
            geometry: boundary.geometry,
            percent_change,
            start_count: row.count(years.start).unwrap_or(0),
            end_count: row.count(years.end).unwrap_or(0),
        });
    }

    debug!(
        unmatched = unmatched,
        undefined = undefined,
        excluded = dropped_excluded,
        "Dropped boundary rows"
    );

    if records.is_empty() {
        warn!(boundaries = total, "No boundary matched a state with a percent change; map will be empty");
    } else {
        info!(states = records.len(), boundaries = total, "Joined boundaries to mortality pivot");
    }

    JoinedTable::new(records)
}
