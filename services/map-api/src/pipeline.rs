//! Startup data pipeline: CSV to pivot to joined, filtered state table.

use std::path::Path;
use std::time::Instant;

use boundaries::{join_and_filter, load_boundaries, JoinedTable};
use map_common::MapResult;
use mortality::{load_records, PivotTable};
use tracing::info;

use crate::config::MapConfig;

/// Run load, pivot, join and filter with the configured columns, years,
/// name property and exclusions.
pub fn build_joined_table(
    csv_path: impl AsRef<Path>,
    boundary_path: impl AsRef<Path>,
    config: &MapConfig,
) -> MapResult<JoinedTable> {
    let start = Instant::now();

    let records = load_records(csv_path.as_ref(), &config.columns)?;
    let pivot = PivotTable::from_records(&records, config.years)?;
    info!(
        rows = records.len(),
        states = pivot.len(),
        years = %config.years.label(),
        "Loaded mortality data"
    );

    let boundaries = load_boundaries(boundary_path.as_ref(), &config.name_property)?;
    let features = boundaries.len();
    let table = join_and_filter(boundaries, &pivot, &config.exclude);

    info!(
        features,
        states = table.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Joined state boundaries"
    );
    Ok(table)
}
