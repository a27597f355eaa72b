//! State boundary geometry and its join with the mortality pivot.
//!
//! Boundaries are read from a GeoJSON FeatureCollection whose features carry
//! the state name in a string property (`NAME` by default). The join keeps
//! boundary order and drops states without a percent change or in the
//! exclusion set.

pub mod join;
pub mod loader;

pub use join::{join_and_filter, ExclusionSet, JoinedRecord, JoinedTable};
pub use loader::{load_boundaries, parse_boundaries, StateBoundary, DEFAULT_NAME_PROPERTY};
