//! Weekly mortality data: CSV loading and the per-state year pivot.
//!
//! - [`loader`] reads the source CSV into typed [`MortalityRecord`]s, selecting
//!   columns by name.
//! - [`transform`] sums counts per state and year and derives the percent
//!   change between two years.

pub mod loader;
pub mod transform;

pub use loader::{load_records, read_records, ColumnMapping, MortalityRecord};
pub use transform::{percent_change, PivotTable, StateRow, YearPair};
