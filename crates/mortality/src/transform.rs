//! Pivot of weekly records into one row per state with yearly totals.

use std::collections::{BTreeMap, BTreeSet};

use map_common::{MapError, MapResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::loader::MortalityRecord;

/// The two years compared by the percent-change column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearPair {
    pub start: i32,
    pub end: i32,
}

impl Default for YearPair {
    fn default() -> Self {
        Self {
            start: 2014,
            end: 2019,
        }
    }
}

impl YearPair {
    pub fn new(start: i32, end: i32) -> MapResult<Self> {
        let pair = Self { start, end };
        pair.validate()?;
        Ok(pair)
    }

    pub fn validate(&self) -> MapResult<()> {
        if self.start == self.end {
            return Err(MapError::Config(format!(
                "start and end year are both {}",
                self.start
            )));
        }
        Ok(())
    }

    /// "2014-2019"
    pub fn label(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

/// Percent change from `start` to `end` deaths.
///
/// Zero to zero is no change (0) and zero to anything else counts as a full
/// increase (100), whatever the magnitude.
pub fn percent_change(start: u64, end: u64) -> f64 {
    match (start, end) {
        (0, 0) => 0.0,
        (0, _) => 100.0,
        (start, end) => (end as f64 - start as f64) / start as f64 * 100.0,
    }
}

/// Yearly totals for one state.
#[derive(Debug, Clone, PartialEq)]
pub struct StateRow {
    pub state: String,
    /// Summed deaths per observed year.
    pub counts: BTreeMap<i32, u64>,
    /// `None` when the state has no rows for the start or end year.
    pub percent_change: Option<f64>,
}

impl StateRow {
    pub fn count(&self, year: i32) -> Option<u64> {
        self.counts.get(&year).copied()
    }
}

/// States by name, each with yearly totals and the derived percent change.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    years: YearPair,
    observed_years: BTreeSet<i32>,
    rows: BTreeMap<String, StateRow>,
}

impl PivotTable {
    /// Sum records per (state, year) and derive the percent change.
    ///
    /// Empty death cells add nothing to their group, but the group still
    /// exists, so a state whose start-year cells are all empty has a start
    /// count of 0 rather than a missing one.
    pub fn from_records(records: &[MortalityRecord], years: YearPair) -> MapResult<Self> {
        years.validate()?;

        let mut totals: BTreeMap<String, BTreeMap<i32, u64>> = BTreeMap::new();
        let mut observed_years = BTreeSet::new();

        for record in records {
            observed_years.insert(record.year);
            let entry = totals
                .entry(record.state.clone())
                .or_default()
                .entry(record.year)
                .or_insert(0);
            *entry = entry
                .checked_add(record.deaths.unwrap_or(0))
                .ok_or_else(|| {
                    MapError::parse(
                        format!("{} {}", record.state, record.year),
                        "death count total overflows u64",
                    )
                })?;
        }

        let absent: Vec<String> = [years.start, years.end]
            .iter()
            .filter(|y| !observed_years.contains(*y))
            .map(|y| y.to_string())
            .collect();
        if !absent.is_empty() {
            return Err(MapError::Schema(format!(
                "no records for year {}",
                absent.join(", ")
            )));
        }

        let rows: BTreeMap<String, StateRow> = totals
            .into_iter()
            .map(|(state, counts)| {
                let change = match (counts.get(&years.start), counts.get(&years.end)) {
                    (Some(&start), Some(&end)) => Some(percent_change(start, end)),
                    _ => None,
                };
                let row = StateRow {
                    state: state.clone(),
                    counts,
                    percent_change: change,
                };
                (state, row)
            })
            .collect();

        let undefined = rows.values().filter(|r| r.percent_change.is_none()).count();
        if undefined > 0 {
            warn!(
                states = undefined,
                start = years.start,
                end = years.end,
                "States missing a compared year have no percent change"
            );
        }

        info!(
            states = rows.len(),
            years = observed_years.len(),
            "Pivoted mortality records"
        );

        Ok(Self {
            years,
            observed_years,
            rows,
        })
    }

    pub fn years(&self) -> YearPair {
        self.years
    }

    /// Every year seen in the source data, ascending.
    pub fn observed_years(&self) -> impl Iterator<Item = i32> + '_ {
        self.observed_years.iter().copied()
    }

    pub fn get(&self, state: &str) -> Option<&StateRow> {
        self.rows.get(state)
    }

    /// Rows ordered by state name.
    pub fn rows(&self) -> impl Iterator<Item = &StateRow> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(state: &str, year: i32, deaths: Option<u64>) -> MortalityRecord {
        MortalityRecord {
            state: state.to_string(),
            year,
            deaths,
        }
    }

    #[test]
    fn test_percent_change_rules() {
        assert_eq!(percent_change(0, 0), 0.0);
        assert_eq!(percent_change(0, 20), 100.0);
        assert_eq!(percent_change(0, 1_000_000), 100.0);
        assert_eq!(percent_change(100, 150), 50.0);
        assert_eq!(percent_change(4, 2), -50.0);
        assert_eq!(percent_change(10, 0), -100.0);
    }

    #[test]
    fn test_percent_change_formula_matches_float_arithmetic() {
        for (start, end) in [(3u64, 7u64), (7, 3), (1234, 1235), (99, 1)] {
            let expected = (end as f64 - start as f64) / start as f64 * 100.0;
            assert!((percent_change(start, end) - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rows_are_summed_per_state_and_year() {
        let records = vec![
            record("Ohio", 2014, Some(40)),
            record("Ohio", 2014, Some(60)),
            record("Ohio", 2019, Some(150)),
            record("Ohio", 2019, None),
        ];
        let table = PivotTable::from_records(&records, YearPair::default()).unwrap();
        let ohio = table.get("Ohio").unwrap();
        assert_eq!(ohio.count(2014), Some(100));
        assert_eq!(ohio.count(2019), Some(150));
        assert_eq!(ohio.percent_change, Some(50.0));
    }

    #[test]
    fn test_all_missing_cells_sum_to_zero() {
        let records = vec![
            record("Texas", 2014, None),
            record("Texas", 2019, Some(5)),
        ];
        let table = PivotTable::from_records(&records, YearPair::default()).unwrap();
        let texas = table.get("Texas").unwrap();
        assert_eq!(texas.count(2014), Some(0));
        assert_eq!(texas.percent_change, Some(100.0));
    }

    #[test]
    fn test_missing_year_yields_undefined_change() {
        let records = vec![
            record("Ohio", 2014, Some(1)),
            record("Ohio", 2019, Some(2)),
            record("Florida", 2014, Some(30)),
        ];
        let table = PivotTable::from_records(&records, YearPair::default()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("Florida").unwrap().percent_change, None);
    }

    #[test]
    fn test_year_absent_from_data_is_schema_error() {
        let records = vec![record("Ohio", 2014, Some(1))];
        let err = PivotTable::from_records(&records, YearPair::default()).unwrap_err();
        assert_eq!(err.kind(), "schema");
        assert!(err.to_string().contains("2019"));
    }

    #[test]
    fn test_overflowing_total_is_parse_error() {
        let records = vec![
            record("Ohio", 2014, Some(u64::MAX)),
            record("Ohio", 2014, Some(1)),
            record("Ohio", 2019, Some(1)),
        ];
        let err = PivotTable::from_records(&records, YearPair::default()).unwrap_err();
        assert_eq!(err.kind(), "parse");
        assert!(err.to_string().contains("Ohio 2014"), "{}", err);
    }

    #[test]
    fn test_equal_years_rejected() {
        assert!(YearPair::new(2014, 2014).is_err());
        assert_eq!(YearPair::new(2015, 2018).unwrap().label(), "2015-2018");
    }
}
