//! CSV loading for weekly death counts.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use map_common::{MapError, MapResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Source column names for the three fields the pipeline keeps.
///
/// Every other column in the file is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    /// Jurisdiction (state) name column.
    pub state: String,
    /// Year column.
    pub year: String,
    /// Death count column for the tracked cause.
    pub deaths: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            state: "Jurisdiction of Occurrence".to_string(),
            year: "MMWR Year".to_string(),
            deaths: "Alzheimer disease (G30)".to_string(),
        }
    }
}

/// One source row reduced to the kept fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MortalityRecord {
    pub state: String,
    pub year: i32,
    /// `None` when the cell is empty (suppressed counts).
    pub deaths: Option<u64>,
}

/// Positions of the mapped columns within the header row.
#[derive(Debug, Clone, Copy)]
struct ColumnIndices {
    state: usize,
    year: usize,
    deaths: usize,
}

impl ColumnIndices {
    fn resolve(headers: &csv::StringRecord, columns: &ColumnMapping) -> MapResult<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);

        let state = find(&columns.state);
        let year = find(&columns.year);
        let deaths = find(&columns.deaths);

        match (state, year, deaths) {
            (Some(state), Some(year), Some(deaths)) => Ok(Self {
                state,
                year,
                deaths,
            }),
            _ => {
                let missing = [
                    (state, &columns.state),
                    (year, &columns.year),
                    (deaths, &columns.deaths),
                ]
                .into_iter()
                .filter(|(idx, _)| idx.is_none())
                .map(|(_, name)| name.clone())
                .collect();
                Err(MapError::MissingColumns { missing })
            }
        }
    }
}

/// Load mortality records from a CSV file with a header row.
pub fn load_records(
    path: impl AsRef<Path>,
    columns: &ColumnMapping,
) -> MapResult<Vec<MortalityRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| MapError::file_access(path, e))?;

    let records = read_records(BufReader::new(file), columns)?;

    info!(
        path = %path.display(),
        rows = records.len(),
        "Loaded mortality records"
    );

    Ok(records)
}

/// Read mortality records from any CSV source with a header row.
pub fn read_records<R: Read>(reader: R, columns: &ColumnMapping) -> MapResult<Vec<MortalityRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| MapError::parse("CSV header", e))?
        .clone();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(MapError::parse("CSV header", "no header row"));
    }

    let indices = ColumnIndices::resolve(&headers, columns)?;
    debug!(
        state = indices.state,
        year = indices.year,
        deaths = indices.deaths,
        "Resolved mortality columns"
    );

    let mut records = Vec::new();
    for result in csv_reader.records() {
        let row = result.map_err(|e| MapError::parse("CSV row", e))?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        records.push(parse_row(&row, indices, line)?);
    }

    Ok(records)
}

fn parse_row(row: &csv::StringRecord, indices: ColumnIndices, line: u64) -> MapResult<MortalityRecord> {
    let field = |idx: usize| row.get(idx).unwrap_or("");

    let state = field(indices.state).to_string();

    let year_raw = field(indices.year);
    let year = year_raw.parse::<i32>().map_err(|_| {
        MapError::parse(format!("line {line}"), format!("invalid year '{year_raw}'"))
    })?;

    let deaths = parse_count(field(indices.deaths))
        .map_err(|message| MapError::parse(format!("line {line}"), message))?;

    Ok(MortalityRecord {
        state,
        year,
        deaths,
    })
}

/// Parse a death count cell. Empty cells are missing values.
///
/// Integral floats such as `12.0` are accepted since exported spreadsheets
/// often write counts that way.
fn parse_count(raw: &str) -> Result<Option<u64>, String> {
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(count) = raw.parse::<u64>() {
        return Ok(Some(count));
    }
    match raw.parse::<f64>() {
        // u64::MAX as f64 rounds up to 2^64, which is itself out of range
        Ok(value)
            if value.is_finite()
                && value >= 0.0
                && value.fract() == 0.0
                && value < u64::MAX as f64 =>
        {
            Ok(Some(value as u64))
        }
        _ => Err(format!("invalid death count '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> ColumnMapping {
        ColumnMapping {
            state: "State".to_string(),
            year: "Year".to_string(),
            deaths: "Deaths".to_string(),
        }
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(""), Ok(None));
        assert_eq!(parse_count("42"), Ok(Some(42)));
        assert_eq!(parse_count("42.0"), Ok(Some(42)));
        assert!(parse_count("-1").is_err());
        assert!(parse_count("4.5").is_err());
        assert!(parse_count("n/a").is_err());
    }

    #[test]
    fn test_parse_count_rejects_out_of_range_floats() {
        assert_eq!(parse_count("1e3"), Ok(Some(1000)));
        assert!(parse_count("1e30").is_err());
        assert!(parse_count("18446744073709551616.0").is_err());
        assert!(parse_count("18446744073709551616").is_err());
    }

    #[test]
    fn test_columns_selected_by_name_not_position() {
        let csv = "Deaths,Other,Year,State\n7,x,2014,Ohio\n,y,2019,Ohio\n";
        let records = read_records(csv.as_bytes(), &mapping()).unwrap();
        assert_eq!(
            records,
            vec![
                MortalityRecord {
                    state: "Ohio".to_string(),
                    year: 2014,
                    deaths: Some(7)
                },
                MortalityRecord {
                    state: "Ohio".to_string(),
                    year: 2019,
                    deaths: None
                },
            ]
        );
    }

    #[test]
    fn test_missing_columns_are_all_reported() {
        let csv = "State,Other\nOhio,1\n";
        match read_records(csv.as_bytes(), &mapping()) {
            Err(MapError::MissingColumns { missing }) => {
                assert_eq!(missing, vec!["Year".to_string(), "Deaths".to_string()]);
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_year_reports_line() {
        let csv = "State,Year,Deaths\nOhio,2014,1\nOhio,twenty,2\n";
        let err = read_records(csv.as_bytes(), &mapping()).unwrap_err();
        assert_eq!(err.kind(), "parse");
        assert!(err.to_string().contains("line 3"), "{}", err);
    }
}
