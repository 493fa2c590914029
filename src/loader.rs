//! Dataset loading from delimited text.
//!
//! The header row decides which column is which, so column order is free and
//! unknown columns are ignored. `latitude` and `longitude` are optional: when
//! both are present the resulting [`Table`] reports coordinates and rows with
//! both cells filled carry a location.

use crate::error::{EpiError, Result};
use crate::table::Table;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use epiwatch_types::record::{CaseRecord, Counts};
use geo::Point;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%Y%m%d"];

/// Load a dataset from a comma-separated file.
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Table> {
    DatasetLoader::new().load(path)
}

/// Parse a calendar date or date-time cell.
///
/// Accepts ISO-8601 dates and date-times (with or without a UTC offset; an
/// offset is dropped after conversion to the local wall time it denotes) and
/// the common `m/d/Y` and `d.m.Y` day formats. Dates without a time of day
/// resolve to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Reads delimited text into a [`Table`].
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    delimiter: u8,
}

impl DatasetLoader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Use a different field delimiter (for example `b';'` or `b'\t'`).
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Table> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let table = self.read(file)?;
        log::info!(
            "Loaded {} rows from {} (coordinates: {})",
            table.len(),
            path.display(),
            table.has_coordinates()
        );
        Ok(table)
    }

    pub fn read<R: Read>(&self, reader: R) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let columns = Columns::resolve(reader.headers()?)?;

        let mut rows = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record = record?;
            rows.push(columns.parse_row(idx + 1, &record)?);
        }

        Ok(Table::new(rows, columns.has_coordinates()))
    }
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Header positions of the columns the loader understands.
struct Columns {
    date: usize,
    region: usize,
    disease: usize,
    new_cases: usize,
    recovered: usize,
    deaths: usize,
    coordinates: Option<(usize, usize)>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let require = |name: &'static str| find(name).ok_or(EpiError::MissingColumn(name));

        let coordinates = match (find("latitude"), find("longitude")) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            (None, None) => None,
            (Some(_), None) | (None, Some(_)) => {
                log::warn!("Only one of 'latitude'/'longitude' present; ignoring coordinates");
                None
            }
        };

        Ok(Self {
            date: require("date")?,
            region: require("region")?,
            disease: require("disease")?,
            new_cases: require("new_cases")?,
            recovered: require("recovered")?,
            deaths: require("deaths")?,
            coordinates,
        })
    }

    fn has_coordinates(&self) -> bool {
        self.coordinates.is_some()
    }

    fn parse_row(&self, row: usize, record: &StringRecord) -> Result<CaseRecord> {
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        let raw_date = cell(self.date);
        let date = parse_timestamp(raw_date).ok_or_else(|| EpiError::InvalidValue {
            row,
            column: "date",
            value: raw_date.to_string(),
            reason: "not a recognised date or date-time".to_string(),
        })?;

        let counts = Counts::new(
            parse_count(row, "new_cases", cell(self.new_cases))?,
            parse_count(row, "recovered", cell(self.recovered))?,
            parse_count(row, "deaths", cell(self.deaths))?,
        );

        let mut out = CaseRecord::new(date, cell(self.region), cell(self.disease), counts);

        if let Some((lat_idx, lon_idx)) = self.coordinates {
            let lat = parse_coordinate(row, "latitude", cell(lat_idx))?;
            let lon = parse_coordinate(row, "longitude", cell(lon_idx))?;
            if let (Some(lat), Some(lon)) = (lat, lon) {
                out = out.with_location(Point::new(lon, lat));
            }
        }

        Ok(out)
    }
}

/// Counts are integers; float text is truncated and a blank cell counts as zero.
fn parse_count(row: usize, column: &'static str, raw: &str) -> Result<i64> {
    if raw.is_empty() {
        log::debug!("Row {}: blank '{}' treated as 0", row, column);
        return Ok(0);
    }
    if let Ok(v) = raw.parse::<i64>() {
        return Ok(v);
    }
    let invalid = |reason: &str| EpiError::InvalidValue {
        row,
        column,
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    let v = raw
        .parse::<f64>()
        .map_err(|_| invalid("expected an integer count"))?;
    if !v.is_finite() {
        return Err(invalid("expected an integer count"));
    }
    // 2^63 is exactly representable; anything at or past it does not fit
    let v = v.trunc();
    if v < i64::MIN as f64 || v >= i64::MAX as f64 {
        return Err(invalid("count out of range"));
    }
    Ok(v as i64)
}

fn parse_coordinate(row: usize, column: &'static str, raw: &str) -> Result<Option<f64>> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|e| EpiError::InvalidValue {
            row,
            column,
            value: raw.to_string(),
            reason: e.to_string(),
        })
}
