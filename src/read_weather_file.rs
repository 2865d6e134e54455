use crate::errors::WeatherFileError;
use crate::external_conditions::{WeatherSample, WeatherSeries};
use chrono::NaiveDateTime;
use csv::{ReaderBuilder as CsvReaderBuilder, StringRecord};
use std::io::Read;

const COLUMN_TIMESTAMP: &str = "timestamp";
const COLUMN_OUTDOOR_TEMP: &str = "outdoor_temp"; // dry bulb temp in deg F
const COLUMN_RELATIVE_HUMIDITY: &str = "relative_humidity"; // in %
const COLUMN_SOURCE_ELEVATION: &str = "source_elevation"; // elevation of the grid point, in ft

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

struct Columns {
    timestamp: usize,
    outdoor_temp: Option<usize>,
    relative_humidity: Option<usize>,
    source_elevation: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, WeatherFileError> {
        let position = |name: &str| headers.iter().position(|header| header.trim() == name);

        Ok(Self {
            timestamp: position(COLUMN_TIMESTAMP).ok_or(WeatherFileError::MissingColumn {
                column: COLUMN_TIMESTAMP,
            })?,
            outdoor_temp: position(COLUMN_OUTDOOR_TEMP),
            relative_humidity: position(COLUMN_RELATIVE_HUMIDITY),
            source_elevation: position(COLUMN_SOURCE_ELEVATION),
        })
    }
}

fn parse_timestamp(row: usize, value: &str) -> Result<NaiveDateTime, WeatherFileError> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value.trim(), format).ok())
        .ok_or_else(|| WeatherFileError::BadTimestamp {
            row,
            value: value.to_owned(),
        })
}

/// Empty or absent cells are missing values; anything else must parse as a number
fn parse_optional_number(
    record: &StringRecord,
    row: usize,
    column: Option<usize>,
    name: &'static str,
) -> Result<Option<f64>, WeatherFileError> {
    match column.and_then(|idx| record.get(idx)).map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| WeatherFileError::BadNumber {
                row,
                column: name,
                value: value.to_owned(),
            }),
    }
}

/// Read an hourly forecast from CSV with the headers
/// `timestamp,outdoor_temp,relative_humidity[,source_elevation]`.
pub fn weather_series_from_csv(file: impl Read) -> Result<WeatherSeries, WeatherFileError> {
    let mut reader = CsvReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(file);

    let columns = Columns::from_headers(reader.headers()?)?;

    let mut samples = vec![];
    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        // rows are counted from 1, after the header row
        let row = idx + 1;

        let timestamp = parse_timestamp(row, record.get(columns.timestamp).unwrap_or_default())?;
        samples.push(WeatherSample {
            timestamp,
            outdoor_temp: parse_optional_number(
                &record,
                row,
                columns.outdoor_temp,
                COLUMN_OUTDOOR_TEMP,
            )?,
            relative_humidity: parse_optional_number(
                &record,
                row,
                columns.relative_humidity,
                COLUMN_RELATIVE_HUMIDITY,
            )?,
            source_elevation: parse_optional_number(
                &record,
                row,
                columns.source_elevation,
                COLUMN_SOURCE_ELEVATION,
            )?,
        });
    }

    Ok(WeatherSeries::new(samples))
}
