#![allow(clippy::too_many_arguments)]

pub mod cache;
mod compare_floats;
pub mod core;
pub mod corpus;
pub mod errors;
pub mod external_conditions;
pub mod input;
pub mod output;
pub mod read_weather_file;
mod simulation_time;
mod statistics;

extern crate lazy_static;

pub use crate::corpus::ForecastResults;
use crate::corpus::{Corpus, DailySummary, HourlyRecord};
use crate::errors::{ForecastError, OutputError};
use crate::external_conditions::WeatherSeries;
use crate::input::ingest;
use crate::output::Output;
use csv::WriterBuilder;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use std::io::{Read, Write};
use tracing::{debug, info};

const MAIN_ZONE_NAME: &str = "main";

pub const DAILY_OUTPUT_KEY: &str = "daily.csv";
pub const HOURLY_OUTPUT_KEY: &str = "hourly.csv";
pub const SUMMARY_OUTPUT_KEY: &str = "summary.json";

/// Run a forecast from a JSON input document, writing the daily, hourly and summary outputs.
///
/// Arguments:
/// * `input` - the `ForecastInput` JSON document
/// * `output` - where to write results
/// * `weather` - a forecast read separately (e.g. from a CSV file), which replaces any
///               weather in the input document
///
/// Returns None, writing nothing, when there is no weather or building to forecast for.
pub fn run_forecast(
    input: impl Read,
    output: impl Output,
    weather: Option<WeatherSeries>,
) -> Result<Option<ForecastResults>, ForecastError> {
    let mut input = ingest(input)?;
    if let Some(weather) = weather {
        input.weather = Some(weather);
    }

    let Some(corpus) = Corpus::from_inputs(&input) else {
        info!("No weather or building profile given, so no forecast was produced");
        return Ok(None);
    };
    let results = corpus.run();

    if !output.is_noop() {
        write_daily_output_file(&output, &results).map_err(OutputError::new)?;
        write_hourly_output_file(&output, &results).map_err(OutputError::new)?;
        write_summary_output_file(&output, &results).map_err(OutputError::new)?;
    }

    Ok(Some(results))
}

lazy_static! {
    pub static ref UNITS_MAP: IndexMap<&'static str, &'static str> = IndexMap::from([
        ("Date", "[date]"),
        ("Timestamp", "[datetime]"),
        ("Zone", "[name]"),
        ("Min outdoor temp", "[deg F]"),
        ("Max outdoor temp", "[deg F]"),
        ("Avg outdoor temp", "[deg F]"),
        ("Outdoor temp", "[deg F]"),
        ("Relative humidity", "[%]"),
        ("Setpoint", "[deg F]"),
        ("Electric rate", "[$/kWh]"),
        ("Heat output", "[BTU]"),
        ("Electrical energy", "[kWh]"),
        ("Aux energy", "[kWh]"),
        ("Gas", "[therms]"),
        ("Defrost penalty", "[fraction]"),
        ("Unmet demand", "[BTU]"),
        ("Cost", "[$]"),
        ("Hours", "[hours]"),
    ]);
}

const DAILY_HEADINGS: [&str; 13] = [
    "Date",
    "Zone",
    "Min outdoor temp",
    "Max outdoor temp",
    "Avg outdoor temp",
    "Heat output",
    "Electrical energy",
    "Aux energy",
    "Gas",
    "Defrost penalty",
    "Unmet demand",
    "Cost",
    "Hours",
];

const HOURLY_HEADINGS: [&str; 13] = [
    "Timestamp",
    "Zone",
    "Outdoor temp",
    "Relative humidity",
    "Setpoint",
    "Electric rate",
    "Heat output",
    "Electrical energy",
    "Aux energy",
    "Gas",
    "Defrost penalty",
    "Unmet demand",
    "Cost",
];

fn units_row(headings: &[&str]) -> Vec<&'static str> {
    headings
        .iter()
        .map(|heading| UNITS_MAP.get(heading).copied().unwrap_or("Unit not defined"))
        .collect()
}

/// Each zone's name with its metrics, the main zone first
fn zones_of(results: &ForecastResults) -> impl Iterator<Item = (&str, &corpus::WeeklyMetrics)> {
    std::iter::once((MAIN_ZONE_NAME, &results.metrics)).chain(
        results
            .zones
            .iter()
            .map(|zone| (zone.name.as_str(), &zone.metrics)),
    )
}

fn daily_row(zone: &str, day: &DailySummary) -> Vec<String> {
    let totals = &day.totals;
    vec![
        day.date.to_string(),
        zone.to_string(),
        day.min_outdoor_temp.to_string(),
        day.max_outdoor_temp.to_string(),
        day.avg_outdoor_temp.to_string(),
        totals.heat_output_btu.to_string(),
        totals.electrical_energy_kwh.to_string(),
        totals.aux_energy_kwh.to_string(),
        totals.gas_therms.to_string(),
        totals.defrost_penalty_fraction.to_string(),
        totals.unmet_btu.to_string(),
        totals.cost_dollars.to_string(),
        totals.timestep_hours.to_string(),
    ]
}

fn hourly_row(zone: &str, record: &HourlyRecord) -> Vec<String> {
    let result = &record.result;
    vec![
        record.timestamp.to_string(),
        zone.to_string(),
        record.outdoor_temp.to_string(),
        record.humidity.to_string(),
        record.setpoint.to_string(),
        record.electric_rate.to_string(),
        result.heat_output_btu.to_string(),
        result.electrical_energy_kwh.to_string(),
        result.aux_energy_kwh.to_string(),
        result.gas_therms.to_string(),
        result.defrost_penalty_fraction.to_string(),
        result.unmet_btu.to_string(),
        result.cost_dollars.to_string(),
    ]
}

fn write_daily_output_file(output: &impl Output, results: &ForecastResults) -> anyhow::Result<()> {
    debug!("writing out daily results");
    let writer = output.writer_for_location_key(DAILY_OUTPUT_KEY)?;
    let mut writer = WriterBuilder::new().from_writer(writer);

    writer.write_record(DAILY_HEADINGS)?;
    writer.write_record(units_row(&DAILY_HEADINGS))?;
    for (zone, metrics) in zones_of(results) {
        for day in &metrics.daily_summaries {
            writer.write_record(daily_row(zone, day))?;
        }
    }

    writer.flush()?;
    Ok(())
}

fn write_hourly_output_file(output: &impl Output, results: &ForecastResults) -> anyhow::Result<()> {
    debug!("writing out hourly results");
    let writer = output.writer_for_location_key(HOURLY_OUTPUT_KEY)?;
    let mut writer = WriterBuilder::new().from_writer(writer);

    writer.write_record(HOURLY_HEADINGS)?;
    writer.write_record(units_row(&HOURLY_HEADINGS))?;
    for (zone, metrics) in zones_of(results) {
        for record in &metrics.hourly {
            writer.write_record(hourly_row(zone, record))?;
        }
    }

    writer.flush()?;
    Ok(())
}

fn write_summary_output_file(
    output: &impl Output,
    results: &ForecastResults,
) -> anyhow::Result<()> {
    debug!("writing out forecast summary");
    let mut writer = output.writer_for_location_key(SUMMARY_OUTPUT_KEY)?;
    serde_json::to_writer_pretty(&mut writer, results)?;
    writer.flush()?;
    Ok(())
}
