use crate::external_conditions::{WeatherSample, WeatherSeries};
use chrono::{NaiveDate, NaiveDateTime};
use itertools::Itertools;

pub const DEFAULT_TIMESTEP_HOURS: f64 = 1.0;
const MAX_TIMESTEP_HOURS: f64 = 24.0;
const SECONDS_PER_HOUR: f64 = 3_600.;

/// A single step through a weather series, with the length of time (in hours) the sample
/// stands for.
#[derive(Clone, Copy, Debug)]
pub struct SimulationTimeIteration<'a> {
    pub sample: &'a WeatherSample,
    pub timestep: f64,
}

impl SimulationTimeIteration<'_> {
    pub fn timestamp(&self) -> NaiveDateTime {
        self.sample.timestamp
    }

    /// Calendar date the sample belongs to, in the series' local time
    pub fn date(&self) -> NaiveDate {
        self.sample.timestamp.date()
    }
}

/// Sanitise a timestep length, falling back to an hour for anything that is not a sensible
/// positive duration of at most a day.
pub fn sanitise_timestep(hours: f64) -> f64 {
    if hours.is_finite() && hours > 0. && hours <= MAX_TIMESTEP_HOURS {
        hours
    } else {
        DEFAULT_TIMESTEP_HOURS
    }
}

/// The timestep of each sample, taken as the gap to the following sample. The last sample
/// repeats the previous gap; a single sample is taken to stand for an hour.
pub fn timesteps(series: &WeatherSeries) -> Vec<f64> {
    let gaps = series
        .iter()
        .tuple_windows()
        .map(|(current, next)| {
            sanitise_timestep(
                (next.timestamp - current.timestamp).num_seconds() as f64 / SECONDS_PER_HOUR,
            )
        })
        .collect::<Vec<_>>();

    (0..series.len())
        .map(|idx| {
            gaps.get(idx)
                .or(gaps.last())
                .copied()
                .unwrap_or(DEFAULT_TIMESTEP_HOURS)
        })
        .collect()
}

pub fn iter(series: &WeatherSeries) -> impl Iterator<Item = SimulationTimeIteration<'_>> {
    series
        .iter()
        .zip(timesteps(series))
        .map(|(sample, timestep)| SimulationTimeIteration { sample, timestep })
}
