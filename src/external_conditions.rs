use crate::core::units::{FEET_PER_THOUSAND_FEET, HOURS_PER_DAY};
use crate::input::ElevationConfig;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// Temperature (deg F) assumed for any sample with a missing or non-finite temperature
pub const FALLBACK_OUTDOOR_TEMP_F: f64 = 50.;
/// Relative humidity (%) assumed for any sample with a missing or non-finite humidity
pub const FALLBACK_HUMIDITY_PCT: f64 = 60.;

/// One observation or forecast of outdoor conditions, in the home's local time
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(rename_all = "camelCase")]
pub struct WeatherSample {
    pub timestamp: NaiveDateTime,
    /// in deg F
    #[serde(default)]
    pub outdoor_temp: Option<f64>,
    /// in %, 0 to 100
    #[serde(default)]
    pub relative_humidity: Option<f64>,
    /// Elevation (ft) of the grid point as reported by the forecast source
    #[serde(default)]
    pub source_elevation: Option<f64>,
}

impl WeatherSample {
    pub fn new(timestamp: NaiveDateTime, outdoor_temp: f64, relative_humidity: f64) -> Self {
        Self {
            timestamp,
            outdoor_temp: Some(outdoor_temp),
            relative_humidity: Some(relative_humidity),
            source_elevation: None,
        }
    }

    /// Outdoor temperature, with missing or non-finite values replaced by 50F
    pub fn outdoor_temp_or_fallback(&self) -> f64 {
        self.outdoor_temp
            .filter(|t| t.is_finite())
            .unwrap_or(FALLBACK_OUTDOOR_TEMP_F)
    }

    /// Relative humidity clamped to 0-100%, with missing or non-finite values replaced by 60%
    pub fn humidity_or_fallback(&self) -> f64 {
        self.relative_humidity
            .filter(|rh| rh.is_finite())
            .unwrap_or(FALLBACK_HUMIDITY_PCT)
            .clamp(0., 100.)
    }

    pub fn has_valid_temp(&self) -> bool {
        self.outdoor_temp.is_some_and(f64::is_finite)
    }
}

/// A chronological series of weather samples, typically 7 days of hourly values
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(transparent)]
pub struct WeatherSeries {
    samples: Vec<WeatherSample>,
}

impl WeatherSeries {
    pub fn new(samples: Vec<WeatherSample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[WeatherSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeatherSample> {
        self.samples.iter()
    }

    /// Build an hourly series from daily high/low figures (see `DailyWeather::hourly_temp`).
    /// Days without data are filled with a mild placeholder day.
    pub fn from_daily(start_date: NaiveDate, days: &[Option<DailyWeather>]) -> Self {
        let samples = days
            .iter()
            .enumerate()
            .flat_map(|(day_idx, day)| {
                let day = day.unwrap_or_default();
                let date = start_date + TimeDelta::days(day_idx as i64);
                (0..HOURS_PER_DAY).map(move |hour| {
                    let timestamp = date.and_time(NaiveTime::MIN) + TimeDelta::hours(hour as i64);
                    WeatherSample::new(timestamp, day.hourly_temp(hour), day.humidity)
                })
            })
            .collect();

        Self { samples }
    }
}

impl FromIterator<WeatherSample> for WeatherSeries {
    fn from_iter<T: IntoIterator<Item = WeatherSample>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Daily summary weather, as provided by daily forecasts and historical archives
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct DailyWeather {
    pub high: f64,
    pub low: f64,
    pub humidity: f64,
}

impl Default for DailyWeather {
    fn default() -> Self {
        Self {
            high: 50.,
            low: 40.,
            humidity: FALLBACK_HUMIDITY_PCT,
        }
    }
}

const HOUR_OF_DAILY_LOW: f64 = 6.;
const HOUR_OF_DAILY_HIGH: f64 = 14.;

impl DailyWeather {
    pub fn new(high: f64, low: f64) -> Self {
        Self {
            high,
            low,
            ..Default::default()
        }
    }

    /// Temperature at the given hour of the day. Rises along a half cosine from the low at
    /// 6am to the high at 2pm, then falls along a longer half cosine to the next 6am.
    pub fn hourly_temp(&self, hour: u32) -> f64 {
        let hour = hour as f64;
        let swing = self.high - self.low;
        if (HOUR_OF_DAILY_LOW..HOUR_OF_DAILY_HIGH).contains(&hour) {
            let progress = (hour - HOUR_OF_DAILY_LOW) / (HOUR_OF_DAILY_HIGH - HOUR_OF_DAILY_LOW);
            self.low + swing * (1. - (PI * progress).cos()) / 2.
        } else {
            let falling_hours = HOURS_PER_DAY as f64 - (HOUR_OF_DAILY_HIGH - HOUR_OF_DAILY_LOW);
            let progress =
                (hour - HOUR_OF_DAILY_HIGH).rem_euclid(HOURS_PER_DAY as f64) / falling_hours;
            self.high - swing * (1. - (PI * progress).cos()) / 2.
        }
    }
}

/// Correct the outdoor temperatures of a forecast for the difference in elevation between
/// the forecast grid point and the home, using a standard lapse rate.
///
/// Arguments:
/// * `series` - the forecast to correct
/// * `home_elevation_ft` - elevation of the home, in ft
/// * `station_elevation_ft` - elevation of the forecast grid point, in ft, typically from
///                            geocoding. An elevation reported on a sample by the forecast
///                            source is preferred over this.
pub fn adjust_forecast_for_elevation(
    series: &WeatherSeries,
    home_elevation_ft: f64,
    station_elevation_ft: Option<f64>,
) -> WeatherSeries {
    adjust_forecast_for_elevation_with(
        series,
        home_elevation_ft,
        station_elevation_ft,
        &ElevationConfig::default(),
    )
}

pub fn adjust_forecast_for_elevation_with(
    series: &WeatherSeries,
    home_elevation_ft: f64,
    station_elevation_ft: Option<f64>,
    config: &ElevationConfig,
) -> WeatherSeries {
    if !home_elevation_ft.is_finite() || !config.lapse_rate_f_per_1000_ft.is_finite() {
        return series.clone();
    }
    let geocoded_elevation = station_elevation_ft.filter(|e| e.is_finite());

    let mut adjusted_count = 0;
    let samples = series
        .iter()
        .map(|sample| {
            let station_elevation = sample
                .source_elevation
                .filter(|e| e.is_finite())
                .or(geocoded_elevation);
            match (station_elevation, sample.outdoor_temp) {
                (Some(station_elevation), Some(temp)) => {
                    let difference = home_elevation_ft - station_elevation;
                    if difference.abs() < config.min_difference_ft {
                        return sample.clone();
                    }
                    adjusted_count += 1;
                    WeatherSample {
                        outdoor_temp: Some(
                            temp - config.lapse_rate_f_per_1000_ft * difference
                                / FEET_PER_THOUSAND_FEET,
                        ),
                        ..sample.clone()
                    }
                }
                _ => sample.clone(),
            }
        })
        .collect::<Vec<_>>();

    debug!(
        adjusted_count,
        total = samples.len(),
        "Applied elevation correction to forecast"
    );

    WeatherSeries::new(samples)
}
