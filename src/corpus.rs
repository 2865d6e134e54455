use crate::compare_floats::clamp_finite;
use crate::core::controls::time_control::{get_setpoint_for_hour, SchedulePeriod};
use crate::core::cooling_systems::air_conditioning::compute_hourly_cooling_performance;
use crate::core::energy_supply::tariff_data::get_rate_for_hour;
use crate::core::heating_systems::balance_point::{calculate_balance_point, BalancePoint};
use crate::core::heating_systems::common::{
    compute_hourly_performance, HourlyConditions, HourlyResult,
};
use crate::core::space_heat_demand::heat_loss::{resolve, ResolvedHeatLoss};
use crate::core::units::HOURS_PER_DAY;
use crate::external_conditions::{adjust_forecast_for_elevation_with, WeatherSeries};
use crate::input::{
    BillingInput, BuildingProfile, EquipmentProfile, ForecastInput, HvacMode, ModelConfig,
    PerformanceConfig, RateSchedule, ThermostatSchedule, ZoneInput,
};
use crate::simulation_time;
use crate::statistics::temperature_stats;
use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

const DAYS_PER_BILLING_MONTH: f64 = 30.;
/// Plausible range (kWh/day) for non-HVAC household electricity use
const BASELOAD_KWH_PER_DAY_RANGE: (f64, f64) = (5., 25.);
const DEFAULT_BASELOAD_KWH_PER_DAY: f64 = 10.;

/// The thermal load a building places on its equipment
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildingLoad {
    /// in BTU/hr/F
    pub heat_loss_factor: f64,
    /// Multiplier on the heat loss factor for solar gains when cooling
    pub solar_exposure: f64,
}

impl From<f64> for BuildingLoad {
    fn from(heat_loss_factor: f64) -> Self {
        Self {
            heat_loss_factor,
            solar_exposure: 1.,
        }
    }
}

/// The outcome of a single forecast timestep, with the conditions it was calculated for
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyRecord {
    pub timestamp: NaiveDateTime,
    /// in deg F, after substitution of missing values
    pub outdoor_temp: f64,
    /// in %, after substitution of missing values
    pub humidity: f64,
    /// in deg F
    pub setpoint: f64,
    /// in $/kWh
    pub electric_rate: f64,
    #[serde(flatten)]
    pub result: HourlyResult,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: NaiveDate,
    /// in deg F
    pub min_outdoor_temp: f64,
    /// in deg F
    pub max_outdoor_temp: f64,
    /// in deg F
    pub avg_outdoor_temp: f64,
    #[serde(flatten)]
    pub totals: HourlyResult,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyMetrics {
    /// One entry per calendar date in the series, in date order
    pub daily_summaries: Vec<DailySummary>,
    pub totals: HourlyResult,
    /// Auxiliary share of all electricity used, in %
    pub aux_percentage: f64,
    /// Samples whose outdoor temperature was missing or unusable
    pub substituted_samples: usize,
    #[serde(skip)]
    pub hourly: Vec<HourlyRecord>,
}

impl WeeklyMetrics {
    pub fn total_cost(&self) -> f64 {
        self.totals.cost_dollars
    }

    /// Length of time the forecast covers, in days
    pub fn days_covered(&self) -> f64 {
        self.totals.timestep_hours / HOURS_PER_DAY as f64
    }
}

fn aux_percentage(totals: &HourlyResult) -> f64 {
    let total_electric = totals.total_electric_kwh();
    if total_electric > 0. {
        100. * totals.aux_energy_kwh / total_electric
    } else {
        0.
    }
}

#[derive(Default)]
struct DayBucket {
    outdoor_temps: Vec<f64>,
    totals: HourlyResult,
}

/// Run the performance model over every sample of a forecast and roll the results up into
/// calendar days and a weekly total.
///
/// Missing or non-finite outdoor temperatures are taken as 50F and missing humidity as 60%,
/// so a bad sample only ever affects its own contribution.
///
/// Arguments:
/// * `series` - the forecast, already corrected for elevation
/// * `equipment` - primary heating/cooling equipment
/// * `load` - the building's heat loss factor and solar exposure
/// * `schedule` - thermostat schedule, whose mode selects heating or cooling
/// * `rate_schedule` - electricity and gas prices
/// * `use_electric_aux_heat` - whether heat pump shortfall is met with resistance heat
/// * `config` - performance model tuning
pub fn compute_weekly_metrics(
    series: &WeatherSeries,
    equipment: &EquipmentProfile,
    load: BuildingLoad,
    schedule: &ThermostatSchedule,
    rate_schedule: &RateSchedule,
    use_electric_aux_heat: bool,
    config: &PerformanceConfig,
) -> WeeklyMetrics {
    let equipment = EquipmentProfile {
        use_electric_aux_heat,
        ..equipment.clone()
    };
    let gas_rate = rate_schedule.effective_gas_rate();

    let mut days: IndexMap<NaiveDate, DayBucket> = Default::default();
    let mut hourly = Vec::with_capacity(series.len());
    let mut substituted_samples = 0;

    for t_it in simulation_time::iter(series) {
        if !t_it.sample.has_valid_temp() {
            substituted_samples += 1;
        }
        let outdoor_temp = t_it.sample.outdoor_temp_or_fallback();
        let humidity = t_it.sample.humidity_or_fallback();
        let setpoint = get_setpoint_for_hour(schedule, t_it.timestamp());
        let electric_rate = get_rate_for_hour(rate_schedule, t_it.timestamp());

        let conditions =
            HourlyConditions::new(setpoint, outdoor_temp, humidity).with_timestep(t_it.timestep);
        let result = match schedule.mode {
            HvacMode::Heating => compute_hourly_performance(
                &equipment,
                load.heat_loss_factor,
                conditions,
                config,
            ),
            HvacMode::Cooling => compute_hourly_cooling_performance(
                &equipment,
                load.heat_loss_factor,
                load.solar_exposure,
                conditions,
            ),
        }
        .priced(electric_rate, gas_rate);

        let bucket = days.entry(t_it.date()).or_default();
        bucket.outdoor_temps.push(outdoor_temp);
        bucket.totals += &result;

        hourly.push(HourlyRecord {
            timestamp: t_it.timestamp(),
            outdoor_temp,
            humidity,
            setpoint,
            electric_rate,
            result,
        });
    }

    if substituted_samples > 0 {
        warn!(
            substituted_samples,
            total = series.len(),
            "Forecast samples with missing outdoor temperature were taken as 50F"
        );
    }

    days.sort_keys();
    let daily_summaries = days
        .into_iter()
        .filter_map(|(date, bucket)| {
            temperature_stats(&bucket.outdoor_temps).map(|stats| DailySummary {
                date,
                min_outdoor_temp: stats.min,
                max_outdoor_temp: stats.max,
                avg_outdoor_temp: stats.mean,
                totals: bucket.totals,
            })
        })
        .collect::<Vec<_>>();

    let mut totals = HourlyResult::default();
    for summary in &daily_summaries {
        totals += &summary.totals;
    }

    WeeklyMetrics {
        aux_percentage: aux_percentage(&totals),
        daily_summaries,
        totals,
        substituted_samples,
        hourly,
    }
}

/// Projected monthly electricity bill, in $
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillProjection {
    pub monthly_hvac_cost: f64,
    pub monthly_baseload_cost: f64,
    pub fixed_monthly_cost: f64,
    pub monthly_total: f64,
}

/// Scale the HVAC cost of a forecast to a month, and add household baseload and fixed
/// charges.
///
/// Arguments:
/// * `hvac_cost` - HVAC cost over the whole forecast, in $
/// * `days_covered` - length of time the forecast covers, in days (not necessarily whole)
/// * `billing` - baseload and fixed charges
/// * `rate_schedule` - prices baseload at the flat rate
pub fn project_monthly_bill(
    hvac_cost: f64,
    days_covered: f64,
    billing: &BillingInput,
    rate_schedule: &RateSchedule,
) -> BillProjection {
    let monthly_hvac_cost = if days_covered.is_finite() && days_covered > 0. {
        clamp_finite(hvac_cost, 0., f64::MAX, 0.) * DAYS_PER_BILLING_MONTH / days_covered
    } else {
        0.
    };
    let baseload_kwh_per_day = clamp_finite(
        billing.baseload_kwh_per_day,
        BASELOAD_KWH_PER_DAY_RANGE.0,
        BASELOAD_KWH_PER_DAY_RANGE.1,
        DEFAULT_BASELOAD_KWH_PER_DAY,
    );
    let monthly_baseload_cost =
        baseload_kwh_per_day * rate_schedule.effective_flat_rate() * DAYS_PER_BILLING_MONTH;
    let fixed_monthly_cost = clamp_finite(billing.fixed_monthly_cost, 0., f64::MAX, 0.);

    BillProjection {
        monthly_hvac_cost,
        monthly_baseload_cost,
        fixed_monthly_cost,
        monthly_total: monthly_hvac_cost + monthly_baseload_cost + fixed_monthly_cost,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneForecast {
    pub name: String,
    pub heat_loss: ResolvedHeatLoss,
    pub metrics: WeeklyMetrics,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResults {
    pub heat_loss: ResolvedHeatLoss,
    pub balance_point: BalancePoint,
    pub metrics: WeeklyMetrics,
    pub zones: Vec<ZoneForecast>,
    pub bill_projection: BillProjection,
}

impl ForecastResults {
    /// HVAC cost over the forecast for the main zone and every extra zone, in $
    pub fn total_hvac_cost(&self) -> f64 {
        self.metrics.total_cost()
            + self
                .zones
                .iter()
                .map(|zone| zone.metrics.total_cost())
                .sum::<f64>()
    }
}

/// A forecast ready to run: weather corrected for the home's elevation and the building's
/// heat loss resolved.
#[derive(Clone, Debug)]
pub struct Corpus {
    weather: WeatherSeries,
    building: BuildingProfile,
    equipment: EquipmentProfile,
    heat_loss: ResolvedHeatLoss,
    schedule: ThermostatSchedule,
    rates: RateSchedule,
    zones: Vec<ZoneInput>,
    billing: BillingInput,
    config: ModelConfig,
}

impl Corpus {
    /// Returns None when there is no weather to forecast over or no building to heat.
    pub fn from_inputs(input: &ForecastInput) -> Option<Self> {
        let building = input.building.clone()?;
        let weather = input.weather.as_ref().filter(|weather| !weather.is_empty())?;

        let weather = match building.elevation {
            Some(home_elevation) => adjust_forecast_for_elevation_with(
                weather,
                home_elevation,
                input.weather_station_elevation,
                &input.config.elevation,
            ),
            None => weather.clone(),
        };

        for (first, second) in input.rates.overlapping_blocks() {
            warn!(
                first,
                second, "Time-of-use blocks overlap, the earlier block takes precedence"
            );
        }

        let heat_loss = resolve(&input.heat_loss_sources, Some(&building));

        Some(Self {
            weather,
            building,
            equipment: input.equipment.clone(),
            heat_loss,
            schedule: input.schedule.clone(),
            rates: input.rates.clone(),
            zones: input.zones.clone(),
            billing: input.billing,
            config: input.config,
        })
    }

    pub fn heat_loss(&self) -> ResolvedHeatLoss {
        self.heat_loss
    }

    pub fn weather(&self) -> &WeatherSeries {
        &self.weather
    }

    fn weekly_metrics(
        &self,
        equipment: &EquipmentProfile,
        load: BuildingLoad,
        schedule: &ThermostatSchedule,
    ) -> WeeklyMetrics {
        compute_weekly_metrics(
            &self.weather,
            equipment,
            load,
            schedule,
            &self.rates,
            equipment.use_electric_aux_heat,
            &self.config.performance,
        )
    }

    fn run_zone(&self, zone: &ZoneInput) -> ZoneForecast {
        let heat_loss = resolve(&zone.heat_loss_sources, Some(&zone.building));
        let equipment = zone.equipment.as_ref().unwrap_or(&self.equipment);
        let schedule = zone.schedule.as_ref().unwrap_or(&self.schedule);
        let load = BuildingLoad {
            heat_loss_factor: heat_loss.factor,
            solar_exposure: zone.building.solar_exposure,
        };

        ZoneForecast {
            name: zone.name.clone(),
            heat_loss,
            metrics: self.weekly_metrics(equipment, load, schedule),
        }
    }

    pub fn run(&self) -> ForecastResults {
        let load = BuildingLoad {
            heat_loss_factor: self.heat_loss.factor,
            solar_exposure: self.building.solar_exposure,
        };
        let metrics = self.weekly_metrics(&self.equipment, load, &self.schedule);

        let zones = self
            .zones
            .par_iter()
            .map(|zone| self.run_zone(zone))
            .collect::<Vec<_>>();

        let balance_point = calculate_balance_point(
            &self.equipment,
            self.heat_loss.factor,
            self.schedule.setpoint_for_period(SchedulePeriod::Day),
            &self.config.performance,
        );

        let hvac_cost = metrics.total_cost()
            + zones
                .iter()
                .map(|zone| zone.metrics.total_cost())
                .sum::<f64>();
        let bill_projection = project_monthly_bill(
            hvac_cost,
            metrics.days_covered(),
            &self.billing,
            &self.rates,
        );

        info!(
            heat_loss_factor = self.heat_loss.factor,
            heat_loss_source = %self.heat_loss.source,
            days = metrics.daily_summaries.len(),
            zones = zones.len(),
            hvac_cost,
            balance_point = balance_point.balance_point_temp_f,
            "Forecast complete"
        );

        ForecastResults {
            heat_loss: self.heat_loss,
            balance_point,
            metrics,
            zones,
            bill_projection,
        }
    }
}
