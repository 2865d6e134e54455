use crate::compare_floats::{clamp_finite, finite_or, max_of_2};
use crate::core::heating_systems::{furnace, heat_pump};
use crate::external_conditions::{FALLBACK_HUMIDITY_PCT, FALLBACK_OUTDOOR_TEMP_F};
use crate::input::{EquipmentProfile, PerformanceConfig, DEFAULT_DAY_SETPOINT_F};
use crate::simulation_time::{sanitise_timestep, DEFAULT_TIMESTEP_HOURS};
use serde::Serialize;
use std::ops::AddAssign;

/// Conditions for a single timestep of a performance calculation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HourlyConditions {
    /// in deg F
    pub indoor_temp: f64,
    /// in deg F
    pub outdoor_temp: f64,
    /// relative humidity, in %
    pub humidity: f64,
    /// in hours
    pub timestep_hours: f64,
}

impl HourlyConditions {
    pub fn new(indoor_temp: f64, outdoor_temp: f64, humidity: f64) -> Self {
        Self {
            indoor_temp,
            outdoor_temp,
            humidity,
            timestep_hours: DEFAULT_TIMESTEP_HOURS,
        }
    }

    pub fn with_timestep(self, timestep_hours: f64) -> Self {
        Self {
            timestep_hours,
            ..self
        }
    }

    /// Replace anything non-finite or out of range with the documented defaults
    pub(crate) fn sanitised(&self) -> Self {
        Self {
            indoor_temp: finite_or(self.indoor_temp, DEFAULT_DAY_SETPOINT_F),
            outdoor_temp: finite_or(self.outdoor_temp, FALLBACK_OUTDOOR_TEMP_F),
            humidity: clamp_finite(self.humidity, 0., 100., FALLBACK_HUMIDITY_PCT),
            timestep_hours: sanitise_timestep(self.timestep_hours),
        }
    }
}

/// Energy and cost for one timestep
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyResult {
    /// Heat delivered to (or, when cooling, removed from) the home, in BTU
    pub heat_output_btu: f64,
    /// Electricity used by the primary equipment, in kWh
    pub electrical_energy_kwh: f64,
    /// Electricity used by auxiliary resistance heat, in kWh
    pub aux_energy_kwh: f64,
    /// Gas burned by a furnace, in therms
    pub gas_therms: f64,
    /// Fraction (0 to 1) by which defrost cycles increased the primary electricity use
    pub defrost_penalty_fraction: f64,
    /// Demand the system could not serve, in BTU
    pub unmet_btu: f64,
    /// in $
    pub cost_dollars: f64,
    /// in hours
    pub timestep_hours: f64,
}

impl HourlyResult {
    /// Total electricity drawn from the grid, in kWh
    pub fn total_electric_kwh(&self) -> f64 {
        self.electrical_energy_kwh + self.aux_energy_kwh
    }

    /// Price the energy use of the timestep
    ///
    /// Arguments:
    /// * `electric_rate` - in $/kWh
    /// * `gas_rate` - in $/therm
    pub fn priced(self, electric_rate: f64, gas_rate: f64) -> Self {
        Self {
            cost_dollars: self.total_electric_kwh() * electric_rate + self.gas_therms * gas_rate,
            ..self
        }
    }
}

/// Accumulates energy, cost and time; the defrost fraction keeps the peak value seen
impl AddAssign<&HourlyResult> for HourlyResult {
    fn add_assign(&mut self, rhs: &HourlyResult) {
        self.heat_output_btu += rhs.heat_output_btu;
        self.electrical_energy_kwh += rhs.electrical_energy_kwh;
        self.aux_energy_kwh += rhs.aux_energy_kwh;
        self.gas_therms += rhs.gas_therms;
        self.defrost_penalty_fraction =
            max_of_2(self.defrost_penalty_fraction, rhs.defrost_penalty_fraction);
        self.unmet_btu += rhs.unmet_btu;
        self.cost_dollars += rhs.cost_dollars;
        self.timestep_hours += rhs.timestep_hours;
    }
}

/// Heat output and energy use of the primary heating system for one timestep, given the
/// building's heat loss factor (BTU/hr/F). The returned result is not yet priced.
pub fn compute_hourly_performance(
    equipment: &EquipmentProfile,
    heat_loss_factor: f64,
    conditions: HourlyConditions,
    config: &PerformanceConfig,
) -> HourlyResult {
    if equipment.primary_system.heats_with_gas() {
        furnace::compute_hourly_furnace_performance(equipment, heat_loss_factor, conditions)
    } else {
        heat_pump::compute_hourly_heat_pump_performance(
            equipment,
            heat_loss_factor,
            conditions,
            config,
        )
    }
}

/// Heat output (BTU/hr) the primary heating system can deliver at the given outdoor temperature
pub fn heating_capacity_btu_per_hour(
    equipment: &EquipmentProfile,
    outdoor_temp: f64,
    config: &PerformanceConfig,
) -> f64 {
    if equipment.primary_system.heats_with_gas() {
        furnace::furnace_capacity_btu_per_hour(equipment)
    } else {
        heat_pump::heat_pump_capacity_btu_per_hour(equipment, outdoor_temp, config)
    }
}

/// Required heat output (BTU/hr) to hold the indoor temperature
pub(crate) fn required_heat_btu_per_hour(heat_loss_factor: f64, indoor: f64, outdoor: f64) -> f64 {
    sanitise_factor(heat_loss_factor) * max_of_2(indoor - outdoor, 0.)
}

pub(crate) fn sanitise_factor(heat_loss_factor: f64) -> f64 {
    max_of_2(finite_or(heat_loss_factor, 0.), 0.)
}
