use crate::compare_floats::{clamp_finite, max_of_2, min_of_2, positive_or};
use crate::core::heating_systems::common::{sanitise_factor, HourlyConditions, HourlyResult};
use crate::core::units::{kbtu_to_btu, WATT_HOURS_PER_KILOWATT_HOUR};
use crate::input::{EquipmentProfile, DEFAULT_RATED_CAPACITY_KBTU, DEFAULT_SEER2};

/// This module provides functions to represent air conditioning, i.e. the cooling side of
/// a heat pump or a central AC unit.

/// Outdoor temperature (deg F) above which capacity and efficiency derate
const DERATE_START_TEMP_F: f64 = 95.;
const CAPACITY_DERATE_PER_F: f64 = 0.01;
const MIN_CAPACITY_FACTOR: f64 = 0.6;
const SEER_DERATE_PER_F: f64 = 0.015;
const MIN_SEER_FACTOR: f64 = 0.5;

/// Solar gains can at most raise the cooling load to this multiple of the heat loss factor
const SOLAR_MULTIPLIER_RANGE: (f64, f64) = (1., 2.5);

fn degrees_above_derate_start(outdoor_temp: f64) -> f64 {
    max_of_2(outdoor_temp - DERATE_START_TEMP_F, 0.)
}

/// Heat (BTU/hr) the air conditioner can remove at the given outdoor temperature
pub fn cooling_capacity_btu_per_hour(equipment: &EquipmentProfile, outdoor_temp: f64) -> f64 {
    let factor = max_of_2(
        1. - degrees_above_derate_start(outdoor_temp) * CAPACITY_DERATE_PER_F,
        MIN_CAPACITY_FACTOR,
    );
    kbtu_to_btu(positive_or(
        equipment.rated_capacity,
        DEFAULT_RATED_CAPACITY_KBTU,
    )) * factor
}

/// SEER2 after derating for very hot outdoor air
pub fn effective_seer(equipment: &EquipmentProfile, outdoor_temp: f64) -> f64 {
    let factor = max_of_2(
        1. - degrees_above_derate_start(outdoor_temp) * SEER_DERATE_PER_F,
        MIN_SEER_FACTOR,
    );
    positive_or(equipment.cooling_efficiency, DEFAULT_SEER2) * factor
}

/// Heat removed and electricity used by the air conditioner over one timestep
///
/// Arguments:
/// * `equipment` - the cooling equipment
/// * `heat_loss_factor` - in BTU/hr/F
/// * `solar_exposure` - multiplier on the heat loss factor for solar gains
/// * `conditions` - indoor setpoint and outdoor weather
pub fn compute_hourly_cooling_performance(
    equipment: &EquipmentProfile,
    heat_loss_factor: f64,
    solar_exposure: f64,
    conditions: HourlyConditions,
) -> HourlyResult {
    let conditions = conditions.sanitised();
    let timestep = conditions.timestep_hours;

    let solar_multiplier = clamp_finite(
        solar_exposure,
        SOLAR_MULTIPLIER_RANGE.0,
        SOLAR_MULTIPLIER_RANGE.1,
        SOLAR_MULTIPLIER_RANGE.0,
    );
    let heat_gain_factor = sanitise_factor(heat_loss_factor) * solar_multiplier;
    let required =
        heat_gain_factor * max_of_2(conditions.outdoor_temp - conditions.indoor_temp, 0.);

    let capacity = cooling_capacity_btu_per_hour(equipment, conditions.outdoor_temp);
    let delivered = min_of_2(required, capacity);
    let seer = effective_seer(equipment, conditions.outdoor_temp);

    HourlyResult {
        heat_output_btu: delivered * timestep,
        electrical_energy_kwh: delivered * timestep / (seer * WATT_HOURS_PER_KILOWATT_HOUR),
        unmet_btu: (required - delivered) * timestep,
        timestep_hours: timestep,
        ..Default::default()
    }
}
