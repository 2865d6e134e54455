use crate::compare_floats::{min_of_2, positive_or};
use crate::core::heating_systems::common::{
    required_heat_btu_per_hour, HourlyConditions, HourlyResult,
};
use crate::core::units::{btu_to_therms, kbtu_to_btu};
use crate::input::{EquipmentProfile, DEFAULT_AFUE, DEFAULT_RATED_CAPACITY_KBTU};

/// AFUE values above this are taken to be given as a percentage
const AFUE_PERCENT_THRESHOLD: f64 = 1.;
const PERCENT: f64 = 100.;

/// Furnace output does not derate with outdoor temperature
pub fn furnace_capacity_btu_per_hour(equipment: &EquipmentProfile) -> f64 {
    kbtu_to_btu(positive_or(
        equipment.rated_capacity,
        DEFAULT_RATED_CAPACITY_KBTU,
    ))
}

/// Annual fuel utilisation efficiency as a fraction in (0, 1]
pub fn afue_fraction(equipment: &EquipmentProfile) -> f64 {
    let afue = positive_or(equipment.afue, DEFAULT_AFUE);
    if afue <= AFUE_PERCENT_THRESHOLD {
        afue
    } else if afue <= PERCENT {
        afue / PERCENT
    } else {
        DEFAULT_AFUE
    }
}

pub(crate) fn compute_hourly_furnace_performance(
    equipment: &EquipmentProfile,
    heat_loss_factor: f64,
    conditions: HourlyConditions,
) -> HourlyResult {
    let conditions = conditions.sanitised();
    let timestep = conditions.timestep_hours;

    let required = required_heat_btu_per_hour(
        heat_loss_factor,
        conditions.indoor_temp,
        conditions.outdoor_temp,
    );
    let delivered = min_of_2(required, furnace_capacity_btu_per_hour(equipment));

    HourlyResult {
        heat_output_btu: delivered * timestep,
        gas_therms: btu_to_therms(delivered * timestep) / afue_fraction(equipment),
        unmet_btu: (required - delivered) * timestep,
        timestep_hours: timestep,
        ..Default::default()
    }
}
