use crate::compare_floats::finite_or;
use crate::core::heating_systems::common::{
    heating_capacity_btu_per_hour, required_heat_btu_per_hour,
};
use crate::core::solvers::bisect;
use crate::input::{EquipmentProfile, PerformanceConfig, DEFAULT_DAY_SETPOINT_F};
use serde::Serialize;
use tracing::warn;

/// Range of outdoor temperatures (deg F) searched for the balance point
pub const BALANCE_POINT_SEARCH_RANGE: (f64, f64) = (-20., 60.);
const TEMPERATURE_TOLERANCE_F: f64 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancePoint {
    /// Outdoor temperature (deg F) at which the primary system's capacity equals the
    /// building's heat loss
    pub balance_point_temp_f: f64,
}

/// Find the outdoor temperature below which the primary heating system can no longer keep
/// up with the building's heat loss.
///
/// The result is clamped to the search range: a system that keeps up everywhere in the
/// range reports the bottom of it, and one that falls short everywhere reports the top.
///
/// Arguments:
/// * `equipment` - the primary heating system
/// * `heat_loss_factor` - in BTU/hr/F
/// * `indoor_temp` - setpoint to hold, in deg F
/// * `config` - performance model tuning
pub fn calculate_balance_point(
    equipment: &EquipmentProfile,
    heat_loss_factor: f64,
    indoor_temp: f64,
    config: &PerformanceConfig,
) -> BalancePoint {
    let indoor_temp = finite_or(indoor_temp, DEFAULT_DAY_SETPOINT_F);
    let surplus = |outdoor_temp: f64| {
        heating_capacity_btu_per_hour(equipment, outdoor_temp, config)
            - required_heat_btu_per_hour(heat_loss_factor, indoor_temp, outdoor_temp)
    };

    let (low, high) = BALANCE_POINT_SEARCH_RANGE;
    let balance_point_temp_f = if surplus(low) >= 0. {
        low
    } else if surplus(high) < 0. {
        high
    } else {
        bisect(surplus, low, high, TEMPERATURE_TOLERANCE_F).unwrap_or_else(|err| {
            warn!(%err, "Balance point search did not converge, assuming the top of the range");
            high
        })
    };

    BalancePoint {
        balance_point_temp_f,
    }
}
