use crate::compare_floats::{clamp_finite, finite_or, max_of_2, min_of_2, positive_or};
use crate::core::heating_systems::common::{
    required_heat_btu_per_hour, HourlyConditions, HourlyResult,
};
use crate::core::units::{btu_to_kwh, kbtu_to_btu, BTU_PER_KBTU, BTU_PER_KILOWATT_HOUR};
use crate::input::{
    CustomPerformanceCurve, DefrostConfig, EquipmentProfile, PerformanceConfig,
    DEFAULT_CUTOFF_TEMP_F, DEFAULT_HSPF2, DEFAULT_RATED_CAPACITY_KBTU,
};
use interp::{interp, InterpMode};
use lazy_static::lazy_static;

/// This module provides functions to represent an air-source heat pump: how its heating
/// capacity and efficiency fall away as the outdoor temperature drops, and how much extra
/// electricity defrost cycles cost in cold, humid weather.

/// Standard high rating temperature, in deg F
const RATING_TEMP_HIGH_F: f64 = 47.;
/// Standard low rating temperature, in deg F
const RATING_TEMP_LOW_F: f64 = 17.;
/// Points of a custom performance curve, in increasing order
const RATING_TEMPS_F: [f64; 2] = [RATING_TEMP_LOW_F, RATING_TEMP_HIGH_F];

const CAPACITY_FACTOR_AT_LOW_RATING: f64 = 0.64;
/// Capacity lost per deg F between the rating temperatures
const CAPACITY_SLOPE_ABOVE_LOW_RATING: f64 = 0.012;
/// Capacity lost per deg F below the low rating temperature
const CAPACITY_SLOPE_BELOW_LOW_RATING: f64 = 0.01;

const BASE_COP_AT_HIGH_RATING: f64 = 4.8;
const BASE_COP_SLOPE_ABOVE_LOW_RATING: f64 = 0.0867;
const BASE_COP_AT_LOW_RATING: f64 = 2.2;
const BASE_COP_SLOPE_BELOW_LOW_RATING: f64 = 0.02;
const BASE_COP_FLOOR: f64 = 1.2;

const MIN_COP: f64 = 1.0;
const MAX_COP: f64 = 10.;

const FREEZING_F: f64 = 32.;
/// Temperature band (deg F) in which near-saturated air adds to the defrost penalty
const SATURATION_BAND_F: (f64, f64) = (32., 42.);
const SATURATION_PENALTY_SCALE: f64 = 0.10;

/// Hours in each outdoor temperature bin (deg F) of the HSPF2 heating season
const HSPF2_BIN_HOURS: [(f64, f64); 16] = [
    (62., 87.),
    (57., 183.),
    (52., 294.),
    (47., 358.),
    (42., 415.),
    (37., 460.),
    (33., 430.),
    (28., 407.),
    (23., 311.),
    (18., 239.),
    (13., 152.),
    (8., 91.),
    (3., 47.),
    (-2., 20.),
    (-7., 8.),
    (-13., 3.),
];

lazy_static! {
    /// Bin-hour weighted seasonal average of the unscaled COP curve
    static ref BASE_SEASONAL_COP: f64 = seasonal_average(base_cop);
}

fn seasonal_average(cop_at: impl Fn(f64) -> f64) -> f64 {
    let (weighted, hours) = HSPF2_BIN_HOURS
        .iter()
        .fold((0., 0.), |(weighted, hours), (temp, bin_hours)| {
            (weighted + cop_at(*temp) * bin_hours, hours + bin_hours)
        });
    weighted / hours
}

/// Fraction of rated capacity delivered at the given outdoor temperature, before any
/// minimum-capacity floor or lockout is applied
fn capacity_factor(outdoor_temp: f64) -> f64 {
    if outdoor_temp >= RATING_TEMP_HIGH_F {
        1.
    } else if outdoor_temp >= RATING_TEMP_LOW_F {
        1. - (RATING_TEMP_HIGH_F - outdoor_temp) * CAPACITY_SLOPE_ABOVE_LOW_RATING
    } else {
        CAPACITY_FACTOR_AT_LOW_RATING
            - (RATING_TEMP_LOW_F - outdoor_temp) * CAPACITY_SLOPE_BELOW_LOW_RATING
    }
}

/// COP shape before scaling to the rated HSPF2
fn base_cop(outdoor_temp: f64) -> f64 {
    if outdoor_temp >= RATING_TEMP_HIGH_F {
        BASE_COP_AT_HIGH_RATING
    } else if outdoor_temp >= RATING_TEMP_LOW_F {
        BASE_COP_AT_HIGH_RATING
            - (RATING_TEMP_HIGH_F - outdoor_temp) * BASE_COP_SLOPE_ABOVE_LOW_RATING
    } else {
        max_of_2(
            BASE_COP_AT_LOW_RATING
                - (RATING_TEMP_LOW_F - outdoor_temp) * BASE_COP_SLOPE_BELOW_LOW_RATING,
            BASE_COP_FLOOR,
        )
    }
}

/// Only curves with every value positive and finite are used
fn custom_curve(equipment: &EquipmentProfile) -> Option<&CustomPerformanceCurve> {
    equipment.custom_performance_curve.as_ref().filter(|curve| {
        [
            curve.capacity_at_47,
            curve.capacity_at_17,
            curve.cop_at_47,
            curve.cop_at_17,
        ]
        .iter()
        .all(|value| value.is_finite() && *value > 0.)
    })
}

fn rated_capacity_btu_per_hour(equipment: &EquipmentProfile) -> f64 {
    match custom_curve(equipment) {
        Some(curve) => kbtu_to_btu(curve.capacity_at_47),
        None => kbtu_to_btu(positive_or(
            equipment.rated_capacity,
            DEFAULT_RATED_CAPACITY_KBTU,
        )),
    }
}

fn is_locked_out(equipment: &EquipmentProfile, outdoor_temp: f64) -> bool {
    outdoor_temp <= finite_or(equipment.cutoff_temp, DEFAULT_CUTOFF_TEMP_F)
}

/// Heat output (BTU/hr) the heat pump can deliver at the given outdoor temperature.
///
/// Never increases as the outdoor temperature falls, never drops below the configured
/// minimum fraction of rated capacity while running, and is zero at or below the
/// compressor cutoff temperature.
pub fn heat_pump_capacity_btu_per_hour(
    equipment: &EquipmentProfile,
    outdoor_temp: f64,
    config: &PerformanceConfig,
) -> f64 {
    if is_locked_out(equipment, outdoor_temp) {
        return 0.;
    }

    let rated = rated_capacity_btu_per_hour(equipment);
    let min_fraction = clamp_finite(config.min_capacity_fraction, 0., 1., 0.);

    let capacity = match custom_curve(equipment) {
        Some(curve) => {
            let at_low_rating = min_of_2(curve.capacity_at_17, curve.capacity_at_47) * BTU_PER_KBTU;
            min_of_2(
                interp(
                    &RATING_TEMPS_F,
                    &[at_low_rating, rated],
                    outdoor_temp,
                    &InterpMode::Extrapolate,
                ),
                rated,
            )
        }
        None => rated * capacity_factor(outdoor_temp),
    };

    max_of_2(capacity, rated * min_fraction)
}

/// Coefficient of performance at the given outdoor temperature.
///
/// The default curve is scaled so that its weighted average over the HSPF2 heating season
/// matches the equipment's rated HSPF2.
pub fn heat_pump_cop(equipment: &EquipmentProfile, outdoor_temp: f64) -> f64 {
    let cop = match custom_curve(equipment) {
        Some(curve) => interp(
            &RATING_TEMPS_F,
            &[curve.cop_at_17, curve.cop_at_47],
            outdoor_temp,
            &InterpMode::Extrapolate,
        ),
        None => {
            let hspf2 = positive_or(equipment.heating_efficiency, DEFAULT_HSPF2);
            let seasonal_cop = hspf2 * BTU_PER_KBTU / BTU_PER_KILOWATT_HOUR;
            base_cop(outdoor_temp) * seasonal_cop / *BASE_SEASONAL_COP
        }
    };

    clamp_finite(cop, MIN_COP, MAX_COP, MIN_COP)
}

/// Fraction by which defrost cycles increase the compressor's electricity use.
///
/// Frost only builds up in a band of temperatures around freezing when the air is humid
/// enough; outside those conditions the penalty is zero. The result lies in [0, 1].
pub fn defrost_penalty(outdoor_temp: f64, humidity: f64, config: &DefrostConfig) -> f64 {
    if !outdoor_temp.is_finite()
        || !humidity.is_finite()
        || outdoor_temp < config.min_temp
        || outdoor_temp > config.max_temp
        || humidity < config.humidity_threshold
    {
        return 0.;
    }

    let weight = defrost_temperature_weight(outdoor_temp, config);
    let humidity_fraction = clamp_finite(humidity, 0., 100., 0.) / 100.;
    let mut penalty = finite_or(config.max_penalty, 0.) * humidity_fraction * weight;

    if humidity >= config.saturation_humidity
        && (SATURATION_BAND_F.0..=SATURATION_BAND_F.1).contains(&outdoor_temp)
    {
        penalty += (humidity_fraction - config.saturation_humidity / 100.)
            * SATURATION_PENALTY_SCALE
            * weight;
    }

    clamp_finite(penalty, 0., 1., 0.)
}

/// How strongly frost forms at the given temperature: 1 in the peak band, half by the top
/// of the range, and tailing off below freezing.
fn defrost_temperature_weight(outdoor_temp: f64, config: &DefrostConfig) -> f64 {
    let fraction_of = |numerator: f64, denominator: f64| {
        if denominator > 0. {
            clamp_finite(numerator / denominator, 0., 1., 0.)
        } else {
            0.
        }
    };

    if outdoor_temp > config.peak_high_temp {
        1. - 0.5 * fraction_of(
            outdoor_temp - config.peak_high_temp,
            config.max_temp - config.peak_high_temp,
        )
    } else if outdoor_temp >= config.peak_low_temp {
        1.
    } else if outdoor_temp >= FREEZING_F {
        1. - 0.1 * fraction_of(config.peak_low_temp - outdoor_temp, config.peak_low_temp - FREEZING_F)
    } else {
        0.9 - 0.3 * fraction_of(FREEZING_F - outdoor_temp, FREEZING_F - config.min_temp)
    }
}

/// Heat delivered and energy used by a heat pump over one timestep.
///
/// Demand beyond the heat pump's capacity is met by electric resistance heat if the
/// equipment has it, and otherwise reported as unmet.
pub(crate) fn compute_hourly_heat_pump_performance(
    equipment: &EquipmentProfile,
    heat_loss_factor: f64,
    conditions: HourlyConditions,
    config: &PerformanceConfig,
) -> HourlyResult {
    let conditions = conditions.sanitised();
    let timestep = conditions.timestep_hours;

    let required = required_heat_btu_per_hour(
        heat_loss_factor,
        conditions.indoor_temp,
        conditions.outdoor_temp,
    );
    let capacity = heat_pump_capacity_btu_per_hour(equipment, conditions.outdoor_temp, config);
    let delivered = min_of_2(required, capacity);
    let shortfall = required - delivered;

    let defrost_penalty_fraction = if delivered > 0. {
        defrost_penalty(
            conditions.outdoor_temp,
            conditions.humidity,
            &config.defrost,
        )
    } else {
        0.
    };
    let cop = heat_pump_cop(equipment, conditions.outdoor_temp);
    let electrical_energy_kwh =
        btu_to_kwh(delivered * timestep) / cop * (1. + defrost_penalty_fraction);

    let (aux_energy_kwh, unmet_btu) = if equipment.use_electric_aux_heat {
        (btu_to_kwh(shortfall * timestep), 0.)
    } else {
        (0., shortfall * timestep)
    };
    let heat_output_btu = if equipment.use_electric_aux_heat {
        required * timestep
    } else {
        delivered * timestep
    };

    HourlyResult {
        heat_output_btu,
        electrical_energy_kwh,
        aux_energy_kwh,
        gas_therms: 0.,
        defrost_penalty_fraction,
        unmet_btu,
        cost_dollars: 0.,
        timestep_hours: timestep,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn equipment() -> EquipmentProfile {
        EquipmentProfile::default()
    }

    #[fixture]
    fn config() -> PerformanceConfig {
        PerformanceConfig::default()
    }

    #[rstest]
    #[case(60., 24_000.)]
    #[case(47., 24_000.)]
    #[case(32., 19_680.)]
    #[case(17., 15_360.)]
    #[case(7., 12_960.)]
    #[case(-10., 8_880.)]
    #[case(-15., 0.)]
    #[case(-30., 0.)]
    fn should_calc_capacity_on_default_curve(
        equipment: EquipmentProfile,
        config: PerformanceConfig,
        #[case] outdoor_temp: f64,
        #[case] expected: f64,
    ) {
        assert_relative_eq!(
            heat_pump_capacity_btu_per_hour(&equipment, outdoor_temp, &config),
            expected,
            max_relative = 1e-9
        );
    }

    #[rstest]
    fn should_floor_capacity_at_min_fraction_until_lockout(config: PerformanceConfig) {
        let equipment = EquipmentProfile {
            cutoff_temp: -40.,
            ..Default::default()
        };
        assert_relative_eq!(
            heat_pump_capacity_btu_per_hour(&equipment, -25., &config),
            24_000. * 0.3
        );
        assert_eq!(
            heat_pump_capacity_btu_per_hour(&equipment, -40., &config),
            0.
        );
    }

    #[rstest]
    fn should_never_increase_capacity_as_temperature_falls(
        equipment: EquipmentProfile,
        config: PerformanceConfig,
    ) {
        let capacities = (-40..=80)
            .rev()
            .map(|temp| heat_pump_capacity_btu_per_hour(&equipment, temp as f64, &config))
            .collect::<Vec<_>>();
        assert!(capacities.windows(2).all(|pair| pair[1] <= pair[0]));
    }

    #[rstest]
    fn should_interpolate_custom_curve(config: PerformanceConfig) {
        let equipment = EquipmentProfile {
            custom_performance_curve: Some(CustomPerformanceCurve {
                capacity_at_47: 36.,
                capacity_at_17: 24.,
                cop_at_47: 4.,
                cop_at_17: 2.5,
            }),
            ..Default::default()
        };

        assert_relative_eq!(
            heat_pump_capacity_btu_per_hour(&equipment, 32., &config),
            30_000.,
            max_relative = 1e-9
        );
        assert_relative_eq!(
            heat_pump_capacity_btu_per_hour(&equipment, 65., &config),
            36_000.
        );
        assert_relative_eq!(
            heat_pump_capacity_btu_per_hour(&equipment, 2., &config),
            18_000.,
            max_relative = 1e-9
        );
        assert_relative_eq!(heat_pump_cop(&equipment, 32.), 3.25, max_relative = 1e-9);
        assert_relative_eq!(heat_pump_cop(&equipment, 62.), 4.75, max_relative = 1e-9);
        assert_relative_eq!(heat_pump_cop(&equipment, 7.), 2., max_relative = 1e-9);
        assert_relative_eq!(heat_pump_cop(&equipment, -30.), MIN_COP);
    }

    #[rstest]
    fn should_ignore_invalid_custom_curve(
        equipment: EquipmentProfile,
        config: PerformanceConfig,
    ) {
        let with_bad_curve = EquipmentProfile {
            custom_performance_curve: Some(CustomPerformanceCurve {
                capacity_at_47: f64::NAN,
                capacity_at_17: 24.,
                cop_at_47: 4.,
                cop_at_17: 2.5,
            }),
            ..Default::default()
        };
        assert_eq!(
            heat_pump_capacity_btu_per_hour(&with_bad_curve, 30., &config),
            heat_pump_capacity_btu_per_hour(&equipment, 30., &config)
        );
    }

    #[rstest]
    #[case(8.5)]
    #[case(9.)]
    #[case(10.5)]
    fn should_match_rated_hspf2_over_heating_season(#[case] hspf2: f64) {
        let equipment = EquipmentProfile {
            heating_efficiency: hspf2,
            ..Default::default()
        };
        assert_relative_eq!(
            seasonal_average(|temp| heat_pump_cop(&equipment, temp)),
            hspf2 / 3.41214,
            max_relative = 1e-9
        );
    }

    #[rstest]
    fn should_drop_cop_as_temperature_falls(equipment: EquipmentProfile) {
        let at_47 = heat_pump_cop(&equipment, 47.);
        let at_17 = heat_pump_cop(&equipment, 17.);
        assert!(at_17 < at_47);
        assert_relative_eq!(at_47 / at_17, 4.8 / (4.8 - 30. * 0.0867));
        assert_eq!(heat_pump_cop(&equipment, 80.), at_47);
    }

    #[rstest]
    fn should_floor_cop() {
        let equipment = EquipmentProfile {
            heating_efficiency: 1.,
            ..Default::default()
        };
        assert_eq!(heat_pump_cop(&equipment, -20.), MIN_COP);
    }

    #[rstest]
    #[case(38., 80., 0.16)]
    #[case(38., 100., 0.205)]
    #[case(45., 80., 0.08)]
    #[case(32., 100., 0.1845)]
    #[case(20., 100., 0.12)]
    #[case(50., 90., 0.)]
    #[case(38., 50., 0.)]
    #[case(10., 90., 0.)]
    #[case(f64::NAN, 90., 0.)]
    fn should_calc_defrost_penalty(
        config: PerformanceConfig,
        #[case] outdoor_temp: f64,
        #[case] humidity: f64,
        #[case] expected: f64,
    ) {
        assert_relative_eq!(
            defrost_penalty(outdoor_temp, humidity, &config.defrost),
            expected,
            epsilon = 1e-12
        );
    }

    #[rstest]
    #[case(8., 90., 0.18)]
    #[case(38., 90., 0.)]
    #[case(8., 80., 0.)]
    #[case(-5., 90., 0.)]
    fn should_calc_defrost_penalty_with_configured_thresholds(
        #[case] outdoor_temp: f64,
        #[case] humidity: f64,
        #[case] expected: f64,
    ) {
        let config = DefrostConfig {
            min_temp: 0.,
            max_temp: 15.,
            peak_low_temp: 5.,
            peak_high_temp: 10.,
            humidity_threshold: 85.,
            ..Default::default()
        };
        assert_relative_eq!(
            defrost_penalty(outdoor_temp, humidity, &config),
            expected,
            epsilon = 1e-12
        );
    }

    #[rstest]
    fn should_only_apply_defrost_in_default_band() {
        // 8F at 90% is frost-prone for the configured band above but not the default one
        assert_eq!(defrost_penalty(8., 90., &DefrostConfig::default()), 0.);
    }

    #[rstest]
    fn should_keep_defrost_penalty_in_unit_range() {
        let config = DefrostConfig {
            max_penalty: 5.,
            ..Default::default()
        };
        assert_eq!(defrost_penalty(38., 100., &config), 1.);
    }

    #[rstest]
    fn should_use_aux_heat_for_shortfall(equipment: EquipmentProfile, config: PerformanceConfig) {
        let conditions = HourlyConditions::new(70., 20., 50.);
        let result = compute_hourly_heat_pump_performance(&equipment, 400., conditions, &config);

        let capacity = 24_000. * (1. - 27. * 0.012);
        assert_relative_eq!(result.heat_output_btu, 20_000.);
        assert_relative_eq!(result.aux_energy_kwh, (20_000. - capacity) / 3412.14);
        assert_relative_eq!(
            result.electrical_energy_kwh,
            capacity / 3412.14 / heat_pump_cop(&equipment, 20.)
        );
        assert_eq!(result.defrost_penalty_fraction, 0.);
        assert_eq!(result.unmet_btu, 0.);
    }

    #[rstest]
    fn should_report_unmet_demand_without_aux_heat(config: PerformanceConfig) {
        let equipment = EquipmentProfile {
            use_electric_aux_heat: false,
            ..Default::default()
        };
        let conditions = HourlyConditions::new(70., 20., 50.).with_timestep(0.5);
        let result = compute_hourly_heat_pump_performance(&equipment, 400., conditions, &config);

        let capacity = 24_000. * (1. - 27. * 0.012);
        assert_eq!(result.aux_energy_kwh, 0.);
        assert_relative_eq!(result.unmet_btu, (20_000. - capacity) * 0.5);
        assert_relative_eq!(result.heat_output_btu, capacity * 0.5);
        assert_eq!(result.timestep_hours, 0.5);
    }

    #[rstest]
    fn should_apply_defrost_penalty_to_compressor_energy(
        equipment: EquipmentProfile,
        config: PerformanceConfig,
    ) {
        let dry = compute_hourly_heat_pump_performance(
            &equipment,
            200.,
            HourlyConditions::new(68., 38., 40.),
            &config,
        );
        let humid = compute_hourly_heat_pump_performance(
            &equipment,
            200.,
            HourlyConditions::new(68., 38., 80.),
            &config,
        );
        assert_relative_eq!(humid.defrost_penalty_fraction, 0.16);
        assert_relative_eq!(
            humid.electrical_energy_kwh,
            dry.electrical_energy_kwh * 1.16
        );
    }

    #[rstest]
    fn should_use_no_energy_when_warm_enough(
        equipment: EquipmentProfile,
        config: PerformanceConfig,
    ) {
        let result = compute_hourly_heat_pump_performance(
            &equipment,
            400.,
            HourlyConditions::new(68., 72., 90.),
            &config,
        );
        assert_eq!(
            result,
            HourlyResult {
                timestep_hours: 1.,
                ..Default::default()
            }
        );
    }
}
