use approx::assert_relative_eq;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use hvac_forecast::core::controls::time_control::get_setpoint_for_hour;
use hvac_forecast::core::energy_supply::tariff_data::get_rate_for_hour;
use hvac_forecast::core::heating_systems::balance_point::calculate_balance_point;
use hvac_forecast::core::space_heat_demand::heat_loss::{resolve, HeatLossSource};
use hvac_forecast::corpus::{compute_weekly_metrics, BuildingLoad};
use hvac_forecast::external_conditions::{WeatherSample, WeatherSeries};
use hvac_forecast::input::{
    ingest, BuildingProfile, EquipmentProfile, HeatLossSources, PerformanceConfig, RateSchedule,
    ThermostatSchedule,
};
use hvac_forecast::output::SinkOutput;
use hvac_forecast::run_forecast;
use pretty_assertions::assert_eq;
use rstest::*;

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 6)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// A cold week with a daily swing between 15F and 39F
fn cold_week(start: NaiveDateTime) -> WeatherSeries {
    (0..168)
        .map(|hour| {
            let temp = 27. + 12. * ((hour % 24) as f64 / 24. * std::f64::consts::TAU).sin();
            WeatherSample::new(start + TimeDelta::hours(hour), temp, 75.)
        })
        .collect()
}

#[fixture]
fn schedule() -> ThermostatSchedule {
    ThermostatSchedule {
        day_period_start: "06:00".into(),
        night_period_start: "22:00".into(),
        day_setpoint: 70.,
        night_setpoint: 65.,
        ..Default::default()
    }
}

#[rstest]
fn should_calculate_heat_loss_for_typical_home() {
    let building = BuildingProfile {
        square_feet: 1500.,
        insulation_level: 1.0,
        home_shape: 1.0,
        ceiling_height: 8.,
        ..Default::default()
    };
    let resolved = resolve(&HeatLossSources::default(), Some(&building));

    assert_eq!(resolved.source, HeatLossSource::Calculated);
    assert_relative_eq!(resolved.factor, 485.8, epsilon = 0.05);
}

#[rstest]
#[case(at(5, 59), 65.)]
#[case(at(6, 0), 70.)]
#[case(at(21, 59), 70.)]
#[case(at(22, 0), 65.)]
fn should_switch_setpoint_at_period_boundaries(
    schedule: ThermostatSchedule,
    #[case] timestamp: NaiveDateTime,
    #[case] expected: f64,
) {
    assert_eq!(get_setpoint_for_hour(&schedule, timestamp), expected);
}

#[rstest]
fn should_charge_flat_rate_all_day() {
    let rates = RateSchedule::flat(0.15);
    for minute in 0..(24 * 60) {
        assert_eq!(get_rate_for_hour(&rates, at(minute / 60, minute % 60)), 0.15);
    }
}

#[rstest]
#[case(at(0, 0), 7)]
#[case(at(13, 0), 8)]
fn should_summarise_a_week_by_day(
    schedule: ThermostatSchedule,
    #[case] start: NaiveDateTime,
    #[case] expected_days: usize,
) {
    let metrics = compute_weekly_metrics(
        &cold_week(start),
        &EquipmentProfile::default(),
        BuildingLoad::from(485.8),
        &schedule,
        &RateSchedule::flat(0.15),
        true,
        &PerformanceConfig::default(),
    );

    assert_eq!(metrics.daily_summaries.len(), expected_days);
    assert_eq!(metrics.hourly.len(), 168);
    let daily_cost: f64 = metrics
        .daily_summaries
        .iter()
        .map(|day| day.totals.cost_dollars)
        .sum();
    assert_relative_eq!(daily_cost, metrics.total_cost(), max_relative = 1e-9);
    assert!(metrics.total_cost() > 0.);
}

#[rstest]
fn should_isolate_a_bad_temperature_sample(schedule: ThermostatSchedule) {
    let series = cold_week(at(0, 0));
    let bad_index = 40;
    let with_bad_sample: WeatherSeries = series
        .iter()
        .enumerate()
        .map(|(idx, sample)| WeatherSample {
            outdoor_temp: if idx == bad_index {
                Some(f64::NAN)
            } else {
                sample.outdoor_temp
            },
            ..sample.clone()
        })
        .collect();

    let run = |series: &WeatherSeries| {
        compute_weekly_metrics(
            series,
            &EquipmentProfile::default(),
            BuildingLoad::from(485.8),
            &schedule,
            &RateSchedule::flat(0.15),
            true,
            &PerformanceConfig::default(),
        )
    };
    let clean = run(&series);
    let affected = run(&with_bad_sample);

    assert_eq!(affected.substituted_samples, 1);
    assert!(affected.total_cost().is_finite());
    for (idx, (a, b)) in clean.hourly.iter().zip(&affected.hourly).enumerate() {
        if idx == bad_index {
            assert_eq!(b.outdoor_temp, 50.);
        } else {
            assert_eq!(a, b);
        }
    }
}

#[rstest]
fn should_bound_balance_point() {
    let equipment = EquipmentProfile::default();
    let config = PerformanceConfig::default();

    let no_loss = calculate_balance_point(&equipment, 0., 70., &config);
    assert_eq!(no_loss.balance_point_temp_f, -20.);

    let huge_loss = calculate_balance_point(&equipment, 1e6, 70., &config);
    assert_eq!(huge_loss.balance_point_temp_f, 60.);
}

#[rstest]
fn should_forecast_from_json_document() {
    let input = r#"{
        "building": {"squareFeet": 1500},
        "schedule": {"dayPeriodStart": "06:00", "nightPeriodStart": "22:00", "daySetpoint": 70, "nightSetpoint": 65},
        "rates": {"flatRate": 0.15, "touBlocks": [{"start": "16:00", "end": "21:00", "rate": 0.40}]},
        "billing": {"baseloadKwhPerDay": 12, "fixedMonthlyCost": 10},
        "weather": [
            {"timestamp": "2025-01-06T15:00:00", "outdoorTemp": 30, "relativeHumidity": 70},
            {"timestamp": "2025-01-06T16:00:00", "outdoorTemp": 30, "relativeHumidity": 70}
        ]
    }"#;

    let results = run_forecast(input.as_bytes(), SinkOutput, None)
        .unwrap()
        .unwrap();

    let hourly = &results.metrics.hourly;
    assert_eq!(hourly[0].electric_rate, 0.15);
    assert_eq!(hourly[1].electric_rate, 0.40);
    // same weather, so the same energy at a higher price
    assert_relative_eq!(
        hourly[1].result.cost_dollars / hourly[0].result.cost_dollars,
        0.40 / 0.15,
        max_relative = 1e-9
    );
    assert_relative_eq!(
        results.bill_projection.monthly_baseload_cost,
        12. * 0.15 * 30.
    );
    assert_eq!(results.bill_projection.fixed_monthly_cost, 10.);
}

#[rstest]
fn should_parse_input_documents_through_public_api() {
    let input = ingest(r#"{"equipment": {"primarySystem": "gasFurnace"}}"#.as_bytes()).unwrap();
    assert!(input.equipment.primary_system.heats_with_gas());
    assert!(input.building.is_none());
}
