use crate::errors::ForecastError;
use crate::external_conditions::WeatherSeries;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Read};
use strum::{Display, EnumString};

pub fn ingest(json: impl Read) -> Result<ForecastInput, ForecastError> {
    Ok(serde_json::from_reader(BufReader::new(json))?)
}

pub(crate) const DEFAULT_SQUARE_FEET: f64 = 1500.;
pub(crate) const DEFAULT_CEILING_HEIGHT_FT: f64 = 8.;
pub(crate) const DEFAULT_RATED_CAPACITY_KBTU: f64 = 24.;
pub(crate) const DEFAULT_HSPF2: f64 = 9.0;
pub(crate) const DEFAULT_SEER2: f64 = 15.0;
pub(crate) const DEFAULT_AFUE: f64 = 0.95;
pub(crate) const DEFAULT_CUTOFF_TEMP_F: f64 = -15.;
pub(crate) const DEFAULT_DAY_PERIOD_START: &str = "06:00";
pub(crate) const DEFAULT_NIGHT_PERIOD_START: &str = "22:00";
pub(crate) const DEFAULT_DAY_SETPOINT_F: f64 = 70.;
pub(crate) const DEFAULT_NIGHT_SETPOINT_F: f64 = 68.;
pub(crate) const DEFAULT_ELECTRIC_RATE: f64 = 0.10;
pub(crate) const DEFAULT_GAS_RATE: f64 = 1.20;

/// The complete input document for a forecast, as persisted by the owning application.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(default, rename_all = "camelCase")]
pub struct ForecastInput {
    pub building: Option<BuildingProfile>,
    pub equipment: EquipmentProfile,
    pub heat_loss_sources: HeatLossSources,
    pub schedule: ThermostatSchedule,
    pub rates: RateSchedule,
    pub weather: Option<WeatherSeries>,
    /// Geocoded elevation of the forecast grid point, in ft. Any elevation reported by the
    /// forecast source on individual samples takes precedence over this.
    pub weather_station_elevation: Option<f64>,
    /// Further zones, each forecast independently of the main one
    pub zones: Vec<ZoneInput>,
    pub billing: BillingInput,
    pub config: ModelConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(default, rename_all = "camelCase")]
pub struct BuildingProfile {
    pub square_feet: f64,
    /// Multiplier, typically 0.65 (well insulated) to 1.4 (poorly insulated)
    pub insulation_level: f64,
    /// Exterior surface multiplier for the shape of the home
    pub home_shape: f64,
    /// in ft
    pub ceiling_height: f64,
    /// in ft, only meaningful for homes with a loft
    pub wall_height: Option<f64>,
    pub has_loft: bool,
    /// Elevation of the home above sea level, in ft
    pub elevation: Option<f64>,
    /// Multiplier on the heat gain factor when cooling, 1.0 to 2.5
    pub solar_exposure: f64,
}

impl Default for BuildingProfile {
    fn default() -> Self {
        Self {
            square_feet: DEFAULT_SQUARE_FEET,
            insulation_level: 1.0,
            home_shape: 1.0,
            ceiling_height: DEFAULT_CEILING_HEIGHT_FT,
            wall_height: None,
            has_loft: false,
            elevation: None,
            solar_exposure: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumString, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum PrimarySystem {
    #[default]
    HeatPump,
    GasFurnace,
    AcPlusGas,
}

impl PrimarySystem {
    /// Whether space heating is provided by burning gas rather than by a heat pump
    pub fn heats_with_gas(&self) -> bool {
        matches!(self, PrimarySystem::GasFurnace | PrimarySystem::AcPlusGas)
    }
}

/// Manufacturer performance data at the two standard rating temperatures
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(rename_all = "camelCase")]
pub struct CustomPerformanceCurve {
    /// in kBTU/hr
    pub capacity_at_47: f64,
    /// in kBTU/hr
    pub capacity_at_17: f64,
    pub cop_at_47: f64,
    pub cop_at_17: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(default, rename_all = "camelCase")]
pub struct EquipmentProfile {
    pub primary_system: PrimarySystem,
    /// in kBTU/hr
    pub rated_capacity: f64,
    /// HSPF2
    pub heating_efficiency: f64,
    /// SEER2
    pub cooling_efficiency: f64,
    /// Gas furnace efficiency, either as a fraction or as a percentage
    pub afue: f64,
    pub custom_performance_curve: Option<CustomPerformanceCurve>,
    pub use_electric_aux_heat: bool,
    /// Outdoor temperature (deg F) at or below which the compressor locks out
    pub cutoff_temp: f64,
}

impl Default for EquipmentProfile {
    fn default() -> Self {
        Self {
            primary_system: PrimarySystem::HeatPump,
            rated_capacity: DEFAULT_RATED_CAPACITY_KBTU,
            heating_efficiency: DEFAULT_HSPF2,
            cooling_efficiency: DEFAULT_SEER2,
            afue: DEFAULT_AFUE,
            custom_performance_curve: None,
            use_electric_aux_heat: true,
            cutoff_temp: DEFAULT_CUTOFF_TEMP_F,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumString, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum HeatLossProvenance {
    /// Derived from an observed thermostat coast-down
    Measured,
    /// Filled in by the analyzer from assumptions when the data was insufficient
    #[default]
    Estimated,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerHeatLoss {
    /// in BTU/hr/F
    pub heat_loss_factor: Option<f64>,
    #[serde(default)]
    pub provenance: HeatLossProvenance,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(rename_all = "camelCase")]
pub struct LearnedHeatLoss {
    /// in BTU/hr/F
    pub heat_loss_factor: Option<f64>,
    /// Number of days of bill and weather data the factor was learned from
    #[serde(default)]
    pub cumulative_days: u32,
}

/// The competing sources for a building's heat loss factor
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(default, rename_all = "camelCase")]
pub struct HeatLossSources {
    /// in BTU/hr/F
    pub manual_heat_loss: Option<f64>,
    pub use_manual_heat_loss: bool,
    /// Result of an analysis run in the current session
    pub analyzer_heat_loss: Option<AnalyzerHeatLoss>,
    /// Result of an earlier analysis, as persisted in settings
    pub stored_analyzer_heat_loss: Option<AnalyzerHeatLoss>,
    pub use_analyzer_heat_loss: bool,
    pub learned_heat_loss: Option<LearnedHeatLoss>,
    pub use_learned_heat_loss: bool,
    pub use_calculated_heat_loss: bool,
}

impl Default for HeatLossSources {
    fn default() -> Self {
        Self {
            manual_heat_loss: None,
            use_manual_heat_loss: false,
            analyzer_heat_loss: None,
            stored_analyzer_heat_loss: None,
            use_analyzer_heat_loss: true,
            learned_heat_loss: None,
            use_learned_heat_loss: false,
            use_calculated_heat_loss: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, EnumString, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum HvacMode {
    #[default]
    Heating,
    Cooling,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(default, rename_all = "camelCase")]
pub struct ThermostatSchedule {
    /// Time of day as "HH:MM"
    pub day_period_start: String,
    /// Time of day as "HH:MM"
    pub night_period_start: String,
    /// in deg F
    pub day_setpoint: f64,
    /// in deg F
    pub night_setpoint: f64,
    pub mode: HvacMode,
}

impl Default for ThermostatSchedule {
    fn default() -> Self {
        Self {
            day_period_start: DEFAULT_DAY_PERIOD_START.to_string(),
            night_period_start: DEFAULT_NIGHT_PERIOD_START.to_string(),
            day_setpoint: DEFAULT_DAY_SETPOINT_F,
            night_setpoint: DEFAULT_NIGHT_SETPOINT_F,
            mode: HvacMode::Heating,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(rename_all = "camelCase")]
pub struct TouBlock {
    /// Time of day as "HH:MM"
    pub start: String,
    /// Time of day as "HH:MM", exclusive
    pub end: String,
    /// in $/kWh
    pub rate: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(default, rename_all = "camelCase")]
pub struct RateSchedule {
    /// in $/kWh, used whenever no time-of-use block applies
    pub flat_rate: f64,
    pub tou_blocks: Vec<TouBlock>,
    /// in $/therm
    pub gas_rate: f64,
}

impl Default for RateSchedule {
    fn default() -> Self {
        Self {
            flat_rate: DEFAULT_ELECTRIC_RATE,
            tou_blocks: vec![],
            gas_rate: DEFAULT_GAS_RATE,
        }
    }
}

impl RateSchedule {
    pub fn flat(rate: f64) -> Self {
        Self {
            flat_rate: rate,
            ..Default::default()
        }
    }
}

/// A further zone of the home, with its own envelope and thermostat. Equipment and schedule
/// fall back to those of the main zone where not given.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(default, rename_all = "camelCase")]
pub struct ZoneInput {
    pub name: String,
    pub building: BuildingProfile,
    pub equipment: Option<EquipmentProfile>,
    pub heat_loss_sources: HeatLossSources,
    pub schedule: Option<ThermostatSchedule>,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(default, rename_all = "camelCase")]
pub struct BillingInput {
    /// Non-HVAC household electricity use, in kWh/day
    pub baseload_kwh_per_day: f64,
    /// Fixed monthly connection charge, in $
    pub fixed_monthly_cost: f64,
}

impl Default for BillingInput {
    fn default() -> Self {
        Self {
            baseload_kwh_per_day: 10.,
            fixed_monthly_cost: 0.,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(default, rename_all = "camelCase")]
pub struct ModelConfig {
    pub performance: PerformanceConfig,
    pub elevation: ElevationConfig,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(default, rename_all = "camelCase")]
pub struct PerformanceConfig {
    /// Lowest fraction of rated capacity a running heat pump is assumed to deliver
    pub min_capacity_fraction: f64,
    pub defrost: DefrostConfig,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            min_capacity_fraction: 0.3,
            defrost: Default::default(),
        }
    }
}

/// Thresholds for the heuristic defrost penalty. The penalty only applies between
/// `min_temp` and `max_temp` (deg F) when relative humidity is at least
/// `humidity_threshold` (%), and is strongest between `peak_low_temp` and `peak_high_temp`.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(default, rename_all = "camelCase")]
pub struct DefrostConfig {
    pub min_temp: f64,
    pub max_temp: f64,
    pub peak_low_temp: f64,
    pub peak_high_temp: f64,
    pub humidity_threshold: f64,
    /// Penalty fraction at the peak temperatures and 100% humidity
    pub max_penalty: f64,
    /// Relative humidity (%) above which frost builds up fastest
    pub saturation_humidity: f64,
}

impl Default for DefrostConfig {
    fn default() -> Self {
        Self {
            min_temp: 20.,
            max_temp: 45.,
            peak_low_temp: 36.,
            peak_high_temp: 40.,
            humidity_threshold: 60.,
            max_penalty: 0.20,
            saturation_humidity: 95.,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[serde(default, rename_all = "camelCase")]
pub struct ElevationConfig {
    /// in deg F per 1000 ft
    pub lapse_rate_f_per_1000_ft: f64,
    /// Elevation differences (ft) smaller than this are ignored
    pub min_difference_ft: f64,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            lapse_rate_f_per_1000_ft: 3.5,
            min_difference_ft: 50.,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::io::Cursor;
    use std::str::FromStr;

    #[rstest]
    fn should_ingest_minimal_document_with_defaults() {
        let input = ingest(Cursor::new(r#"{"building": {"squareFeet": 2000}}"#)).unwrap();
        let building = input.building.unwrap();
        assert_eq!(building.square_feet, 2000.);
        assert_eq!(building.insulation_level, 1.0);
        assert_eq!(building.ceiling_height, 8.);
        assert_eq!(input.equipment.primary_system, PrimarySystem::HeatPump);
        assert_eq!(input.equipment.heating_efficiency, 9.0);
        assert!(input.heat_loss_sources.use_calculated_heat_loss);
        assert_eq!(input.schedule.day_period_start, "06:00");
        assert_eq!(input.rates.flat_rate, 0.10);
        assert!(input.weather.is_none());
    }

    #[rstest]
    fn should_ingest_full_document() {
        let json = r#"{
            "building": {"squareFeet": 1800, "insulationLevel": 0.65, "hasLoft": true, "elevation": 5280},
            "equipment": {
                "primarySystem": "acPlusGas",
                "ratedCapacity": 36,
                "afue": 96,
                "customPerformanceCurve": {"capacityAt47": 36, "capacityAt17": 24, "copAt47": 4.0, "copAt17": 2.5}
            },
            "heatLossSources": {
                "manualHeatLoss": 520,
                "useManualHeatLoss": true,
                "analyzerHeatLoss": {"heatLossFactor": 410, "provenance": "measured"},
                "learnedHeatLoss": {"heatLossFactor": 450, "cumulativeDays": 45}
            },
            "schedule": {"dayPeriodStart": "07:30", "nightPeriodStart": "23:00", "daySetpoint": 72, "nightSetpoint": 66, "mode": "cooling"},
            "rates": {"flatRate": 0.14, "touBlocks": [{"start": "16:00", "end": "21:00", "rate": 0.32}]},
            "weather": [
                {"timestamp": "2025-01-06T00:00:00", "outdoorTemp": 28.5, "relativeHumidity": 80},
                {"timestamp": "2025-01-06T01:00:00", "outdoorTemp": null, "sourceElevation": 4900}
            ],
            "zones": [{"name": "bonus room", "building": {"squareFeet": 400}}]
        }"#;
        let input = ingest(Cursor::new(json)).unwrap();
        assert_eq!(input.equipment.primary_system, PrimarySystem::AcPlusGas);
        assert_eq!(input.equipment.afue, 96.);
        assert_eq!(
            input.heat_loss_sources.analyzer_heat_loss.unwrap().provenance,
            HeatLossProvenance::Measured
        );
        assert!(input.heat_loss_sources.use_analyzer_heat_loss);
        assert_eq!(input.schedule.mode, HvacMode::Cooling);
        assert_eq!(input.rates.tou_blocks.len(), 1);
        assert_eq!(input.rates.gas_rate, 1.20);
        let weather = input.weather.unwrap();
        assert_eq!(weather.len(), 2);
        assert_eq!(weather.samples()[1].outdoor_temp, None);
        assert_eq!(weather.samples()[1].source_elevation, Some(4900.));
        assert_eq!(input.zones[0].name, "bonus room");
        assert!(input.zones[0].equipment.is_none());
    }

    #[rstest]
    fn should_reject_malformed_document() {
        assert!(matches!(
            ingest(Cursor::new("{\"building\": ")),
            Err(ForecastError::InvalidRequest(_))
        ));
    }

    #[rstest]
    #[case("heatPump", PrimarySystem::HeatPump)]
    #[case("gasFurnace", PrimarySystem::GasFurnace)]
    #[case("acPlusGas", PrimarySystem::AcPlusGas)]
    fn should_parse_primary_system_names(#[case] name: &str, #[case] expected: PrimarySystem) {
        assert_eq!(PrimarySystem::from_str(name).unwrap(), expected);
        assert_eq!(expected.to_string(), name);
    }

    #[rstest]
    fn should_identify_gas_heating_systems() {
        assert!(!PrimarySystem::HeatPump.heats_with_gas());
        assert!(PrimarySystem::GasFurnace.heats_with_gas());
        assert!(PrimarySystem::AcPlusGas.heats_with_gas());
    }
}
