// This module resolves a single heat loss factor for a building from the competing sources
// that may be available for it.

use crate::compare_floats::{finite_or, max_of_2, valid_positive};
use crate::core::units::design_heat_loss_to_factor;
use crate::input::{
    AnalyzerHeatLoss, BuildingProfile, HeatLossProvenance, HeatLossSources,
    DEFAULT_CEILING_HEIGHT_FT,
};
use serde::Serialize;
use std::ops::Range;
use strum::Display;
use tracing::{debug, warn};

/// Design heat loss per square foot at the reference delta T, in BTU/hr/sqft
pub const BASE_BTU_PER_SQ_FT_HEATING: f64 = 22.67;
/// Fraction of nominal floor area counted when part of the home is a loft, which has
/// roughly half the exterior exposure of ground floor area
const LOFT_EFFECTIVE_AREA_FRACTION: f64 = 0.65;
/// Home shape multipliers of loft-style homes. A loft flag on any other shape is ignored.
const LOFT_HOME_SHAPES: Range<f64> = 1.2..1.3;
const CEILING_MULTIPLIER_PER_FT: f64 = 0.1;
const MIN_CEILING_MULTIPLIER: f64 = 0.1;
/// Days of bill data needed before a learned factor is trusted
pub const MIN_LEARNED_DAYS: u32 = 30;

/// The sources of a heat loss factor, in priority order, highest first
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum HeatLossSource {
    Manual,
    Measured,
    Learned,
    Calculated,
    FormulaFallback,
    /// No source could provide a factor
    Degraded,
}

impl HeatLossSource {
    pub const PRIORITY: [HeatLossSource; 5] = [
        HeatLossSource::Manual,
        HeatLossSource::Measured,
        HeatLossSource::Learned,
        HeatLossSource::Calculated,
        HeatLossSource::FormulaFallback,
    ];

    /// Try to obtain a valid factor (in BTU/hr/F) from this source alone
    fn attempt(&self, sources: &HeatLossSources, building: Option<&BuildingProfile>) -> Option<f64> {
        match self {
            HeatLossSource::Manual => sources
                .use_manual_heat_loss
                .then_some(sources.manual_heat_loss)
                .and_then(valid_positive),
            HeatLossSource::Measured => {
                if !sources.use_analyzer_heat_loss {
                    return None;
                }
                measured_factor(sources.analyzer_heat_loss.as_ref())
                    .or_else(|| measured_factor(sources.stored_analyzer_heat_loss.as_ref()))
            }
            HeatLossSource::Learned => sources
                .learned_heat_loss
                .filter(|learned| {
                    sources.use_learned_heat_loss && learned.cumulative_days >= MIN_LEARNED_DAYS
                })
                .and_then(|learned| valid_positive(learned.heat_loss_factor)),
            HeatLossSource::Calculated => {
                if !sources.use_calculated_heat_loss {
                    return None;
                }
                building.and_then(calculated_heat_loss_factor)
            }
            HeatLossSource::FormulaFallback => {
                // only stands in for a calculated factor that was switched off, not one that
                // could not be worked out
                if sources.use_calculated_heat_loss {
                    return None;
                }
                building.and_then(calculated_heat_loss_factor)
            }
            HeatLossSource::Degraded => None,
        }
    }
}

fn measured_factor(analyzer: Option<&AnalyzerHeatLoss>) -> Option<f64> {
    analyzer
        .filter(|a| a.provenance == HeatLossProvenance::Measured)
        .and_then(|a| valid_positive(a.heat_loss_factor))
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedHeatLoss {
    /// in BTU/hr/F
    pub factor: f64,
    pub source: HeatLossSource,
}

impl ResolvedHeatLoss {
    pub fn is_degraded(&self) -> bool {
        self.source == HeatLossSource::Degraded
    }
}

/// Pick the single authoritative heat loss factor for a building, by trying each source in
/// priority order. Always returns a finite, non-negative factor: 0 (tagged `Degraded`) if no
/// source is usable.
pub fn resolve(sources: &HeatLossSources, building: Option<&BuildingProfile>) -> ResolvedHeatLoss {
    for source in HeatLossSource::PRIORITY {
        if let Some(factor) = source.attempt(sources, building) {
            debug!(%source, factor, "Resolved heat loss factor");
            return ResolvedHeatLoss { factor, source };
        }
    }

    warn!("No usable heat loss source, heat loss estimate is degraded to zero");
    ResolvedHeatLoss {
        factor: 0.,
        source: HeatLossSource::Degraded,
    }
}

/// Design heat loss (BTU/hr at the reference delta T of 70F) of a building, from a DOE-style
/// area-based formula. Returns None if the floor area is unusable.
pub fn calculate_design_heat_loss(building: &BuildingProfile) -> Option<f64> {
    let square_feet = valid_positive(Some(building.square_feet))?;
    let effective_square_feet = if is_loft_style(building) {
        square_feet * LOFT_EFFECTIVE_AREA_FRACTION
    } else {
        square_feet
    };

    let insulation_level = max_of_2(finite_or(building.insulation_level, 1.0), 0.);
    let home_shape = max_of_2(finite_or(building.home_shape, 1.0), 0.);

    let design_heat_loss = effective_square_feet
        * BASE_BTU_PER_SQ_FT_HEATING
        * insulation_level
        * home_shape
        * ceiling_multiplier(building);

    valid_positive(Some(design_heat_loss))
}

/// Heat loss factor (BTU/hr/F) of a building from the area-based formula
pub fn calculated_heat_loss_factor(building: &BuildingProfile) -> Option<f64> {
    calculate_design_heat_loss(building).map(design_heat_loss_to_factor)
}

fn is_loft_style(building: &BuildingProfile) -> bool {
    building.has_loft && LOFT_HOME_SHAPES.contains(&building.home_shape)
}

fn ceiling_multiplier(building: &BuildingProfile) -> f64 {
    let height = match building.wall_height.filter(|h| h.is_finite() && *h > 0.) {
        Some(wall_height) if is_loft_style(building) => wall_height,
        _ => finite_or(building.ceiling_height, DEFAULT_CEILING_HEIGHT_FT),
    };

    max_of_2(
        1. + (height - DEFAULT_CEILING_HEIGHT_FT) * CEILING_MULTIPLIER_PER_FT,
        MIN_CEILING_MULTIPLIER,
    )
}
