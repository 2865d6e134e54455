pub const BTU_PER_KILOWATT_HOUR: f64 = 3_412.14;
pub const BTU_PER_KBTU: f64 = 1_000.;
pub const BTU_PER_THERM: f64 = 100_000.;
pub const WATT_HOURS_PER_KILOWATT_HOUR: f64 = 1_000.;
pub const MINUTES_PER_HOUR: u32 = 60;
pub const HOURS_PER_DAY: u32 = 24;
pub const MINUTES_PER_DAY: u32 = MINUTES_PER_HOUR * HOURS_PER_DAY;
pub const FEET_PER_THOUSAND_FEET: f64 = 1_000.;

/// Indoor/outdoor temperature difference (in deg F) that design heat loss figures are quoted at.
pub const REFERENCE_DELTA_T_F: f64 = 70.;

pub fn btu_to_kwh(btu: f64) -> f64 {
    btu / BTU_PER_KILOWATT_HOUR
}

pub fn kbtu_to_btu(kbtu: f64) -> f64 {
    kbtu * BTU_PER_KBTU
}

pub fn btu_to_therms(btu: f64) -> f64 {
    btu / BTU_PER_THERM
}

/// Convert a design heat loss (BTU/hr at the reference delta T) to a heat loss factor (BTU/hr/F)
pub fn design_heat_loss_to_factor(design_heat_loss_btu_per_hour: f64) -> f64 {
    design_heat_loss_btu_per_hour / REFERENCE_DELTA_T_F
}
