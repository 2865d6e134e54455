pub mod controls;
pub mod cooling_systems;
pub mod energy_supply;
pub mod heating_systems;
pub(crate) mod solvers;
pub mod space_heat_demand;
pub mod units;
