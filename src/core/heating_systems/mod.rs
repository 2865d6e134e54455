pub mod balance_point;
pub mod common;
pub mod furnace;
pub mod heat_pump;
