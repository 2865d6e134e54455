use crate::core::controls::time_control::{minute_of_day, parse_time_of_day, CircularInterval};
use crate::input::{RateSchedule, TouBlock, DEFAULT_ELECTRIC_RATE, DEFAULT_GAS_RATE};
use chrono::NaiveDateTime;
use itertools::Itertools;

/// This module resolves utility prices from a flat rate and optional time-of-use blocks.

fn valid_rate(rate: f64) -> Option<f64> {
    (rate.is_finite() && rate >= 0.).then_some(rate)
}

impl TouBlock {
    /// The minutes of the day the block covers, if both its times parse
    pub fn interval(&self) -> Option<CircularInterval> {
        Some(CircularInterval::new(
            parse_time_of_day(&self.start)?,
            parse_time_of_day(&self.end)?,
        ))
    }
}

impl RateSchedule {
    /// Electricity price ($/kWh) outside any time-of-use block
    pub fn effective_flat_rate(&self) -> f64 {
        valid_rate(self.flat_rate).unwrap_or(DEFAULT_ELECTRIC_RATE)
    }

    /// in $/therm
    pub fn effective_gas_rate(&self) -> f64 {
        valid_rate(self.gas_rate).unwrap_or(DEFAULT_GAS_RATE)
    }

    /// Pairs of indices of time-of-use blocks that cover some of the same minutes
    pub fn overlapping_blocks(&self) -> Vec<(usize, usize)> {
        self.tou_blocks
            .iter()
            .enumerate()
            .filter_map(|(idx, block)| block.interval().map(|interval| (idx, interval)))
            .tuple_combinations()
            .filter(|((_, first), (_, second))| first.overlaps(second))
            .map(|((first_idx, _), (second_idx, _))| (first_idx, second_idx))
            .collect()
    }
}

/// Electricity price ($/kWh) in force at the given local time.
///
/// The first time-of-use block covering the time with a usable rate wins; otherwise the
/// flat rate applies.
pub fn get_rate_for_hour(rates: &RateSchedule, timestamp: NaiveDateTime) -> f64 {
    let minute = minute_of_day(timestamp);
    rates
        .tou_blocks
        .iter()
        .find_map(|block| {
            block
                .interval()
                .filter(|interval| interval.contains(minute))
                .and_then(|_| valid_rate(block.rate))
        })
        .unwrap_or_else(|| rates.effective_flat_rate())
}
