// This module provides functions to resolve thermostat setpoints from a two-period daily schedule

use crate::core::units::{MINUTES_PER_DAY, MINUTES_PER_HOUR};
use crate::input::{
    ThermostatSchedule, DEFAULT_DAY_PERIOD_START, DEFAULT_DAY_SETPOINT_F,
    DEFAULT_NIGHT_PERIOD_START, DEFAULT_NIGHT_SETPOINT_F,
};
use chrono::{NaiveDateTime, NaiveTime, Timelike};
use std::cmp::Ordering;
use strum_macros::Display;

/// A half-open interval `[start, end)` of minutes on the circular 1440-minute day.
///
/// The interval wraps past midnight when `start > end`; `start == end` covers the whole day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CircularInterval {
    start: u32,
    end: u32,
}

impl CircularInterval {
    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start: start % MINUTES_PER_DAY,
            end: end % MINUTES_PER_DAY,
        }
    }

    pub fn contains(&self, minute: u32) -> bool {
        let minute = minute % MINUTES_PER_DAY;
        match self.start.cmp(&self.end) {
            Ordering::Equal => true,
            Ordering::Less => self.start <= minute && minute < self.end,
            Ordering::Greater => minute >= self.start || minute < self.end,
        }
    }

    /// Whether the two intervals share at least one minute
    pub fn overlaps(&self, other: &CircularInterval) -> bool {
        // two arcs on a circle intersect exactly when one contains the other's start
        self.contains(other.start) || other.contains(self.start)
    }

    /// Number of minutes covered
    pub fn duration_minutes(&self) -> u32 {
        match self.start.cmp(&self.end) {
            Ordering::Equal => MINUTES_PER_DAY,
            Ordering::Less => self.end - self.start,
            Ordering::Greater => MINUTES_PER_DAY - self.start + self.end,
        }
    }
}

/// Parse an `HH:MM` time of day into minutes since midnight
pub fn parse_time_of_day(value: &str) -> Option<u32> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .ok()
        .map(|time| time.hour() * MINUTES_PER_HOUR + time.minute())
}

pub fn minute_of_day(timestamp: NaiveDateTime) -> u32 {
    timestamp.hour() * MINUTES_PER_HOUR + timestamp.minute()
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
#[strum(serialize_all = "camelCase")]
pub enum SchedulePeriod {
    Day,
    Night,
}

fn time_or_default(value: &str, default: &str) -> u32 {
    parse_time_of_day(value)
        .or_else(|| parse_time_of_day(default))
        .unwrap_or_default()
}

fn setpoint_or_default(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        default
    }
}

impl ThermostatSchedule {
    /// The `[day start, night start)` interval, with unparseable times replaced by the
    /// default 06:00 and 22:00
    pub fn day_period(&self) -> CircularInterval {
        CircularInterval::new(
            time_or_default(&self.day_period_start, DEFAULT_DAY_PERIOD_START),
            time_or_default(&self.night_period_start, DEFAULT_NIGHT_PERIOD_START),
        )
    }

    pub fn period_at(&self, timestamp: NaiveDateTime) -> SchedulePeriod {
        if self.day_period().contains(minute_of_day(timestamp)) {
            SchedulePeriod::Day
        } else {
            SchedulePeriod::Night
        }
    }

    pub fn setpoint_for_period(&self, period: SchedulePeriod) -> f64 {
        match period {
            SchedulePeriod::Day => setpoint_or_default(self.day_setpoint, DEFAULT_DAY_SETPOINT_F),
            SchedulePeriod::Night => {
                setpoint_or_default(self.night_setpoint, DEFAULT_NIGHT_SETPOINT_F)
            }
        }
    }
}

/// Indoor setpoint (deg F) in force at the given local time
pub fn get_setpoint_for_hour(schedule: &ThermostatSchedule, timestamp: NaiveDateTime) -> f64 {
    schedule.setpoint_for_period(schedule.period_at(timestamp))
}
