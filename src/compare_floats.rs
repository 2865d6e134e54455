pub fn min_of_2<T: PartialOrd + Copy>(first: T, second: T) -> T {
    if first < second {
        first
    } else {
        second
    }
}

pub fn max_of_2<T: PartialOrd + Copy>(first: T, second: T) -> T {
    if first > second {
        first
    } else {
        second
    }
}

/// Use the given value if it is a finite number, otherwise the default.
pub fn finite_or(value: f64, default: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        default
    }
}

/// As `finite_or`, but for values that must also be strictly positive.
pub fn positive_or(value: f64, default: f64) -> f64 {
    if value.is_finite() && value > 0. {
        value
    } else {
        default
    }
}

/// Clamp to the range [min, max], treating a non-finite value as the default.
pub fn clamp_finite(value: f64, min: f64, max: f64, default: f64) -> f64 {
    max_of_2(min, min_of_2(max, finite_or(value, default)))
}

/// A candidate value that is accepted only if it is finite and strictly positive.
pub fn valid_positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.)
}
