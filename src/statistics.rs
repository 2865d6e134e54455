/// A simple statistics module with summary statistics over a set of temperatures.
use statrs::statistics::Statistics;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TemperatureStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Min, max and mean of a set of temperatures, or None if there are none.
pub fn temperature_stats(temperatures: &[f64]) -> Option<TemperatureStats> {
    if temperatures.is_empty() {
        return None;
    }

    Some(TemperatureStats {
        min: Statistics::min(temperatures),
        max: Statistics::max(temperatures),
        mean: Statistics::mean(temperatures),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::*;

    #[rstest]
    fn test_temperature_stats() {
        let stats = temperature_stats(&[30., 40., 50., 20.]).unwrap();
        assert_eq!(stats.min, 20.);
        assert_eq!(stats.max, 50.);
        assert_relative_eq!(stats.mean, 35.);
    }

    #[rstest]
    fn test_temperature_stats_empty() {
        assert!(temperature_stats(&[]).is_none());
    }
}
