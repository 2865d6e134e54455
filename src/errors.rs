use thiserror::Error;

/// Errors at the boundary of the engine, i.e. while reading inputs or writing outputs.
/// The forecasting calculations themselves never fail on numeric input.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Request was considered invalid due to error: {0}")]
    InvalidRequest(#[from] serde_json::Error),
    #[error("Weather file could not be read: {0}")]
    InvalidWeatherFile(#[from] WeatherFileError),
    #[error("Error while writing forecast output: {0}")]
    ErrorInOutput(OutputError),
}

#[derive(Debug, Error)]
pub enum WeatherFileError {
    #[error("Could not parse CSV weather data: {0}")]
    Csv(#[from] csv::Error),
    #[error("Weather file has no '{column}' column")]
    MissingColumn { column: &'static str },
    #[error("Row {row} has an unparseable timestamp '{value}'")]
    BadTimestamp { row: usize, value: String },
    #[error("Row {row} has an unparseable number '{value}' in column '{column}'")]
    BadNumber {
        row: usize,
        column: &'static str,
        value: String,
    },
}

#[derive(Debug, Error)]
#[error(transparent)]
pub struct OutputError {
    error: anyhow::Error,
}

impl OutputError {
    pub(crate) fn new(error: anyhow::Error) -> Self {
        Self { error }
    }
}

impl From<OutputError> for ForecastError {
    fn from(value: OutputError) -> Self {
        ForecastError::ErrorInOutput(value)
    }
}
