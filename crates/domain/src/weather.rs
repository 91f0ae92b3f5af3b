//! Weather reports and the flattened reading republished as telemetry.

use serde::{Deserialize, Serialize};

/// Offset between Kelvin and degrees Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

/// The subset of an OpenWeatherMap current-weather response we use.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherReport {
    pub main: MainBlock,
}

/// The `main` block of a weather report.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MainBlock {
    /// Temperature in Kelvin.
    pub temp: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
}

/// A flattened reading, published as `{"temperature": .., "humidity": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Percent.
    pub humidity: f64,
}

impl From<&WeatherReport> for SensorReading {
    fn from(report: &WeatherReport) -> Self {
        Self {
            temperature: report.main.temp - KELVIN_OFFSET,
            humidity: report.main.humidity,
        }
    }
}
