//! Weather source port.

use std::future::Future;

use iotlab_domain::error::LabError;
use iotlab_domain::weather::WeatherReport;

/// Something that can produce the current weather.
pub trait WeatherSource {
    /// Fetch one report.
    fn fetch(&self) -> impl Future<Output = Result<WeatherReport, LabError>> + Send;
}
