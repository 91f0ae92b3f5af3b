//! Telemetry publisher — polls a weather source and republishes readings.

use std::future::Future;
use std::time::Duration;

use iotlab_domain::error::LabError;
use iotlab_domain::weather::SensorReading;

use crate::ports::{MessagePublisher, WeatherSource};
use crate::topics::TELEMETRY_TOPIC;

/// Fetches one weather report per tick and publishes it as device telemetry.
pub struct TelemetryPublisher<W, P> {
    source: W,
    publisher: P,
}

impl<W: WeatherSource, P: MessagePublisher> TelemetryPublisher<W, P> {
    /// Create a publisher reading from `source` and writing to `publisher`.
    pub fn new(source: W, publisher: P) -> Self {
        Self { source, publisher }
    }

    /// Fetch one report, flatten it and publish it on the telemetry topic.
    ///
    /// # Errors
    ///
    /// Returns the fetch or publish error unchanged.
    pub async fn publish_once(&self) -> Result<SensorReading, LabError> {
        let report = self.source.fetch().await?;
        let reading = SensorReading::from(&report);
        tracing::info!(
            temperature_c = reading.temperature,
            humidity_pct = reading.humidity,
            "weather reading"
        );

        let payload =
            serde_json::to_vec(&reading).map_err(|err| LabError::Transport(Box::new(err)))?;
        self.publisher.publish(TELEMETRY_TOPIC, payload).await?;
        Ok(reading)
    }

    /// Publish every `interval` until `shutdown` resolves.
    ///
    /// Returns the number of readings published. The first failure ends the
    /// loop.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`publish_once`](Self::publish_once).
    pub async fn run(
        &self,
        interval: Duration,
        shutdown: impl Future<Output = ()>,
    ) -> Result<u64, LabError> {
        tokio::pin!(shutdown);
        let mut published = 0;
        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                result = self.publish_once() => {
                    result?;
                    published += 1;
                }
            }
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                () = tokio::time::sleep(interval) => {}
            }
        }
        tracing::info!(published, "telemetry publisher stopped");
        Ok(published)
    }
}
