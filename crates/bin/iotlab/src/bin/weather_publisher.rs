//! Republish the current weather as device telemetry until Ctrl-C.

use anyhow::Context;

use iotlab::config::Config;
use iotlab_adapter_http::OpenWeatherClient;
use iotlab_app::services::telemetry_publisher::TelemetryPublisher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    iotlab::logging::init(&config.logging);

    let source = OpenWeatherClient::new(&config.weather).context("failed to build weather client")?;
    let (publisher, event_loop) =
        iotlab_adapter_mqtt::connect(&config.mqtt).context("failed to configure MQTT client")?;
    let network = iotlab_adapter_mqtt::spawn_event_loop(event_loop);

    let telemetry = TelemetryPublisher::new(source, publisher.clone());
    let result = telemetry
        .run(config.publisher.interval(), iotlab::shutdown_signal())
        .await;

    publisher
        .disconnect(network)
        .await
        .context("failed to disconnect from MQTT broker")?;
    let published = result.context("telemetry publisher failed")?;
    tracing::info!(published, "weather publisher stopped");
    Ok(())
}
