//! Acknowledge `setValue` RPC requests until Ctrl-C.

use anyhow::Context;

use iotlab::config::Config;
use iotlab_app::services::command_responder::CommandResponder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    iotlab::logging::init(&config.logging);

    let (publisher, event_loop) =
        iotlab_adapter_mqtt::connect(&config.mqtt).context("failed to configure MQTT client")?;
    let responder = CommandResponder::new(publisher.clone());

    iotlab_adapter_mqtt::run_subscriber(
        &publisher,
        event_loop,
        &responder,
        iotlab::shutdown_signal(),
    )
    .await
    .context("RPC subscriber failed")?;
    Ok(())
}
