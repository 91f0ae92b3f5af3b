//! Serve the sensor resource tree over CoAP until Ctrl-C.

use anyhow::Context;

use iotlab::config::Config;
use iotlab_adapter_coap::CoapServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    iotlab::logging::init(&config.logging);

    let server = CoapServer::bind(&config.coap)
        .await
        .with_context(|| format!("failed to bind {}", config.coap.bind))?;
    server
        .run(iotlab::shutdown_signal())
        .await
        .context("CoAP server failed")?;
    Ok(())
}
