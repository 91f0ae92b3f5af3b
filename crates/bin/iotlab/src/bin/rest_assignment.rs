//! Log in to the IoT backend and run both REST scenarios.

use anyhow::Context;

use iotlab::config::Config;
use iotlab_adapter_http::ServerApi;
use iotlab_app::ports::ThingApi;
use iotlab_app::services::assignment::AssignmentService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    iotlab::logging::init(&config.logging);

    let settings = config.assignment.settings()?;
    let api = ServerApi::new(&config.rest).context("failed to build REST client")?;
    api.login(&config.rest.username, &config.rest.password)
        .await
        .context("login failed")?;

    let service = AssignmentService::new(api, settings);

    let first = service
        .first_use_case()
        .await
        .context("first use case failed")?;
    tracing::info!(
        thing_id = %first.kept.id,
        name = %first.kept.name,
        deleted = %first.deleted,
        entries = first.telemetry.len(),
        commands = first.commands.len(),
        "first use case done"
    );

    let second = service
        .second_use_case(first.kept.id)
        .await
        .context("second use case failed")?;
    tracing::info!(
        entries = second.telemetry.len(),
        response = %second.rpc_response,
        "second use case done"
    );

    Ok(())
}
