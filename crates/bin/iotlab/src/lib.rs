//! # iotlab — composition root
//!
//! Shared plumbing of the four binaries under `src/bin/`:
//!
//! - `rest_assignment` — log in and run both REST scenarios
//! - `weather_publisher` — republish the current weather as device telemetry
//! - `rpc_subscriber` — acknowledge `setValue` RPC requests
//! - `coap_server` — serve the sensor resource tree
//!
//! Each binary loads [`config::Config`], initialises logging, builds its
//! adapters, wires them into an `iotlab-app` service where there is one, and
//! runs until done or Ctrl-C. Nothing here knows about the wire formats.

pub mod config;
pub mod logging;

/// Resolve on Ctrl-C.
///
/// If the signal handler cannot be installed the error is logged and the
/// future resolves immediately, so long-running loops stop instead of
/// becoming unkillable.
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl-C, shutting down"),
        Err(err) => tracing::error!(error = %err, "failed to listen for Ctrl-C"),
    }
}
