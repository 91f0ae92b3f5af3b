//! # iotlab-adapter-mqtt
//!
//! MQTT adapter — connects to a ThingsBoard-style broker as a device.
//!
//! - [`MqttPublisher`] implements
//!   [`MessagePublisher`](iotlab_app::ports::MessagePublisher) on top of a
//!   `rumqttc` [`AsyncClient`](rumqttc::AsyncClient).
//! - [`spawn_event_loop`] drives the network in a background task for
//!   publish-only clients.
//! - [`run_subscriber`] drives the network in a background task too, renews
//!   the RPC request subscription on every CONNACK and hands requests to a
//!   [`CommandResponder`](iotlab_app::services::command_responder::CommandResponder).
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `iotlab-app` and `iotlab-domain`.

mod client;
mod config;
mod error;
mod subscriber;

pub use client::{MqttPublisher, connect, spawn_event_loop};
pub use config::MqttConfig;
pub use error::MqttError;
pub use subscriber::{Incoming, classify, run_subscriber};
