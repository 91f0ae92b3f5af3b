//! # iotlab-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `ThingApi` — the IoT backend REST surface (things, telemetry, RPC)
//!   - `MessagePublisher` — publish a payload on a broker topic
//!   - `WeatherSource` — fetch one current weather report
//! - Define **use cases** as service structs generic over those ports:
//!   - `AssignmentService` — the two scripted REST scenarios
//!   - `TelemetryPublisher` — poll the weather, republish as telemetry
//!   - `CommandResponder` — acknowledge `setValue` RPC requests
//! - Own the MQTT topic names shared by publisher and subscriber
//!
//! ## Dependency rule
//! Depends on `iotlab-domain` only (plus `tokio` for timers and `select!`).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;
pub mod topics;
