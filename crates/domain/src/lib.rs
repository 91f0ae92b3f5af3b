//! # iotlab-domain
//!
//! Pure domain model for the iotlab clients and servers.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, wire timestamps
//! - Define **Things** (device records registered on the IoT backend)
//! - Define **Telemetry** (metric points, server entries, query ranges)
//! - Define **RPC commands** and the switch acknowledgement
//! - Define **Weather** reports and the flattened sensor reading
//! - Define the **Sensor** resource tree served over CoAP
//!
//! ## Dependency rule
//! No workspace dependencies and no IO: only `chrono`, `serde`, `serde_json`
//! and `thiserror`. Sockets, HTTP and MQTT live behind the port traits of
//! `iotlab-app`.

pub mod error;
pub mod id;
pub mod time;

pub mod rpc;
pub mod sensor;
pub mod telemetry;
pub mod thing;
pub mod weather;
