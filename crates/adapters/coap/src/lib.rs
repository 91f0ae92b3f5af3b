//! # iotlab-adapter-coap
//!
//! CoAP adapter — serves the [`SensorTree`](iotlab_domain::sensor::SensorTree)
//! over UDP.
//!
//! - [`SensorHandler`] maps request methods and paths onto tree operations
//!   and CoAP response codes. It is pure and owns the tree.
//! - [`CoapServer`] receives one datagram at a time, decodes it with
//!   `coap-lite`, lets the handler fill the response and sends it back,
//!   followed by any notifications for [`Observers`] of the root resource.
//!
//! ## Dependency rule
//!
//! Depends on `iotlab-domain` only: the server has no use case beyond the
//! resource tree itself.

mod config;
mod error;
mod handler;
mod observe;
mod server;

pub use config::CoapConfig;
pub use error::CoapError;
pub use handler::{MAX_PAYLOAD, Reply, SensorHandler, WELL_KNOWN_CORE};
pub use observe::{DEREGISTER, Observers, REGISTER, encode_value, observe_value};
pub use server::CoapServer;
