//! CoAP server configuration.

use std::net::{Ipv4Addr, SocketAddr};

use serde::Deserialize;

/// Default CoAP port (RFC 7252).
pub const DEFAULT_PORT: u16 = 5683;

/// Configuration for the CoAP server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoapConfig {
    /// UDP address to listen on.
    pub bind: SocketAddr,
}

impl Default for CoapConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
        }
    }
}
