//! Resource observation (RFC 7641).
//!
//! A GET carrying `Observe: 0` registers the requester, `Observe: 1` cancels
//! the registration. Every change to an observed resource produces one
//! non-confirmable 2.05 notification per observer, echoing the observer's
//! token and a fresh sequence number.

use std::collections::BTreeMap;
use std::net::SocketAddr;

use coap_lite::{CoapOption, MessageType, Packet};

use crate::error::CoapError;
use crate::handler::Reply;

/// Observe option value that registers an observer.
pub const REGISTER: u32 = 0;

/// Observe option value that cancels a registration.
pub const DEREGISTER: u32 = 1;

/// Observe sequence numbers are 24-bit.
const SEQUENCE_MASK: u32 = 0x00FF_FFFF;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Observer {
    peer: SocketAddr,
    token: Vec<u8>,
}

/// Observers per resource path.
#[derive(Debug, Default)]
pub struct Observers {
    by_path: BTreeMap<String, Vec<Observer>>,
    sequence: u32,
    next_message_id: u16,
}

impl Observers {
    /// Register `peer` on `path` and return the sequence number to put in the
    /// registration response. Registering twice with the same token keeps a
    /// single entry.
    pub fn register(&mut self, path: &str, peer: SocketAddr, token: &[u8]) -> u32 {
        let observer = Observer {
            peer,
            token: token.to_vec(),
        };
        let observers = self.by_path.entry(path.to_string()).or_default();
        if !observers.contains(&observer) {
            observers.push(observer);
            tracing::info!(path, %peer, "observer registered");
        }
        self.sequence
    }

    pub fn deregister(&mut self, path: &str, peer: SocketAddr, token: &[u8]) {
        if let Some(observers) = self.by_path.get_mut(path) {
            observers.retain(|observer| observer.peer != peer || observer.token != token);
            tracing::info!(path, %peer, "observer removed");
        }
        self.by_path.retain(|_, observers| !observers.is_empty());
    }

    /// Drop every registration of `peer`, as after it rejected a
    /// notification with RST.
    pub fn forget_peer(&mut self, peer: SocketAddr) {
        for observers in self.by_path.values_mut() {
            observers.retain(|observer| observer.peer != peer);
        }
        self.by_path.retain(|_, observers| !observers.is_empty());
    }

    #[must_use]
    pub fn count(&self, path: &str) -> usize {
        self.by_path.get(path).map_or(0, Vec::len)
    }

    /// Encode one notification of `reply` per observer of `path`.
    pub fn notify(&mut self, path: &str, reply: &Reply) -> Vec<(SocketAddr, Vec<u8>)> {
        let Some(observers) = self.by_path.get(path) else {
            return Vec::new();
        };
        self.sequence = (self.sequence + 1) & SEQUENCE_MASK;
        let mut notifications = Vec::with_capacity(observers.len());
        for observer in observers {
            self.next_message_id = self.next_message_id.wrapping_add(1);
            let mut packet = Packet::new();
            packet.header.set_type(MessageType::NonConfirmable);
            packet.header.message_id = self.next_message_id;
            packet.set_token(observer.token.clone());
            packet.add_option(CoapOption::Observe, encode_value(self.sequence));
            reply.clone().fill(&mut packet);
            match packet.to_bytes() {
                Ok(bytes) => notifications.push((observer.peer, bytes)),
                Err(err) => {
                    tracing::warn!(
                        peer = %observer.peer,
                        error = %CoapError::Encode(err),
                        "dropping notification"
                    );
                }
            }
        }
        tracing::debug!(path, count = notifications.len(), "observers notified");
        notifications
    }
}

/// Read the Observe option of `packet`, if any.
#[must_use]
pub fn observe_value(packet: &Packet) -> Option<u32> {
    let value = packet.get_option(CoapOption::Observe)?.iter().next()?;
    Some(
        value
            .iter()
            .fold(0u32, |acc, byte| (acc << 8) | u32::from(*byte)),
    )
}

/// Minimal big-endian encoding of an option integer; zero is empty.
#[must_use]
pub fn encode_value(value: u32) -> Vec<u8> {
    value
        .to_be_bytes()
        .into_iter()
        .skip_while(|byte| *byte == 0)
        .collect()
}
