//! UDP front end of the resource server.

use std::future::Future;
use std::net::SocketAddr;

use coap_lite::{CoapOption, CoapRequest, MessageType, Packet, RequestType, ResponseType};
use tokio::net::UdpSocket;

use iotlab_domain::sensor::normalize_path;

use crate::config::CoapConfig;
use crate::error::CoapError;
use crate::handler::SensorHandler;
use crate::observe::{DEREGISTER, Observers, REGISTER, encode_value, observe_value};

/// Receive buffer size; any UDP datagram fits, so nothing is truncated.
const MAX_DATAGRAM: usize = 65_535;

/// Single-task CoAP server owning its handler and observers.
pub struct CoapServer {
    socket: UdpSocket,
    handler: SensorHandler,
    observers: Observers,
    notifications: Vec<(SocketAddr, Vec<u8>)>,
}

impl CoapServer {
    /// Bind the configured address with a fresh sensor tree.
    ///
    /// # Errors
    ///
    /// Returns [`CoapError::Io`] if the address cannot be bound.
    pub async fn bind(config: &CoapConfig) -> Result<Self, CoapError> {
        let socket = UdpSocket::bind(config.bind).await?;
        tracing::info!(addr = %socket.local_addr()?, "CoAP server listening");
        Ok(Self {
            socket,
            handler: SensorHandler::default(),
            observers: Observers::default(),
            notifications: Vec::new(),
        })
    }

    /// Address actually bound, useful with port 0.
    ///
    /// # Errors
    ///
    /// Returns [`CoapError::Io`] if the socket cannot report it.
    pub fn local_addr(&self) -> Result<SocketAddr, CoapError> {
        Ok(self.socket.local_addr()?)
    }

    #[must_use]
    pub fn handler(&self) -> &SensorHandler {
        &self.handler
    }

    #[must_use]
    pub fn observers(&self) -> &Observers {
        &self.observers
    }

    /// Decode one datagram, answer it and encode the response.
    ///
    /// Returns `None` for malformed datagrams and for messages that do not
    /// expect a response (ACK, RST). A RST cancels every observation of its
    /// sender. Notifications triggered by the request are queued for
    /// [`take_notifications`](Self::take_notifications).
    pub fn handle_datagram(&mut self, bytes: &[u8], peer: SocketAddr) -> Option<Vec<u8>> {
        let packet = match Packet::from_bytes(bytes) {
            Ok(packet) => packet,
            Err(err) => {
                tracing::warn!(%peer, error = %err, "dropping malformed datagram");
                return None;
            }
        };
        if packet.header.get_type() == MessageType::Reset {
            self.observers.forget_peer(peer);
        }
        let mut request = CoapRequest::from_packet(packet, peer);
        if request.response.is_none() {
            tracing::debug!(%peer, "ignoring message without response slot");
            return None;
        }
        let path = normalize_path(&request.get_path()).to_string();
        tracing::debug!(%peer, method = ?request.get_method(), %path, "request received");

        let is_get = matches!(request.get_method(), RequestType::Get);
        let is_put = matches!(request.get_method(), RequestType::Put);
        let reply = self
            .handler
            .handle(request.get_method(), &path, &request.message.payload);

        let mut sequence = None;
        if is_get && reply.status == ResponseType::Content {
            let token = request.message.get_token().to_vec();
            match observe_value(&request.message) {
                Some(REGISTER) if self.handler.is_observable(&path) => {
                    sequence = Some(self.observers.register(&path, peer, &token));
                }
                Some(DEREGISTER) => self.observers.deregister(&path, peer, &token),
                _ => {}
            }
        }
        if is_put && reply.status == ResponseType::Changed && self.observers.count(&path) > 0 {
            let current = self.handler.handle(&RequestType::Get, &path, &[]);
            let sent = self.observers.notify(&path, &current);
            self.notifications.extend(sent);
        }

        let response = request.response.as_mut()?;
        reply.apply(response);
        if let Some(sequence) = sequence {
            response
                .message
                .add_option(CoapOption::Observe, encode_value(sequence));
        }

        match response.message.to_bytes() {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                tracing::warn!(%peer, error = %CoapError::Encode(err), "dropping response");
                None
            }
        }
    }

    /// Notifications queued since the last call, with their destinations.
    pub fn take_notifications(&mut self) -> Vec<(SocketAddr, Vec<u8>)> {
        std::mem::take(&mut self.notifications)
    }

    /// Serve datagrams one at a time until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Returns [`CoapError::Io`] if the socket fails.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<(), CoapError> {
        tokio::pin!(shutdown);
        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let (len, peer) = tokio::select! {
                biased;
                () = &mut shutdown => break,
                received = self.socket.recv_from(&mut buf) => received?,
            };
            if let Some(response) = self.handle_datagram(&buf[..len], peer) {
                self.socket.send_to(&response, peer).await?;
            }
            for (observer, notification) in self.take_notifications() {
                if let Err(err) = self.socket.send_to(&notification, observer).await {
                    tracing::warn!(%observer, error = %err, "failed to send notification");
                }
            }
        }
        tracing::info!("CoAP server stopped");
        Ok(())
    }
}
