//! CoAP adapter error types.

/// Errors specific to the CoAP adapter.
#[derive(Debug, thiserror::Error)]
pub enum CoapError {
    /// The UDP socket failed.
    #[error("CoAP socket error")]
    Io(#[from] std::io::Error),

    /// A response could not be encoded.
    #[error("failed to encode CoAP message")]
    Encode(#[source] coap_lite::error::MessageError),
}
