//! Command responder — acknowledges switch commands received over MQTT.

use iotlab_domain::error::LabError;
use iotlab_domain::rpc::{PrevState, RpcCommand};

use crate::ports::MessagePublisher;
use crate::topics::{ATTRIBUTES_TOPIC, RPC_REQUEST_FILTER, matches_filter};

/// Decode an RPC request published on `topic`.
///
/// Returns `None` for topics outside the RPC request filter and for payloads
/// that are not a JSON command.
#[must_use]
pub fn decode_request(topic: &str, payload: &[u8]) -> Option<RpcCommand> {
    if !matches_filter(RPC_REQUEST_FILTER, topic) {
        return None;
    }
    serde_json::from_slice(payload).ok()
}

/// Publishes one `prevState` attribute per `setValue` request.
pub struct CommandResponder<P> {
    publisher: P,
}

impl<P: MessagePublisher> CommandResponder<P> {
    pub fn new(publisher: P) -> Self {
        Self { publisher }
    }

    /// Handle one incoming message.
    ///
    /// A `setValue` request with a boolean parameter is answered on the
    /// attributes topic with the negated value and the published
    /// acknowledgement is returned. Every other message is ignored.
    ///
    /// # Errors
    ///
    /// Returns the publisher's error if the acknowledgement cannot be queued.
    #[tracing::instrument(skip(self, payload), fields(payload_len = payload.len()))]
    pub async fn on_message(
        &self,
        topic: &str,
        payload: &[u8],
    ) -> Result<Option<PrevState>, LabError> {
        let Some(command) = decode_request(topic, payload) else {
            tracing::debug!("ignoring message that is not an RPC request");
            return Ok(None);
        };
        let Some(ack) = PrevState::for_command(&command) else {
            tracing::debug!(method = %command.method, "ignoring RPC request");
            return Ok(None);
        };

        tracing::info!(status = %command.params, "current status of switch");
        let payload = serde_json::to_vec(&ack).map_err(|err| LabError::Transport(Box::new(err)))?;
        self.publisher.publish(ATTRIBUTES_TOPIC, payload).await?;
        Ok(Some(ack))
    }
}
