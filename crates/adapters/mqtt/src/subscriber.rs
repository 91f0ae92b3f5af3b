//! RPC request subscriber loop.

use std::future::Future;

use rumqttc::{Event, EventLoop, Packet};
use tokio::sync::mpsc;

use iotlab_app::services::command_responder::CommandResponder;
use iotlab_app::topics::RPC_REQUEST_FILTER;

use crate::client::{MqttPublisher, spawn_forwarding_event_loop};
use crate::error::MqttError;

/// What the subscriber loop cares about in a broker event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A CONNACK; the subscription must be (re)issued.
    Connected,
    /// An application message.
    Message { topic: String, payload: Vec<u8> },
    /// Anything else.
    Other,
}

/// Reduce a `rumqttc` event to an [`Incoming`].
#[must_use]
pub fn classify(event: &Event) -> Incoming {
    match event {
        Event::Incoming(Packet::ConnAck(_)) => Incoming::Connected,
        Event::Incoming(Packet::Publish(publish)) => Incoming::Message {
            topic: String::from_utf8_lossy(publish.topic.as_ref()).into_owned(),
            payload: publish.payload.to_vec(),
        },
        _ => Incoming::Other,
    }
}

/// Run the RPC responder until `shutdown` resolves, then disconnect if a
/// connection was ever established.
///
/// `event_loop` is polled in its own task so that publications queued while
/// acknowledging a burst of requests are always flushed. Every CONNACK renews
/// the subscription to the RPC request topics, every message is handed to
/// `responder`.
///
/// # Errors
///
/// Returns [`MqttError`] if a subscription or the final disconnect cannot be
/// queued.
pub async fn run_subscriber(
    publisher: &MqttPublisher,
    event_loop: EventLoop,
    responder: &CommandResponder<MqttPublisher>,
    shutdown: impl Future<Output = ()>,
) -> Result<(), MqttError> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = spawn_forwarding_event_loop(event_loop, tx);

    tokio::pin!(shutdown);
    let mut connected = false;
    loop {
        let incoming = tokio::select! {
            biased;
            () = &mut shutdown => break,
            incoming = rx.recv() => incoming,
        };
        match incoming {
            Some(Incoming::Connected) => {
                connected = true;
                if let Err(err) = publisher.subscribe(RPC_REQUEST_FILTER).await {
                    handle.abort();
                    return Err(err);
                }
            }
            Some(Incoming::Message { topic, payload }) => {
                if let Err(err) = responder.on_message(&topic, &payload).await {
                    tracing::warn!(error = %err, %topic, "failed to acknowledge RPC request");
                }
            }
            Some(Incoming::Other) => {}
            None => {
                tracing::warn!("MQTT event loop stopped");
                return handle.await.map_err(MqttError::EventLoop);
            }
        }
    }

    tracing::info!("stopping RPC subscriber");
    if connected {
        publisher.disconnect(handle).await
    } else {
        handle.abort();
        Ok(())
    }
}
