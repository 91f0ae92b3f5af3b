//! Publishing side of the broker connection.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, Outgoing, Packet, QoS};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use iotlab_app::ports::MessagePublisher;
use iotlab_domain::error::LabError;

use crate::config::MqttConfig;
use crate::error::MqttError;
use crate::subscriber::{Incoming, classify};

/// Pause before polling again after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// How long [`MqttPublisher::disconnect`] waits for the event loop to flush.
const DISCONNECT_GRACE: Duration = Duration::from_secs(5);

/// Cloneable handle that queues publications and subscriptions.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    qos: QoS,
}

/// Create the client handle and its event loop.
///
/// Nothing touches the network until the event loop is polled, either by
/// [`spawn_event_loop`] or by [`run_subscriber`](crate::run_subscriber).
///
/// # Errors
///
/// Returns [`MqttError`] when the configuration is invalid.
pub fn connect(config: &MqttConfig) -> Result<(MqttPublisher, EventLoop), MqttError> {
    let qos = config.qos()?;
    let options = config.options()?;
    tracing::info!(
        host = %config.broker_host,
        port = config.broker_port,
        "connecting to MQTT broker"
    );
    let (client, event_loop) = AsyncClient::new(options, config.channel_capacity);
    Ok((MqttPublisher { client, qos }, event_loop))
}

/// Drive `event_loop` in a background task until a disconnect is sent.
///
/// Connection errors are logged and polling resumes after a short pause,
/// which makes `rumqttc` reconnect.
pub fn spawn_event_loop(event_loop: EventLoop) -> JoinHandle<()> {
    tokio::spawn(drive(event_loop, None))
}

/// Like [`spawn_event_loop`], but also forwards every CONNACK and incoming
/// message to `forward`.
///
/// The channel is unbounded so the task never waits on its consumer: the
/// consumer queues requests that only this task can flush.
pub(crate) fn spawn_forwarding_event_loop(
    event_loop: EventLoop,
    forward: mpsc::UnboundedSender<Incoming>,
) -> JoinHandle<()> {
    tokio::spawn(drive(event_loop, Some(forward)))
}

async fn drive(mut event_loop: EventLoop, forward: Option<mpsc::UnboundedSender<Incoming>>) {
    tracing::debug!("MQTT event loop started");
    loop {
        let event = match event_loop.poll().await {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, "MQTT connection error");
                tokio::time::sleep(RECONNECT_DELAY).await;
                continue;
            }
        };
        match &event {
            Event::Incoming(Packet::ConnAck(ack)) => {
                tracing::info!(code = ?ack.code, "connected to MQTT broker");
            }
            Event::Outgoing(Outgoing::Disconnect) => {
                tracing::info!("disconnected from MQTT broker");
                break;
            }
            notification => {
                tracing::trace!(?notification, "MQTT notification");
            }
        }
        if let Some(forward) = &forward {
            let incoming = classify(&event);
            if incoming != Incoming::Other && forward.send(incoming).is_err() {
                tracing::debug!("MQTT event consumer is gone");
            }
        }
    }
}

impl MqttPublisher {
    /// Quality of service used for every request.
    #[must_use]
    pub fn qos(&self) -> QoS {
        self.qos
    }

    /// Subscribe to `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::Client`] if the request cannot be queued.
    pub async fn subscribe(&self, filter: &str) -> Result<(), MqttError> {
        self.client.subscribe(filter.to_string(), self.qos).await?;
        tracing::info!(filter, "subscribed");
        Ok(())
    }

    /// Queue a disconnect and wait for `event_loop` to finish sending it.
    ///
    /// The task is aborted if the broker was never reachable.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError`] if the disconnect cannot be queued or the task
    /// panicked.
    pub async fn disconnect(&self, event_loop: JoinHandle<()>) -> Result<(), MqttError> {
        self.client.disconnect().await?;
        let abort = event_loop.abort_handle();
        match tokio::time::timeout(DISCONNECT_GRACE, event_loop).await {
            Ok(joined) => joined.map_err(MqttError::EventLoop),
            Err(_) => {
                tracing::warn!("MQTT event loop did not stop in time");
                abort.abort();
                Ok(())
            }
        }
    }
}

impl MessagePublisher for MqttPublisher {
    #[tracing::instrument(skip(self, payload), fields(payload_len = payload.len()))]
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), LabError> {
        self.client
            .publish(topic.to_string(), self.qos, false, payload)
            .await
            .map_err(MqttError::from)?;
        tracing::debug!("published");
        Ok(())
    }
}
