//! MQTT adapter error types.

use iotlab_domain::error::LabError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The configured quality of service is not 0, 1 or 2.
    #[error("invalid MQTT QoS {0}")]
    InvalidQos(u8),

    /// The rumqttc client could not queue a request.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// The event loop task could not be joined.
    #[error("MQTT event loop task failed")]
    EventLoop(#[source] tokio::task::JoinError),

    /// A domain-level error (validation, etc.).
    #[error("domain error")]
    Domain(#[source] LabError),
}

impl MqttError {
    /// Convert into a [`LabError`] for propagation across port boundaries.
    pub fn into_domain(self) -> LabError {
        match self {
            Self::Domain(err) => err,
            other => LabError::Transport(Box::new(other)),
        }
    }
}

impl From<MqttError> for LabError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}

impl From<LabError> for MqttError {
    fn from(err: LabError) -> Self {
        Self::Domain(err)
    }
}

impl From<rumqttc::ClientError> for MqttError {
    fn from(err: rumqttc::ClientError) -> Self {
        Self::Client(err)
    }
}
