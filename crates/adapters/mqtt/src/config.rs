//! MQTT connection configuration.

use std::time::Duration;

use rumqttc::{MqttOptions, QoS};
use serde::Deserialize;

use iotlab_domain::error::{LabError, ValidationError};

use crate::error::MqttError;

/// Configuration for the broker connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// MQTT client identifier. A random one is generated when empty.
    pub client_id: String,
    /// Device access token, sent as the MQTT user name.
    pub access_token: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Quality of service for subscriptions and publications (0, 1 or 2).
    pub qos: u8,
    /// Capacity of the request channel between client and event loop.
    pub channel_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "thingsboard.e-yantra.org".to_string(),
            broker_port: 1883,
            client_id: String::new(),
            access_token: String::new(),
            keep_alive_secs: 60,
            qos: 1,
            channel_capacity: 10,
        }
    }
}

impl MqttConfig {
    /// The configured quality of service.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::InvalidQos`] for values above 2.
    pub fn qos(&self) -> Result<QoS, MqttError> {
        match self.qos {
            0 => Ok(QoS::AtMostOnce),
            1 => Ok(QoS::AtLeastOnce),
            2 => Ok(QoS::ExactlyOnce),
            other => Err(MqttError::InvalidQos(other)),
        }
    }

    /// The client identifier to connect with.
    #[must_use]
    pub fn effective_client_id(&self) -> String {
        if self.client_id.is_empty() {
            format!("iotlab-{}", uuid::Uuid::new_v4().simple())
        } else {
            self.client_id.clone()
        }
    }

    /// Build `rumqttc` connection options.
    ///
    /// # Errors
    ///
    /// Returns [`MqttError::Domain`] when no access token is configured.
    pub fn options(&self) -> Result<MqttOptions, MqttError> {
        if self.access_token.is_empty() {
            return Err(LabError::from(ValidationError::MissingCredential("access token")).into());
        }
        let mut options = MqttOptions::new(
            self.effective_client_id(),
            self.broker_host.clone(),
            self.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(u64::from(self.keep_alive_secs)));
        options.set_credentials(self.access_token.clone(), String::new());
        Ok(options)
    }
}
