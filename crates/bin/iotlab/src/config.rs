//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `iotlab.toml` in the working directory. Every field has a
//! default so the file is optional; secrets default to empty and are checked
//! by the adapter that needs them. Environment variables take precedence
//! over file values.

use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

use iotlab_adapter_coap::CoapConfig;
use iotlab_adapter_http::{HttpConfig, WeatherConfig};
use iotlab_adapter_mqtt::MqttConfig;
use iotlab_app::services::assignment::AssignmentSettings;
use iotlab_domain::telemetry::TimeRange;

/// Name of the optional configuration file.
pub const CONFIG_FILE: &str = "iotlab.toml";

/// Filter used when `[logging] filter` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "iotlab=info,iotlab_app=info,iotlab_adapter_http=info,iotlab_adapter_mqtt=info,iotlab_adapter_coap=info";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// IoT backend REST client.
    pub rest: HttpConfig,
    /// REST scenario knobs.
    pub assignment: AssignmentConfig,
    /// OpenWeatherMap client.
    pub weather: WeatherConfig,
    /// Broker connection shared by publisher and subscriber.
    pub mqtt: MqttConfig,
    /// Telemetry publisher cadence.
    pub publisher: PublisherConfig,
    /// CoAP listener.
    pub coap: CoapConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// REST scenario configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AssignmentConfig {
    /// Telemetry rounds in the first scenario.
    pub rounds: u32,
    /// Seconds between sending telemetry and polling for a command.
    pub interval_secs: u64,
    /// Start of the range read back in the first scenario.
    pub telemetry_start: String,
    /// End of the range read back in the first scenario.
    pub telemetry_end: String,
    /// Start of the history range read in the second scenario.
    pub history_start: String,
    /// End of the history range read in the second scenario.
    pub history_end: String,
}

/// Telemetry publisher configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Seconds between two published readings.
    pub interval_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `iotlab.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(CONFIG_FILE)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("IOTLAB_REST_URL") {
            self.rest.base_url = val;
        }
        if let Some(val) = lookup("IOTLAB_USERNAME") {
            self.rest.username = val;
        }
        if let Some(val) = lookup("IOTLAB_PASSWORD") {
            self.rest.password = val;
        }
        if let Some(val) = lookup("IOTLAB_WEATHER_API_KEY") {
            self.weather.api_key = val;
        }
        if let Some(val) = lookup("IOTLAB_WEATHER_CITY") {
            self.weather.city = val;
        }
        if let Some(val) = lookup("IOTLAB_MQTT_HOST") {
            self.mqtt.broker_host = val;
        }
        if let Some(port) = lookup("IOTLAB_MQTT_PORT").and_then(|val| val.parse().ok()) {
            self.mqtt.broker_port = port;
        }
        if let Some(val) = lookup("IOTLAB_ACCESS_TOKEN") {
            self.mqtt.access_token = val;
        }
        if let Some(addr) = lookup("IOTLAB_COAP_BIND").and_then(|val| val.parse::<SocketAddr>().ok())
        {
            self.coap.bind = addr;
        }
        if let Some(val) = lookup("IOTLAB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let urls = [
            ("rest.base_url", &self.rest.base_url),
            ("weather.url", &self.weather.url),
        ];
        for (name, url) in urls {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Validation(format!(
                    "{name} must be an http(s) URL, got {url:?}"
                )));
            }
        }
        if self.mqtt.broker_port == 0 {
            return Err(ConfigError::Validation("mqtt.broker_port must be non-zero".to_string()));
        }
        if self.mqtt.qos > 2 {
            return Err(ConfigError::Validation(format!(
                "mqtt.qos must be 0, 1 or 2, got {}",
                self.mqtt.qos
            )));
        }
        if self.coap.bind.port() == 0 {
            return Err(ConfigError::Validation("coap.bind port must be non-zero".to_string()));
        }
        if self.publisher.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "publisher.interval_secs must be non-zero".to_string(),
            ));
        }
        self.assignment.settings()?;
        Ok(())
    }
}

impl AssignmentConfig {
    /// Settings for [`AssignmentService`](iotlab_app::services::assignment::AssignmentService).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when a range bound is malformed or
    /// a range is inverted.
    pub fn settings(&self) -> Result<AssignmentSettings, ConfigError> {
        let range = |start: &str, end: &str| {
            TimeRange::parse(start, end)
                .map_err(|err| ConfigError::Validation(format!("invalid time range: {err:?}")))
        };
        Ok(AssignmentSettings {
            rounds: self.rounds,
            interval: Duration::from_secs(self.interval_secs),
            telemetry_range: range(&self.telemetry_start, &self.telemetry_end)?,
            history_range: range(&self.history_start, &self.history_end)?,
        })
    }
}

impl PublisherConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            rounds: 5,
            interval_secs: 1,
            telemetry_start: "2020-02-19 00:00:00".to_string(),
            telemetry_end: "2022-02-19 16:45:00".to_string(),
            history_start: "2017-10-30 09:00:00".to_string(),
            history_end: "2021-06-10 17:00:00".to_string(),
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self { interval_secs: 10 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
