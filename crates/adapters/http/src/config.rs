//! HTTP client configuration.

use serde::Deserialize;

/// Configuration for the IoT backend client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Base URL every request path is appended to.
    pub base_url: String,
    /// Login user name.
    pub username: String,
    /// Login password.
    pub password: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "https://apihptu.e-yantra.org/api".to_string(),
            username: String::new(),
            password: String::new(),
        }
    }
}

/// Configuration for the OpenWeatherMap client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Current-weather endpoint.
    pub url: String,
    /// City passed as `q`.
    pub city: String,
    /// API key passed as `appid`.
    pub api_key: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            url: "https://api.openweathermap.org/data/2.5/weather".to_string(),
            city: "kolkata".to_string(),
            api_key: String::new(),
        }
    }
}
