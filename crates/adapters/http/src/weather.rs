//! OpenWeatherMap current-weather client.

use iotlab_app::ports::WeatherSource;
use iotlab_domain::error::{LabError, StatusError, ValidationError};
use iotlab_domain::weather::WeatherReport;

use crate::config::WeatherConfig;
use crate::error::HttpError;

/// Fetches the current weather of one city.
pub struct OpenWeatherClient {
    client: reqwest::Client,
    url: String,
    city: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Build a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Domain`] when no API key is configured and
    /// [`HttpError::Request`] if the underlying client cannot be built.
    pub fn new(config: &WeatherConfig) -> Result<Self, HttpError> {
        if config.api_key.is_empty() {
            return Err(LabError::from(ValidationError::MissingCredential("weather api key")).into());
        }
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            url: config.url.clone(),
            city: config.city.clone(),
            api_key: config.api_key.clone(),
        })
    }

    async fn fetch_report(&self) -> Result<WeatherReport, HttpError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("q", self.city.as_str()), ("appid", self.api_key.as_str())])
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        StatusError::check(status, &body)?;
        serde_json::from_str(&body).map_err(HttpError::Decode)
    }
}

impl WeatherSource for OpenWeatherClient {
    #[tracing::instrument(skip(self), fields(city = %self.city))]
    async fn fetch(&self) -> Result<WeatherReport, LabError> {
        Ok(self.fetch_report().await?)
    }
}
