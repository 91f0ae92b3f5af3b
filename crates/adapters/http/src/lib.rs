//! # iotlab-adapter-http
//!
//! HTTP adapter — `reqwest` implementations of the HTTP-facing ports.
//!
//! - [`ServerApi`] implements [`ThingApi`](iotlab_app::ports::ThingApi): one
//!   request per call against the IoT backend, with the session bearer token
//!   for user-scoped calls and the thing's access token for device-scoped
//!   calls.
//! - [`OpenWeatherClient`] implements
//!   [`WeatherSource`](iotlab_app::ports::WeatherSource) on top of the
//!   OpenWeatherMap current-weather endpoint.
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `iotlab-app` and `iotlab-domain`.

mod config;
mod error;
mod server_api;
mod weather;

pub use config::{HttpConfig, WeatherConfig};
pub use error::HttpError;
pub use server_api::ServerApi;
pub use weather::OpenWeatherClient;
