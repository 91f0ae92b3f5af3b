//! Port traits implemented by the HTTP and MQTT adapters.
//!
//! Every method returns `impl Future + Send` and reports failures as
//! [`LabError`](iotlab_domain::error::LabError), so services never see
//! adapter error types.

pub mod message_publisher;
pub mod thing_api;
pub mod weather_source;

pub use message_publisher::MessagePublisher;
pub use thing_api::ThingApi;
pub use weather_source::WeatherSource;
