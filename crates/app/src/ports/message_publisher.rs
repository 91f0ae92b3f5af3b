//! Message publisher port — fire a payload at a broker topic.

use std::future::Future;

use iotlab_domain::error::LabError;

/// Publishes raw payloads to topics.
///
/// Quality of service and retain flags are adapter configuration, not part
/// of the call.
pub trait MessagePublisher {
    /// Queue `payload` for delivery on `topic`.
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), LabError>> + Send;
}

impl<T: MessagePublisher + Send + Sync> MessagePublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), LabError>> + Send {
        (**self).publish(topic, payload)
    }
}
