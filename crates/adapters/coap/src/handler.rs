//! Request dispatch onto the sensor tree.

use coap_lite::{
    CoapOption, CoapResponse, ContentFormat, MessageClass, Packet, RequestType, ResponseType,
};

use iotlab_domain::sensor::{Deletion, ResourceError, SENSOR_PATH, SensorTree, normalize_path};

/// Resource discovery path (RFC 6690).
pub const WELL_KNOWN_CORE: &str = ".well-known/core";

/// Largest request payload stored; bigger PUT/POST bodies get 4.13 so every
/// stored payload still fits in a response.
pub const MAX_PAYLOAD: usize = 1024;

/// A response, independent of the message it answers.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: ResponseType,
    pub payload: Vec<u8>,
    pub content_format: Option<ContentFormat>,
    /// Path of a created resource, sent as `Location-Path` options.
    pub location: Option<String>,
}

impl Reply {
    fn status(status: ResponseType) -> Self {
        Self {
            status,
            payload: Vec::new(),
            content_format: None,
            location: None,
        }
    }

    fn text(status: ResponseType, payload: &str) -> Self {
        Self {
            payload: payload.as_bytes().to_vec(),
            content_format: Some(ContentFormat::TextPlain),
            ..Self::status(status)
        }
    }

    /// Copy the reply into a response slot.
    pub fn apply(self, response: &mut CoapResponse) {
        self.fill(&mut response.message);
    }

    /// Write code, options and payload into `message`.
    pub(crate) fn fill(self, message: &mut Packet) {
        message.header.code = MessageClass::Response(self.status);
        if let Some(format) = self.content_format {
            message.set_content_format(format);
        }
        if let Some(location) = self.location {
            for segment in location.split('/') {
                message.add_option(CoapOption::LocationPath, segment.as_bytes().to_vec());
            }
        }
        message.payload = self.payload;
    }
}

/// Owns the resource tree and answers requests against it.
#[derive(Debug, Default)]
pub struct SensorHandler {
    tree: SensorTree,
}

impl SensorHandler {
    #[must_use]
    pub fn new(tree: SensorTree) -> Self {
        Self { tree }
    }

    #[must_use]
    pub fn tree(&self) -> &SensorTree {
        &self.tree
    }

    /// Whether `path` names a resource that accepts observers.
    #[must_use]
    pub fn is_observable(&self, path: &str) -> bool {
        self.tree
            .read(path)
            .is_ok_and(|resource| resource.observable)
    }

    /// Answer one request.
    #[tracing::instrument(skip(self, payload), fields(payload_len = payload.len()))]
    pub fn handle(&mut self, method: &RequestType, path: &str, payload: &[u8]) -> Reply {
        let path = normalize_path(path);
        if path == WELL_KNOWN_CORE {
            return self.discover(method);
        }
        if !self.tree.contains(path) {
            tracing::debug!("unknown resource");
            return Reply::status(ResponseType::NotFound);
        }

        if payload.len() > MAX_PAYLOAD && matches!(method, RequestType::Put | RequestType::Post) {
            tracing::warn!(limit = MAX_PAYLOAD, "request payload too large");
            return Reply::status(ResponseType::RequestEntityTooLarge);
        }

        let result = match method {
            RequestType::Get => self.get(path),
            RequestType::Put => self.put(path, payload),
            RequestType::Post => self.post(path, payload),
            RequestType::Delete => self.delete(path),
            _ => return Reply::status(ResponseType::MethodNotAllowed),
        };
        result.unwrap_or_else(|err| match err {
            ResourceError::NotFound(_) => Reply::status(ResponseType::NotFound),
            ResourceError::ChildrenNotAllowed(_) => Reply::status(ResponseType::MethodNotAllowed),
        })
    }

    fn discover(&self, method: &RequestType) -> Reply {
        if *method != RequestType::Get {
            return Reply::status(ResponseType::MethodNotAllowed);
        }
        Reply {
            payload: self.tree.link_format().into_bytes(),
            content_format: Some(ContentFormat::ApplicationLinkFormat),
            ..Reply::status(ResponseType::Content)
        }
    }

    fn get(&self, path: &str) -> Result<Reply, ResourceError> {
        let resource = self.tree.read(path)?;
        Ok(Reply::text(ResponseType::Content, &resource.payload))
    }

    fn put(&mut self, path: &str, payload: &[u8]) -> Result<Reply, ResourceError> {
        let payload = String::from_utf8_lossy(payload).into_owned();
        let resource = self.tree.write(path, payload)?;
        tracing::info!(path, payload = %resource.payload, "resource updated");
        Ok(Reply::text(ResponseType::Changed, &resource.payload))
    }

    fn post(&mut self, path: &str, payload: &[u8]) -> Result<Reply, ResourceError> {
        let payload = String::from_utf8_lossy(payload).into_owned();
        let created = self.tree.create_child(path, payload)?;
        tracing::info!(path = %created, "resource created");
        Ok(Reply {
            location: Some(created),
            ..Reply::status(ResponseType::Created)
        })
    }

    fn delete(&mut self, path: &str) -> Result<Reply, ResourceError> {
        match self.tree.delete(path)? {
            Deletion::Removed => tracing::info!(path, "resource removed"),
            Deletion::Retained => {
                tracing::info!(path = SENSOR_PATH, "delete accepted, root resource kept");
            }
        }
        Ok(Reply::status(ResponseType::Deleted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> SensorHandler {
        SensorHandler::default()
    }

    #[test]
    fn should_return_blank_initial_payload() {
        let reply = handler().handle(&RequestType::Get, "sensor/", b"");
        assert_eq!(reply.status, ResponseType::Content);
        assert_eq!(reply.payload, b" ");
        assert_eq!(reply.content_format, Some(ContentFormat::TextPlain));
    }

    #[test]
    fn should_return_put_payload_on_next_get() {
        let mut handler = handler();

        let put = handler.handle(&RequestType::Put, "sensor", b"21.7");
        assert_eq!(put.status, ResponseType::Changed);
        assert_eq!(put.payload, b"21.7");

        let get = handler.handle(&RequestType::Get, "sensor/", b"");
        assert_eq!(get.payload, b"21.7");
    }

    #[test]
    fn should_create_child_with_location() {
        let mut handler = handler();

        let reply = handler.handle(&RequestType::Post, "sensor", b"child");
        assert_eq!(reply.status, ResponseType::Created);
        assert_eq!(reply.location.as_deref(), Some("sensor/1"));

        let get = handler.handle(&RequestType::Get, "sensor/1", b"");
        assert_eq!(get.payload, b"child");
    }

    #[test]
    fn should_refuse_post_on_child() {
        let mut handler = handler();
        handler.handle(&RequestType::Post, "sensor", b"");

        let reply = handler.handle(&RequestType::Post, "sensor/1", b"");
        assert_eq!(reply.status, ResponseType::MethodNotAllowed);
    }

    #[test]
    fn should_delete_child_and_keep_root() {
        let mut handler = handler();
        handler.handle(&RequestType::Post, "sensor", b"");

        let child = handler.handle(&RequestType::Delete, "sensor/1", b"");
        assert_eq!(child.status, ResponseType::Deleted);
        assert!(!handler.tree().contains("sensor/1"));

        let root = handler.handle(&RequestType::Delete, "sensor", b"");
        assert_eq!(root.status, ResponseType::Deleted);
        assert!(handler.tree().contains("sensor"));
    }

    #[test]
    fn should_refuse_oversized_payload_and_keep_previous_one() {
        let mut handler = handler();
        handler.handle(&RequestType::Put, "sensor", b"20.0");
        let oversized = vec![b'9'; MAX_PAYLOAD + 1];

        let put = handler.handle(&RequestType::Put, "sensor", &oversized);
        assert_eq!(put.status, ResponseType::RequestEntityTooLarge);
        let post = handler.handle(&RequestType::Post, "sensor", &oversized);
        assert_eq!(post.status, ResponseType::RequestEntityTooLarge);

        assert_eq!(handler.tree().read("sensor").unwrap().payload, "20.0");
        assert!(!handler.tree().contains("sensor/1"));

        let largest = vec![b'9'; MAX_PAYLOAD];
        let put = handler.handle(&RequestType::Put, "sensor", &largest);
        assert_eq!(put.status, ResponseType::Changed);
    }

    #[test]
    fn should_only_let_root_be_observed() {
        let mut handler = handler();
        handler.handle(&RequestType::Post, "sensor", b"");

        assert!(handler.is_observable("sensor/"));
        assert!(!handler.is_observable("sensor/1"));
        assert!(!handler.is_observable("actuator"));
    }

    #[test]
    fn should_answer_unknown_path_with_not_found() {
        let reply = handler().handle(&RequestType::Get, "actuator", b"");
        assert_eq!(reply.status, ResponseType::NotFound);
    }

    #[test]
    fn should_answer_unsupported_method_with_method_not_allowed() {
        let reply = handler().handle(&RequestType::Fetch, "sensor", b"");
        assert_eq!(reply.status, ResponseType::MethodNotAllowed);
    }

    #[test]
    fn should_list_resources_on_well_known_core() {
        let reply = handler().handle(&RequestType::Get, "/.well-known/core", b"");
        assert_eq!(reply.status, ResponseType::Content);
        assert_eq!(reply.content_format, Some(ContentFormat::ApplicationLinkFormat));
        assert!(String::from_utf8(reply.payload).unwrap().starts_with("</sensor>"));

        let put = handler().handle(&RequestType::Put, WELL_KNOWN_CORE, b"x");
        assert_eq!(put.status, ResponseType::MethodNotAllowed);
    }
}
