//! Sensor resource tree — the in-memory state served by the CoAP server.
//!
//! The tree has one fixed root (`sensor`) holding a mutable text payload.
//! The root allows children; each `create_child` call mounts a new nested
//! resource `sensor/<n>` with its own payload. There is no versioning and no
//! concurrency control: the last write wins.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::error::{LabError, NotFoundError, ValidationError};

/// Path of the root sensor resource.
pub const SENSOR_PATH: &str = "sensor";

/// Payload of a freshly mounted root resource.
pub const INITIAL_PAYLOAD: &str = " ";

/// Media type of every payload in the tree.
pub const CONTENT_TYPE: &str = "text/plain";

/// Errors raised by tree operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResourceError {
    #[error("no resource at {0}")]
    NotFound(String),

    #[error("resource {0} does not accept children")]
    ChildrenNotAllowed(String),
}

impl From<ResourceError> for LabError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::NotFound(path) => NotFoundError {
                entity: "Resource",
                id: path,
            }
            .into(),
            ResourceError::ChildrenNotAllowed(path) => {
                ValidationError::ChildrenNotAllowed { path }.into()
            }
        }
    }
}

/// One addressable resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub payload: String,
    pub resource_type: Option<&'static str>,
    pub interface_type: Option<&'static str>,
    pub observable: bool,
    pub allow_children: bool,
}

impl Resource {
    fn sensor() -> Self {
        Self {
            payload: INITIAL_PAYLOAD.to_string(),
            resource_type: Some("rt1"),
            interface_type: Some("if1"),
            observable: true,
            allow_children: true,
        }
    }

    fn child(payload: String) -> Self {
        Self {
            payload,
            resource_type: None,
            interface_type: None,
            observable: false,
            allow_children: false,
        }
    }
}

/// What a delete did to the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
    /// A child resource was unmounted.
    Removed,
    /// The root was addressed; the request is accepted but the root stays.
    Retained,
}

/// The resource tree rooted at [`SENSOR_PATH`].
#[derive(Debug, Clone)]
pub struct SensorTree {
    resources: BTreeMap<String, Resource>,
    next_child: u32,
}

impl Default for SensorTree {
    fn default() -> Self {
        let mut resources = BTreeMap::new();
        resources.insert(SENSOR_PATH.to_string(), Resource::sensor());
        Self {
            resources,
            next_child: 1,
        }
    }
}

/// Strip leading and trailing slashes so `sensor/` and `/sensor` address
/// the same resource.
#[must_use]
pub fn normalize_path(path: &str) -> &str {
    path.trim_matches('/')
}

impl SensorTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.resources.contains_key(normalize_path(path))
    }

    /// Read a resource.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] for unknown paths.
    pub fn read(&self, path: &str) -> Result<&Resource, ResourceError> {
        let path = normalize_path(path);
        self.resources
            .get(path)
            .ok_or_else(|| ResourceError::NotFound(path.to_string()))
    }

    /// Replace the payload of a resource.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] for unknown paths.
    pub fn write(&mut self, path: &str, payload: String) -> Result<&Resource, ResourceError> {
        let path = normalize_path(path);
        let resource = self
            .resources
            .get_mut(path)
            .ok_or_else(|| ResourceError::NotFound(path.to_string()))?;
        resource.payload = payload;
        Ok(resource)
    }

    /// Mount a new child under `parent` and return its path.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] for unknown parents and
    /// [`ResourceError::ChildrenNotAllowed`] when the parent is a leaf.
    pub fn create_child(&mut self, parent: &str, payload: String) -> Result<String, ResourceError> {
        let parent = normalize_path(parent);
        let resource = self.read(parent)?;
        if !resource.allow_children {
            return Err(ResourceError::ChildrenNotAllowed(parent.to_string()));
        }
        let path = format!("{parent}/{}", self.next_child);
        self.next_child += 1;
        self.resources.insert(path.clone(), Resource::child(payload));
        Ok(path)
    }

    /// Delete a resource. Deleting the root is accepted without effect.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::NotFound`] for unknown paths.
    pub fn delete(&mut self, path: &str) -> Result<Deletion, ResourceError> {
        let path = normalize_path(path);
        if path == SENSOR_PATH {
            return Ok(Deletion::Retained);
        }
        self.resources
            .remove(path)
            .map(|_| Deletion::Removed)
            .ok_or_else(|| ResourceError::NotFound(path.to_string()))
    }

    /// All mounted resources in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Resource)> {
        self.resources.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// CoRE link-format (RFC 6690) listing of every mounted resource.
    #[must_use]
    pub fn link_format(&self) -> String {
        let mut out = String::new();
        for (path, resource) in self.iter() {
            if !out.is_empty() {
                out.push(',');
            }
            let _ = write!(out, "</{path}>");
            if let Some(rt) = resource.resource_type {
                let _ = write!(out, ";rt=\"{rt}\"");
            }
            if let Some(interface) = resource.interface_type {
                let _ = write!(out, ";if=\"{interface}\"");
            }
            out.push_str(";ct=0");
            if resource.observable {
                out.push_str(";obs");
            }
        }
        out
    }
}
