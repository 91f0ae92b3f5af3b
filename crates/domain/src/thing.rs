//! Thing — a device record registered on the IoT backend.

use serde::{Deserialize, Serialize};

use crate::error::{LabError, ValidationError};
use crate::id::ThingId;

/// A thing as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thing {
    pub id: ThingId,
    pub name: String,
    #[serde(default)]
    pub thing_type: String,
    #[serde(default)]
    pub description: String,
}

/// Per-thing credential used by device-scoped requests.
///
/// Distinct from the user session token. `Debug` is redacted.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// The client-supplied part of a thing, sent on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThingDraft {
    pub name: String,
    pub thing_type: String,
    pub description: String,
}

impl ThingDraft {
    /// Create a builder for constructing a [`ThingDraft`].
    #[must_use]
    pub fn builder() -> ThingDraftBuilder {
        ThingDraftBuilder::default()
    }

    /// Shortcut for a draft with only a name.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::Validation`] when `name` is empty.
    pub fn named(name: impl Into<String>) -> Result<Self, LabError> {
        Self::builder().name(name).build()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), LabError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`ThingDraft`].
#[derive(Debug, Default)]
pub struct ThingDraftBuilder {
    name: Option<String>,
    thing_type: Option<String>,
    description: Option<String>,
}

impl ThingDraftBuilder {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn thing_type(mut self, thing_type: impl Into<String>) -> Self {
        self.thing_type = Some(thing_type.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Consume the builder and produce a validated [`ThingDraft`].
    ///
    /// Type and description default to empty strings.
    ///
    /// # Errors
    ///
    /// Returns [`LabError::Validation`] when the name is missing or empty.
    pub fn build(self) -> Result<ThingDraft, LabError> {
        let draft = ThingDraft {
            name: self.name.unwrap_or_default(),
            thing_type: self.thing_type.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
        };
        draft.validate()?;
        Ok(draft)
    }
}
