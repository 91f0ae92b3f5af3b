//! RPC commands exchanged with a thing, and the switch acknowledgement.

use serde::{Deserialize, Serialize};

use crate::error::{LabError, ValidationError};

/// Method name of the switch command handled by the RPC subscriber.
pub const SET_VALUE: &str = "setValue";

/// A named remote command with an arbitrary JSON parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcCommand {
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl RpcCommand {
    /// Build a command after checking the method is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyMethod`] for an empty method name.
    pub fn new(
        method: impl Into<String>,
        params: impl Into<serde_json::Value>,
    ) -> Result<Self, LabError> {
        let command = Self {
            method: method.into(),
            params: params.into(),
        };
        command.validate()?;
        Ok(command)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyMethod`] for an empty method name.
    pub fn validate(&self) -> Result<(), LabError> {
        if self.method.is_empty() {
            return Err(ValidationError::EmptyMethod.into());
        }
        Ok(())
    }

    /// The requested switch state when this is a `setValue` command with a
    /// boolean parameter.
    #[must_use]
    pub fn requested_switch_state(&self) -> Option<bool> {
        if self.method != SET_VALUE {
            return None;
        }
        self.params.as_bool()
    }
}

/// Attribute published in reply to a `setValue` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrevState {
    pub prev_state: bool,
}

impl PrevState {
    /// The acknowledgement for `command`, if it is a switch command.
    ///
    /// The previous state is the negation of the requested one.
    #[must_use]
    pub fn for_command(command: &RpcCommand) -> Option<Self> {
        command
            .requested_switch_state()
            .map(|requested| Self {
                prev_state: !requested,
            })
    }
}
