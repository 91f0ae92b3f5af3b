//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`LabError`]
//! at port boundaries.

use std::error::Error as StdError;

/// Top-level error shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum LabError {
    /// A value failed a client-side check before any IO happened.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A requested resource does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The server answered with a non-2xx status.
    #[error(transparent)]
    Status(#[from] StatusError),

    /// A user-scoped request was attempted before logging in.
    #[error("not logged in")]
    NotLoggedIn,

    /// An adapter-level failure (network, broker, socket, decoding).
    #[error("transport error")]
    Transport(#[source] Box<dyn StdError + Send + Sync>),
}

/// Client-side validation failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("RPC method must not be empty")]
    EmptyMethod,

    #[error("time range start {start} is after end {end}")]
    InvertedRange { start: String, end: String },

    #[error("invalid timestamp {value:?}, expected YYYY-MM-DD HH:mm:ss")]
    InvalidTimestamp { value: String },

    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("resource {path} does not accept children")]
    ChildrenNotAllowed { path: String },
}

/// A lookup that found nothing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Failure derived from an HTTP status code.
///
/// Carries the exact status and the raw response body so callers can
/// inspect what the server said.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("Error {status}")]
pub struct StatusError {
    pub status: u16,
    pub body: String,
}

impl StatusError {
    /// Accept any status in `200..=299`, reject everything else.
    ///
    /// # Errors
    ///
    /// Returns a [`StatusError`] carrying `status` and `body` when the
    /// status is outside the 2xx range.
    pub fn check(status: u16, body: &str) -> Result<(), StatusError> {
        if status / 100 == 2 {
            return Ok(());
        }
        Err(StatusError {
            status,
            body: body.to_string(),
        })
    }
}
