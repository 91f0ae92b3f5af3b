//! HTTP adapter error types.

use iotlab_domain::error::{LabError, StatusError};

/// Errors specific to the HTTP adapter.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The request could not be sent or the body could not be read.
    #[error("HTTP request failed")]
    Request(#[from] reqwest::Error),

    /// The response body is not the JSON we expected.
    #[error("failed to decode response body")]
    Decode(#[source] serde_json::Error),

    /// The server answered with a non-2xx status.
    #[error(transparent)]
    Status(#[from] StatusError),

    /// A user-scoped call was made before `login`.
    #[error("not logged in")]
    NotLoggedIn,

    /// A domain-level error (validation, not-found, etc.).
    #[error("domain error")]
    Domain(#[source] LabError),
}

impl HttpError {
    /// Convert into a [`LabError`] for propagation across port boundaries.
    ///
    /// Status and session errors keep their own variants, transport failures
    /// are boxed into [`LabError::Transport`].
    #[must_use]
    pub fn into_domain(self) -> LabError {
        match self {
            Self::Domain(err) => err,
            Self::Status(err) => LabError::Status(err),
            Self::NotLoggedIn => LabError::NotLoggedIn,
            other => LabError::Transport(Box::new(other)),
        }
    }
}

impl From<HttpError> for LabError {
    fn from(err: HttpError) -> Self {
        err.into_domain()
    }
}

impl From<LabError> for HttpError {
    fn from(err: LabError) -> Self {
        Self::Domain(err)
    }
}
