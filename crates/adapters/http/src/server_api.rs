//! REST client for the IoT device-management backend.

use std::sync::{PoisonError, RwLock};

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use iotlab_app::ports::ThingApi;
use iotlab_domain::error::{LabError, StatusError, ValidationError};
use iotlab_domain::id::{TelemetryId, ThingId};
use iotlab_domain::rpc::RpcCommand;
use iotlab_domain::telemetry::{TelemetryEntry, TelemetryPoint, TimeRange};
use iotlab_domain::thing::{AccessToken, Thing, ThingDraft};

use crate::config::HttpConfig;
use crate::error::HttpError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    auth_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
}

/// Session-holding client for the backend.
///
/// Every request carries `Accept: application/json`. The session token
/// obtained by [`login`](ThingApi::login) is kept for the lifetime of the
/// client and attached to every user-scoped call.
pub struct ServerApi {
    client: reqwest::Client,
    base_url: String,
    auth_token: RwLock<Option<String>>,
}

impl ServerApi {
    /// Build a client for the backend at `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Request`] if the underlying client cannot be built.
    pub fn new(config: &HttpConfig) -> Result<Self, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_token: RwLock::new(None),
        })
    }

    /// Whether [`login`](ThingApi::login) has succeeded.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.auth_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn session_token(&self) -> Result<String, HttpError> {
        self.auth_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(HttpError::NotLoggedIn)
    }

    /// Start a user-scoped request.
    fn session_request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> Result<RequestBuilder, HttpError> {
        let token = self.session_token()?;
        Ok(self
            .client
            .request(method, self.url(path))
            .bearer_auth(token))
    }

    /// Start a device-scoped request.
    fn device_request(
        &self,
        method: reqwest::Method,
        path: &str,
        token: &AccessToken,
    ) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(token.as_str())
    }

    /// Send and read the whole body.
    async fn send(request: RequestBuilder) -> Result<(StatusCode, String), HttpError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(status = status.as_u16(), body_len = body.len(), "response received");
        Ok((status, body))
    }

    /// Send, require a 2xx status, and decode the JSON body.
    async fn expect_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, HttpError> {
        let (status, body) = Self::send(request).await?;
        StatusError::check(status.as_u16(), &body)?;
        serde_json::from_str(&body).map_err(HttpError::Decode)
    }

    /// Like [`expect_json`](Self::expect_json) but a 404 yields `None`.
    async fn expect_json_or_missing<T: DeserializeOwned>(
        request: RequestBuilder,
    ) -> Result<Option<T>, HttpError> {
        let (status, body) = Self::send(request).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        StatusError::check(status.as_u16(), &body)?;
        serde_json::from_str(&body).map(Some).map_err(HttpError::Decode)
    }
}

impl ThingApi for ServerApi {
    #[tracing::instrument(skip(self, password))]
    async fn login(&self, username: &str, password: &str) -> Result<(), LabError> {
        if username.is_empty() {
            return Err(ValidationError::MissingCredential("username").into());
        }
        if password.is_empty() {
            return Err(ValidationError::MissingCredential("password").into());
        }
        let request = self
            .client
            .post(self.url("/login"))
            .json(&serde_json::json!({"username": username, "password": password}));
        let LoginResponse { auth_token } = Self::expect_json(request).await?;
        *self
            .auth_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(auth_token);
        tracing::info!("logged in");
        Ok(())
    }

    #[tracing::instrument(skip(self, draft), fields(name = %draft.name))]
    async fn create_thing(&self, draft: &ThingDraft) -> Result<Thing, LabError> {
        draft.validate()?;
        let request = self
            .session_request(reqwest::Method::POST, "/thing")?
            .json(draft);
        Ok(Self::expect_json(request).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn get_thing(&self, id: ThingId) -> Result<Thing, LabError> {
        let request = self.session_request(reqwest::Method::GET, &format!("/thing/{id}"))?;
        Ok(Self::expect_json(request).await?)
    }

    #[tracing::instrument(skip(self, draft), fields(name = %draft.name))]
    async fn update_thing(&self, id: ThingId, draft: &ThingDraft) -> Result<Thing, LabError> {
        draft.validate()?;
        let request = self
            .session_request(reqwest::Method::PUT, &format!("/thing/{id}"))?
            .json(draft);
        Ok(Self::expect_json(request).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_thing(&self, id: ThingId) -> Result<(), LabError> {
        let request = self.session_request(reqwest::Method::DELETE, &format!("/thing/{id}"))?;
        let (status, body) = Self::send(request).await?;
        StatusError::check(status.as_u16(), &body)?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn client_token(&self, id: ThingId) -> Result<AccessToken, LabError> {
        let request =
            self.session_request(reqwest::Method::GET, &format!("/thing/{id}/token"))?;
        let TokenResponse { access_token } = Self::expect_json(request).await?;
        Ok(AccessToken::new(access_token))
    }

    #[tracing::instrument(skip(self, token, point), fields(metrics = point.len()))]
    async fn add_telemetry(
        &self,
        token: &AccessToken,
        point: &TelemetryPoint,
    ) -> Result<TelemetryEntry, LabError> {
        let request = self
            .device_request(reqwest::Method::POST, "/telemetry", token)
            .json(point);
        Ok(Self::expect_json(request).await?)
    }

    #[tracing::instrument(skip(self, token, point))]
    async fn update_telemetry(
        &self,
        token: &AccessToken,
        id: TelemetryId,
        point: &TelemetryPoint,
    ) -> Result<TelemetryEntry, LabError> {
        let request = self
            .device_request(reqwest::Method::PUT, &format!("/telemetry/{id}"), token)
            .json(point);
        Ok(Self::expect_json(request).await?)
    }

    #[tracing::instrument(skip(self, token))]
    async fn get_telemetry(
        &self,
        token: &AccessToken,
        range: TimeRange,
    ) -> Result<Vec<TelemetryEntry>, LabError> {
        let request = self
            .device_request(reqwest::Method::GET, "/telemetry", token)
            .query(&range.query());
        Ok(Self::expect_json_or_missing(request)
            .await?
            .unwrap_or_default())
    }

    #[tracing::instrument(skip(self))]
    async fn get_thing_telemetry(
        &self,
        id: ThingId,
        range: TimeRange,
    ) -> Result<Vec<TelemetryEntry>, LabError> {
        let request = self
            .session_request(reqwest::Method::GET, &format!("/thing/{id}/telemetry"))?
            .query(&range.query());
        Ok(Self::expect_json_or_missing(request)
            .await?
            .unwrap_or_default())
    }

    #[tracing::instrument(skip(self, command), fields(method = %command.method))]
    async fn send_rpc(
        &self,
        id: ThingId,
        command: &RpcCommand,
    ) -> Result<serde_json::Value, LabError> {
        command.validate()?;
        let request = self
            .session_request(reqwest::Method::POST, &format!("/rpc/{id}"))?
            .json(command);
        let response: serde_json::Value = Self::expect_json(request).await?;
        tracing::debug!(%response, "RPC accepted");
        Ok(response)
    }

    #[tracing::instrument(skip(self, token))]
    async fn receive_rpc(&self, token: &AccessToken) -> Result<Option<RpcCommand>, LabError> {
        let request = self.device_request(reqwest::Method::GET, "/rpc", token);
        let Some(value) = Self::expect_json_or_missing::<serde_json::Value>(request).await? else {
            return Ok(None);
        };
        let empty = value.is_null() || value.as_object().is_some_and(serde_json::Map::is_empty);
        if empty {
            return Ok(None);
        }
        let command = serde_json::from_value(value).map_err(HttpError::Decode)?;
        Ok(Some(command))
    }
}
