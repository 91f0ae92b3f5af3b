//! Thing API port — the REST surface of the IoT device-management backend.
//!
//! User-scoped operations authenticate with the session token obtained by
//! [`ThingApi::login`]; device-scoped operations take the thing's
//! [`AccessToken`] explicitly.

use std::future::Future;

use iotlab_domain::error::LabError;
use iotlab_domain::id::{TelemetryId, ThingId};
use iotlab_domain::rpc::RpcCommand;
use iotlab_domain::telemetry::{TelemetryEntry, TelemetryPoint, TimeRange};
use iotlab_domain::thing::{AccessToken, Thing, ThingDraft};

/// Client for the IoT backend.
///
/// Every failing call surfaces as [`LabError::Status`] carrying the HTTP
/// status and raw body, except the reads documented as treating 404 as an
/// empty result.
pub trait ThingApi {
    /// Authenticate the session.
    fn login(
        &self,
        username: &str,
        password: &str,
    ) -> impl Future<Output = Result<(), LabError>> + Send;

    /// Register a new thing.
    fn create_thing(
        &self,
        draft: &ThingDraft,
    ) -> impl Future<Output = Result<Thing, LabError>> + Send;

    /// Fetch a thing by id.
    fn get_thing(&self, id: ThingId) -> impl Future<Output = Result<Thing, LabError>> + Send;

    /// Replace name, type and description of a thing.
    fn update_thing(
        &self,
        id: ThingId,
        draft: &ThingDraft,
    ) -> impl Future<Output = Result<Thing, LabError>> + Send;

    /// Delete a thing.
    fn delete_thing(&self, id: ThingId) -> impl Future<Output = Result<(), LabError>> + Send;

    /// Fetch the device access token of a thing.
    fn client_token(
        &self,
        id: ThingId,
    ) -> impl Future<Output = Result<AccessToken, LabError>> + Send;

    /// Report telemetry as the thing owning `token`.
    fn add_telemetry(
        &self,
        token: &AccessToken,
        point: &TelemetryPoint,
    ) -> impl Future<Output = Result<TelemetryEntry, LabError>> + Send;

    /// Overwrite a previously reported telemetry entry.
    fn update_telemetry(
        &self,
        token: &AccessToken,
        id: TelemetryId,
        point: &TelemetryPoint,
    ) -> impl Future<Output = Result<TelemetryEntry, LabError>> + Send;

    /// Telemetry of the thing owning `token` within `range`.
    ///
    /// A 404 means "no data" and yields an empty list.
    fn get_telemetry(
        &self,
        token: &AccessToken,
        range: TimeRange,
    ) -> impl Future<Output = Result<Vec<TelemetryEntry>, LabError>> + Send;

    /// Telemetry of thing `id` within `range`.
    ///
    /// A 404 means "no data" and yields an empty list.
    fn get_thing_telemetry(
        &self,
        id: ThingId,
        range: TimeRange,
    ) -> impl Future<Output = Result<Vec<TelemetryEntry>, LabError>> + Send;

    /// Send a command to thing `id`, returning the server's record of it.
    fn send_rpc(
        &self,
        id: ThingId,
        command: &RpcCommand,
    ) -> impl Future<Output = Result<serde_json::Value, LabError>> + Send;

    /// Poll the next pending command for the thing owning `token`.
    ///
    /// A 404 means "nothing pending" and yields `None`.
    fn receive_rpc(
        &self,
        token: &AccessToken,
    ) -> impl Future<Output = Result<Option<RpcCommand>, LabError>> + Send;
}
