//! Assignment service — the two scripted REST scenarios.
//!
//! The first scenario provisions things and streams telemetry from one of
//! them; the second reads a thing's history and sends it a command. Both are
//! straight-line sequences: the first failing call aborts the scenario and
//! its error is returned unchanged.

use std::time::Duration;

use iotlab_domain::error::LabError;
use iotlab_domain::id::ThingId;
use iotlab_domain::rpc::RpcCommand;
use iotlab_domain::telemetry::{TelemetryEntry, TelemetryPoint, TimeRange};
use iotlab_domain::thing::{AccessToken, Thing, ThingDraft};

use crate::ports::ThingApi;

/// Name of the thing created and then deleted.
pub const DISCARDED_NAME: &str = "Device1";
/// Name of the thing created and kept.
pub const KEPT_NAME: &str = "Device2";
/// Name the kept thing is renamed to.
pub const RENAMED_NAME: &str = "device-2";
/// Command sent by the second scenario.
pub const TAP_METHOD: &str = "setTap";

/// Knobs of the scenarios.
#[derive(Debug, Clone)]
pub struct AssignmentSettings {
    /// Number of telemetry rounds in the first scenario.
    pub rounds: u32,
    /// Pause between sending telemetry and polling for commands.
    pub interval: Duration,
    /// Range read back after every telemetry upload.
    pub telemetry_range: TimeRange,
    /// Range read by the second scenario.
    pub history_range: TimeRange,
}

/// Outcome of [`AssignmentService::first_use_case`].
#[derive(Debug, Clone)]
pub struct FirstUseCaseReport {
    /// The renamed thing.
    pub kept: Thing,
    /// Id of the thing that was deleted.
    pub deleted: ThingId,
    /// Access token of the kept thing.
    pub access_token: AccessToken,
    /// Telemetry of the kept thing as read after the last upload.
    pub telemetry: Vec<TelemetryEntry>,
    /// Commands received while polling, in arrival order.
    pub commands: Vec<RpcCommand>,
}

/// Outcome of [`AssignmentService::second_use_case`].
#[derive(Debug, Clone)]
pub struct SecondUseCaseReport {
    pub telemetry: Vec<TelemetryEntry>,
    pub rpc_response: serde_json::Value,
}

/// Runs the scenarios against a [`ThingApi`].
pub struct AssignmentService<A> {
    api: A,
    settings: AssignmentSettings,
}

impl<A: ThingApi> AssignmentService<A> {
    /// Create a new service driving the given API client.
    pub fn new(api: A, settings: AssignmentSettings) -> Self {
        Self { api, settings }
    }

    /// Access the underlying API client.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Create `Device1` and `Device2`, delete the first, rename the second to
    /// `device-2`, then for each round report `temperature = i*10` and
    /// `humidity = i*15`, read the telemetry back, wait the configured
    /// interval and poll for a command.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the API.
    #[tracing::instrument(skip(self), fields(rounds = self.settings.rounds))]
    pub async fn first_use_case(&self) -> Result<FirstUseCaseReport, LabError> {
        let discarded = self
            .api
            .create_thing(&ThingDraft::named(DISCARDED_NAME)?)
            .await?;
        let kept = self.api.create_thing(&ThingDraft::named(KEPT_NAME)?).await?;
        tracing::info!(discarded = %discarded.id, kept = %kept.id, "things created");

        self.api.delete_thing(discarded.id).await?;
        tracing::info!(thing_id = %discarded.id, "thing deleted");

        let kept = self
            .api
            .update_thing(kept.id, &ThingDraft::named(RENAMED_NAME)?)
            .await?;
        tracing::info!(thing_id = %kept.id, name = %kept.name, "thing renamed");

        let access_token = self.api.client_token(kept.id).await?;

        let mut telemetry = Vec::new();
        let mut commands = Vec::new();
        for round in 0..self.settings.rounds {
            let point = TelemetryPoint::new()
                .metric("temperature", f64::from(round * 10))
                .metric("humidity", f64::from(round * 15));
            self.api.add_telemetry(&access_token, &point).await?;

            telemetry = self
                .api
                .get_thing_telemetry(kept.id, self.settings.telemetry_range)
                .await?;
            tracing::info!(round, entries = telemetry.len(), "telemetry read back");

            tokio::time::sleep(self.settings.interval).await;

            if let Some(command) = self.api.receive_rpc(&access_token).await? {
                tracing::info!(method = %command.method, params = %command.params, "RPC received");
                commands.push(command);
            }
        }

        Ok(FirstUseCaseReport {
            kept,
            deleted: discarded.id,
            access_token,
            telemetry,
            commands,
        })
    }

    /// Read the history of `thing_id` and send it `setTap(true)`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by the API.
    #[tracing::instrument(skip(self))]
    pub async fn second_use_case(&self, thing_id: ThingId) -> Result<SecondUseCaseReport, LabError> {
        let telemetry = self
            .api
            .get_thing_telemetry(thing_id, self.settings.history_range)
            .await?;
        tracing::info!(entries = telemetry.len(), "history read");

        let command = RpcCommand::new(TAP_METHOD, true)?;
        let rpc_response = self.api.send_rpc(thing_id, &command).await?;
        tracing::info!(response = %rpc_response, "RPC sent");

        Ok(SecondUseCaseReport {
            telemetry,
            rpc_response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iotlab_domain::error::StatusError;
    use iotlab_domain::id::TelemetryId;
    use std::collections::{BTreeMap, HashMap, VecDeque};
    use std::sync::Mutex;

    #[derive(Default)]
    struct State {
        logged_in: bool,
        next_id: i64,
        things: BTreeMap<ThingId, Thing>,
        tokens: HashMap<String, ThingId>,
        telemetry: Vec<(ThingId, TelemetryEntry)>,
        pending: HashMap<ThingId, VecDeque<RpcCommand>>,
        sent: Vec<(ThingId, RpcCommand)>,
        fail_delete: bool,
    }

    /// In-memory stand-in for the backend.
    #[derive(Default)]
    struct InMemoryApi {
        state: Mutex<State>,
    }

    impl InMemoryApi {
        fn logged_in() -> Self {
            let api = Self::default();
            api.state.lock().unwrap().logged_in = true;
            api
        }

        fn session(&self) -> Result<std::sync::MutexGuard<'_, State>, LabError> {
            let state = self.state.lock().unwrap();
            if state.logged_in {
                Ok(state)
            } else {
                Err(LabError::NotLoggedIn)
            }
        }

        fn owner(state: &State, token: &AccessToken) -> Result<ThingId, LabError> {
            state
                .tokens
                .get(token.as_str())
                .copied()
                .ok_or_else(|| not_found().into())
        }

        fn entries_of(state: &State, id: ThingId) -> Vec<TelemetryEntry> {
            state
                .telemetry
                .iter()
                .filter(|(owner, _)| *owner == id)
                .map(|(_, entry)| entry.clone())
                .collect()
        }
    }

    fn not_found() -> StatusError {
        StatusError {
            status: 404,
            body: "{}".to_string(),
        }
    }

    fn entry(id: i64, point: &TelemetryPoint) -> TelemetryEntry {
        let mut values = serde_json::Map::new();
        for (name, value) in point.iter() {
            values.insert(name.to_string(), serde_json::json!(value));
        }
        TelemetryEntry {
            id: Some(TelemetryId::from_raw(id)),
            ts: None,
            values,
        }
    }

    impl ThingApi for InMemoryApi {
        async fn login(&self, _username: &str, _password: &str) -> Result<(), LabError> {
            self.state.lock().unwrap().logged_in = true;
            Ok(())
        }

        async fn create_thing(&self, draft: &ThingDraft) -> Result<Thing, LabError> {
            let mut state = self.session()?;
            state.next_id += 1;
            let thing = Thing {
                id: ThingId::from_raw(state.next_id),
                name: draft.name.clone(),
                thing_type: draft.thing_type.clone(),
                description: draft.description.clone(),
            };
            state.tokens.insert(format!("token-{}", thing.id), thing.id);
            state.things.insert(thing.id, thing.clone());
            Ok(thing)
        }

        async fn get_thing(&self, id: ThingId) -> Result<Thing, LabError> {
            let state = self.session()?;
            state.things.get(&id).cloned().ok_or_else(|| not_found().into())
        }

        async fn update_thing(&self, id: ThingId, draft: &ThingDraft) -> Result<Thing, LabError> {
            let mut state = self.session()?;
            let thing = state.things.get_mut(&id).ok_or_else(not_found)?;
            thing.name.clone_from(&draft.name);
            thing.thing_type.clone_from(&draft.thing_type);
            thing.description.clone_from(&draft.description);
            Ok(thing.clone())
        }

        async fn delete_thing(&self, id: ThingId) -> Result<(), LabError> {
            let mut state = self.session()?;
            if state.fail_delete {
                return Err(StatusError {
                    status: 500,
                    body: "boom".to_string(),
                }
                .into());
            }
            state.things.remove(&id).ok_or_else(not_found)?;
            state.telemetry.retain(|(owner, _)| *owner != id);
            state.tokens.retain(|_, owner| *owner != id);
            Ok(())
        }

        async fn client_token(&self, id: ThingId) -> Result<AccessToken, LabError> {
            let state = self.session()?;
            if !state.things.contains_key(&id) {
                return Err(not_found().into());
            }
            Ok(AccessToken::new(format!("token-{id}")))
        }

        async fn add_telemetry(
            &self,
            token: &AccessToken,
            point: &TelemetryPoint,
        ) -> Result<TelemetryEntry, LabError> {
            let mut state = self.state.lock().unwrap();
            let owner = Self::owner(&state, token)?;
            let id = i64::try_from(state.telemetry.len()).unwrap() + 1;
            let created = entry(id, point);
            state.telemetry.push((owner, created.clone()));
            Ok(created)
        }

        async fn update_telemetry(
            &self,
            token: &AccessToken,
            id: TelemetryId,
            point: &TelemetryPoint,
        ) -> Result<TelemetryEntry, LabError> {
            let mut state = self.state.lock().unwrap();
            let owner = Self::owner(&state, token)?;
            let slot = state
                .telemetry
                .iter_mut()
                .find(|(o, e)| *o == owner && e.id == Some(id))
                .ok_or_else(not_found)?;
            slot.1 = entry(id.as_i64(), point);
            Ok(slot.1.clone())
        }

        async fn get_telemetry(
            &self,
            token: &AccessToken,
            _range: TimeRange,
        ) -> Result<Vec<TelemetryEntry>, LabError> {
            let state = self.state.lock().unwrap();
            let owner = Self::owner(&state, token)?;
            Ok(Self::entries_of(&state, owner))
        }

        async fn get_thing_telemetry(
            &self,
            id: ThingId,
            _range: TimeRange,
        ) -> Result<Vec<TelemetryEntry>, LabError> {
            let state = self.session()?;
            Ok(Self::entries_of(&state, id))
        }

        async fn send_rpc(
            &self,
            id: ThingId,
            command: &RpcCommand,
        ) -> Result<serde_json::Value, LabError> {
            let mut state = self.session()?;
            state.sent.push((id, command.clone()));
            Ok(serde_json::json!({"thingId": id.as_i64(), "method": command.method}))
        }

        async fn receive_rpc(&self, token: &AccessToken) -> Result<Option<RpcCommand>, LabError> {
            let mut state = self.state.lock().unwrap();
            let owner = Self::owner(&state, token)?;
            Ok(state.pending.get_mut(&owner).and_then(VecDeque::pop_front))
        }
    }

    fn settings() -> AssignmentSettings {
        AssignmentSettings {
            rounds: 5,
            interval: Duration::ZERO,
            telemetry_range: TimeRange::parse("2020-02-19 00:00:00", "2022-02-19 16:45:00")
                .unwrap(),
            history_range: TimeRange::parse("2017-10-30 09:00:00", "2021-06-10 17:00:00")
                .unwrap(),
        }
    }

    #[tokio::test]
    async fn should_keep_five_entries_for_renamed_thing_and_none_for_deleted() {
        let service = AssignmentService::new(InMemoryApi::logged_in(), settings());

        let report = service.first_use_case().await.unwrap();

        assert_eq!(report.kept.name, RENAMED_NAME);
        assert_eq!(report.telemetry.len(), 5);
        let range = settings().telemetry_range;
        let kept = service.api().get_thing_telemetry(report.kept.id, range).await.unwrap();
        let deleted = service.api().get_thing_telemetry(report.deleted, range).await.unwrap();
        assert_eq!(kept.len(), 5);
        assert!(deleted.is_empty());
    }

    #[tokio::test]
    async fn should_report_scaled_round_values() {
        let service = AssignmentService::new(InMemoryApi::logged_in(), settings());

        let report = service.first_use_case().await.unwrap();

        let temperatures: Vec<f64> = report
            .telemetry
            .iter()
            .filter_map(|e| e.metric("temperature"))
            .collect();
        let humidities: Vec<f64> = report
            .telemetry
            .iter()
            .filter_map(|e| e.metric("humidity"))
            .collect();
        assert_eq!(temperatures, vec![0.0, 10.0, 20.0, 30.0, 40.0]);
        assert_eq!(humidities, vec![0.0, 15.0, 30.0, 45.0, 60.0]);
    }

    #[tokio::test]
    async fn should_delete_the_first_thing_only() {
        let service = AssignmentService::new(InMemoryApi::logged_in(), settings());

        let report = service.first_use_case().await.unwrap();

        assert!(service.api().get_thing(report.deleted).await.is_err());
        let kept = service.api().get_thing(report.kept.id).await.unwrap();
        assert_eq!(kept.name, RENAMED_NAME);
    }

    #[tokio::test]
    async fn should_collect_pending_commands_while_polling() {
        let api = InMemoryApi::logged_in();
        let command = RpcCommand::new("setValue", true).unwrap();
        // Things get ids 1 and 2; the kept one is 2.
        api.state
            .lock()
            .unwrap()
            .pending
            .insert(ThingId::from_raw(2), VecDeque::from([command.clone()]));
        let service = AssignmentService::new(api, settings());

        let report = service.first_use_case().await.unwrap();

        assert_eq!(report.commands, vec![command]);
    }

    #[tokio::test]
    async fn should_stop_at_first_failing_call() {
        let api = InMemoryApi::logged_in();
        api.state.lock().unwrap().fail_delete = true;
        let service = AssignmentService::new(api, settings());

        let result = service.first_use_case().await;

        assert!(matches!(
            result,
            Err(LabError::Status(StatusError { status: 500, .. }))
        ));
        assert!(service.api().state.lock().unwrap().telemetry.is_empty());
    }

    #[tokio::test]
    async fn should_fail_without_login() {
        let service = AssignmentService::new(InMemoryApi::default(), settings());
        assert!(matches!(
            service.first_use_case().await,
            Err(LabError::NotLoggedIn)
        ));
    }

    #[tokio::test]
    async fn should_send_set_tap_in_second_use_case() {
        let service = AssignmentService::new(InMemoryApi::logged_in(), settings());
        let first = service.first_use_case().await.unwrap();

        let report = service.second_use_case(first.kept.id).await.unwrap();

        assert_eq!(report.telemetry.len(), 5);
        assert_eq!(report.rpc_response["method"], TAP_METHOD);
        let sent = service.api().state.lock().unwrap().sent.clone();
        assert_eq!(
            sent,
            vec![(first.kept.id, RpcCommand::new(TAP_METHOD, true).unwrap())]
        );
    }
}
