//! A small in-memory IoT backend served by axum on an ephemeral port.
//!
//! It follows the REST surface the client targets closely enough to drive
//! whole scenarios: bearer-token auth, numeric ids, and 404 for empty
//! telemetry ranges or an empty RPC queue. Telemetry reads can be switched
//! to fail with 500.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::header::{ACCEPT, AUTHORIZATION};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};

pub const USERNAME: &str = "student@cs684.edu";
pub const PASSWORD: &str = "secret";
const SESSION_TOKEN: &str = "session-token";

#[derive(Default)]
pub struct Backend {
    next_id: i64,
    pub things: BTreeMap<i64, Value>,
    tokens: HashMap<String, i64>,
    pub telemetry: Vec<(i64, Value)>,
    pub pending_rpc: HashMap<i64, VecDeque<Value>>,
    pub ranges_seen: Vec<(String, String)>,
    /// Answer every telemetry range query with 500.
    pub fail_telemetry_reads: bool,
}

pub type Shared = Arc<Mutex<Backend>>;

/// Start the backend and return its base URL.
pub async fn spawn() -> (String, Shared) {
    let state = Shared::default();
    let app = Router::new()
        .route("/login", post(login))
        .route("/thing", post(create_thing))
        .route(
            "/thing/{id}",
            get(get_thing).put(update_thing).delete(delete_thing),
        )
        .route("/thing/{id}/token", get(thing_token))
        .route("/thing/{id}/telemetry", get(thing_telemetry))
        .route("/telemetry", post(add_telemetry).get(own_telemetry))
        .route("/telemetry/{id}", put(update_telemetry))
        .route("/rpc/{id}", post(send_rpc))
        .route("/rpc", get(receive_rpc))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), state)
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"error": message}))).into_response()
}

fn require_session(headers: &HeaderMap) -> Result<(), Response> {
    if bearer(headers) == Some(SESSION_TOKEN) {
        Ok(())
    } else {
        Err(error(StatusCode::UNAUTHORIZED, "invalid session"))
    }
}

fn require_device(backend: &Backend, headers: &HeaderMap) -> Result<i64, Response> {
    bearer(headers)
        .and_then(|token| backend.tokens.get(token).copied())
        .ok_or_else(|| error(StatusCode::UNAUTHORIZED, "invalid access token"))
}

#[derive(Deserialize)]
struct Credentials {
    username: String,
    password: String,
}

async fn login(headers: HeaderMap, Json(body): Json<Credentials>) -> Response {
    let accepts_json = headers
        .get(ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("application/json"));
    if !accepts_json {
        return error(StatusCode::NOT_ACCEPTABLE, "json only");
    }
    if body.username != USERNAME || body.password != PASSWORD {
        return error(StatusCode::UNAUTHORIZED, "bad credentials");
    }
    Json(json!({"authToken": SESSION_TOKEN})).into_response()
}

fn thing_json(id: i64, body: &Value) -> Value {
    json!({
        "id": id,
        "name": body["name"],
        "thingType": body["thingType"],
        "description": body["description"],
    })
}

async fn create_thing(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = require_session(&headers) {
        return resp;
    }
    let mut backend = state.lock().unwrap();
    backend.next_id += 1;
    let id = backend.next_id;
    let thing = thing_json(id, &body);
    backend.things.insert(id, thing.clone());
    backend.tokens.insert(format!("access-{id}"), id);
    (StatusCode::CREATED, Json(thing)).into_response()
}

async fn get_thing(State(state): State<Shared>, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(resp) = require_session(&headers) {
        return resp;
    }
    let backend = state.lock().unwrap();
    match backend.things.get(&id) {
        Some(thing) => Json(thing.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "no such thing"),
    }
}

async fn update_thing(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = require_session(&headers) {
        return resp;
    }
    let mut backend = state.lock().unwrap();
    if !backend.things.contains_key(&id) {
        return error(StatusCode::NOT_FOUND, "no such thing");
    }
    let thing = thing_json(id, &body);
    backend.things.insert(id, thing.clone());
    Json(thing).into_response()
}

async fn delete_thing(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(resp) = require_session(&headers) {
        return resp;
    }
    let mut backend = state.lock().unwrap();
    if backend.things.remove(&id).is_none() {
        return error(StatusCode::NOT_FOUND, "no such thing");
    }
    backend.telemetry.retain(|(owner, _)| *owner != id);
    backend.tokens.retain(|_, owner| *owner != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn thing_token(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(resp) = require_session(&headers) {
        return resp;
    }
    let backend = state.lock().unwrap();
    if !backend.things.contains_key(&id) {
        return error(StatusCode::NOT_FOUND, "no such thing");
    }
    Json(json!({"accessToken": format!("access-{id}")})).into_response()
}

#[derive(Deserialize)]
struct Range {
    #[serde(rename = "startTs")]
    start: String,
    #[serde(rename = "endTs")]
    end: String,
}

fn entries_for(backend: &Backend, owner: i64) -> Response {
    if backend.fail_telemetry_reads {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    let entries: Vec<Value> = backend
        .telemetry
        .iter()
        .filter(|(o, _)| *o == owner)
        .map(|(_, entry)| entry.clone())
        .collect();
    if entries.is_empty() {
        return error(StatusCode::NOT_FOUND, "no telemetry in range");
    }
    Json(entries).into_response()
}

async fn thing_telemetry(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(range): Query<Range>,
) -> Response {
    if let Err(resp) = require_session(&headers) {
        return resp;
    }
    let mut backend = state.lock().unwrap();
    backend.ranges_seen.push((range.start, range.end));
    entries_for(&backend, id)
}

async fn own_telemetry(
    State(state): State<Shared>,
    headers: HeaderMap,
    Query(range): Query<Range>,
) -> Response {
    let mut backend = state.lock().unwrap();
    let owner = match require_device(&backend, &headers) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    backend.ranges_seen.push((range.start, range.end));
    entries_for(&backend, owner)
}

fn entry_json(id: i64, owner: i64, data: &Value) -> Value {
    let mut entry = data.clone();
    if let Some(fields) = entry.as_object_mut() {
        fields.insert("id".to_string(), json!(id));
        fields.insert("thingId".to_string(), json!(owner));
        fields.insert("ts".to_string(), json!("2021-06-01 12:00:00"));
    }
    entry
}

async fn add_telemetry(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(data): Json<Value>,
) -> Response {
    let mut backend = state.lock().unwrap();
    let owner = match require_device(&backend, &headers) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    backend.next_id += 1;
    let entry = entry_json(backend.next_id, owner, &data);
    backend.telemetry.push((owner, entry.clone()));
    (StatusCode::CREATED, Json(entry)).into_response()
}

async fn update_telemetry(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(data): Json<Value>,
) -> Response {
    let mut backend = state.lock().unwrap();
    let owner = match require_device(&backend, &headers) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    let Some(slot) = backend
        .telemetry
        .iter_mut()
        .find(|(o, entry)| *o == owner && entry["id"] == json!(id))
    else {
        return error(StatusCode::NOT_FOUND, "no such entry");
    };
    slot.1 = entry_json(id, owner, &data);
    Json(slot.1.clone()).into_response()
}

async fn send_rpc(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(command): Json<Value>,
) -> Response {
    if let Err(resp) = require_session(&headers) {
        return resp;
    }
    let mut backend = state.lock().unwrap();
    if !backend.things.contains_key(&id) {
        return error(StatusCode::NOT_FOUND, "no such thing");
    }
    backend
        .pending_rpc
        .entry(id)
        .or_default()
        .push_back(command.clone());
    Json(json!({
        "thingId": id,
        "method": command["method"],
        "params": command["params"],
        "status": "QUEUED",
    }))
    .into_response()
}

async fn receive_rpc(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut backend = state.lock().unwrap();
    let owner = match require_device(&backend, &headers) {
        Ok(owner) => owner,
        Err(resp) => return resp,
    };
    match backend
        .pending_rpc
        .get_mut(&owner)
        .and_then(VecDeque::pop_front)
    {
        Some(command) => Json(command).into_response(),
        None => error(StatusCode::NOT_FOUND, "no pending RPC"),
    }
}
