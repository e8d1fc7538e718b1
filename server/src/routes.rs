//! HTTP routes
//!
//! User-facing routes take a bearer token; `/received` and `/logs` take the
//! static API key. Device failures become 500 with `{"error": ...}`.

use crate::auth::{ApiKey, Authenticator, Caller};
use crate::body::extract_body;
use crate::error::ApiError;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};
use sms_gateway::GatewayOperations;
use sms_gateway_shared::replies::MESSAGE_SENT;
use sms_gateway_shared::{DeviceStatus, MessageLogEntry, ReceivedMessages, SendOutcome, SmsSendRequest};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

const SERVICE_NAME: &str = "UniFi SMS Gateway API";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub ops: GatewayOperations,
    pub auth: Arc<Authenticator>,
}

impl AppState {
    pub fn new(ops: GatewayOperations, auth: Authenticator) -> Self {
        Self {
            ops,
            auth: Arc::new(auth),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let sms = Router::new()
        .route("/status", get(status))
        .route("/retrieve", get(retrieve))
        .route("/clear", delete(clear))
        .route("/send/{number}", post(send_to_number))
        .route("/send", post(send))
        .route("/history", get(history))
        .route("/received", get(received))
        .route("/logs", get(logs));

    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .nest("/api/sms", sms)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/api/health",
            "sms": "/api/sms",
        },
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

async fn status(State(state): State<AppState>, Caller(caller): Caller) -> Result<Json<DeviceStatus>, ApiError> {
    info!(caller = %caller, "Device status requested");
    let status = state.ops.get_status().await?;
    debug!("Device status retrieved: {:?}", status);
    Ok(Json(status))
}

async fn retrieve(State(state): State<AppState>, _caller: Caller) -> Result<Json<String>, ApiError> {
    Ok(Json(state.ops.list_messages().await?))
}

async fn clear(State(state): State<AppState>, _caller: Caller) -> Result<Json<String>, ApiError> {
    Ok(Json(state.ops.clear_messages().await?))
}

#[derive(Debug, Deserialize)]
struct SendQuery {
    path: Option<String>,
}

/// Send to a number taken from the URL; the body is raw text or a JSON
/// document queried with `?path=`. Not logged.
async fn send_to_number(
    State(state): State<AppState>,
    _caller: Caller,
    Path(number): Path<String>,
    Query(query): Query<SendQuery>,
    payload: Bytes,
) -> Result<Json<Value>, ApiError> {
    let body = extract_body(&payload, query.path.as_deref())?;
    let outcome = state
        .ops
        .send_message(SmsSendRequest::new(number, body), None)
        .await?;
    Ok(Json(json!({ "message": MESSAGE_SENT, "result": outcome })))
}

#[derive(Debug, Default, Deserialize)]
struct SendPayload {
    #[serde(default)]
    to_number: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl SendPayload {
    /// Parse a JSON payload into a request; both fields must be non-empty strings
    fn parse_request(raw: &[u8]) -> Result<SmsSendRequest, ApiError> {
        let missing = || ApiError::BadRequest("To number and message are required".into());
        let payload: SendPayload = serde_json::from_slice(raw).map_err(|e| {
            debug!("Rejected send payload: {}", e);
            missing()
        })?;
        match (
            payload.to_number.filter(|n| !n.is_empty()),
            payload.message.filter(|m| !m.is_empty()),
        ) {
            (Some(number), Some(message)) => Ok(SmsSendRequest::new(number, message)),
            _ => Err(missing()),
        }
    }
}

/// Send and log under the authenticated caller
async fn send(
    State(state): State<AppState>,
    Caller(caller): Caller,
    payload: Bytes,
) -> Result<(StatusCode, Json<SendOutcome>), ApiError> {
    let request = SendPayload::parse_request(&payload)?;
    let outcome = state.ops.send_message(request, Some(caller)).await?;
    let code = if outcome.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    Ok((code, Json(outcome)))
}

async fn history(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> Result<Json<Vec<MessageLogEntry>>, ApiError> {
    Ok(Json(state.ops.store().history_for(caller).await?))
}

async fn received(State(state): State<AppState>, _key: ApiKey) -> Result<Json<ReceivedMessages>, ApiError> {
    Ok(Json(state.ops.received_messages().await?))
}

async fn logs(State(state): State<AppState>, _key: ApiKey) -> Result<Json<Vec<MessageLogEntry>>, ApiError> {
    Ok(Json(state.ops.store().all().await?))
}
