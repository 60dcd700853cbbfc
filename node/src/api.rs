//! # REST + WebSocket API
//!
//! Builds the axum router that exposes the vault over HTTP. All endpoints
//! share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                   | Description                              |
//! |--------|------------------------|------------------------------------------|
//! | GET    | `/health`              | Liveness probe                           |
//! | GET    | `/status`              | Release status, phase, owner             |
//! | GET    | `/guardians`           | Guardians with their confirmation flags  |
//! | GET    | `/guardians/:address`  | Role and confirmation of one address     |
//! | POST   | `/lock`                | Signed `lock` call                       |
//! | POST   | `/confirm`             | Signed `confirm` call                    |
//! | GET    | `/events`              | Event log, optionally `?from=<sequence>` |
//! | GET    | `/ws`                  | Live event stream                        |
//!
//! Mutations arrive as [`SignedCall`]s. The handler authenticates the
//! signature against this node's vault id and hands the recovered
//! [`Address`] to the vault. Failures come back as
//! `{ "error": "...", "code": "..." }`. That includes bodies that are not
//! a well-formed signed call, which get a 400 with code `INVALID_INPUT`.

use axum::{
    extract::{
        rejection::JsonRejection,
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use willvault_contracts::events::EventRecord;
use willvault_contracts::shared::SharedVault;
use willvault_contracts::will_vault::{ReleaseStatus, VaultError, VaultErrorKind, VaultState};
use willvault_protocol::crypto::DataHash;
use willvault_protocol::identity::{Address, AuthError, SignedCall, VaultCall};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// The vault id signed calls must name.
    pub vault_id: String,
    /// The node's reported version string.
    pub version: String,
    /// The served vault.
    pub vault: SharedVault,
    /// Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/guardians", get(guardians_handler))
        .route("/guardians/:address", get(guardian_handler))
        .route("/lock", post(lock_handler))
        .route("/confirm", post(confirm_handler))
        .route("/events", get(events_handler))
        .route("/ws", get(ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response Types
// ---------------------------------------------------------------------------

/// Body of `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub vault_id: String,
    pub version: String,
    pub owner: Address,
    pub state: VaultState,
    pub data_hash: DataHash,
    pub confirmations_needed: u32,
    pub current_confirmations: u32,
    pub remaining_confirmations: u32,
    pub released: bool,
    /// RFC 3339 time the status was read.
    pub timestamp: String,
}

/// One entry of `GET /guardians`.
#[derive(Debug, Serialize, Deserialize)]
pub struct GuardianInfo {
    pub address: Address,
    pub confirmed: bool,
}

/// Body of `GET /guardians/:address`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RoleResponse {
    pub address: Address,
    pub is_guardian: bool,
    pub is_confirmed: bool,
    pub is_owner: bool,
}

/// Body of a successful `POST /lock` or `POST /confirm`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CallResponse {
    /// The authenticated caller.
    pub caller: Address,
    /// Events appended by the call.
    pub events: Vec<EventRecord>,
    /// Release status as this call left it.
    pub status: ReleaseStatus,
}

/// Query string of `GET /events`.
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// First sequence number to return.
    pub from: Option<u64>,
}

/// Error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,
    /// Stable machine-readable code.
    pub code: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A failed request, rendered as an [`ErrorResponse`].
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl From<VaultError> for ApiError {
    fn from(e: VaultError) -> Self {
        let status = match e.kind() {
            VaultErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            VaultErrorKind::Unauthorized | VaultErrorKind::NotGuardian => StatusCode::FORBIDDEN,
            VaultErrorKind::InvalidState | VaultErrorKind::AlreadyConfirmed => {
                StatusCode::CONFLICT
            }
        };
        Self::new(status, e.code(), e.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        let code = match e {
            AuthError::WrongVault { .. } => "WRONG_VAULT",
            AuthError::InvalidSignature => "INVALID_SIGNATURE",
        };
        Self::new(StatusCode::UNAUTHORIZED, code, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
            code: self.code.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`: returns 200 if the node is alive.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status`: vault summary, read under one lock.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let resp = state.vault.read(|v| {
        let status = v.release_status();
        StatusResponse {
            vault_id: state.vault_id.clone(),
            version: state.version.clone(),
            owner: *v.owner(),
            state: v.vault_state(),
            data_hash: status.data_hash,
            confirmations_needed: status.confirmations_needed,
            current_confirmations: status.current_confirmations,
            remaining_confirmations: v.remaining_confirmations(),
            released: status.released,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    });
    Json(resp)
}

/// `GET /guardians`: guardians in registration order.
async fn guardians_handler(State(state): State<AppState>) -> impl IntoResponse {
    let guardians: Vec<GuardianInfo> = state.vault.read(|v| {
        v.guardians()
            .iter()
            .map(|g| GuardianInfo {
                address: *g,
                confirmed: v.is_confirmed(g),
            })
            .collect()
    });
    Json(guardians)
}

/// `GET /guardians/:address`: role lookup for any address.
async fn guardian_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RoleResponse>, ApiError> {
    let address: Address = address
        .parse()
        .map_err(|e| ApiError::new(StatusCode::BAD_REQUEST, "INVALID_ADDRESS", format!("{e}")))?;

    let resp = state.vault.read(|v| RoleResponse {
        address,
        is_guardian: v.is_guardian(&address),
        is_confirmed: v.is_confirmed(&address),
        is_owner: *v.owner() == address,
    });
    Ok(Json(resp))
}

/// `POST /lock`: owner commits the data hash.
async fn lock_handler(
    State(state): State<AppState>,
    payload: Result<Json<SignedCall>, JsonRejection>,
) -> Result<Json<CallResponse>, ApiError> {
    submit(&state, "lock", payload).map(Json)
}

/// `POST /confirm`: a guardian confirms release.
async fn confirm_handler(
    State(state): State<AppState>,
    payload: Result<Json<SignedCall>, JsonRejection>,
) -> Result<Json<CallResponse>, ApiError> {
    submit(&state, "confirm", payload).map(Json)
}

/// Authenticate and apply a signed call posted to `endpoint`.
fn submit(
    state: &AppState,
    endpoint: &str,
    payload: Result<Json<SignedCall>, JsonRejection>,
) -> Result<CallResponse, ApiError> {
    let _timer = state.metrics.call_latency_seconds.start_timer();

    let result = payload
        .map_err(|rejection| {
            ApiError::new(StatusCode::BAD_REQUEST, "INVALID_INPUT", rejection.body_text())
        })
        .and_then(|Json(signed)| apply(state, endpoint, &signed));
    match &result {
        Ok(resp) => state.metrics.record_events(&resp.events),
        Err(e) => {
            tracing::debug!(endpoint, code = e.code, "call rejected: {}", e.message);
            state.metrics.record_rejection(e.code);
        }
    }
    result
}

fn apply(state: &AppState, endpoint: &str, signed: &SignedCall) -> Result<CallResponse, ApiError> {
    if signed.call.name() != endpoint {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "CALL_MISMATCH",
            format!("{} call posted to /{}", signed.call.name(), endpoint),
        ));
    }

    let caller = signed.authenticate(&state.vault_id)?;
    let committed = match signed.call {
        VaultCall::Lock { data_hash } => state.vault.lock_vault(&caller, data_hash)?,
        VaultCall::Confirm => state.vault.confirm_release(&caller)?,
    };

    Ok(CallResponse {
        caller,
        events: committed.records,
        status: committed.status,
    })
}

/// `GET /events`: the event log, oldest first.
async fn events_handler(
    Query(query): Query<EventsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    Json(state.vault.events_since(query.from.unwrap_or(0)))
}

/// `GET /ws`: WebSocket upgrade for live event streaming.
///
/// Clients receive one JSON [`EventRecord`] per message. The channel is
/// push-only; client messages are ignored.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Forwards committed events until the client disconnects or the channel
/// closes.
async fn handle_ws_connection(mut socket: WebSocket, state: AppState) {
    let mut rx = state.vault.subscribe();

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(record) => {
                        let payload = match serde_json::to_string(&record) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::warn!("failed to serialize ws event: {}", e);
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // Missed records stay available from GET /events.
                        tracing::warn!("ws subscriber lagged by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }
}
