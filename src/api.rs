//! REST API Server for the loan assistant
//!
//! Exposes the dialogue engine via HTTP endpoints
//! Integrates with the chat frontend
//!
//! Two route families share one session model:
//! - `/chat`, `/reset`: bare `{"reply": ...}` bodies for the browser chat page
//! - `/api/chat`, `/api/reset`: the `ApiResponse` envelope with the session id
//!
//! The session id comes from the request body when present, else from the
//! `loanbot_session` cookie, else a new one is allocated. Every response sets
//! the cookie so clients that never echo the id keep their conversation.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use uuid::Uuid;

use crate::dialogue::DialogueEngine;
use crate::models::TurnOutcome;
use crate::state::SessionStore;

pub const SESSION_COOKIE: &str = "loanbot_session";

// =============================
// Request Models
// =============================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResetRequest {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
    pub session_id: Uuid,
}

/// Body of the browser routes
#[derive(Debug, Serialize, Deserialize)]
pub struct BareReply {
    pub reply: String,
}

// =============================
// Response Wrapper
// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

// =============================
// API State
// =============================

#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<DialogueEngine>,
    pub sessions: Arc<dyn SessionStore>,
    turn_locks: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl ApiState {
    pub fn new(engine: Arc<DialogueEngine>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            engine,
            sessions,
            turn_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `turn` while holding the session's lock, so turns of one
    /// session apply in arrival order. The lock entry is dropped once no
    /// other request is holding or waiting on it.
    async fn serialized<F, Fut, T>(&self, session_id: Uuid, turn: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        let lock = {
            let mut locks = self.turn_locks.lock().await;
            locks.entry(session_id).or_default().clone()
        };

        let result = {
            let _turn = lock.lock().await;
            turn().await
        };

        // Clones are only taken under the map lock: map + ours == 2 means idle.
        let mut locks = self.turn_locks.lock().await;
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&session_id);
        }

        result
    }
}

// =============================
// Session Ids
// =============================

fn stable_uuid_from_string(input: &str) -> Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
}

/// Body id, then cookie id, then a fresh one for a new conversation
fn resolve_session_id(body_id: Option<&str>, headers: &HeaderMap) -> Uuid {
    let supplied = body_id
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| session_cookie(headers).filter(|v| !v.is_empty()));

    match supplied {
        Some(v) => Uuid::parse_str(&v).unwrap_or_else(|_| stable_uuid_from_string(&v)),
        None => Uuid::new_v4(),
    }
}

fn with_session_cookie(session_id: Uuid, status: StatusCode, body: impl IntoResponse) -> Response {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, session_id
    );
    (status, [(header::SET_COOKIE, cookie)], body).into_response()
}

// =============================
// Turn Handling
// =============================

async fn chat_turn(state: &ApiState, session_id: Uuid, message: &str) -> Result<TurnOutcome, String> {
    state
        .serialized(session_id, || async {
            let session = state.sessions.load(session_id).await.map_err(|e| {
                error!(%session_id, "Failed to load session: {}", e);
                format!("Session unavailable: {}", e)
            })?;

            info!(%session_id, idle = session.is_idle(), "Received chat turn");

            let outcome = state.engine.process_turn(session, message).await;
            save_outcome(state, session_id, outcome).await
        })
        .await
}

async fn reset_turn(state: &ApiState, session_id: Uuid) -> Result<TurnOutcome, String> {
    state
        .serialized(session_id, || async {
            info!(%session_id, "Resetting session");
            save_outcome(state, session_id, DialogueEngine::reset_session()).await
        })
        .await
}

async fn save_outcome(
    state: &ApiState,
    session_id: Uuid,
    outcome: TurnOutcome,
) -> Result<TurnOutcome, String> {
    state
        .sessions
        .save(session_id, &outcome.state)
        .await
        .map_err(|e| {
            error!(%session_id, "Failed to save session: {}", e);
            format!("Session unavailable: {}", e)
        })?;
    Ok(outcome)
}

fn envelope(session_id: Uuid, result: Result<TurnOutcome, String>) -> Response {
    match result {
        Ok(outcome) => with_session_cookie(
            session_id,
            StatusCode::OK,
            Json(ApiResponse::success(ChatReply {
                reply: outcome.reply,
                session_id,
            })),
        ),
        Err(message) => with_session_cookie(
            session_id,
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(message)),
        ),
    }
}

fn bare(session_id: Uuid, result: Result<TurnOutcome, String>) -> Response {
    match result {
        Ok(outcome) => with_session_cookie(
            session_id,
            StatusCode::OK,
            Json(BareReply {
                reply: outcome.reply,
            }),
        ),
        Err(message) => with_session_cookie(
            session_id,
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(BareReply { reply: message }),
        ),
    }
}

// =============================
// Health Endpoint
// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

// =============================
// Chat Endpoints
// =============================

async fn api_chat_handler(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Response {
    if req.message.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("No user message found".into())),
        )
            .into_response();
    }

    let session_id = resolve_session_id(req.session_id.as_deref(), &headers);
    let result = chat_turn(&state, session_id, &req.message).await;
    envelope(session_id, result)
}

async fn chat_handler(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Response {
    let session_id = resolve_session_id(req.session_id.as_deref(), &headers);
    let result = chat_turn(&state, session_id, &req.message).await;
    bare(session_id, result)
}

// =============================
// Reset Endpoints
// =============================

async fn api_reset_handler(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Option<Json<ResetRequest>>,
) -> Response {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let session_id = resolve_session_id(req.session_id.as_deref(), &headers);
    let result = reset_turn(&state, session_id).await;
    envelope(session_id, result)
}

async fn reset_handler(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Option<Json<ResetRequest>>,
) -> Response {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let session_id = resolve_session_id(req.session_id.as_deref(), &headers);
    let result = reset_turn(&state, session_id).await;
    bare(session_id, result)
}

// =============================
// Router
// =============================

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health))
        .route("/chat", post(chat_handler))
        .route("/reset", post(reset_handler))
        .route("/api/chat", post(api_chat_handler))
        .route("/api/reset", post(api_reset_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

// =============================
// Server Startup
// =============================

pub async fn start_server(
    state: ApiState,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
