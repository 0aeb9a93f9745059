// SPDX-FileCopyrightText: 2026 Waggle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook server for Slack events, interactivity, and slash commands.
//!
//! Every route sits behind the signing-secret middleware. Handlers
//! validate, de-duplicate, and forward onto the engine's event channel,
//! then return 200 immediately; Slack retries anything slower than
//! three seconds.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Form, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self as axum_middleware, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};
use waggle_core::{InboundEvent, WaggleError};

use crate::events::{self, EventEnvelope, SlashCommand};
use crate::signature;

const MAX_BODY_BYTES: usize = 1024 * 1024;
const DEDUP_RETENTION: Duration = Duration::from_secs(15 * 60);
const DEDUP_PRUNE_THRESHOLD: usize = 4096;

#[derive(Clone)]
pub struct ServerState {
    pub inbound_tx: mpsc::Sender<InboundEvent>,
    seen_events: Arc<DashMap<String, Instant>>,
}

impl ServerState {
    pub fn new(inbound_tx: mpsc::Sender<InboundEvent>) -> Self {
        Self {
            inbound_tx,
            seen_events: Arc::new(DashMap::new()),
        }
    }

    /// Record an event id, reporting whether it was already seen.
    /// Webhooks are at-least-once; retries must not re-run transitions.
    fn is_duplicate(&self, id: &str) -> bool {
        if self.seen_events.len() > DEDUP_PRUNE_THRESHOLD {
            let cutoff = Instant::now() - DEDUP_RETENTION;
            self.seen_events.retain(|_, seen_at| *seen_at > cutoff);
        }
        self.seen_events
            .insert(id.to_string(), Instant::now())
            .is_some()
    }

    async fn forward(&self, event: InboundEvent) {
        if self.is_duplicate(&event.id) {
            debug!(event_id = %event.id, "dropping duplicate delivery");
            return;
        }
        if self.inbound_tx.send(event).await.is_err() {
            warn!("event loop receiver dropped, discarding inbound event");
        }
    }
}

#[derive(Clone)]
struct SigningSecret(Arc<String>);

/// Middleware that verifies the Slack request signature.
///
/// Buffers the body (signatures cover the raw bytes), verifies, then
/// reconstructs the request for the inner handler.
async fn verify_signature_middleware(
    State(secret): State<SigningSecret>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let (parts, body) = request.into_parts();

    let timestamp = parts
        .headers
        .get("x-slack-request-timestamp")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let provided = parts
        .headers
        .get("x-slack-signature")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let (Some(timestamp), Some(provided)) = (timestamp, provided) else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    if !signature::verify(&secret.0, &timestamp, &bytes, &provided) {
        warn!("rejected request with invalid Slack signature");
        return Err(StatusCode::UNAUTHORIZED);
    }

    let request = Request::from_parts(parts, axum::body::Body::from(bytes));
    Ok(next.run(request).await)
}

async fn handle_events(
    State(state): State<ServerState>,
    Json(envelope): Json<EventEnvelope>,
) -> Response {
    match envelope {
        EventEnvelope::UrlVerification { challenge } => {
            Json(serde_json::json!({ "challenge": challenge })).into_response()
        }
        EventEnvelope::EventCallback { event_id, event } => {
            if let Some(inbound) = events::callback_to_event(event_id, event) {
                state.forward(inbound).await;
            }
            StatusCode::OK.into_response()
        }
        EventEnvelope::Other => StatusCode::OK.into_response(),
    }
}

#[derive(serde::Deserialize)]
struct InteractivityForm {
    payload: String,
}

async fn handle_interactivity(
    State(state): State<ServerState>,
    Form(form): Form<InteractivityForm>,
) -> StatusCode {
    match serde_json::from_str(&form.payload) {
        Ok(payload) => {
            if let Some(inbound) = events::interaction_to_event(payload) {
                state.forward(inbound).await;
            }
        }
        Err(error) => {
            warn!(%error, "unparseable interactivity payload");
        }
    }
    StatusCode::OK
}

async fn handle_commands(
    State(state): State<ServerState>,
    Form(command): Form<SlashCommand>,
) -> StatusCode {
    state.forward(events::command_to_event(command)).await;
    StatusCode::OK
}

pub fn router(signing_secret: String, state: ServerState) -> Router {
    Router::new()
        .route("/slack/events", post(handle_events))
        .route("/slack/interactivity", post(handle_interactivity))
        .route("/slack/commands", post(handle_commands))
        .route_layer(axum_middleware::from_fn_with_state(
            SigningSecret(Arc::new(signing_secret)),
            verify_signature_middleware,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind the webhook server and serve it in a background task.
///
/// Returns the bound address (useful when the port is 0) and the task
/// handle so the adapter can abort it at shutdown.
pub async fn bind_and_serve(
    listen_address: &str,
    port: u16,
    signing_secret: String,
    state: ServerState,
) -> Result<(std::net::SocketAddr, JoinHandle<()>), WaggleError> {
    let addr = format!("{listen_address}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| WaggleError::Channel {
            message: format!("failed to bind webhook server to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;
    let local_addr = listener.local_addr().map_err(|e| WaggleError::Channel {
        message: format!("failed to read bound address: {e}"),
        source: Some(Box::new(e)),
    })?;

    tracing::info!("Slack webhook server listening on {local_addr}");

    let app = router(signing_secret, state);
    let handle = tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, app).await {
            tracing::error!(%error, "webhook server exited");
        }
    });

    Ok((local_addr, handle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use waggle_core::{ActionEvent, EventKind};

    const SECRET: &str = "test-signing-secret";

    async fn start() -> (std::net::SocketAddr, mpsc::Receiver<InboundEvent>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(16);
        let state = ServerState::new(tx);
        let (addr, handle) = bind_and_serve("127.0.0.1", 0, SECRET.to_string(), state)
            .await
            .unwrap();
        (addr, rx, handle)
    }

    async fn post_signed(
        addr: std::net::SocketAddr,
        route: &str,
        content_type: &str,
        body: String,
    ) -> reqwest::Response {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let sig = signature::compute(SECRET, &timestamp, body.as_bytes());
        reqwest::Client::new()
            .post(format!("http://{addr}{route}"))
            .header("content-type", content_type)
            .header("x-slack-request-timestamp", timestamp)
            .header("x-slack-signature", sig)
            .body(body)
            .send()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn url_verification_echoes_challenge() {
        let (addr, _rx, handle) = start().await;
        let body = r#"{"type":"url_verification","challenge":"c0ffee"}"#.to_string();
        let response = post_signed(addr, "/slack/events", "application/json", body).await;
        assert_eq!(response.status(), 200);
        let json: serde_json::Value = response.json().await.unwrap();
        assert_eq!(json["challenge"], "c0ffee");
        handle.abort();
    }

    #[tokio::test]
    async fn unsigned_requests_are_rejected() {
        let (addr, _rx, handle) = start().await;
        let response = reqwest::Client::new()
            .post(format!("http://{addr}/slack/events"))
            .header("content-type", "application/json")
            .body(r#"{"type":"url_verification","challenge":"x"}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
        handle.abort();
    }

    #[tokio::test]
    async fn tampered_body_fails_verification() {
        let (addr, _rx, handle) = start().await;
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let sig = signature::compute(SECRET, &timestamp, b"original");
        let response = reqwest::Client::new()
            .post(format!("http://{addr}/slack/events"))
            .header("content-type", "application/json")
            .header("x-slack-request-timestamp", timestamp)
            .header("x-slack-signature", sig)
            .body(r#"{"type":"url_verification","challenge":"x"}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
        handle.abort();
    }

    #[tokio::test]
    async fn message_events_are_forwarded_once() {
        let (addr, mut rx, handle) = start().await;
        let body = r#"{
            "type": "event_callback",
            "event_id": "Ev777",
            "event": { "type": "message", "user": "U1", "text": "hi", "channel_type": "im" }
        }"#
        .to_string();

        // Delivered twice, as Slack retries do.
        post_signed(addr, "/slack/events", "application/json", body.clone()).await;
        post_signed(addr, "/slack/events", "application/json", body).await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, EventKind::Message("hi".into()));
        assert!(
            tokio::time::timeout(Duration::from_millis(100), rx.recv())
                .await
                .is_err(),
            "duplicate delivery must not be forwarded"
        );
        handle.abort();
    }

    #[tokio::test]
    async fn interactivity_payload_is_forwarded() {
        let (addr, mut rx, handle) = start().await;
        let payload = r#"{
            "type": "block_actions",
            "trigger_id": "T42",
            "user": { "id": "U1" },
            "actions": [{ "action_id": "weekly_checkin_yes" }]
        }"#;
        let body = format!("payload={}", urlencode(payload));
        post_signed(
            addr,
            "/slack/interactivity",
            "application/x-www-form-urlencoded",
            body,
        )
        .await;

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, EventKind::Action(ActionEvent::ParticipationYes));
        handle.abort();
    }

    #[tokio::test]
    async fn slash_commands_are_forwarded() {
        let (addr, mut rx, handle) = start().await;
        let body = "command=%2Fwaggle&text=&user_id=U9&user_name=ada&trigger_id=T9".to_string();
        post_signed(
            addr,
            "/slack/commands",
            "application/x-www-form-urlencoded",
            body,
        )
        .await;

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event.kind,
            EventKind::Command {
                name: "waggle".into(),
                text: String::new()
            }
        );
        handle.abort();
    }

    // Minimal percent-encoding for test payloads.
    fn urlencode(raw: &str) -> String {
        let mut out = String::new();
        for byte in raw.bytes() {
            match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    out.push(byte as char)
                }
                _ => out.push_str(&format!("%{byte:02X}")),
            }
        }
        out
    }
}
