//! HTTP routes: investigation submission, SSE event streaming, liveness.
//!
//! Submission allocates a session and spawns the engine in the background,
//! returning the thread id immediately. Streaming drains that session's
//! event log on a fixed poll interval until the end marker, then deletes
//! the session — each thread id supports one successful drain.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use futures::Stream;
use inquest_core::engine::InvestigationEngine;
use inquest_core::session::{SessionEvent, SessionStore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Response header carrying the thread id alongside the JSON body.
pub const THREAD_ID_HEADER: &str = "x-thread-id";

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<InvestigationEngine>,
    pub store: Arc<SessionStore>,
    pub poll_interval: Duration,
    pub started_at: DateTime<Utc>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([axum::http::HeaderName::from_static(THREAD_ID_HEADER)]);

    Router::new()
        .route("/investigate", post(investigate))
        .route("/stream/{thread_id}", get(stream_events))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct InvestigateRequest {
    #[serde(default)]
    query: String,
}

#[derive(Debug, Serialize)]
struct InvestigateResponse {
    message: String,
    thread_id: String,
}

/// Accept a query, allocate a session, and kick off the investigation in
/// the background. Returns immediately with the thread id.
async fn investigate(
    State(state): State<AppState>,
    Json(request): Json<InvestigateRequest>,
) -> Response {
    if request.query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"message": "Query is required."})),
        )
            .into_response();
    }

    let token = state.store.create();
    info!(token = %token, "Accepted investigation request");
    state
        .engine
        .clone()
        .spawn(request.query, state.store.clone(), token.clone());

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&token) {
        headers.insert(THREAD_ID_HEADER, value);
    }
    (
        headers,
        Json(InvestigateResponse {
            message: "Investigation started.".to_string(),
            thread_id: token,
        }),
    )
        .into_response()
}

/// Stream a session's events to the client as SSE until the end marker.
async fn stream_events(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Response {
    if !state.store.contains(&thread_id) {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "Unknown thread id."})),
        )
            .into_response();
    }

    let stream = event_stream(state.store.clone(), thread_id, state.poll_interval);
    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// Liveness probe.
async fn healthz(State(state): State<AppState>) -> Json<serde_json::Value> {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0);
    Json(json!({
        "status": "ok",
        "active_sessions": state.store.len(),
        "uptime_secs": uptime_secs,
    }))
}

struct DrainState {
    store: Arc<SessionStore>,
    token: String,
    offset: usize,
    pending: VecDeque<SessionEvent>,
    interval: Duration,
    done: bool,
}

/// Poll-driven reader over one session's event log.
///
/// Forwards log and report events as SSE data frames; on the end marker it
/// emits a `close` event, deletes the session, and ends the stream. If the
/// session disappears underneath us (swept), the stream just ends.
fn event_stream(
    store: Arc<SessionStore>,
    token: String,
    interval: Duration,
) -> impl Stream<Item = Result<Event, Infallible>> {
    let initial = DrainState {
        store,
        token,
        offset: 0,
        pending: VecDeque::new(),
        interval,
        done: false,
    };

    futures::stream::unfold(initial, |mut s| async move {
        if s.done {
            return None;
        }
        loop {
            if let Some(event) = s.pending.pop_front() {
                match event {
                    SessionEvent::End => {
                        s.done = true;
                        let _ = s.store.remove(&s.token);
                        return Some((Ok(Event::default().event("close")), s));
                    }
                    other => match Event::default().json_data(&other) {
                        Ok(frame) => return Some((Ok(frame), s)),
                        Err(_) => continue,
                    },
                }
            }

            match s.store.read_from(&s.token, s.offset) {
                Ok(events) if !events.is_empty() => {
                    s.offset += events.len();
                    s.pending.extend(events);
                }
                Ok(_) => tokio::time::sleep(s.interval).await,
                Err(_) => return None,
            }
        }
    })
}
