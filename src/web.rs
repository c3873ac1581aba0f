//! Axum-based HTTP status and control surface

use crate::capabilities::Observable;
use crate::driver::{ChargerDriver, DeviceCommand};
use crate::error::ChargeSyncError;
use crate::events::EventBus;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::time::Duration;
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub driver: Arc<ChargerDriver>,
    pub events: EventBus,
}

#[derive(Deserialize)]
pub struct PollIntervalBody {
    pub seconds: u64,
}

#[derive(Deserialize)]
pub struct CommandBody {
    pub command: String,
    #[serde(default)]
    pub value: Option<f64>,
}

fn error_status(err: &ChargeSyncError) -> StatusCode {
    match err {
        ChargeSyncError::Validation { .. } => StatusCode::BAD_REQUEST,
        ChargeSyncError::Auth { .. } => StatusCode::UNAUTHORIZED,
        ChargeSyncError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        ChargeSyncError::Fetch { .. }
        | ChargeSyncError::DataShape { .. }
        | ChargeSyncError::Network { .. }
        | ChargeSyncError::Api { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &ChargeSyncError) -> Response {
    (
        error_status(err),
        Json(serde_json::json!({"ok": false, "error": err.to_string()})),
    )
        .into_response()
}

pub(crate) async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub(crate) async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let drv = &state.driver;
    let sink = drv.sink();

    let mut observables = serde_json::Map::new();
    for name in Observable::ALL {
        let value = sink
            .get(name)
            .and_then(|v| serde_json::to_value(v).ok())
            .unwrap_or(serde_json::Value::Null);
        observables.insert(name.as_str().to_string(), value);
    }

    Json(serde_json::json!({
        "device_id": drv.device_id(),
        "state": drv.state().as_str(),
        "available": sink.is_available(),
        "poll_interval_seconds": drv.poll_interval().as_secs(),
        "observables": observables,
        "stats": drv.stats(),
    }))
}

pub(crate) async fn set_poll_interval(
    State(state): State<AppState>,
    Json(body): Json<PollIntervalBody>,
) -> Response {
    match state
        .driver
        .set_poll_interval(Duration::from_secs(body.seconds))
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"ok": true, "poll_interval_seconds": body.seconds})),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

pub(crate) async fn command(
    State(state): State<AppState>,
    Json(body): Json<CommandBody>,
) -> Response {
    let cmd = match DeviceCommand::parse(&body.command, body.value) {
        Ok(c) => c,
        Err(e) => return error_response(&e),
    };
    match state.driver.handle_command(cmd).await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({"ok": true, "command": cmd.name()})),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

pub(crate) async fn events(State(state): State<AppState>) -> impl IntoResponse {
    let rx = state.events.subscribe();
    let stream = tokio_stream::wrappers::BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(ev) => serde_json::to_string(&ev).ok().map(|payload| {
            Ok::<Event, std::convert::Infallible>(
                Event::default().event(ev.event.name()).data(payload),
            )
        }),
        // Lagged receivers skip what they missed
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/status", get(status))
        .route("/api/events", get(events))
        .route("/api/poll-interval", post(set_poll_interval))
        .route("/api/commands", post(command))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let router = build_router(state);

    let logger = crate::logging::get_logger("web");
    logger.info(&format!(
        "Starting web server; requested host={}, port={}",
        host, port
    ));

    let (addr, parsed_ok): (SocketAddr, bool) = match host.parse::<IpAddr>() {
        Ok(ip) => (SocketAddr::new(ip, port), true),
        Err(_) => (([127, 0, 0, 1], port).into(), false),
    };
    if !parsed_ok {
        logger.warn(&format!(
            "Invalid host '{}'; falling back to 127.0.0.1",
            host
        ));
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    logger.info(&format!(
        "Web server listening at http://{}:{} (API /api)",
        local_addr.ip(),
        local_addr.port()
    ));

    axum::serve(listener, router).await?;
    Ok(())
}
