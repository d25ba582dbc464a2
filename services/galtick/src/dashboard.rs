//! Web dashboard with JSON API endpoints and the HTTP command surface

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::commands::{Command, CommandContext, CommandHandler};
use crate::state::StateHandle;

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub state: StateHandle,
    pub commands: CommandHandler,
    pub admin_token: Option<String>,
}

/// Body of `POST /api/tickchannel`
#[derive(Debug, Deserialize)]
pub struct TickChannelRequest {
    pub channel_id: u64,
    #[serde(default)]
    pub channel_name: Option<String>,
}

/// Build the dashboard axum router
pub fn build_router(
    state: StateHandle,
    commands: CommandHandler,
    admin_token: Option<String>,
) -> Router {
    let dashboard_state = DashboardState {
        state,
        commands,
        admin_token,
    };

    Router::new()
        .route("/", get(index_handler))
        .route("/api/status", get(status_handler))
        .route("/api/history", get(history_handler))
        .route("/api/tick", get(tick_handler))
        .route("/api/nexttick", get(next_tick_handler))
        .route("/api/tickchannel", post(tick_channel_handler))
        .route("/health", get(health_handler))
        .with_state(dashboard_state)
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;

    let last_tick = state
        .last_tick
        .as_ref()
        .map(|t| html_escape(t.as_str()))
        .unwrap_or_else(|| "Unknown".to_string());
    let channel = state
        .channel_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "NOT CONFIGURED".to_string());

    let history_rows: String = state
        .history
        .iter()
        .rev()
        .map(|h| {
            let status = if h.success { "OK" } else { "Failed" };
            format!(
                r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
                html_escape(&h.tick),
                h.channel_id.map(|c| c.to_string()).unwrap_or_default(),
                status,
                html_escape(h.error.as_deref().unwrap_or(""))
            )
        })
        .collect();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Galtick Dashboard</title>
</head>
<body style="font-family: sans-serif; margin: 2rem;">
    <h1>Galtick Dashboard</h1>
    <section>
        <h2>Monitor</h2>
        <p>Phase: {phase}</p>
        <p>Last tick: {last_tick}</p>
        <p>Notification channel: {channel}</p>
        <p>Consecutive errors: {errors}</p>
    </section>
    <section>
        <h2>Notification History</h2>
        <table>
            <thead><tr><th>Tick</th><th>Channel</th><th>Status</th><th>Error</th></tr></thead>
            <tbody>{history_rows}</tbody>
        </table>
    </section>
</body>
</html>"#,
        phase = state.phase,
        last_tick = last_tick,
        channel = channel,
        errors = state.consecutive_errors,
        history_rows = history_rows,
    );

    Html(html)
}

/// Tick values come from a remote API and must not reach the page as markup
fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

async fn status_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;

    Json(serde_json::json!({
        "last_tick": state.last_tick,
        "channel_id": state.channel_id,
        "phase": state.phase,
        "last_poll_epoch_ms": state.last_poll_epoch_ms,
        "last_change_epoch_ms": state.last_change_epoch_ms,
        "consecutive_errors": state.consecutive_errors,
        "polling_interval_ms": state.polling_interval_ms,
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

async fn history_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    let history: Vec<_> = state.history.iter().cloned().collect();
    Json(history)
}

async fn tick_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.commands.tick().await)
}

async fn next_tick_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    Json(dashboard.commands.next_tick().await)
}

fn is_admin(headers: &HeaderMap, admin_token: Option<&str>) -> bool {
    let Some(expected) = admin_token else {
        return false;
    };
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected)
}

async fn tick_channel_handler(
    State(dashboard): State<DashboardState>,
    headers: HeaderMap,
    Json(request): Json<TickChannelRequest>,
) -> Response {
    let ctx = CommandContext {
        channel_id: request.channel_id,
        channel_name: request.channel_name,
        is_admin: is_admin(&headers, dashboard.admin_token.as_deref()),
    };

    match dashboard.commands.execute(Command::TickChannel, &ctx).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e @ crate::GaltickError::Privilege(_)) => (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
        Err(e @ crate::GaltickError::Config(_)) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}
