use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use chrono::{FixedOffset, NaiveDate, Utc};
use dotenvy::dotenv;
use log::{error, info, warn};
use std::collections::HashMap;
use std::sync::Arc;

use yotei::core::Config;
use yotei::database::Database;
use yotei::slack::events::{InboundPayload, InteractionPayload};
use yotei::slack::{ClientRegistry, SlackNotifier};
use yotei::{ChannelDirectory, EventHandler};

#[derive(Clone)]
struct AppState {
    handler: Arc<EventHandler>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting yotei reminder bot...");

    let db = Arc::new(Database::new(&config.database_path).await?);
    let http = reqwest::Client::new();
    let registry = Arc::new(ClientRegistry::new(
        db.clone(),
        http.clone(),
        config.slack_fallback_token.clone(),
    ));
    let channels = Arc::new(ChannelDirectory::new());
    let notifier = Arc::new(SlackNotifier::new(registry.clone(), channels.clone()));

    let handler = Arc::new(EventHandler::new(
        config.clone(),
        db,
        registry,
        channels,
        notifier,
        http,
    )?);

    spawn_dispatch_clock(
        handler.clone(),
        config.timezone()?,
        config.dispatch_time.clone(),
    );

    let app = Router::new()
        .route("/slack/events", post(slack_events))
        .route("/slack/interactions", post(slack_interactions))
        .route("/oauth/redirect", get(oauth_redirect))
        .with_state(AppState { handler });

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("Listening on {}", config.listen_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Fires the daily reminder sweep once per day at the configured wall-clock
/// time in the target timezone.
fn spawn_dispatch_clock(handler: Arc<EventHandler>, timezone: FixedOffset, at: String) {
    tokio::spawn(async move {
        let mut last_run: Option<NaiveDate> = None;
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(30));
        loop {
            interval.tick().await;
            let now = Utc::now().with_timezone(&timezone);
            let due = now.format("%H:%M").to_string() == at;
            if due && last_run != Some(now.date_naive()) {
                last_run = Some(now.date_naive());
                match handler.run_daily_dispatch().await {
                    Ok(sent) => info!("Daily dispatch delivered {sent} reminder(s)"),
                    Err(e) => error!("Daily dispatch failed: {e:#}"),
                }
            }
        }
    });
}

async fn slack_events(
    State(state): State<AppState>,
    Json(payload): Json<serde_json::Value>,
) -> impl IntoResponse {
    match serde_json::from_value::<InboundPayload>(payload) {
        Ok(InboundPayload::UrlVerification { challenge }) => {
            Json(serde_json::json!({ "challenge": challenge })).into_response()
        }
        Ok(InboundPayload::EventCallback(envelope)) => {
            // Ack immediately; Slack redelivers events that take too long
            let handler = state.handler.clone();
            tokio::spawn(async move {
                handler.handle_event(envelope).await;
            });
            StatusCode::OK.into_response()
        }
        Ok(InboundPayload::Other) => StatusCode::OK.into_response(),
        Err(e) => {
            warn!("Undecodable event payload: {e:#}");
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

/// Interactive components (the App Home button) arrive form-encoded with
/// the JSON body in a `payload` field.
async fn slack_interactions(
    State(state): State<AppState>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(raw) = form.get("payload") else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    match serde_json::from_str::<InteractionPayload>(raw) {
        Ok(payload) => {
            let handler = state.handler.clone();
            tokio::spawn(async move {
                if let Err(e) = handler.handle_interaction(payload).await {
                    error!("Interaction handling failed: {e:#}");
                }
            });
            StatusCode::OK.into_response()
        }
        Err(e) => {
            warn!("Undecodable interaction payload: {e:#}");
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

async fn oauth_redirect(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let Some(code) = params.get("code") else {
        return (StatusCode::BAD_REQUEST, "Missing code parameter.".to_string());
    };
    match state.handler.handle_oauth_code(code).await {
        Ok(team_id) => (
            StatusCode::OK,
            format!("Installation complete for team {team_id}. You can close this tab."),
        ),
        Err(e) => {
            error!("OAuth exchange failed: {e:#}");
            (
                StatusCode::BAD_REQUEST,
                "OAuth exchange failed; check the server logs.".to_string(),
            )
        }
    }
}
