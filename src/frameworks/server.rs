// Framework bootstrap for the rock-paper-scissors server runtime.

use crate::domain::MatchRecorder;
use crate::frameworks::config;
use crate::frameworks::listener::{AcceptSource, FaultAwareListener};
use crate::interface_adapters::net::{leaderboard_handler, matches_handler, ws_handler};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::store::InMemoryMatchStore;
use crate::use_cases::{GameSettings, SessionRegistry};

use axum::{Router, routing::get};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    // try_init so a second call (tests, embedding) leaves the first subscriber in place.
    let installed = if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init()
    };
    if installed.is_err() {
        return;
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Serves on an already bound listener with the default session limits.
pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    run_with_settings(listener, GameSettings::default()).await
}

pub async fn run_with_settings(
    listener: tokio::net::TcpListener,
    game_settings: GameSettings,
) -> Result<()> {
    serve_on(listener, game_settings).await
}

// Serves until the server future ends or the listener reports a fault.
// A listener fault is returned so the process can exit with it.
pub(crate) async fn serve_on<A: AcceptSource>(
    source: A,
    game_settings: GameSettings,
) -> Result<()> {
    let address = source.local_addr()?;
    let state = build_state(game_settings);

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/leaderboard", get(leaderboard_handler))
        .route("/matches", get(matches_handler))
        .with_state(state);

    let (listener, fault_rx) = FaultAwareListener::new(source);
    tracing::info!(?address, "listening");

    let server = axum::serve(listener, app).into_future();
    tokio::select! {
        served = server => served.inspect_err(|e| {
            tracing::error!(error = %e, "server error");
        }),
        Ok(fault) = fault_rx => Err(fault),
    }
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::new(config::bind_addr(), config::http_port());

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run_with_settings(listener, config::game_settings()).await
}

fn build_state(game_settings: GameSettings) -> Arc<AppState> {
    tracing::debug!(
        reply_timeout_ms = game_settings.reply_timeout.as_millis(),
        max_invalid_replies = game_settings.max_invalid_replies,
        "session limits configured"
    );

    let recorder: Arc<dyn MatchRecorder> = Arc::new(InMemoryMatchStore::new());

    Arc::new(AppState {
        registry: SessionRegistry::new(),
        recorder,
        game_settings,
    })
}
