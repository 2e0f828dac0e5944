//! Chart Quiz Back binary entrypoint wiring the REST surface and storage layers.

use std::{env, net::SocketAddr};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod dao;
mod dto;
mod error;
mod routes;
mod services;
mod state;

use config::AppConfig;
use state::{AppState, SharedState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let app_state = AppState::new(AppConfig::load());

    install_storage(&app_state).await;
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Start the MongoDB supervisor, or fall back to the in-memory store when the
/// backend is compiled out.
#[cfg(feature = "mongo-store")]
async fn install_storage(state: &SharedState) {
    let mongo_uri = env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".into());
    let mongo_db = env::var("MONGO_DB").ok();
    tokio::spawn(run_storage_supervisor(state.clone(), mongo_uri, mongo_db));
}

/// Start the MongoDB supervisor, or fall back to the in-memory store when the
/// backend is compiled out.
#[cfg(not(feature = "mongo-store"))]
async fn install_storage(state: &SharedState) {
    use crate::dao::roster_store::memory::MemoryRosterStore;

    tracing::warn!("built without mongo-store; roster data lives in process memory only");
    state
        .install_roster_store(std::sync::Arc::new(MemoryRosterStore::new()))
        .await;
}

/// Supervises the MongoDB connection by retrying in the background and toggling
/// degraded mode when connectivity changes.
#[cfg(feature = "mongo-store")]
async fn run_storage_supervisor(state: SharedState, uri: String, db_name: Option<String>) {
    use std::{sync::Arc, time::Duration};

    use crate::dao::roster_store::mongodb::{MongoConfig, MongoRosterStore};
    use tokio::time::sleep;
    use tracing::warn;

    let initial_delay_ms = 1000;
    let mut delay = Duration::from_millis(initial_delay_ms);
    let max_delay = Duration::from_secs(10);

    loop {
        if let Some(store) = state.roster_store().await {
            match store.health_check().await {
                Ok(_) => {
                    // Healthy connection: reset the retry backoff and avoid
                    // hammering the database with pings.
                    delay = Duration::from_millis(initial_delay_ms);
                    sleep(Duration::from_secs(5)).await;
                }
                Err(err) => {
                    // Existing connection failed: drop it, flip to degraded
                    // mode, and retry with exponential backoff.
                    warn!(error = %err, "storage health check failed; entering degraded mode");
                    state.clear_roster_store().await;
                    sleep(delay).await;
                    delay = (delay * 2).min(max_delay);
                }
            }
            continue;
        }

        let config = match MongoConfig::from_uri(&uri, db_name.as_deref()).await {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "invalid MongoDB configuration");
                sleep(delay).await;
                delay = (delay * 2).min(max_delay);
                continue;
            }
        };

        match MongoRosterStore::connect(config).await {
            Ok(store) => {
                // Fresh connection and indexes ready: install it and leave
                // degraded mode.
                info!("connected to MongoDB; leaving degraded mode");
                state.install_roster_store(Arc::new(store)).await;
                delay = Duration::from_millis(initial_delay_ms);
            }
            Err(err) => {
                // Could not reach MongoDB at all: wait and retry with
                // exponential backoff.
                warn!(error = %err, "MongoDB connection attempt failed");
                sleep(delay).await;
                delay = (delay * 2).min(max_delay);
            }
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: state::SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
