//! Authoritative robot-simulation sync server.
//!
//! HTTP carries control commands, WebSocket sessions carry mirrored commands,
//! simulation events and per-tick state snapshots to rendering clients.

use std::net::SocketAddr;

use tracing::{error, info};

mod domain;
mod gateway;
mod hub;
mod protocol;
mod sim;
mod world;

use gateway::AppState;
use world::WorldConfig;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .compact()
        .init();

    let state = AppState::new(WorldConfig::default());
    sim::spawn(state.clone());

    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8080u16);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("listening on {addr}");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("failed to bind {addr}: {err}");
            return;
        }
    };
    if let Err(err) = axum::serve(listener, gateway::router(state)).await {
        error!("server error: {err}");
    }
}
