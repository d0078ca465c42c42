//! Referral store service for the community referral board.
//!
//!
//!
//! # Endpoints
//! - `GET /referrals`: every referral, newest first
//! - `POST /referrals`: create from a draft, responds `201` with the stored referral
//! - `PUT /referrals/{id}/votes`: overwrite `upvotes` and `downvotes`, `204` or `404`
//! - `GET /apps`: the app catalog
//!
//!
//!
//! # Stores
//! - `REFR_STORE=redis` (default): see [`database`]
//! - `REFR_STORE=memory`: process-local, handy for local runs and demos
//!
//!
//!
//! # Notes
//!
//! ## No vote bookkeeping here
//! The service does not know who voted. Clients keep their own ledger and send
//! absolute counter values. It is a plain document store on purpose so any
//! managed document database could take its place.
//!
//!
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
//!
//! Run against a local Redis.
//! ```sh
//! REDIS_URL=redis://localhost:6379 RUST_LOG=info cargo run -p refr
//! ```
//!
//! Run without Redis.
//! ```sh
//! REFR_STORE=memory RUST_LOG=info cargo run -p refr
//! ```
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, put},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod routes;
pub mod state;

use routes::{apps_handler, create_handler, list_handler, votes_handler};
use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/referrals", get(list_handler).post(create_handler))
        .route("/referrals/{id}/votes", put(votes_handler))
        .route("/apps", get(apps_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    let app = router(state);

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
