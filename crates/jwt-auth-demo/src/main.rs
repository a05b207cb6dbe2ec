//! jwt-auth demo service
//!
//! Small HTTP service wiring every jwt-auth access mode onto routes, with
//! in-memory users and revocation records.

mod routes;
mod store;

use jwt_auth::config::AuthConfig;
use jwt_auth::services::HttpRoleResolver;
use jwt_auth::SessionAuthenticator;
use routes::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use store::{DemoStore, DemoUser};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jwt_auth=debug,jwt_auth_demo=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jwt-auth demo");

    let config = Arc::new(AuthConfig::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?);

    info!(
        timezone = %config.timezone,
        algorithm = ?config.jwt.algorithm,
        roles_service = %config.roles.base_url,
        "Configuration loaded successfully"
    );

    let resolver = Arc::new(HttpRoleResolver::new(&config.roles)?);

    let store = Arc::new(DemoStore::seeded());
    let authenticator = SessionAuthenticator::new(config, store.clone())
        .with_user_lookup::<DemoUser>(store.clone());

    let state = Arc::new(AppState {
        store,
        authenticator: Arc::new(authenticator),
    });

    let app = routes::build_routes(state, resolver);

    let bind_address =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string());
    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("jwt-auth demo listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("jwt-auth demo shutdown complete");

    Ok(())
}

/// Returns when SIGINT or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, shutting down..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, shutting down...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
