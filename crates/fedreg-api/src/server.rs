//! HTTP server lifecycle

use crate::router::build_router;
use crate::shutdown::ShutdownSignal;
use crate::state::AppState;
use fedreg_config::Config;
use fedreg_core::{Error, Result};
use fedreg_registry::Registry;
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Serve the registry API until `shutdown` fires, then wait at most
/// `server.shutdown_timeout` for in-flight requests.
pub async fn serve(config: &Config, registry: Registry, shutdown: ShutdownSignal) -> Result<()> {
    let state = Arc::new(AppState::new(registry, &config.auth));
    if !state.auth.enabled() {
        warn!("Authentication disabled: every caller is an administrator");
    }
    let app = build_router(state, &config.server);

    let listener = TcpListener::bind(config.server.listen).await?;
    info!(
        listen = %config.server.listen,
        api_prefix = %config.server.api_prefix,
        "Federation registry listening"
    );

    let graceful = shutdown.clone();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move { graceful.wait().await })
        .into_future();
    let mut handle = tokio::spawn(server);

    tokio::select! {
        joined = &mut handle => return flatten(joined),
        _ = shutdown.wait() => {}
    }

    info!(timeout = ?config.server.shutdown_timeout, "Draining in-flight requests");
    match tokio::time::timeout(config.server.shutdown_timeout, handle).await {
        Ok(joined) => flatten(joined),
        Err(_) => {
            warn!("Graceful shutdown timed out");
            Ok(())
        }
    }
}

fn flatten(
    joined: std::result::Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<()> {
    match joined {
        Ok(result) => result.map_err(Error::from),
        Err(e) => Err(Error::Internal(format!("server task failed: {e}"))),
    }
}
