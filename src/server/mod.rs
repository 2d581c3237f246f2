pub mod middleware;
pub mod router;

use crate::config::CONFIG;
use crate::error::DiagError;
use crate::probe;
use router::{DiagState, diag_router};
use tokio::net::TcpListener;
use tracing::{error, info};

/// Run the minimal debug server on `HOST:PORT`. The platform kills
/// instances that never bind the published port, so a failed bind is
/// reported loudly with the address named.
pub async fn serve() -> Result<(), DiagError> {
    let client = probe::probe_client().map_err(DiagError::Http)?;
    let state = DiagState::new(client);
    let app = diag_router(state);

    let addr = format!("{}:{}", CONFIG.host, CONFIG.port);
    info!(addr = %addr, "starting diagnostics server");
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %addr, error = %e, "port unavailable");
            return Err(e.into());
        }
    };
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install Ctrl-C handler");
    }
}
