//! HTTP server exposing the utilization endpoint.
//!
//! `GET /{subscriptionId}/ComputeUtilization/{location}/{vmType}` answers with
//! the quota, reserved cores and running cores of the VM family.

mod handlers;
mod routes;
mod state;

pub use handlers::{compute_utilization_handler, status_code, ErrorResponse};
pub use routes::{create_router, UTILIZATION_ROUTE};
pub use state::ServerState;

use crate::error::UtilizationResult;
use std::net::SocketAddr;

/// Serve the utilization endpoint until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: ServerState) -> UtilizationResult<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
