// ABOUTME: HTTP surface of the daemon.
// ABOUTME: Deploy trigger, settings read/update and health, served with axum.

mod error;
mod handlers;
mod router;
mod state;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use handlers::{HealthResponse, SECRET_HEADER, SettingsBody};
pub use router::create_router;
pub use state::AppState;

use tokio::net::TcpListener;

/// Serve `state` on `listener` until ctrl-c.
///
/// In-flight requests drain; swap tasks already spawned are not awaited.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let app = create_router(state);

    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "swapd listening");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
