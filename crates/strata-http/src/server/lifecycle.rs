//! Signal handling for graceful shutdown

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Resolve on Ctrl+C, SIGTERM or when `token` is cancelled elsewhere; cancels `token`
pub async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => warn!("received Ctrl+C, shutting down gracefully"),
        _ = terminate => warn!("received terminate signal, shutting down gracefully"),
        _ = token.cancelled() => warn!("shutdown requested, shutting down gracefully"),
    }

    token.cancel();
}
