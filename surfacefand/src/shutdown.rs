//! Shutdown handling for graceful daemon termination
//!
//! Tears the fan controller down once the server stops accepting requests,
//! so late adapter calls observe `Removed` instead of reaching the device.

use surfacefan_hardware::SharedController;
use tokio::signal;
use tracing::{error, info};

/// Wait for Ctrl+C or SIGTERM
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

/// Remove the fan controller
pub(crate) async fn teardown(controller: &SharedController) {
    let mut controller = controller.write().await;
    info!(
        "Removing fan controller {} (state: {})",
        controller.endpoint(),
        controller.state()
    );
    controller.remove();
}
