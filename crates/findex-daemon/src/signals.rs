//! Shutdown triggers.
//!
//! The daemon stops on SIGINT, on SIGTERM, or when a shutdown request
//! arrives over the IPC socket.

use tokio::sync::broadcast;

/// What caused the daemon to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Interrupt,
    Terminate,
    IpcRequest,
}

/// Resolves once any shutdown trigger fires.
pub async fn shutdown_requested(mut ipc_shutdown: broadcast::Receiver<()>) -> ShutdownReason {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => ShutdownReason::Interrupt,
        _ = sigterm() => ShutdownReason::Terminate,
        _ = ipc_shutdown.recv() => ShutdownReason::IpcRequest,
    }
}

#[cfg(unix)]
async fn sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            // The other triggers still work without a SIGTERM stream
            tracing::error!(error = %e, "Cannot listen for SIGTERM");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn sigterm() {
    std::future::pending::<()>().await;
}
