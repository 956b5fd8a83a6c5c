//! Daemon lifecycle management.

use anyhow::{Context, Result};
use findex_core::DaemonConfig;
use findex_engine::{Indexer, SearchConfig};
use findex_ipc::IpcServer;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::handler::DaemonHandler;
use crate::signals;

/// The main daemon process
pub struct Daemon {
    config: DaemonConfig,
    shutdown_tx: broadcast::Sender<()>,
    is_running: Arc<AtomicBool>,
    start_time: std::time::Instant,
}

impl Daemon {
    /// Create a new daemon instance
    pub fn new() -> Result<Self> {
        let config = DaemonConfig::load();

        config
            .ensure_dirs()
            .context("Failed to create data directories")?;

        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self {
            config,
            shutdown_tx,
            is_running: Arc::new(AtomicBool::new(false)),
            start_time: std::time::Instant::now(),
        })
    }

    /// Run the daemon
    pub async fn run(&self) -> Result<()> {
        // Check single instance
        self.acquire_pid_lock()?;

        self.is_running.store(true, Ordering::SeqCst);

        tracing::info!(
            socket = %self.config.socket_path.display(),
            data_dir = %self.config.data_dir.display(),
            "Daemon starting"
        );

        let search_config = SearchConfig::from(&self.config.search);
        let indexer = Arc::new(
            Indexer::open(self.config.records_dir(), search_config)
                .await
                .context("Failed to open record store")?,
        );

        let handler = Arc::new(DaemonHandler::new(
            self.config.clone(),
            indexer,
            self.shutdown_tx.clone(),
            self.start_time,
        ));

        let ipc_server = IpcServer::new(&self.config.socket_path, handler)
            .await
            .context("Failed to create IPC server")?;

        let shutdown_rx = self.shutdown_tx.subscribe();

        tokio::select! {
            result = ipc_server.run() => {
                if let Err(e) = result {
                    tracing::error!("IPC server error: {}", e);
                }
            }
            reason = signals::shutdown_requested(shutdown_rx) => {
                tracing::info!(?reason, "Shutting down");
            }
        }

        self.cleanup().await?;

        Ok(())
    }

    /// Acquire PID lock to ensure single instance
    fn acquire_pid_lock(&self) -> Result<()> {
        let pid_file = &self.config.pid_file;

        if pid_file.exists() {
            // Read existing PID
            if let Ok(pid_str) = std::fs::read_to_string(pid_file) {
                if let Ok(pid) = pid_str.trim().parse::<u32>() {
                    if is_process_running(pid) {
                        anyhow::bail!("Daemon already running (PID: {})", pid);
                    }
                }
            }
            // Stale PID file, remove it
            std::fs::remove_file(pid_file)?;
        }

        std::fs::write(pid_file, std::process::id().to_string())?;

        tracing::debug!(pid = std::process::id(), "PID lock acquired");

        Ok(())
    }

    /// Cleanup resources on shutdown
    async fn cleanup(&self) -> Result<()> {
        tracing::info!("Cleaning up...");

        if self.config.socket_path.exists() {
            let _ = std::fs::remove_file(&self.config.socket_path);
        }

        if self.config.pid_file.exists() {
            let _ = std::fs::remove_file(&self.config.pid_file);
        }

        self.is_running.store(false, Ordering::SeqCst);

        tracing::info!("Cleanup complete");

        Ok(())
    }
}

impl Drop for Daemon {
    fn drop(&mut self) {
        // Ensure cleanup happens even on panic
        if self.config.pid_file.exists() {
            let _ = std::fs::remove_file(&self.config.pid_file);
        }
    }
}

/// Check if a process is running by PID
fn is_process_running(pid: u32) -> bool {
    // kill(pid, 0) checks existence without sending a signal
    unsafe { libc::kill(pid as i32, 0) == 0 }
}
