//! Findex CLI
//!
//! Command-line interface for the Findex indexing daemon.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use findex_ipc::{IpcClient, Request, Response, ResponseData};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "findex")]
#[command(about = "Findex - fuzzy search over your indexed files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Findex daemon
    Start {
        /// Run in foreground (for debugging)
        #[arg(short, long)]
        foreground: bool,
    },

    /// Stop the Findex daemon
    Stop,

    /// Show daemon status
    Status,

    /// Check if daemon is running
    Ping,

    /// Scan and index one or more folders
    Index {
        /// Folders to index
        #[arg(required = true)]
        folders: Vec<PathBuf>,
    },

    /// Fuzzy-search the indexed files
    Search {
        /// Search query
        query: String,

        /// Maximum number of results to print
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Show corpus statistics
    Stats,

    /// Remove every indexed record
    Clear,

    /// Cancel the in-flight indexing run
    Cancel,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Simple logging for CLI
    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt().with_target(false).init();
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { foreground } => cmd_start(foreground).await,
        Commands::Stop => cmd_stop().await,
        Commands::Status => cmd_status().await,
        Commands::Ping => cmd_ping().await,
        Commands::Index { folders } => cmd_index(folders).await,
        Commands::Search { query, limit } => cmd_search(&query, limit).await,
        Commands::Stats => cmd_stats().await,
        Commands::Clear => cmd_clear().await,
        Commands::Cancel => cmd_cancel().await,
    }
}

async fn cmd_start(foreground: bool) -> Result<()> {
    if foreground {
        println!("Starting Findex daemon in foreground...");
        println!("Press Ctrl+C to stop.");

        let status = std::process::Command::new("findex-daemon")
            .status()
            .context("Failed to start daemon. Is findex-daemon in PATH?")?;

        if !status.success() {
            anyhow::bail!("Daemon exited with error");
        }
    } else {
        if IpcClient::new().is_daemon_running() {
            println!("Findex daemon is already running.");
            return Ok(());
        }

        let child = std::process::Command::new("findex-daemon")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .context("Failed to start daemon")?;

        println!("✓ Findex daemon started (PID: {})", child.id());
    }

    Ok(())
}

async fn cmd_stop() -> Result<()> {
    let client = IpcClient::new();

    if !client.is_daemon_running() {
        println!("Findex daemon is not running.");
        return Ok(());
    }

    match client.request(Request::Shutdown).await {
        Ok(Response::Ack) => {
            println!("✓ Findex daemon stopping...");

            // Wait a moment for cleanup
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;

            if !client.is_daemon_running() {
                println!("✓ Daemon stopped.");
            }
        }
        Ok(resp) => {
            println!("Unexpected response: {:?}", resp);
        }
        Err(e) => {
            println!("Failed to stop daemon: {}", e);
        }
    }

    Ok(())
}

async fn cmd_status() -> Result<()> {
    let client = IpcClient::new();

    if !client.is_daemon_running() {
        println!("Findex daemon is not running.");
        println!("\nStart with: findex start");
        return Ok(());
    }

    match client.request(Request::Status).await {
        Ok(Response::Ok {
            data:
                Some(ResponseData::Status {
                    version,
                    uptime_secs,
                    indexing,
                    total_files,
                }),
        }) => {
            println!("Findex Daemon v{}", version);
            println!();
            println!("  Status:   Running");
            println!("  Uptime:   {}", format_duration(uptime_secs));
            println!(
                "  Indexing: {}",
                if indexing { "in progress" } else { "idle" }
            );
            println!("  Files:    {} indexed", total_files);
        }
        Ok(_) => {
            println!("Unexpected status response");
        }
        Err(e) => {
            println!("Failed to get status: {}", e);
        }
    }

    Ok(())
}

async fn cmd_ping() -> Result<()> {
    let client = IpcClient::new();

    if !client.is_daemon_running() {
        println!("✗ Daemon not running");
        return Ok(());
    }

    let start = std::time::Instant::now();
    match client.request(Request::Ping).await {
        Ok(Response::Ok {
            data: Some(ResponseData::Pong { .. }),
        }) => {
            let elapsed = start.elapsed();
            println!("✓ Pong! ({:.2}ms)", elapsed.as_secs_f64() * 1000.0);
        }
        Ok(_) => {
            println!("✗ Unexpected response");
        }
        Err(e) => {
            println!("✗ Error: {}", e);
        }
    }

    Ok(())
}

async fn cmd_index(folders: Vec<PathBuf>) -> Result<()> {
    let mut resolved = Vec::with_capacity(folders.len());
    for folder in folders {
        resolved.push(folder.canonicalize().context("Invalid folder path")?);
    }

    let client = IpcClient::new();

    if !client.is_daemon_running() {
        println!("✗ Daemon not running. Start with: findex start");
        return Ok(());
    }

    println!("Indexing {} folder(s)...", resolved.len());

    let response = client
        .request_streamed(
            Request::StartIndexing { folders: resolved },
            |processed, total, current| {
                println!("  [{}/{}] {}", processed, total, current.display());
            },
        )
        .await;

    match response {
        Ok(Response::Ok {
            data:
                Some(ResponseData::IndexOutcome {
                    success,
                    files_processed,
                    error,
                }),
        }) => {
            if success {
                println!("✓ Indexed {} files", files_processed);
                if let Some(warning) = error {
                    println!("  Warning: {}", warning);
                }
            } else {
                println!(
                    "✗ Indexing failed: {}",
                    error.unwrap_or_else(|| "unknown error".to_string())
                );
            }
        }
        Ok(Response::Error { message, .. }) => {
            println!("✗ Indexing failed: {}", message);
        }
        Ok(_) => {
            println!("✗ Unexpected response");
        }
        Err(e) => {
            println!("✗ Error: {}", e);
        }
    }

    Ok(())
}

async fn cmd_search(query: &str, limit: usize) -> Result<()> {
    let client = IpcClient::new();

    if !client.is_daemon_running() {
        println!("✗ Daemon not running. Start with: findex start");
        return Ok(());
    }

    let response = client
        .request(Request::Search {
            query: query.to_string(),
            filters: None,
        })
        .await;

    match response {
        Ok(Response::Ok {
            data: Some(ResponseData::Hits { hits }),
        }) => {
            if hits.is_empty() {
                println!("No matches for '{}'", query);
                return Ok(());
            }

            println!("{} match(es) for '{}':", hits.len(), query);
            println!();
            for hit in hits.iter().take(limit) {
                println!(
                    "  {:.3}  {}  [{}]",
                    hit.score,
                    hit.record.path.display(),
                    hit.record.category
                );
            }
            if hits.len() > limit {
                println!();
                println!("  ... and {} more", hits.len() - limit);
            }
        }
        Ok(Response::Error { message, .. }) => {
            println!("✗ Search failed: {}", message);
        }
        Ok(_) => {
            println!("✗ Unexpected response");
        }
        Err(e) => {
            println!("✗ Error: {}", e);
        }
    }

    Ok(())
}

async fn cmd_stats() -> Result<()> {
    let client = IpcClient::new();

    if !client.is_daemon_running() {
        println!("✗ Daemon not running. Start with: findex start");
        return Ok(());
    }

    match client.request(Request::Stats).await {
        Ok(Response::Ok {
            data: Some(ResponseData::Stats { stats }),
        }) => {
            println!("Indexed corpus");
            println!();
            println!("  Files:  {}", stats.total_files);
            println!("  Size:   {:.1} MB", stats.total_size as f64 / 1024.0 / 1024.0);
            match stats.last_indexed {
                Some(ts) => println!("  Last indexed: {}", ts.format("%Y-%m-%d %H:%M:%S UTC")),
                None => println!("  Last indexed: never"),
            }
            if !stats.by_category.is_empty() {
                println!();
                for (category, count) in &stats.by_category {
                    println!("  {:>8}  {}", count, category);
                }
            }
        }
        Ok(Response::Error { message, .. }) => {
            println!("✗ Failed to get stats: {}", message);
        }
        Ok(_) => {
            println!("✗ Unexpected response");
        }
        Err(e) => {
            println!("✗ Error: {}", e);
        }
    }

    Ok(())
}

async fn cmd_clear() -> Result<()> {
    let client = IpcClient::new();

    if !client.is_daemon_running() {
        println!("✗ Daemon not running. Start with: findex start");
        return Ok(());
    }

    match client.request(Request::ClearIndex).await {
        Ok(Response::Ok { .. }) => {
            println!("✓ Index cleared");
        }
        Ok(Response::Error { message, .. }) => {
            println!("✗ Failed to clear index: {}", message);
        }
        Ok(_) => {
            println!("✗ Unexpected response");
        }
        Err(e) => {
            println!("✗ Error: {}", e);
        }
    }

    Ok(())
}

async fn cmd_cancel() -> Result<()> {
    let client = IpcClient::new();

    if !client.is_daemon_running() {
        println!("✗ Daemon not running");
        return Ok(());
    }

    match client.request(Request::CancelIndexing).await {
        Ok(Response::Ack) => {
            println!("✓ Cancellation requested");
        }
        Ok(_) => {
            println!("✗ Unexpected response");
        }
        Err(e) => {
            println!("✗ Error: {}", e);
        }
    }

    Ok(())
}

fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}
