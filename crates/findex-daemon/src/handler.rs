//! Request handler for daemon IPC.

use async_trait::async_trait;
use findex_core::DaemonConfig;
use findex_engine::{EngineError, Indexer, RunState};
use findex_ipc::{ErrorCode, EventSink, Request, RequestHandler, Response, ResponseData};
use findex_scan::{ContentExtractor, Scanner};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, mpsc};

/// Handles incoming IPC requests
pub struct DaemonHandler {
    indexer: Arc<Indexer>,
    extractor: ContentExtractor,
    shutdown_tx: broadcast::Sender<()>,
    start_time: Instant,
}

impl DaemonHandler {
    /// Create a new handler
    pub fn new(
        config: DaemonConfig,
        indexer: Arc<Indexer>,
        shutdown_tx: broadcast::Sender<()>,
        start_time: Instant,
    ) -> Self {
        Self {
            indexer,
            extractor: ContentExtractor::new(config.max_extract_size),
            shutdown_tx,
            start_time,
        }
    }

    /// Get uptime in seconds
    fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Scan, extract and ingest, streaming one progress frame per file.
    async fn start_indexing(&self, folders: Vec<PathBuf>, events: EventSink) -> Response {
        if matches!(self.indexer.run_state(), RunState::Running { .. }) {
            return Response::error(
                ErrorCode::IndexingInProgress,
                "An indexing run is already in flight",
            );
        }

        // The walk is blocking filesystem work
        let scan = tokio::task::spawn_blocking(move || Scanner::new().scan_folders(&folders)).await;

        let descriptors = match scan {
            Ok(Ok(descriptors)) => descriptors,
            Ok(Err(e)) => {
                self.indexer.mark_failed(e.to_string());
                return Response::ok_with(ResponseData::IndexOutcome {
                    success: false,
                    files_processed: 0,
                    error: Some(e.to_string()),
                });
            }
            Err(e) => {
                self.indexer.mark_failed(e.to_string());
                return Response::error(ErrorCode::InternalError, e.to_string());
            }
        };

        let mut items = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let content = self.extractor.extract(&descriptor).await;
            items.push((descriptor, content));
        }

        // Forward engine progress events to the connection
        let (tx, mut rx) = mpsc::channel::<findex_engine::IngestProgress>(32);
        let sink = events.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(p) = rx.recv().await {
                sink.progress(p.processed, p.total, p.current).await;
            }
        });

        let outcome = self.indexer.ingest(items, Some(tx)).await;

        // All progress frames are queued before the terminal response
        let _ = forwarder.await;

        match outcome {
            Ok(outcome) => {
                let error = if outcome.failed > 0 {
                    Some(format!("{} files could not be stored", outcome.failed))
                } else {
                    None
                };
                Response::ok_with(ResponseData::IndexOutcome {
                    success: true,
                    files_processed: outcome.stored,
                    error,
                })
            }
            Err(EngineError::IngestInProgress) => Response::error(
                ErrorCode::IndexingInProgress,
                "An indexing run is already in flight",
            ),
            Err(e) => {
                tracing::warn!(error = %e, "Indexing run failed");
                Response::error(ErrorCode::InternalError, e.to_string())
            }
        }
    }
}

#[async_trait]
impl RequestHandler for DaemonHandler {
    async fn handle(&self, request: Request, events: EventSink) -> Response {
        match request {
            Request::Ping => Response::ok_with(ResponseData::Pong {
                timestamp: chrono::Utc::now().timestamp(),
            }),

            Request::Status => {
                let indexing = matches!(self.indexer.run_state(), RunState::Running { .. });
                let total_files = match self.indexer.stats().await {
                    Ok(stats) => stats.total_files,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to read stats for status");
                        0
                    }
                };

                Response::ok_with(ResponseData::Status {
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    uptime_secs: self.uptime_secs(),
                    indexing,
                    total_files,
                })
            }

            Request::StartIndexing { folders } => self.start_indexing(folders, events).await,

            Request::Search { query, filters } => {
                if filters.is_some() {
                    tracing::debug!("Search filters are not supported yet; ignoring");
                }
                let hits = self.indexer.search(&query);
                Response::ok_with(ResponseData::Hits { hits })
            }

            Request::Stats => match self.indexer.stats().await {
                Ok(stats) => Response::ok_with(ResponseData::Stats { stats }),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to collect stats");
                    Response::error(ErrorCode::InternalError, e.to_string())
                }
            },

            Request::ClearIndex => match self.indexer.clear().await {
                Ok(()) => Response::ok(),
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to clear index");
                    Response::error(ErrorCode::InternalError, e.to_string())
                }
            },

            Request::CancelIndexing => {
                self.indexer.cancel();
                Response::ack()
            }

            Request::Shutdown => {
                tracing::info!("Shutdown requested via IPC");
                let _ = self.shutdown_tx.send(());
                Response::ack()
            }
        }
    }
}
