//! Unix socket IPC server for the Findex daemon.
//!
//! Handles incoming connections, dispatches requests to a handler, and
//! forwards the handler's progress frames to the client ahead of the
//! terminal response.

use crate::{ErrorCode, IpcError, Request, Response};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;

/// Maximum request size (1MB)
const MAX_REQUEST_SIZE: usize = 1024 * 1024;

/// Timeout for reading a request off a fresh connection
const REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Handler-side emitter for intermediate progress frames.
///
/// Frames are queued to the connection task; a slow or disconnected
/// client never blocks or fails the handler.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<Response>,
}

impl EventSink {
    /// Build a sink detached from any connection, plus its receiving
    /// end. Lets handler tests observe emitted frames directly.
    pub fn detached() -> (Self, mpsc::Receiver<Response>) {
        let (tx, rx) = mpsc::channel(32);
        (Self { tx }, rx)
    }

    /// Emit one progress frame. Dropped if the client went away.
    pub async fn progress(&self, processed: usize, total: usize, current_file: PathBuf) {
        let _ = self
            .tx
            .send(Response::Progress {
                processed,
                total,
                current_file,
            })
            .await;
    }
}

/// Trait for handling incoming requests
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Handle a request and return the terminal response. Long-running
    /// handlers stream progress through `events` along the way.
    async fn handle(&self, request: Request, events: EventSink) -> Response;
}

/// Unix socket IPC server
pub struct IpcServer {
    listener: UnixListener,
    handler: Arc<dyn RequestHandler>,
}

impl IpcServer {
    /// Create a new IPC server bound to the given socket path
    pub async fn new<P: AsRef<Path>>(
        socket_path: P,
        handler: Arc<dyn RequestHandler>,
    ) -> Result<Self, IpcError> {
        let socket_path = socket_path.as_ref();

        // Remove stale socket file if it exists
        if socket_path.exists() {
            let _ = std::fs::remove_file(socket_path);
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let listener = UnixListener::bind(socket_path)?;

        // Set socket permissions (user only - 0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::info!("IPC server listening on {}", socket_path.display());

        Ok(Self { listener, handler })
    }

    /// Run the server, accepting connections until shutdown
    pub async fn run(&self) -> Result<(), IpcError> {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    let handler = self.handler.clone();
                    tokio::spawn(async move {
                        if let Err(e) = Self::handle_connection(stream, handler).await {
                            tracing::debug!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Accept error: {}", e);
                }
            }
        }
    }

    /// Handle a single connection: one request, progress frames, one
    /// terminal response.
    async fn handle_connection(
        mut stream: UnixStream,
        handler: Arc<dyn RequestHandler>,
    ) -> Result<(), IpcError> {
        let request = tokio::time::timeout(REQUEST_TIMEOUT, Self::read_request(&mut stream))
            .await
            .map_err(IpcError::Timeout)?;

        let request = match request {
            Ok(req) => req,
            Err(e) => {
                let response = Response::error(
                    ErrorCode::InvalidRequest,
                    format!("Failed to parse request: {}", e),
                );
                Self::write_frame(&mut stream, &response).await?;
                return Err(e);
            }
        };

        tracing::debug!("Received request: {:?}", request);

        let (tx, mut rx) = mpsc::channel(32);
        let events = EventSink { tx };

        let fut = handler.handle(request, events);
        tokio::pin!(fut);

        // Forward progress frames while the handler runs
        let response = loop {
            tokio::select! {
                frame = rx.recv() => match frame {
                    Some(frame) => Self::write_frame(&mut stream, &frame).await?,
                    // Sink dropped early; just wait out the handler
                    None => break fut.await,
                },
                response = &mut fut => break response,
            }
        };

        // The handler dropped its sink; flush anything still queued
        while let Ok(frame) = rx.try_recv() {
            Self::write_frame(&mut stream, &frame).await?;
        }

        Self::write_frame(&mut stream, &response).await?;

        Ok(())
    }

    /// Read a request from the stream
    async fn read_request(stream: &mut UnixStream) -> Result<Request, IpcError> {
        // Length prefix (4 bytes, little-endian)
        let mut len_buf = [0u8; 4];
        stream.read_exact(&mut len_buf).await?;
        let len = u32::from_le_bytes(len_buf) as usize;

        if len > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge);
        }

        let mut buf = vec![0u8; len];
        stream.read_exact(&mut buf).await?;

        // Try MessagePack first, fall back to JSON for easier debugging
        if let Ok(request) = rmp_serde::from_slice(&buf) {
            return Ok(request);
        }

        // JSON fallback (useful for testing with nc/socat)
        if let Ok(request) = serde_json::from_slice(&buf) {
            return Ok(request);
        }

        Err(IpcError::Deserialize(
            rmp_serde::from_slice::<Request>(&buf).unwrap_err(),
        ))
    }

    /// Write one response frame to the stream
    async fn write_frame(stream: &mut UnixStream, response: &Response) -> Result<(), IpcError> {
        let response_bytes = rmp_serde::to_vec(response)?;
        let len_bytes = (response_bytes.len() as u32).to_le_bytes();

        stream.write_all(&len_bytes).await?;
        stream.write_all(&response_bytes).await?;
        stream.flush().await?;

        Ok(())
    }
}
