//! IPC client for communicating with the Findex daemon.

use crate::{IpcError, Request, Response};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

/// Default socket path
const DEFAULT_SOCKET_PATH: &str = "/tmp/findex.sock";

/// Connection timeout
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// Request/response timeout for short requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// IPC client for communicating with the daemon
pub struct IpcClient {
    socket_path: PathBuf,
}

impl IpcClient {
    /// Create a client with default socket path
    pub fn new() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
        }
    }

    /// Create a client with custom socket path
    pub fn with_socket_path<P: AsRef<Path>>(socket_path: P) -> Self {
        Self {
            socket_path: socket_path.as_ref().to_path_buf(),
        }
    }

    /// Check if daemon is running
    pub fn is_daemon_running(&self) -> bool {
        self.socket_path.exists()
    }

    async fn do_connect(&self) -> Result<ConnectedClient, IpcError> {
        if !self.socket_path.exists() {
            return Err(IpcError::DaemonNotRunning);
        }

        let stream = tokio::time::timeout(CONNECT_TIMEOUT, UnixStream::connect(&self.socket_path))
            .await
            .map_err(|_| IpcError::ConnectionFailed("Connection timed out".to_string()))??;

        Ok(ConnectedClient { stream })
    }

    /// Send a short request and wait for its terminal response.
    ///
    /// Any progress frames in between are discarded.
    pub async fn request(&self, request: Request) -> Result<Response, IpcError> {
        let mut client = self.do_connect().await?;
        tokio::time::timeout(REQUEST_TIMEOUT, client.send(request))
            .await
            .map_err(|_| IpcError::ConnectionFailed("Request timed out".to_string()))?
    }

    /// Send a long-running request, invoking `on_progress` for every
    /// progress frame, and return the terminal response.
    ///
    /// No overall timeout: indexing a large corpus takes as long as it
    /// takes.
    pub async fn request_streamed<F>(
        &self,
        request: Request,
        on_progress: F,
    ) -> Result<Response, IpcError>
    where
        F: FnMut(usize, usize, &Path),
    {
        let mut client = self.do_connect().await?;
        client.send_streamed(request, on_progress).await
    }
}

impl Default for IpcClient {
    fn default() -> Self {
        Self::new()
    }
}

/// A connected IPC client that can send requests and receive responses
pub struct ConnectedClient {
    stream: UnixStream,
}

impl ConnectedClient {
    /// Send a request and wait for the terminal response, discarding
    /// progress frames.
    pub async fn send(&mut self, request: Request) -> Result<Response, IpcError> {
        self.send_streamed(request, |_, _, _| {}).await
    }

    /// Send a request, forwarding progress frames to the callback until
    /// the terminal response arrives.
    pub async fn send_streamed<F>(
        &mut self,
        request: Request,
        mut on_progress: F,
    ) -> Result<Response, IpcError>
    where
        F: FnMut(usize, usize, &Path),
    {
        let request_bytes = rmp_serde::to_vec(&request)?;
        let len_bytes = (request_bytes.len() as u32).to_le_bytes();

        self.stream.write_all(&len_bytes).await?;
        self.stream.write_all(&request_bytes).await?;
        self.stream.flush().await?;

        loop {
            let frame = self.read_frame().await?;
            match frame {
                Response::Progress {
                    processed,
                    total,
                    current_file,
                } => on_progress(processed, total, &current_file),
                terminal => return Ok(terminal),
            }
        }
    }

    async fn read_frame(&mut self) -> Result<Response, IpcError> {
        let mut len_buf = [0u8; 4];
        self.stream.read_exact(&mut len_buf).await?;
        let len = u32::from_le_bytes(len_buf) as usize;

        let mut buf = vec![0u8; len];
        self.stream.read_exact(&mut buf).await?;

        Ok(rmp_serde::from_slice(&buf)?)
    }
}
