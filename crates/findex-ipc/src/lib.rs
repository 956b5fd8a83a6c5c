//! Unix socket IPC for the Findex daemon.
//!
//! Length-prefixed MessagePack frames (with a JSON fallback on decode,
//! useful for poking the daemon with socat). Long-running requests
//! stream `Progress` frames before their terminal response on the same
//! connection.

mod client;
mod error;
mod protocol;
mod server;

pub use client::{ConnectedClient, IpcClient};
pub use error::IpcError;
pub use protocol::{ErrorCode, Request, Response, ResponseData};
pub use server::{EventSink, IpcServer, RequestHandler};
