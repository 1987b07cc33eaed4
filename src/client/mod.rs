//! Client side of a session: REST calls, a local mirror of the game, and a
//! synchronizer that keeps the mirror live across connection drops.

mod backoff;
mod http;
mod mirror;
mod sync;
mod ws;

pub use backoff::ReconnectPolicy;
pub use http::ApiClient;
pub use mirror::GameMirror;
pub use sync::{Connector, EventStream, LocalConnector, Synchronizer};
pub use ws::WsConnector;

use std::time::Duration;

use crate::protocol::ServerMessage;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server returned {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("Failed to decode message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Fell behind the event stream by {0} events")]
    Lagged(u64),

    #[error("Connection lost after {attempts} reconnect attempts")]
    ConnectionLost { attempts: u32 },
}

/// Connectivity of a synchronizer, as last observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Connected,
    /// Waiting before reconnect attempt `attempt` (1-based)
    Reconnecting { attempt: u32 },
    /// Gave up after the attempt cap; terminal
    Failed,
    /// Shut down by the owner; terminal
    Closed,
}

/// What a synchronizer reports to its owner
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// The stream is attached; a snapshot follows
    Connected,
    /// A server event was applied to the mirror
    Applied(ServerMessage),
    /// The stream dropped
    Disconnected { reason: String },
    /// Reconnect attempt `attempt` will start after `delay`
    Reconnecting { attempt: u32, delay: Duration },
    /// The attempt cap was exceeded; no further events follow
    ConnectionLost { attempts: u32 },
}
