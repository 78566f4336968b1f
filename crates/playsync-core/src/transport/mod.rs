//! Transport bridge
//!
//! Delivers room messages between this client and the relay. Two
//! topologies share one handle:
//!
//! - **Direct**: a WebSocket to the room endpoint.
//! - **Proxied**: a hidden companion frame runs the WebSocket and relays
//!   messages over a cross-document channel, for pages whose security
//!   policy forbids opening the connection themselves.
//!
//! Both run as a background task that owns the connection; the `Transport`
//! handle talks to it over channels. `Closed` is terminal, there is no
//! reconnect.
//!
//! ## Usage
//!
//! ```ignore
//! let mut transport = DirectTransport::spawn(&room.endpoint_url());
//! transport.wait_open().await?;
//! transport.send(&SyncMessage::ReqSync)?;
//! ```

mod direct;
mod proxied;
pub mod relay;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, watch};

use crate::error::{SyncError, SyncResult};
use crate::protocol::SyncMessage;

pub use direct::DirectTransport;
pub use proxied::ProxiedTransport;

/// Which topology to use, chosen by configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Direct,
    Proxied,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Direct => f.write_str("direct"),
            TransportMode::Proxied => f.write_str("proxied"),
        }
    }
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" => Ok(TransportMode::Direct),
            "proxied" | "proxy" => Ok(TransportMode::Proxied),
            other => Err(format!("Unknown transport mode: {}", other)),
        }
    }
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// Opening the connection
    Connecting,
    /// Messages flow both ways
    Open,
    /// Failed or closed; terminal
    Closed,
}

/// Handle to a running transport task
pub struct Transport {
    outbound: mpsc::UnboundedSender<Value>,
    inbound: mpsc::UnboundedReceiver<Value>,
    state: watch::Receiver<TransportState>,
}

/// The task side of a `Transport`
pub(crate) struct TransportTask {
    pub outbound: mpsc::UnboundedReceiver<Value>,
    pub inbound: mpsc::UnboundedSender<Value>,
    pub state: watch::Sender<TransportState>,
}

impl TransportTask {
    pub fn set_state(&self, state: TransportState) {
        let _ = self.state.send(state);
    }

    /// Forward a received message; false once the handle is gone
    pub fn deliver(&self, value: Value) -> bool {
        self.inbound.send(value).is_ok()
    }
}

impl Transport {
    /// Create a handle and the task side it talks to
    pub(crate) fn channel() -> (Self, TransportTask) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(TransportState::Connecting);

        let handle = Self {
            outbound: outbound_tx,
            inbound: inbound_rx,
            state: state_rx,
        };
        let task = TransportTask {
            outbound: outbound_rx,
            inbound: inbound_tx,
            state: state_tx,
        };
        (handle, task)
    }

    /// Get the current state
    pub fn state(&self) -> TransportState {
        *self.state.borrow()
    }

    /// Send a room message
    pub fn send(&self, msg: &SyncMessage) -> SyncResult<()> {
        self.send_raw(serde_json::to_value(msg)?)
    }

    /// Send an already-encoded message unchanged
    pub fn send_raw(&self, value: Value) -> SyncResult<()> {
        if self.state() == TransportState::Closed {
            return Err(SyncError::TransportFailure("connection closed".to_string()));
        }
        self.outbound
            .send(value)
            .map_err(|_| SyncError::TransportFailure("transport task stopped".to_string()))
    }

    /// Wait for the next inbound message; `None` once the transport closed
    pub async fn recv(&mut self) -> Option<Value> {
        self.inbound.recv().await
    }

    /// Wait until the connection is open
    ///
    /// Fails with `TransportFailure` if it closes first.
    pub async fn wait_open(&mut self) -> SyncResult<()> {
        loop {
            match *self.state.borrow_and_update() {
                TransportState::Open => return Ok(()),
                TransportState::Closed => {
                    return Err(SyncError::TransportFailure(
                        "connection closed before opening".to_string(),
                    ))
                }
                TransportState::Connecting => {}
            }

            if self.state.changed().await.is_err() {
                // Task ended without reporting; treat as closed
                if *self.state.borrow() != TransportState::Open {
                    return Err(SyncError::TransportFailure(
                        "transport task stopped".to_string(),
                    ));
                }
                return Ok(());
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mode_parse_and_display() {
        assert_eq!("direct".parse::<TransportMode>().unwrap(), TransportMode::Direct);
        assert_eq!("Proxied".parse::<TransportMode>().unwrap(), TransportMode::Proxied);
        assert!("udp".parse::<TransportMode>().is_err());
        assert_eq!(TransportMode::Proxied.to_string(), "proxied");
    }

    #[tokio::test]
    async fn test_handle_round_trip_through_task() {
        let (mut handle, mut task) = Transport::channel();
        assert_eq!(handle.state(), TransportState::Connecting);

        task.set_state(TransportState::Open);
        handle.wait_open().await.unwrap();

        handle.send(&SyncMessage::ReqSync).unwrap();
        assert_eq!(task.outbound.recv().await, Some(json!({"cmd": "reqSync"})));

        assert!(task.deliver(json!({"cmd": "reqSync"})));
        assert_eq!(handle.recv().await, Some(json!({"cmd": "reqSync"})));
    }

    #[tokio::test]
    async fn test_wait_open_fails_when_closed() {
        let (mut handle, task) = Transport::channel();

        task.set_state(TransportState::Closed);
        let err = handle.wait_open().await.unwrap_err();
        assert!(matches!(err, SyncError::TransportFailure(_)));

        let err = handle.send(&SyncMessage::ReqSync).unwrap_err();
        assert!(matches!(err, SyncError::TransportFailure(_)));
    }

    #[tokio::test]
    async fn test_wait_open_fails_when_task_vanishes() {
        let (mut handle, task) = Transport::channel();
        drop(task);

        assert!(handle.wait_open().await.is_err());
        assert_eq!(handle.recv().await, None);
    }
}
