//! Direct WebSocket transport
//!
//! Room messages travel as JSON text frames.

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::{Transport, TransportState, TransportTask};

/// WebSocket connection to the room endpoint
pub struct DirectTransport;

impl DirectTransport {
    /// Start connecting to `url` in the background
    ///
    /// The returned handle starts in `Connecting`.
    pub fn spawn(url: &str) -> Transport {
        let (handle, task) = Transport::channel();
        tokio::spawn(run(url.to_string(), task));
        handle
    }
}

async fn run(url: String, mut task: TransportTask) {
    debug!("Connecting to {}", url);
    let ws_stream = match connect_async(url.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            warn!("Connection to {} failed: {}", url, e);
            task.set_state(TransportState::Closed);
            return;
        }
    };

    info!("Connected to {}", url);
    task.set_state(TransportState::Open);

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            outgoing = task.outbound.recv() => {
                match outgoing {
                    Some(value) => {
                        if let Err(e) = write.send(Message::Text(value.to_string())).await {
                            warn!("Send to {} failed: {}", url, e);
                            break;
                        }
                    }
                    None => {
                        debug!("Transport handle dropped, closing {}", url);
                        write.close().await.ok();
                        break;
                    }
                }
            }

            incoming = read.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<Value>(&text) {
                            Ok(value) => {
                                if !task.deliver(value) {
                                    break;
                                }
                            }
                            Err(e) => warn!("Ignoring non-JSON frame: {}", e),
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("Server closed connection {}", url);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Connection error ({}): {}", url, e);
                        break;
                    }
                }
            }
        }
    }

    task.set_state(TransportState::Closed);
}
