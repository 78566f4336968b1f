//! Proxied transport
//!
//! Host side of the companion frame protocol:
//!
//! 1. Frame signals `iframe:onLoadedProxy`
//! 2. Host sends `iframe:connect` with the room endpoint
//! 3. Frame signals `iframe:onConnected`, or `iframe:onDisconnected` /
//!    `iframe:onError` on failure
//!
//! Every other message from the frame is room traffic. Messages from any
//! origin but the room service's are ignored.

use tracing::{debug, error, info, warn};

use super::{Transport, TransportState, TransportTask};
use crate::page::MessagePort;
use crate::protocol::BridgeSignal;

/// Room connection relayed through a companion frame
pub struct ProxiedTransport;

impl ProxiedTransport {
    /// Drive the companion frame behind `port` in the background
    ///
    /// `endpoint` is handed to the frame once it has loaded; only messages
    /// from `allowed_origin` are accepted.
    pub fn spawn(port: MessagePort, endpoint: &str, allowed_origin: &str) -> Transport {
        let (handle, task) = Transport::channel();
        tokio::spawn(run(
            port,
            endpoint.to_string(),
            allowed_origin.to_string(),
            task,
        ));
        handle
    }
}

async fn run(
    mut port: MessagePort,
    endpoint: String,
    allowed_origin: String,
    mut task: TransportTask,
) {
    loop {
        tokio::select! {
            envelope = port.recv() => {
                let Some(envelope) = envelope else {
                    warn!("Companion frame went away");
                    break;
                };

                if envelope.origin != allowed_origin {
                    debug!("Ignoring message from {}", envelope.origin);
                } else {
                    match BridgeSignal::parse(&envelope.data) {
                        Some(BridgeSignal::LoadedProxy) => {
                            debug!("Companion frame loaded, connecting to {}", endpoint);
                            port.post(
                                BridgeSignal::Connect(endpoint.clone()).to_value(),
                                &allowed_origin,
                            );
                        }
                        Some(BridgeSignal::Connected) => {
                            info!("Connected to ws server");
                            task.set_state(TransportState::Open);
                        }
                        Some(BridgeSignal::Disconnected) | Some(BridgeSignal::Error) => {
                            error!("Disconnected from ws server");
                            break;
                        }
                        Some(BridgeSignal::Connect(_)) => {
                            debug!("Ignoring connect request from companion frame");
                        }
                        None => {
                            if !task.deliver(envelope.data) {
                                break;
                            }
                        }
                    }
                }
            }

            outgoing = task.outbound.recv() => {
                match outgoing {
                    Some(value) => {
                        port.post(value, &allowed_origin);
                    }
                    None => break,
                }
            }
        }
    }

    task.set_state(TransportState::Closed);
}
