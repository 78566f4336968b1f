//! Companion frame relay
//!
//! The page side of a proxied transport lives on the room service's own
//! origin, where opening the room connection is allowed. It runs a direct
//! transport and relays between it and the host page.

use tracing::{debug, info, warn};

use super::DirectTransport;
use crate::page::{MessagePort, ANY_ORIGIN};
use crate::protocol::BridgeSignal;

/// Serve one host page over `port` until either side goes away
pub async fn run(mut port: MessagePort) {
    port.post(BridgeSignal::LoadedProxy.to_value(), ANY_ORIGIN);

    let (endpoint, host_origin) = loop {
        let Some(envelope) = port.recv().await else {
            debug!("Host page left before connecting");
            return;
        };
        match BridgeSignal::parse(&envelope.data) {
            Some(BridgeSignal::Connect(endpoint)) => break (endpoint, envelope.origin),
            _ => debug!("Ignoring message before connect"),
        }
    };

    info!("Relaying {} for {}", endpoint, host_origin);
    let mut transport = DirectTransport::spawn(&endpoint);

    if let Err(e) = transport.wait_open().await {
        warn!("Relay connection failed: {}", e);
        port.post(BridgeSignal::Error.to_value(), &host_origin);
        return;
    }
    port.post(BridgeSignal::Connected.to_value(), &host_origin);

    loop {
        tokio::select! {
            inbound = transport.recv() => {
                match inbound {
                    Some(value) => {
                        port.post(value, &host_origin);
                    }
                    None => {
                        info!("Relay connection closed");
                        port.post(BridgeSignal::Disconnected.to_value(), &host_origin);
                        break;
                    }
                }
            }

            envelope = port.recv() => {
                let Some(envelope) = envelope else {
                    debug!("Host page gone, closing relay");
                    break;
                };
                if BridgeSignal::parse(&envelope.data).is_some() {
                    debug!("Ignoring bridge signal after connect");
                } else if let Err(e) = transport.send_raw(envelope.data) {
                    warn!("Relay send failed: {}", e);
                }
            }
        }
    }
}
