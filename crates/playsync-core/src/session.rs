//! Sync session
//!
//! Wires the observer, codec and transport together for one page. A
//! session lives until its transport closes; there is no reconnect, the
//! user reloads instead.

use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::codec::SyncCodec;
use crate::config::Room;
use crate::error::{SyncError, SyncResult};
use crate::media::{MediaObserver, Observation};
use crate::page::{Page, SESSION_MARKER};
use crate::protocol::SyncMessage;
use crate::resolver::ContentResolver;
use crate::status::{StatusColor, StatusSink, STATUS_CONNECTING, STATUS_ERROR, STATUS_OK};
use crate::transport::{DirectTransport, ProxiedTransport, Transport, TransportMode};

/// An attached, connected synchronization session
pub struct SyncSession {
    id: String,
    codec: SyncCodec,
    observation: Observation,
    transport: Transport,
    status: Arc<dyn StatusSink>,
}

impl SyncSession {
    /// Attach to a page and connect to the room
    ///
    /// Fails with `AlreadyAttached` before creating any connection if the
    /// page already runs a session, and with `NoMediaFound` after sending
    /// the page to the room's landing page if there is nothing to sync.
    pub async fn attach(
        page: Arc<dyn Page>,
        room: &Room,
        mode: TransportMode,
        resolver: Arc<dyn ContentResolver>,
        status: Arc<dyn StatusSink>,
    ) -> SyncResult<Self> {
        let id = format!("playsync-{}", &uuid::Uuid::new_v4().to_string()[..8]);
        let span = info_span!("session", id = %id, room = %room.id);

        async move {
            if page.has_marker(SESSION_MARKER) {
                warn!("Page is already synchronized");
                return Err(SyncError::AlreadyAttached);
            }

            let observer = match MediaObserver::locate(page.as_ref()) {
                Ok(observer) => observer,
                Err(e) => {
                    page.navigate(&room.landing_url());
                    return Err(e);
                }
            };

            status.update(STATUS_CONNECTING, StatusColor::Orange);

            let mut transport = match mode {
                TransportMode::Direct => {
                    page.set_marker(SESSION_MARKER);
                    DirectTransport::spawn(&room.endpoint_url())
                }
                TransportMode::Proxied => {
                    let port = page.embed_frame(&room.proxy_url(), SESSION_MARKER);
                    ProxiedTransport::spawn(port, &room.endpoint_url(), &room.allowed_origin())
                }
            };

            if let Err(e) = transport.wait_open().await {
                error!("Could not connect to room: {}", e);
                status.update(STATUS_ERROR, StatusColor::Red);
                return Err(e);
            }

            info!("Joined room {} ({} transport)", room.id, mode);
            status.update(STATUS_OK, StatusColor::Green);

            let observation = observer.observe();
            let codec = SyncCodec::new(observer.element(), resolver);

            Ok(Self {
                id,
                codec,
                observation,
                transport,
                status,
            })
        }
        .instrument(span)
        .await
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn codec(&self) -> &SyncCodec {
        &self.codec
    }

    /// Ask peers already in the room for their state
    pub fn request_sync(&self) -> SyncResult<()> {
        self.transport.send(&SyncMessage::ReqSync)
    }

    /// Synchronize until the transport closes
    ///
    /// Always ends with `TransportFailure`, unless the element goes away
    /// first.
    pub async fn run(mut self) -> SyncResult<()> {
        let span = info_span!("session", id = %self.id);

        async move {
            loop {
                tokio::select! {
                    change = self.observation.next() => {
                        if change.is_none() {
                            debug!("Media element gone, ending session");
                            return Ok(());
                        }
                        if let Some(msg) = self.codec.maybe_emit() {
                            if let Err(e) = self.transport.send(&msg) {
                                return Err(self.fail(e));
                            }
                        }
                    }

                    inbound = self.transport.recv() => {
                        let Some(value) = inbound else {
                            return Err(self.fail(SyncError::TransportFailure(
                                "connection closed".to_string(),
                            )));
                        };
                        if let Some(reply) = self.codec.handle_raw(value) {
                            if let Err(e) = self.transport.send(&reply) {
                                return Err(self.fail(e));
                            }
                        }
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Report a lost room connection
    fn fail(&self, e: SyncError) -> SyncError {
        error!("Disconnected from room: {}", e);
        self.status.update(STATUS_ERROR, StatusColor::Red);
        e
    }
}
