//! playsync Core Library
//!
//! This crate keeps video playback synchronized across clients watching
//! the same content, by relaying small control messages through a room.
//!
//! # Architecture
//!
//! - **Media observer**: picks the page's primary video element and turns
//!   its events into local state-changed notifications
//! - **Sync codec**: decides when to broadcast local state and applies
//!   remote state without feedback loops
//! - **Transport bridge**: a direct WebSocket, or a companion frame relaying
//!   one for pages that cannot connect themselves
//!
//! Everything runs on cooperative tasks; nothing is persisted.
//!
//! # Quick Start
//!
//! ```text
//! let room = Config::load()?.room(Some("abc"))?;
//! let session = SyncSession::attach(page, &room, TransportMode::Direct, resolver, status).await?;
//! session.run().await?;
//! ```
//!
//! # Modules
//!
//! - `session`: Attach to a page and run synchronization (main entry point)
//! - `codec`: Outbound/inbound playback state reconciliation
//! - `media`: Media elements and the observer
//! - `transport`: Direct, proxied and relay transports
//! - `protocol`: Room and companion frame messages
//! - `page`, `resolver`, `status`: Collaborators provided by the host environment
//! - `config`: Application configuration

pub mod codec;
pub mod config;
pub mod error;
pub mod media;
pub mod page;
pub mod protocol;
pub mod resolver;
pub mod session;
pub mod status;
pub mod transport;

pub use codec::{SessionState, SyncCodec, DRIFT_TOLERANCE_SECS, SUPPRESSION_WINDOW};
pub use config::{Config, Room};
pub use error::{SyncError, SyncResult};
pub use media::{MediaElement, MediaEvent, MediaObserver, SimulatedPlayer};
pub use page::{HeadlessPage, MessagePort, Page};
pub use protocol::{BridgeSignal, PlaybackEvent, PlaybackState, SyncMessage};
pub use resolver::{ContentResolver, PageResolver, StaticResolver};
pub use session::SyncSession;
pub use status::{NoopStatus, StatusColor, StatusSink, TracingStatus};
pub use transport::{Transport, TransportMode, TransportState};
