//! Hosting page
//!
//! The page the client is attached to: it owns the video elements, the
//! session marker used by the double-attach guard, and any embedded frames.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::media::MediaElement;

/// Id of the element marking a page as already synchronized
pub const SESSION_MARKER: &str = "playsync-bridge";

/// Target origin accepting any receiver
pub const ANY_ORIGIN: &str = "*";

/// A structured message received from another document
#[derive(Debug, Clone, PartialEq)]
pub struct FrameEnvelope {
    /// Origin of the sending document
    pub origin: String,
    pub data: Value,
}

/// One end of a cross-document message channel
#[derive(Debug)]
pub struct MessagePort {
    origin: String,
    peer_origin: String,
    tx: mpsc::UnboundedSender<FrameEnvelope>,
    rx: mpsc::UnboundedReceiver<FrameEnvelope>,
}

impl MessagePort {
    /// Create a connected pair of ports for documents at two origins
    pub fn pair(a_origin: &str, b_origin: &str) -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();

        let a = Self {
            origin: a_origin.to_string(),
            peer_origin: b_origin.to_string(),
            tx: a_tx,
            rx: a_rx,
        };
        let b = Self {
            origin: b_origin.to_string(),
            peer_origin: a_origin.to_string(),
            tx: b_tx,
            rx: b_rx,
        };
        (a, b)
    }

    /// Origin of the document owning this end
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Post a message to the other document
    ///
    /// The message is dropped unless `target_origin` is `*` or matches the
    /// receiver's origin. Returns whether it was delivered.
    pub fn post(&self, data: Value, target_origin: &str) -> bool {
        if target_origin != ANY_ORIGIN && target_origin != self.peer_origin {
            warn!(
                "Dropping message for {}: receiver origin is {}",
                target_origin, self.peer_origin
            );
            return false;
        }

        self.tx
            .send(FrameEnvelope {
                origin: self.origin.clone(),
                data,
            })
            .is_ok()
    }

    /// Wait for the next message; `None` once the other document is gone
    pub async fn recv(&mut self) -> Option<FrameEnvelope> {
        self.rx.recv().await
    }
}

/// The page a session attaches to
pub trait Page: Send + Sync {
    /// All video elements, in document order
    fn videos(&self) -> Vec<Arc<dyn MediaElement>>;

    fn has_marker(&self, id: &str) -> bool;

    fn set_marker(&self, id: &str);

    /// Embed a hidden frame and return the host side of its message channel
    ///
    /// The frame element carries `id`, so it doubles as a marker.
    fn embed_frame(&self, src: &str, id: &str) -> MessagePort;

    /// Leave the page
    fn navigate(&self, url: &str);
}

/// Builds the host side of a frame's channel, given the frame source and the page origin
pub type FrameFactory = Box<dyn Fn(&str, &str) -> MessagePort + Send + Sync>;

/// In-process page
///
/// Frames are produced by a pluggable factory. Without one, embedded
/// frames never answer.
pub struct HeadlessPage {
    origin: String,
    videos: Vec<Arc<dyn MediaElement>>,
    markers: Mutex<HashSet<String>>,
    navigations: Mutex<Vec<String>>,
    frames: Option<FrameFactory>,
    frames_embedded: AtomicUsize,
}

impl HeadlessPage {
    pub fn new(videos: Vec<Arc<dyn MediaElement>>) -> Self {
        Self {
            origin: "http://localhost".to_string(),
            videos,
            markers: Mutex::new(HashSet::new()),
            navigations: Mutex::new(Vec::new()),
            frames: None,
            frames_embedded: AtomicUsize::new(0),
        }
    }

    /// Set the page's own origin
    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = origin.to_string();
        self
    }

    /// Set the factory used for embedded frames
    pub fn with_frames(mut self, factory: FrameFactory) -> Self {
        self.frames = Some(factory);
        self
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// URLs the page was asked to navigate to
    pub fn navigations(&self) -> Vec<String> {
        lock(&self.navigations).clone()
    }

    /// Number of frames embedded so far
    pub fn frames_embedded(&self) -> usize {
        self.frames_embedded.load(Ordering::SeqCst)
    }
}

impl Page for HeadlessPage {
    fn videos(&self) -> Vec<Arc<dyn MediaElement>> {
        self.videos.clone()
    }

    fn has_marker(&self, id: &str) -> bool {
        lock(&self.markers).contains(id)
    }

    fn set_marker(&self, id: &str) {
        lock(&self.markers).insert(id.to_string());
    }

    fn embed_frame(&self, src: &str, id: &str) -> MessagePort {
        debug!("Embedding frame {} from {}", id, src);
        self.set_marker(id);
        self.frames_embedded.fetch_add(1, Ordering::SeqCst);

        match &self.frames {
            Some(factory) => factory(src, &self.origin),
            None => {
                let (host, _frame) = MessagePort::pair(&self.origin, src);
                host
            }
        }
    }

    fn navigate(&self, url: &str) {
        debug!("Navigating to {}", url);
        lock(&self.navigations).push(url.to_string());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_port_delivers_with_sender_origin() {
        let (host, mut frame) = MessagePort::pair("https://page.example", "https://rooms.example");

        assert!(host.post(json!({"cmd": "sync"}), "https://rooms.example"));

        let envelope = frame.recv().await.unwrap();
        assert_eq!(envelope.origin, "https://page.example");
        assert_eq!(envelope.data, json!({"cmd": "sync"}));
    }

    #[tokio::test]
    async fn test_port_drops_mismatched_target() {
        let (host, mut frame) = MessagePort::pair("https://page.example", "https://evil.example");

        assert!(!host.post(json!({"cmd": "sync"}), "https://rooms.example"));
        assert!(frame.post(json!({"cmd": "iframe:onLoadedProxy"}), ANY_ORIGIN));

        drop(host);
        assert!(frame.recv().await.is_none());
    }

    #[test]
    fn test_markers() {
        let page = HeadlessPage::new(Vec::new());
        assert!(!page.has_marker(SESSION_MARKER));

        page.set_marker(SESSION_MARKER);
        assert!(page.has_marker(SESSION_MARKER));
    }

    #[test]
    fn test_embed_frame_sets_marker() {
        let page = HeadlessPage::new(Vec::new()).with_origin("https://page.example");

        let port = page.embed_frame("https://rooms.example/wsproxy", SESSION_MARKER);

        assert_eq!(port.origin(), "https://page.example");
        assert!(page.has_marker(SESSION_MARKER));
        assert_eq!(page.frames_embedded(), 1);
    }

    #[test]
    fn test_navigate_is_recorded() {
        let page = HeadlessPage::new(Vec::new());
        page.navigate("https://rooms.example/r/abc");
        assert_eq!(page.navigations(), vec!["https://rooms.example/r/abc"]);
    }
}
