//! Sync codec
//!
//! Builds outbound playback state from the local element and applies
//! inbound state to it without echoing remote changes back to the room.
//!
//! ## Feedback suppression
//!
//! Applying a remote state fires the element's own play, pause, seeked and
//! ratechange events. Local changes observed within `SUPPRESSION_WINDOW`
//! of the last inbound `sync` are therefore not broadcast. This is a time
//! heuristic: a genuine local action in that window is suppressed too.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::error::SyncError;
use crate::media::MediaElement;
use crate::protocol::{PlaybackEvent, PlaybackState, SyncMessage};
use crate::resolver::ContentResolver;

/// How long after an inbound sync local changes are treated as echoes
pub const SUPPRESSION_WINDOW: Duration = Duration::from_millis(500);

/// Position difference tolerated without seeking, in seconds
pub const DRIFT_TOLERANCE_SECS: f64 = 1.0;

/// Session-lifetime codec state
#[derive(Debug, Default, Clone)]
pub struct SessionState {
    /// When the last inbound sync was applied
    pub last_received_sync: Option<Instant>,
}

impl SessionState {
    /// Whether local changes would be broadcast right now
    pub fn emission_allowed(&self) -> bool {
        match self.last_received_sync {
            Some(at) => at.elapsed() >= SUPPRESSION_WINDOW,
            None => true,
        }
    }
}

/// Reconciles the local element with the room
pub struct SyncCodec {
    element: Arc<dyn MediaElement>,
    resolver: Arc<dyn ContentResolver>,
    state: SessionState,
}

impl SyncCodec {
    pub fn new(element: Arc<dyn MediaElement>, resolver: Arc<dyn ContentResolver>) -> Self {
        Self {
            element,
            resolver,
            state: SessionState::default(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Current state of the local element
    pub fn snapshot(&self) -> PlaybackState {
        PlaybackState::capture(self.element.as_ref(), self.resolver.as_ref())
    }

    /// Build a broadcast for a local change, unless it looks like an echo
    pub fn maybe_emit(&self) -> Option<SyncMessage> {
        if !self.state.emission_allowed() {
            debug!("Suppressing local change inside the sync window");
            return None;
        }
        Some(SyncMessage::Sync(self.snapshot()))
    }

    /// Apply a remote playback state to the local element
    pub fn apply(&mut self, remote: &PlaybackState) {
        self.state.last_received_sync = Some(Instant::now());

        // Zero means the sender's position is unknown
        let drift = (self.element.current_time() - remote.current_time).abs();
        if remote.current_time > 0.0 && drift > DRIFT_TOLERANCE_SECS {
            debug!("Seeking to {} (drift {:.3}s)", remote.current_time, drift);
            self.element.set_current_time(remote.current_time);
        }

        self.element.set_playback_rate(remote.playback_rate);

        match &remote.event {
            PlaybackEvent::Play => {
                if self.element.paused() {
                    self.element.play();
                }
            }
            PlaybackEvent::Pause => {
                if !self.element.paused() {
                    self.element.pause();
                }
            }
            PlaybackEvent::Other(kind) => {
                warn!("{}", SyncError::UnrecognizedEvent(kind.clone()));
            }
        }
    }

    /// Handle a room message, returning the reply to send if any
    ///
    /// A `reqSync` is answered with the current state even inside the
    /// suppression window: it comes from a peer that just joined.
    pub fn handle(&mut self, msg: SyncMessage) -> Option<SyncMessage> {
        match msg {
            SyncMessage::Sync(remote) => {
                self.apply(&remote);
                None
            }
            SyncMessage::ReqSync => Some(SyncMessage::Sync(self.snapshot())),
        }
    }

    /// Decode and handle a raw room message
    ///
    /// Messages outside the room vocabulary are logged and dropped.
    pub fn handle_raw(&mut self, value: Value) -> Option<SyncMessage> {
        debug!("Received message: {}", value);
        match SyncMessage::decode(value) {
            Ok(msg) => self.handle(msg),
            Err(e) => {
                error!("{}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::SimulatedPlayer;
    use crate::resolver::StaticResolver;
    use serde_json::json;

    const CONTENT: &str = "https://video.example/watch/42";

    fn setup(at: f64) -> (Arc<SimulatedPlayer>, SyncCodec) {
        let player = Arc::new(SimulatedPlayer::new(3600.0));
        player.set_current_time(at);
        let codec = SyncCodec::new(
            player.clone(),
            Arc::new(StaticResolver(CONTENT.to_string())),
        );
        (player, codec)
    }

    fn remote(event: PlaybackEvent, current_time: f64, playback_rate: f64) -> PlaybackState {
        PlaybackState {
            page_url: CONTENT.to_string(),
            event,
            current_time,
            playback_rate,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_without_prior_sync() {
        let (player, codec) = setup(12.0);
        player.play();

        let msg = codec.maybe_emit().unwrap();
        assert_eq!(
            msg,
            SyncMessage::Sync(remote(PlaybackEvent::Play, 12.0, 1.0))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_suppression_window() {
        let (_player, mut codec) = setup(10.0);
        codec.apply(&remote(PlaybackEvent::Play, 10.0, 1.0));

        assert!(codec.maybe_emit().is_none());

        tokio::time::advance(Duration::from_millis(499)).await;
        assert!(codec.maybe_emit().is_none());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(codec.maybe_emit().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_reads_paused_state() {
        let (player, codec) = setup(5.0);
        player.set_playback_rate(0.5);

        let state = codec.snapshot();
        assert_eq!(state.event, PlaybackEvent::Pause);
        assert_eq!(state.current_time, 5.0);
        assert_eq!(state.playback_rate, 0.5);
        assert_eq!(state.page_url, CONTENT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drift_threshold() {
        let cases = [
            // (local, remote, expected position)
            (10.0, 10.3, 10.0),
            (10.0, 11.0, 10.0),
            (10.0, 11.5, 11.5),
            (10.0, 8.5, 8.5),
            (10.0, 0.0, 10.0),
        ];

        for (local, incoming, expected) in cases {
            let (player, mut codec) = setup(local);
            codec.apply(&remote(PlaybackEvent::Pause, incoming, 1.0));
            assert_eq!(
                player.current_time(),
                expected,
                "local {} remote {}",
                local,
                incoming
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_always_applied() {
        let (player, mut codec) = setup(10.0);

        codec.apply(&remote(PlaybackEvent::Pause, 10.2, 1.25));
        assert_eq!(player.playback_rate(), 1.25);

        codec.apply(&remote(PlaybackEvent::Pause, 500.0, 0.75));
        assert_eq!(player.playback_rate(), 0.75);
        assert_eq!(player.current_time(), 500.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_play_and_pause() {
        let (player, mut codec) = setup(10.0);

        codec.apply(&remote(PlaybackEvent::Play, 10.0, 1.0));
        assert!(!player.paused());

        codec.apply(&remote(PlaybackEvent::Pause, 10.0, 1.0));
        assert!(player.paused());
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_is_idempotent() {
        let (player, mut codec) = setup(10.0);
        let mut events = player.subscribe();
        let msg = remote(PlaybackEvent::Play, 42.0, 1.5);

        codec.apply(&msg);
        let after_first = (player.current_time(), player.playback_rate(), player.paused());
        while events.try_recv().is_ok() {}

        codec.apply(&msg);
        let after_second = (player.current_time(), player.playback_rate(), player.paused());

        assert_eq!(after_first, after_second);
        assert_eq!(after_second, (42.0, 1.5, false));
        // Nothing changed, so the element fired nothing
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_small_drift_plays_at_new_rate() {
        let (player, mut codec) = setup(10.0);
        assert!(player.paused());

        let reply = codec.handle_raw(json!({
            "cmd": "sync",
            "p": {"event": "play", "currentTime": 10.3, "playbackRate": 1.5, "pageUrl": CONTENT}
        }));

        assert!(reply.is_none());
        assert_eq!(player.current_time(), 10.0);
        assert_eq!(player.playback_rate(), 1.5);
        assert!(!player.paused());
    }

    #[tokio::test(start_paused = true)]
    async fn test_req_sync_bypasses_suppression() {
        let (_player, mut codec) = setup(20.0);
        codec.handle_raw(json!({
            "cmd": "sync",
            "p": {"event": "pause", "currentTime": 20.0, "playbackRate": 1.0, "pageUrl": CONTENT}
        }));
        assert!(codec.maybe_emit().is_none());

        let reply = codec.handle_raw(json!({"cmd": "reqSync"}));
        assert_eq!(
            reply,
            Some(SyncMessage::Sync(remote(PlaybackEvent::Pause, 20.0, 1.0)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_event_keeps_playback_state() {
        let (player, mut codec) = setup(10.0);

        codec.apply(&remote(PlaybackEvent::Other("buffering".into()), 30.0, 2.0));

        assert!(player.paused());
        assert_eq!(player.current_time(), 30.0);
        assert_eq!(player.playback_rate(), 2.0);
        assert!(codec.state().last_received_sync.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_command_is_dropped() {
        let (player, mut codec) = setup(10.0);

        assert!(codec.handle_raw(json!({"cmd": "chat", "p": "hello"})).is_none());
        assert!(codec.state().last_received_sync.is_none());
        assert_eq!(player.current_time(), 10.0);
    }
}
