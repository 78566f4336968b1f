//! Room protocol message types
//!
//! Messages exchanged with the room relay as JSON objects, plus the
//! signals exchanged with the companion frame in proxied mode.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SyncError, SyncResult};
use crate::media::MediaElement;
use crate::resolver::ContentResolver;

/// Command name of a playback state broadcast
pub const CMD_SYNC: &str = "sync";

/// Command name of a state request sent by a joining peer
pub const CMD_REQ_SYNC: &str = "reqSync";

/// Prefix shared by every companion frame signal
pub const BRIDGE_PREFIX: &str = "iframe:";

/// Whether the sender's element was playing or paused
///
/// Unknown kinds are kept verbatim so they can be reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlaybackEvent {
    Play,
    Pause,
    Other(String),
}

impl From<String> for PlaybackEvent {
    fn from(value: String) -> Self {
        match value.as_str() {
            "play" => PlaybackEvent::Play,
            "pause" => PlaybackEvent::Pause,
            _ => PlaybackEvent::Other(value),
        }
    }
}

impl From<PlaybackEvent> for String {
    fn from(event: PlaybackEvent) -> Self {
        match event {
            PlaybackEvent::Play => "play".to_string(),
            PlaybackEvent::Pause => "pause".to_string(),
            PlaybackEvent::Other(other) => other,
        }
    }
}

/// Snapshot of a media element, built fresh for every broadcast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Identifier of the content being watched
    pub page_url: String,
    pub event: PlaybackEvent,
    /// Position in seconds
    pub current_time: f64,
    pub playback_rate: f64,
}

impl PlaybackState {
    /// Read the current state of an element
    ///
    /// The event reflects whether the element is paused now, not which
    /// event triggered the read.
    pub fn capture(element: &dyn MediaElement, resolver: &dyn ContentResolver) -> Self {
        let event = if element.paused() {
            PlaybackEvent::Pause
        } else {
            PlaybackEvent::Play
        };

        Self {
            page_url: resolver.resolve(),
            event,
            current_time: element.current_time(),
            playback_rate: element.playback_rate(),
        }
    }
}

/// Messages exchanged with the room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "p")]
pub enum SyncMessage {
    /// Playback state broadcast
    #[serde(rename = "sync")]
    Sync(PlaybackState),

    /// Ask every peer to broadcast its current state
    #[serde(rename = "reqSync")]
    ReqSync,
}

impl SyncMessage {
    /// Decode a room message from its JSON form
    ///
    /// Commands outside the room vocabulary are reported as
    /// `UnrecognizedCommand` so callers can log and drop them.
    pub fn decode(value: Value) -> SyncResult<Self> {
        let cmd = value
            .get("cmd")
            .and_then(Value::as_str)
            .ok_or_else(|| SyncError::MalformedMessage(format!("missing cmd in {}", value)))?;

        match cmd {
            CMD_SYNC | CMD_REQ_SYNC => serde_json::from_value(value)
                .map_err(|e| SyncError::MalformedMessage(e.to_string())),
            other => Err(SyncError::UnrecognizedCommand(other.to_string())),
        }
    }

    /// Decode a room message from a text frame
    pub fn decode_str(text: &str) -> SyncResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::decode(value)
    }

    /// Encode message to its JSON form
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Signals exchanged with the companion frame in proxied mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", content = "p")]
pub enum BridgeSignal {
    /// Frame finished loading and is ready for a connect command
    #[serde(rename = "iframe:onLoadedProxy")]
    LoadedProxy,

    /// Frame opened the room connection
    #[serde(rename = "iframe:onConnected")]
    Connected,

    /// Frame's room connection closed
    #[serde(rename = "iframe:onDisconnected")]
    Disconnected,

    /// Frame's room connection failed
    #[serde(rename = "iframe:onError")]
    Error,

    /// Host asks the frame to connect to an endpoint
    #[serde(rename = "iframe:connect")]
    Connect(String),
}

impl BridgeSignal {
    /// Interpret a structured message as a bridge signal
    ///
    /// Returns `None` for anything else; those messages are opaque room traffic.
    pub fn parse(value: &Value) -> Option<Self> {
        let cmd = value.get("cmd").and_then(Value::as_str)?;
        if !cmd.starts_with(BRIDGE_PREFIX) {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// Encode signal to its JSON form
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::SimulatedPlayer;
    use crate::resolver::StaticResolver;
    use serde_json::json;

    #[test]
    fn test_sync_message_wire_shape() {
        let msg = SyncMessage::Sync(PlaybackState {
            page_url: "https://video.example/watch/42".to_string(),
            event: PlaybackEvent::Play,
            current_time: 12.5,
            playback_rate: 1.0,
        });

        assert_eq!(
            msg.to_value(),
            json!({
                "cmd": "sync",
                "p": {
                    "pageUrl": "https://video.example/watch/42",
                    "event": "play",
                    "currentTime": 12.5,
                    "playbackRate": 1.0
                }
            })
        );
    }

    #[test]
    fn test_req_sync_has_no_payload() {
        assert_eq!(SyncMessage::ReqSync.to_value(), json!({"cmd": "reqSync"}));

        let decoded = SyncMessage::decode(json!({"cmd": "reqSync"})).unwrap();
        assert_eq!(decoded, SyncMessage::ReqSync);
    }

    #[test]
    fn test_decode_sync_from_text() {
        let text = r#"{"cmd":"sync","p":{"pageUrl":"x","event":"pause","currentTime":3,"playbackRate":1.5}}"#;
        let msg = SyncMessage::decode_str(text).unwrap();

        match msg {
            SyncMessage::Sync(state) => {
                assert_eq!(state.event, PlaybackEvent::Pause);
                assert_eq!(state.current_time, 3.0);
                assert_eq!(state.playback_rate, 1.5);
            }
            _ => panic!("Expected sync message"),
        }
    }

    #[test]
    fn test_decode_unknown_command() {
        let err = SyncMessage::decode(json!({"cmd": "chat", "p": "hi"})).unwrap_err();
        assert!(matches!(err, SyncError::UnrecognizedCommand(cmd) if cmd == "chat"));
    }

    #[test]
    fn test_decode_missing_command() {
        let err = SyncMessage::decode(json!({"p": {}})).unwrap_err();
        assert!(matches!(err, SyncError::MalformedMessage(_)));
    }

    #[test]
    fn test_decode_bad_payload() {
        let err = SyncMessage::decode(json!({"cmd": "sync", "p": {"event": "play"}})).unwrap_err();
        assert!(matches!(err, SyncError::MalformedMessage(_)));
    }

    #[test]
    fn test_unknown_event_is_preserved() {
        let msg = SyncMessage::decode(json!({
            "cmd": "sync",
            "p": {"pageUrl": "x", "event": "buffering", "currentTime": 1.0, "playbackRate": 1.0}
        }))
        .unwrap();

        match msg {
            SyncMessage::Sync(state) => {
                assert_eq!(state.event, PlaybackEvent::Other("buffering".to_string()));
            }
            _ => panic!("Expected sync message"),
        }
    }

    #[test]
    fn test_capture_reads_element() {
        let player = SimulatedPlayer::new(300.0);
        let resolver = StaticResolver("movie-42".to_string());
        player.set_current_time(12.0);
        player.set_playback_rate(0.5);

        let state = PlaybackState::capture(&player, &resolver);
        assert_eq!(state.event, PlaybackEvent::Pause);
        assert_eq!(state.current_time, 12.0);
        assert_eq!(state.playback_rate, 0.5);
        assert_eq!(state.page_url, "movie-42");
    }

    #[test]
    fn test_bridge_signal_parse() {
        assert_eq!(
            BridgeSignal::parse(&json!({"cmd": "iframe:onLoadedProxy"})),
            Some(BridgeSignal::LoadedProxy)
        );
        assert_eq!(
            BridgeSignal::parse(&json!({"cmd": "iframe:connect", "p": "wss://h/api/rooms/r/ws"})),
            Some(BridgeSignal::Connect("wss://h/api/rooms/r/ws".to_string()))
        );
        assert_eq!(BridgeSignal::parse(&json!({"cmd": "sync", "p": {}})), None);
        assert_eq!(BridgeSignal::parse(&json!({"cmd": "iframe:reboot"})), None);
    }

    #[test]
    fn test_bridge_connect_wire_shape() {
        let signal = BridgeSignal::Connect("wss://rooms.example/api/rooms/abc/ws".to_string());
        assert_eq!(
            signal.to_value(),
            json!({"cmd": "iframe:connect", "p": "wss://rooms.example/api/rooms/abc/ws"})
        );
        assert_eq!(
            BridgeSignal::Connected.to_value(),
            json!({"cmd": "iframe:onConnected"})
        );
    }
}
