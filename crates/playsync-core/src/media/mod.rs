//! Media elements and the observer that tracks one of them
//!
//! A `MediaElement` is whatever plays the video on the page. The observer
//! picks the primary element and turns its events into payload-free
//! "local state changed" notifications.

mod observer;
mod simulated;

use tokio::sync::broadcast;

pub use observer::{LocalChange, MediaObserver, Observation};
pub use simulated::SimulatedPlayer;

/// Events fired by a media element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    /// Playback started or resumed
    Play,
    /// Playback paused
    Pause,
    /// A seek began
    Seeking,
    /// A seek completed
    Seeked,
    /// Playback rate changed
    RateChange,
}

/// A playable video element
///
/// Setters take `&self`; implementations provide their own interior
/// mutability, the way a DOM handle does.
pub trait MediaElement: Send + Sync {
    fn paused(&self) -> bool;

    /// Current position in seconds
    fn current_time(&self) -> f64;

    fn set_current_time(&self, seconds: f64);

    fn playback_rate(&self) -> f64;

    fn set_playback_rate(&self, rate: f64);

    /// Total length in seconds, NaN while unknown
    fn duration(&self) -> f64;

    fn play(&self);

    fn pause(&self);

    /// Subscribe to the element's events
    fn subscribe(&self) -> broadcast::Receiver<MediaEvent>;
}
