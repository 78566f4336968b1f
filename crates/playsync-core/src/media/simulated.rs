//! Headless media element
//!
//! A clock-driven player with the event behavior of a browser video
//! element. The position is derived from the time playback last resumed,
//! so nothing needs to tick in the background.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;
use tokio::time::Instant;

use super::{MediaElement, MediaEvent};

const EVENT_CAPACITY: usize = 64;

struct Inner {
    paused: bool,
    /// Position when playback last resumed, seeked or changed rate
    offset: f64,
    resumed_at: Instant,
    rate: f64,
    duration: f64,
}

impl Inner {
    fn position(&self) -> f64 {
        let position = if self.paused {
            self.offset
        } else {
            self.offset + self.resumed_at.elapsed().as_secs_f64() * self.rate
        };
        if self.duration.is_finite() {
            position.min(self.duration)
        } else {
            position
        }
    }

    /// Fold elapsed playback into the offset
    fn rebase(&mut self) {
        self.offset = self.position();
        self.resumed_at = Instant::now();
    }
}

/// In-process media element, paused at zero on creation
pub struct SimulatedPlayer {
    inner: Mutex<Inner>,
    events: broadcast::Sender<MediaEvent>,
}

impl SimulatedPlayer {
    /// Create a player for content of the given length (NaN if unknown)
    pub fn new(duration: f64) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Mutex::new(Inner {
                paused: true,
                offset: 0.0,
                resumed_at: Instant::now(),
                rate: 1.0,
                duration,
            }),
            events,
        }
    }

    /// Whether playback has reached the end
    pub fn ended(&self) -> bool {
        let inner = self.lock();
        inner.duration.is_finite() && inner.position() >= inner.duration
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fire(&self, event: MediaEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

impl MediaElement for SimulatedPlayer {
    fn paused(&self) -> bool {
        self.lock().paused
    }

    fn current_time(&self) -> f64 {
        self.lock().position()
    }

    fn set_current_time(&self, seconds: f64) {
        {
            let mut inner = self.lock();
            let mut target = seconds.max(0.0);
            if inner.duration.is_finite() {
                target = target.min(inner.duration);
            }
            inner.offset = target;
            inner.resumed_at = Instant::now();
        }
        self.fire(MediaEvent::Seeking);
        self.fire(MediaEvent::Seeked);
    }

    fn playback_rate(&self) -> f64 {
        self.lock().rate
    }

    fn set_playback_rate(&self, rate: f64) {
        {
            let mut inner = self.lock();
            if inner.rate == rate {
                return;
            }
            inner.rebase();
            inner.rate = rate;
        }
        self.fire(MediaEvent::RateChange);
    }

    fn duration(&self) -> f64 {
        self.lock().duration
    }

    fn play(&self) {
        {
            let mut inner = self.lock();
            if !inner.paused {
                return;
            }
            inner.paused = false;
            inner.resumed_at = Instant::now();
        }
        self.fire(MediaEvent::Play);
    }

    fn pause(&self) {
        {
            let mut inner = self.lock();
            if inner.paused {
                return;
            }
            inner.rebase();
            inner.paused = true;
        }
        self.fire(MediaEvent::Pause);
    }

    fn subscribe(&self) -> broadcast::Receiver<MediaEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_player_is_paused_at_zero() {
        let player = SimulatedPlayer::new(100.0);
        assert!(player.paused());
        assert_eq!(player.current_time(), 0.0);
        assert_eq!(player.playback_rate(), 1.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_advances_with_rate() {
        let player = SimulatedPlayer::new(100.0);
        player.set_playback_rate(2.0);
        player.play();

        tokio::time::advance(Duration::from_secs(3)).await;
        assert!((player.current_time() - 6.0).abs() < 1e-6);

        player.pause();
        tokio::time::advance(Duration::from_secs(3)).await;
        assert!((player.current_time() - 6.0).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_clamps_to_duration() {
        let player = SimulatedPlayer::new(10.0);
        player.set_current_time(9.0);
        player.play();

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(player.current_time(), 10.0);
        assert!(player.ended());
    }

    #[test]
    fn test_events_fire_only_on_change() {
        let player = SimulatedPlayer::new(100.0);
        let mut events = player.subscribe();

        player.pause();
        player.set_playback_rate(1.0);
        player.play();
        player.play();
        player.set_playback_rate(1.25);
        player.set_current_time(30.0);

        assert_eq!(events.try_recv().unwrap(), MediaEvent::Play);
        assert_eq!(events.try_recv().unwrap(), MediaEvent::RateChange);
        assert_eq!(events.try_recv().unwrap(), MediaEvent::Seeking);
        assert_eq!(events.try_recv().unwrap(), MediaEvent::Seeked);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_seek_clamps_negative() {
        let player = SimulatedPlayer::new(f64::NAN);
        player.set_current_time(-5.0);
        assert_eq!(player.current_time(), 0.0);
        assert!(!player.ended());
    }
}
