//! Media observer
//!
//! Locates the primary video element and surfaces its state changes.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error};

use super::{MediaElement, MediaEvent};
use crate::error::{SyncError, SyncResult};
use crate::page::Page;

/// Notification that the local element's state changed
///
/// Carries no payload: consumers re-read the element, since it may have
/// changed again before the notification is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalChange;

/// Tracks the selected media element
pub struct MediaObserver {
    element: Arc<dyn MediaElement>,
}

impl MediaObserver {
    /// Track a specific element
    pub fn new(element: Arc<dyn MediaElement>) -> Self {
        Self { element }
    }

    /// Find the element to track on a page
    ///
    /// With several elements the longest one wins, which filters out ad and
    /// preview players. Ties keep the first element.
    pub fn locate(page: &dyn Page) -> SyncResult<Self> {
        let elements = page.videos();

        let element = match elements.len() {
            0 => {
                error!("No video element found");
                return Err(SyncError::NoMediaFound);
            }
            1 => elements[0].clone(),
            count => {
                let mut best = 0;
                let mut longest = f64::NEG_INFINITY;
                for (index, element) in elements.iter().enumerate() {
                    let duration = element.duration();
                    if !duration.is_nan() && duration > longest {
                        longest = duration;
                        best = index;
                    }
                }
                debug!("Selected video {} of {} (duration {})", best, count, longest);
                elements[best].clone()
            }
        };

        Ok(Self { element })
    }

    /// The tracked element
    pub fn element(&self) -> Arc<dyn MediaElement> {
        self.element.clone()
    }

    /// Start observing play, pause, seek and rate changes
    pub fn observe(&self) -> Observation {
        Observation {
            events: self.element.subscribe(),
        }
    }
}

/// Stream of local state-changed notifications
pub struct Observation {
    events: broadcast::Receiver<MediaEvent>,
}

impl Observation {
    /// Wait for the next local state change
    ///
    /// Returns `None` once the element is gone.
    pub async fn next(&mut self) -> Option<LocalChange> {
        loop {
            match self.events.recv().await {
                Ok(event) => {
                    if let Some(change) = Self::classify(event) {
                        return Some(change);
                    }
                }
                // Missed notifications collapse into one
                Err(RecvError::Lagged(skipped)) => {
                    debug!("Observer lagged by {} events", skipped);
                    return Some(LocalChange);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn classify(event: MediaEvent) -> Option<LocalChange> {
        match event {
            MediaEvent::Play => debug!("Video started playing"),
            MediaEvent::Pause => debug!("Video paused"),
            MediaEvent::Seeked => debug!("Video seeked"),
            MediaEvent::RateChange => debug!("Video rate changed"),
            MediaEvent::Seeking => return None,
        }
        Some(LocalChange)
    }
}
