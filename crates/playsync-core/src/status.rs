//! Status indicator
//!
//! User-visible connection state. Sinks decide how to render it.

use std::fmt;

use tracing::info;

pub const STATUS_CONNECTING: &str = "Connecting...";
pub const STATUS_OK: &str = "OK";
pub const STATUS_ERROR: &str = "Sync error. Please reload!";

/// Color hint for a status message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Orange,
    Green,
    Red,
}

impl fmt::Display for StatusColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusColor::Orange => "orange",
            StatusColor::Green => "green",
            StatusColor::Red => "red",
        };
        f.write_str(name)
    }
}

/// Receives connection state updates
pub trait StatusSink: Send + Sync {
    fn update(&self, message: &str, color: StatusColor);
}

/// Used when no indicator is attached
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStatus;

impl StatusSink for NoopStatus {
    fn update(&self, _message: &str, _color: StatusColor) {}
}

/// Reports status through the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatus;

impl StatusSink for TracingStatus {
    fn update(&self, message: &str, color: StatusColor) {
        info!(%color, "Status: {}", message);
    }
}
