//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use playsync_core::{PlaybackState, Room, StatusColor};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
#[derive(Debug, Clone, Copy)]
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print the derived addresses of a room
    pub fn print_room(&self, room: &Room) {
        match self.format {
            OutputFormat::Human => {
                println!("Room:      {}", room.id);
                println!("Endpoint:  {}", room.endpoint_url());
                println!("Landing:   {}", room.landing_url());
                println!("Proxy:     {}", room.proxy_url());
                println!("Origin:    {}", room.allowed_origin());
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({
                        "room": room.id,
                        "endpoint": room.endpoint_url(),
                        "landing": room.landing_url(),
                        "proxy": room.proxy_url(),
                        "origin": room.allowed_origin()
                    })
                );
            }
            OutputFormat::Quiet => {
                println!("{}", room.endpoint_url());
            }
        }
    }

    /// Print the local player state
    pub fn print_playback(&self, state: &PlaybackState) {
        match self.format {
            OutputFormat::Human => {
                println!(
                    "{} at {} (x{}) - {}",
                    String::from(state.event.clone()),
                    format_position(state.current_time),
                    state.playback_rate,
                    truncate(&state.page_url, 50)
                );
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(state).unwrap_or_default());
            }
            OutputFormat::Quiet => {
                println!("{:.3}", state.current_time);
            }
        }
    }

    /// Print a connection status update
    pub fn status(&self, message: &str, color: StatusColor) {
        match self.format {
            OutputFormat::Human => {
                let marker = match color {
                    StatusColor::Orange => "…",
                    StatusColor::Green => "✓",
                    StatusColor::Red => "✗",
                };
                println!("{} {}", marker, message);
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": message, "color": color.to_string()})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Format seconds as h:mm:ss.s
fn format_position(seconds: f64) -> String {
    let tenths = (seconds.max(0.0) * 10.0).round() as u64;
    let hours = tenths / 36_000;
    let minutes = (tenths / 600) % 60;
    let secs = tenths % 600;
    format!("{}:{:02}:{:02}.{}", hours, minutes, secs / 10, secs % 10)
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}
