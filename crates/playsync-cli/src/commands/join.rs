//! Join command handler
//!
//! Runs a headless client in a room: a simulated player stands in for the
//! page's video element and is driven from stdin.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use playsync_core::transport::relay;
use playsync_core::{
    Config, ContentResolver, HeadlessPage, MediaElement, MessagePort, PageResolver, PlaybackState,
    Room, SimulatedPlayer, StatusColor, StatusSink, SyncSession, TransportMode,
};

use crate::output::Output;

/// Options for joining a room
#[derive(Debug, Clone)]
pub struct JoinOptions {
    /// Room id, falling back to the configured one
    pub room: Option<String>,
    /// Content URL reported to peers
    pub url: String,
    /// Length of the simulated content in seconds
    pub duration: f64,
    /// Transport override
    pub transport: Option<TransportMode>,
}

/// Commands read from stdin while joined
#[derive(Debug, Clone, Copy, PartialEq)]
enum PlayerCommand {
    Play,
    Pause,
    Seek(f64),
    Rate(f64),
    State,
    Quit,
}

/// Status sink printing through the CLI output
struct CliStatus(Output);

impl StatusSink for CliStatus {
    fn update(&self, message: &str, color: StatusColor) {
        self.0.status(message, color);
    }
}

/// Join a room and synchronize until the room closes or the user quits
pub async fn join(config: &Config, options: JoinOptions, output: &Output) -> Result<()> {
    let room = config
        .room(options.room.as_deref())
        .context("No room given. Pass one or set it with `playsync config set room <id>`")?;
    let mode = options.transport.unwrap_or(config.transport);

    let player = Arc::new(SimulatedPlayer::new(options.duration));
    let page = Arc::new(headless_page(&player, &room));
    let resolver: Arc<dyn ContentResolver> = Arc::new(PageResolver::new(&options.url));

    output.message(&format!("Joining room {} via {} transport...", room.id, mode));

    let session = match SyncSession::attach(
        page,
        &room,
        mode,
        resolver.clone(),
        Arc::new(CliStatus(*output)),
    )
    .await
    {
        Ok(session) => session,
        Err(e) => {
            if let Some(hint) = e.user_message() {
                output.message(hint);
            }
            return Err(e.into());
        }
    };

    // Catch up with peers already in the room
    session.request_sync()?;

    let mut running = tokio::spawn(session.run());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    output.message("Commands: play, pause, seek <seconds>, rate <rate>, state, quit");

    loop {
        tokio::select! {
            result = &mut running => {
                return match result {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(e.into()),
                    Err(e) => Err(anyhow!("Session task failed: {}", e)),
                };
            }

            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    debug!("stdin closed, staying in room");
                    stdin_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }

                match parse_command(&line) {
                    Ok(PlayerCommand::Quit) => break,
                    Ok(PlayerCommand::State) => {
                        let state = PlaybackState::capture(player.as_ref(), resolver.as_ref());
                        output.print_playback(&state);
                    }
                    Ok(command) => run_command(command, player.as_ref()),
                    Err(e) => output.message(&e),
                }
            }
        }
    }

    running.abort();
    output.success(&format!("Left room {}", room.id));
    Ok(())
}

/// A page holding just the simulated player
///
/// Embedded frames are served by an in-process relay on the room's origin.
fn headless_page(player: &Arc<SimulatedPlayer>, room: &Room) -> HeadlessPage {
    let frame_origin = room.allowed_origin();

    HeadlessPage::new(vec![player.clone() as Arc<dyn MediaElement>]).with_frames(Box::new(
        move |src: &str, page_origin: &str| {
            debug!("Starting relay for {}", src);
            let (host, frame) = MessagePort::pair(page_origin, &frame_origin);
            tokio::spawn(relay::run(frame));
            host
        },
    ))
}

fn parse_command(line: &str) -> Result<PlayerCommand, String> {
    let mut parts = line.split_whitespace();
    let name = parts.next().unwrap_or_default().to_ascii_lowercase();
    let arg = parts.next();

    let number = |what: &str| -> Result<f64, String> {
        arg.ok_or_else(|| format!("Usage: {} <number>", what))?
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| format!("Not a number: {}", arg.unwrap_or_default()))
    };

    match name.as_str() {
        "play" => Ok(PlayerCommand::Play),
        "pause" => Ok(PlayerCommand::Pause),
        "seek" => {
            let seconds = number("seek")?;
            if seconds < 0.0 {
                return Err("Position must not be negative".to_string());
            }
            Ok(PlayerCommand::Seek(seconds))
        }
        "rate" => {
            let rate = number("rate")?;
            if rate <= 0.0 {
                return Err("Rate must be positive".to_string());
            }
            Ok(PlayerCommand::Rate(rate))
        }
        "state" | "status" => Ok(PlayerCommand::State),
        "quit" | "exit" => Ok(PlayerCommand::Quit),
        other => Err(format!("Unknown command: {}", other)),
    }
}

fn run_command(command: PlayerCommand, player: &dyn MediaElement) {
    match command {
        PlayerCommand::Play => player.play(),
        PlayerCommand::Pause => player.pause(),
        PlayerCommand::Seek(seconds) => player.set_current_time(seconds),
        PlayerCommand::Rate(rate) => player.set_playback_rate(rate),
        PlayerCommand::State | PlayerCommand::Quit => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playsync_core::Page;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("play"), Ok(PlayerCommand::Play));
        assert_eq!(parse_command("  PAUSE "), Ok(PlayerCommand::Pause));
        assert_eq!(parse_command("seek 90.5"), Ok(PlayerCommand::Seek(90.5)));
        assert_eq!(parse_command("rate 1.25"), Ok(PlayerCommand::Rate(1.25)));
        assert_eq!(parse_command("status"), Ok(PlayerCommand::State));
        assert_eq!(parse_command("quit"), Ok(PlayerCommand::Quit));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_command("seek").is_err());
        assert!(parse_command("seek soon").is_err());
        assert!(parse_command("seek -3").is_err());
        assert!(parse_command("rate 0").is_err());
        assert!(parse_command("rate NaN").is_err());
        assert!(parse_command("rewind").is_err());
    }

    #[test]
    fn test_run_command_drives_player() {
        let player = SimulatedPlayer::new(600.0);

        run_command(PlayerCommand::Seek(42.0), &player);
        run_command(PlayerCommand::Rate(2.0), &player);
        run_command(PlayerCommand::Play, &player);

        assert_eq!(player.playback_rate(), 2.0);
        assert!(!player.paused());
        assert!(player.current_time() >= 42.0);

        run_command(PlayerCommand::Pause, &player);
        assert!(player.paused());
    }

    #[test]
    fn test_headless_page_has_player() {
        let player = Arc::new(SimulatedPlayer::new(600.0));
        let room = Room {
            host: "rooms.example".to_string(),
            id: "abc".to_string(),
            secure: true,
        };

        let page = headless_page(&player, &room);
        assert_eq!(page.videos().len(), 1);
    }
}
