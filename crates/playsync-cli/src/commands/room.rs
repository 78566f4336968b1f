//! Room command handler

use anyhow::{Context, Result};

use playsync_core::Config;

use crate::output::Output;

/// Show the addresses derived for a room
pub fn show(config: &Config, room: Option<&str>, output: &Output) -> Result<()> {
    let room = config
        .room(room)
        .context("No room given. Pass one or set it with `playsync config set room <id>`")?;

    output.print_room(&room);
    Ok(())
}
