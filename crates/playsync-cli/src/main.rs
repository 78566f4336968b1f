//! playsync CLI
//!
//! Command-line client for synchronized playback rooms.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use playsync_core::{Config, TransportMode};

mod commands;
mod output;

use commands::join::JoinOptions;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "playsync")]
#[command(about = "playsync - Watch videos in sync with friends")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Config file to use instead of the default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Join a room with a headless player driven from stdin
    Join {
        /// Room id (defaults to the configured room)
        room: Option<String>,
        /// Content URL reported to peers
        #[arg(short, long, default_value = "headless://playsync")]
        url: String,
        /// Length of the simulated video in seconds
        #[arg(short, long, default_value_t = 7200.0)]
        duration: f64,
        /// Transport to use (direct, proxied)
        #[arg(short, long)]
        transport: Option<TransportMode>,
    },
    /// Show the addresses of a room
    Room {
        /// Room id (defaults to the configured room)
        room: Option<String>,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (host, room, transport, secure, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands work on the file itself
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config = Config::load_with_cli_override(config_path)?;
    init_logging(&config);

    match cli.command {
        Commands::Join {
            room,
            url,
            duration,
            transport,
        } => {
            let options = JoinOptions {
                room,
                url,
                duration,
                transport,
            };
            commands::join::join(&config, options, &output).await
        }
        Commands::Room { room } => commands::room::show(&config, room.as_deref(), &output),
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

/// Initialize logging
///
/// Only initializes if PLAYSYNC_LOG environment variable is set.
/// Logs to config.log_file when set, stderr otherwise.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("PLAYSYNC_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "playsync_core={},playsync_cli={}",
        log_level, log_level
    ));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    match &config.log_file {
        Some(log_path) => {
            let log_file = match File::create(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
                    return;
                }
            };

            // Ignore error if already initialized
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(log_file))
                .try_init();
            info!("Logging initialized to {:?}", log_path);
        }
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
}
