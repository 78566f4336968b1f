//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use playsync_core::{Config, TransportMode};

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "host": config.host,
                    "room": config.room,
                    "transport": config.transport.to_string(),
                    "secure": config.secure,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.host);
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  host:      {}", config.host);
            println!(
                "  room:      {}",
                config.room.as_deref().unwrap_or("(not set)")
            );
            println!("  transport: {}", config.transport);
            println!("  secure:    {}", config.secure);
            println!(
                "  log_file:  {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

/// Apply one key/value pair to a configuration
fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "host" => {
            if value.is_empty() {
                bail!("host cannot be empty");
            }
            config.host = value.to_string();
        }
        "room" => {
            config.room = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.to_string())
            };
        }
        "transport" => {
            config.transport = value
                .parse::<TransportMode>()
                .map_err(anyhow::Error::msg)
                .context("Invalid value for transport. Use 'direct' or 'proxied'.")?;
        }
        "secure" => {
            config.secure = value
                .parse()
                .context("Invalid value for secure. Use 'true' or 'false'.")?;
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: host, room, transport, secure, log_file",
                key
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_apply_known_keys() {
        let mut config = Config::default();

        apply(&mut config, "host", "rooms.example").unwrap();
        apply(&mut config, "room", "abc").unwrap();
        apply(&mut config, "transport", "proxied").unwrap();
        apply(&mut config, "secure", "true").unwrap();

        assert_eq!(config.host, "rooms.example");
        assert_eq!(config.room, Some("abc".to_string()));
        assert_eq!(config.transport, TransportMode::Proxied);
        assert!(config.secure);

        apply(&mut config, "room", "none").unwrap();
        assert!(config.room.is_none());
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let mut config = Config::default();

        assert!(apply(&mut config, "transport", "carrier-pigeon").is_err());
        assert!(apply(&mut config, "secure", "maybe").is_err());
        assert!(apply(&mut config, "host", "").is_err());
        assert!(apply(&mut config, "color", "blue").is_err());
    }

    #[test]
    fn test_set_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        let output = Output::new(OutputFormat::Quiet);

        set("host".to_string(), "rooms.example".to_string(), Some(&path), &output).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("rooms.example"));
    }
}
