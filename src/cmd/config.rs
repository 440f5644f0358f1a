//! Configuration view, validation and scaffolding: `board-sync config`.

use anyhow::{Result, anyhow, bail};
use std::path::Path;

use board_sync::config::SyncToml;
use board_sync::errors::SyncError;
use board_sync::util::redact;

use super::super::ConfigCommands;

/// File plus process environment, as a run would see it.
fn load_effective(config_path: &Path) -> Result<SyncToml> {
    let mut toml = SyncToml::load(config_path).map_err(SyncError::Config)?;
    toml.apply_env(|key| std::env::var(key).ok());
    Ok(toml)
}

fn show_value(value: &Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => format!("\"{}\"", v),
        _ => "(unset)".to_string(),
    }
}

fn show_secret(value: &Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => format!("\"{}\"", redact(v)),
        _ => "(unset)".to_string(),
    }
}

pub fn cmd_config(config_path: &Path, command: Option<ConfigCommands>) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("board-sync configuration");
            println!("========================");
            println!();

            if !config_path.exists() {
                println!("No configuration file at {}", config_path.display());
                println!();
                println!("Run 'board-sync config init' to create one.");
                println!();
                return Ok(());
            }

            println!("Config file: {}", config_path.display());
            println!("Effective values (with environment overrides):");
            println!();

            let toml = load_effective(config_path)?;

            println!("[board]");
            println!("  id = {}", show_value(&toml.board.id));
            println!("  api_key = {}", show_secret(&toml.board.api_key));
            println!("  token = {}", show_secret(&toml.board.token));
            if let Some(url) = &toml.board.api_url {
                println!("  api_url = \"{}\"", url);
            }
            if let Some(fields) = &toml.board.card_fields {
                println!("  card_fields = {:?}", fields);
            }
            println!();

            println!("[repository]");
            println!("  owner = {}", show_value(&toml.repository.owner));
            println!("  name = {}", show_value(&toml.repository.name));
            println!("  branch = {}", show_value(&toml.repository.branch));
            println!("  token = {}", show_secret(&toml.repository.token));
            if let Some(url) = &toml.repository.api_url {
                println!("  api_url = \"{}\"", url);
            }
            println!();

            println!("[content]");
            println!("  item_path = {}", show_value(&toml.content.item_path));
            println!("  private_prefix = \"{}\"", toml.content.private_prefix);
            println!("  extension = \"{}\"", toml.content.extension);
            println!("  layout = \"{}\"", toml.content.layout);
            println!();

            println!("[http]");
            println!("  timeout_secs = {}", toml.http.timeout_secs);
            println!();

            let missing = toml.missing();
            if !missing.is_empty() {
                println!(
                    "{} {}",
                    console::style("Missing:").red().bold(),
                    missing.join(", ")
                );
                println!();
            }
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating {}...", config_path.display());
            println!();

            let toml = load_effective(config_path)?;
            let warnings = toml.validate();
            if !warnings.is_empty() {
                println!("Configuration warnings:");
                for warning in &warnings {
                    println!("  - {}", warning);
                }
                println!();
            }

            let missing = toml.missing();
            if !missing.is_empty() {
                return Err(SyncError::Config(anyhow!(
                    "Missing required setting(s): {}",
                    missing.join(", ")
                ))
                .into());
            }

            println!("{}", console::style("Configuration is valid.").green());
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                bail!(
                    "{} already exists; delete it first if you want to recreate it",
                    config_path.display()
                );
            }

            if let Some(parent) = config_path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(config_path, SyncToml::template())?;

            println!("Created {}", config_path.display());
            println!();
            println!("Fill in:");
            println!("  - [board] id, plus BOARD_SYNC_TRELLO_KEY / BOARD_SYNC_TRELLO_TOKEN");
            println!("  - [repository] owner, name, branch, plus BOARD_SYNC_GITHUB_TOKEN");
            println!("  - [content] item_path");
            println!();
        }
    }

    Ok(())
}
