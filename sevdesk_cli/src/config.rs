//! Configuration file and token resolution.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use log::debug;
use serde::Deserialize;

/// Contents of `~/.config/sevdesk-cli/config.json`. All fields are
/// optional; flags override the file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub api_token: Option<String>,
    pub api_token_command: Option<String>,
    pub base_url: Option<String>,
}

/// Default location: `~/.config/sevdesk-cli/config.json`.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sevdesk-cli")
        .join("config.json")
}

/// Loads the file if it exists; a missing file is an empty config.
pub fn load(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!("No config file at {}", path.display());
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Configuration error: failed to read {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Configuration error: invalid JSON in {}", path.display()))
}

impl Config {
    /// Token in order of precedence: `--token` flag, `api_token`,
    /// `api_token_command`.
    pub fn resolve_token(&self, flag: Option<&str>) -> Result<String> {
        if let Some(token) = flag {
            return Ok(token.to_string());
        }
        if let Some(token) = &self.api_token {
            return Ok(token.clone());
        }
        if let Some(command) = &self.api_token_command {
            return run_token_command(command);
        }
        bail!(
            "Authentication error: no API token; pass --token or set api_token / \
             api_token_command in {}",
            default_path().display()
        );
    }
}

/// Runs the configured command in a shell; its trimmed stdout is the
/// token.
fn run_token_command(command: &str) -> Result<String> {
    debug!("Running token command: {command}");
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .with_context(|| format!("Authentication error: failed to run {command:?}"))?;
    if !output.status.success() {
        bail!(
            "Authentication error: token command {command:?} exited with {}",
            output.status
        );
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        bail!("Authentication error: token command {command:?} printed nothing");
    }
    Ok(token)
}
