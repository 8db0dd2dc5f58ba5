//! API token resolution shared by the command line tools.

use std::process::Command;

use log::debug;

use crate::error::{InvoicerError, Result};

/// Token from `--token`, else the trimmed stdout of `--token-command`.
pub fn resolve(token: Option<String>, command: Option<&str>) -> Result<String> {
    if let Some(token) = token {
        return Ok(token);
    }
    if let Some(command) = command {
        return run_token_command(command);
    }
    Err(InvoicerError::Auth(
        "no API token; pass --token or --token-command".to_string(),
    ))
}

fn run_token_command(command: &str) -> Result<String> {
    debug!("Running token command: {command}");
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .map_err(|err| InvoicerError::Auth(format!("failed to run {command:?}: {err}")))?;
    if !output.status.success() {
        return Err(InvoicerError::Auth(format!(
            "token command {command:?} exited with {}",
            output.status
        )));
    }
    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(InvoicerError::Auth(format!(
            "token command {command:?} printed nothing"
        )));
    }
    Ok(token)
}
