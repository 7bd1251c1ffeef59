//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read a JSON or YAML document. `.yaml`/`.yml` files are parsed as YAML,
/// everything else as JSON.
pub fn read_data_file<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let contents = std::fs::read_to_string(path)?;
    parse_data(path, &contents)
}

fn parse_data<T: DeserializeOwned>(path: &Path, contents: &str) -> Result<T, CliError> {
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
    if is_yaml {
        Ok(serde_yaml::from_str(contents)?)
    } else {
        Ok(serde_json::from_str(contents)?)
    }
}

/// Write `data` as pretty JSON, creating parent directories.
pub fn write_json_file<T: serde::Serialize>(path: &Path, data: &T) -> Result<(), CliError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(data)?)?;
    Ok(())
}

/// Collapse empty strings to a dash for table cells.
pub fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".into()
    } else {
        value.to_owned()
    }
}
