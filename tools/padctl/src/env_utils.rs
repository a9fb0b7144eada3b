use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use log::LevelFilter;

pub fn parse_env_u64(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{name} must be an unsigned integer")),
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(anyhow!("{name} invalid: {err}")),
    }
}

pub fn parse_env_u8(name: &str, default: u8) -> Result<u8> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u8>()
            .with_context(|| format!("{name} must be an integer in 0..=255")),
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(anyhow!("{name} invalid: {err}")),
    }
}

pub fn parse_env_level(name: &str, default: LevelFilter) -> Result<LevelFilter> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<LevelFilter>()
            .map_err(|_| anyhow!("{name} must be one of off|error|warn|info|debug|trace")),
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(anyhow!("{name} invalid: {err}")),
    }
}

/// Settings file location: `--settings`, then `PADCTL_SETTINGS_PATH`, then the working directory.
pub fn settings_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    match std::env::var("PADCTL_SETTINGS_PATH") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => PathBuf::from(stickpad::config::SETTINGS_FILE_NAME),
    }
}
