//! Default locations for the settings file and record store.

use std::env;
use std::path::{Path, PathBuf};

use servdesk_core::util::normalize_text_option;

use crate::error::CliError;

const SETTINGS_FILE_NAME: &str = "attachments.json";

pub fn resolve_settings_path(explicit: Option<&Path>) -> Result<PathBuf, CliError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = normalize_text_option(env::var("SERVDESK_CONFIG").ok()) {
        return Ok(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|dir| dir.join("servdesk").join(SETTINGS_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve config directory".to_string()))
}

pub fn resolve_store_path(explicit: Option<&Path>) -> Result<PathBuf, CliError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = normalize_text_option(env::var("SERVDESK_STORE").ok()) {
        return Ok(PathBuf::from(path));
    }
    dirs::data_dir()
        .map(|dir| dir.join("servdesk").join("store"))
        .ok_or_else(|| CliError::Config("Failed to resolve data directory".to_string()))
}
