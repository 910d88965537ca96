//! TOML file reading with typed errors.
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::ConfigError;

/// Deserialize `path` into `T`.
///
/// Returns `Ok(None)` when the file does not exist so callers can fall back
/// to an empty configuration.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::Parse`] if it is not valid TOML of the expected shape.
pub fn load_config<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    parse_config(&content, path).map(Some)
}

/// Deserialize TOML `content`; `path` only labels errors.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the content does not deserialize.
pub fn parse_config<T: DeserializeOwned>(content: &str, path: &Path) -> Result<T, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.message().to_string(),
    })
}

/// Deserialize one entry of a loosely-typed table.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] naming `section.key` on a shape mismatch.
pub fn entry<T: DeserializeOwned>(
    value: toml::Value,
    section: &str,
    key: &str,
    path: &Path,
) -> Result<T, ConfigError> {
    value.try_into().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.display().to_string(),
        message: format!("[{section}.{key}]: {}", e.message()),
    })
}
