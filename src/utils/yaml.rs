//! YAML parsing with errors that name the offending file.

use anyhow::Result;
use serde::de::DeserializeOwned;
use std::path::Path;

use crate::core::TargetError;

/// Parse a YAML document into `T`.
///
/// An empty or whitespace-only document parses like `{}`.
pub fn parse_yaml<T>(bytes: &[u8], file: &str) -> Result<T, TargetError>
where
    T: DeserializeOwned,
{
    let text = std::str::from_utf8(bytes).map_err(|e| TargetError::YamlError {
        file: file.to_string(),
        reason: format!("not valid UTF-8: {e}"),
    })?;
    let text = if text.trim().is_empty() {
        "{}"
    } else {
        text
    };
    serde_yaml::from_str(text).map_err(|e| TargetError::YamlError {
        file: file.to_string(),
        reason: e.to_string(),
    })
}

/// Read and parse a YAML file.
pub async fn read_yaml_file<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let location = path.display().to_string();
    let bytes = tokio::fs::read(path).await.map_err(|e| TargetError::IoError {
        path: location.clone(),
        reason: e.to_string(),
    })?;
    Ok(parse_yaml(&bytes, &location)?)
}
