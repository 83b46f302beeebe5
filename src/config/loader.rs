//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::EngineConfig;

/// Error type for engine configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load the engine configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: EngineConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;
    Ok(config)
}

/// Load a single JSON document, tolerating failure.
///
/// Unreadable or malformed files are logged and yield `None` so that one
/// bad config file never takes the whole instance down.
pub fn load_json_file(path: &Path) -> Option<serde_json::Value> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "unable to read json file");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "malformed json file");
            None
        }
    }
}

/// Load every `*.json` document under a directory, in sorted path order.
///
/// With `recurse` the walk descends into subdirectories. A missing or
/// invalid directory yields an empty list with a warning.
pub fn load_json_documents(dir: &Path, recurse: bool) -> Vec<(PathBuf, serde_json::Value)> {
    if !dir.is_dir() {
        tracing::warn!(path = %dir.display(), "failed to load json configs; invalid directory");
        return Vec::new();
    }

    let max_depth = if recurse { usize::MAX } else { 1 };
    let mut documents = Vec::new();
    for entry in walkdir::WalkDir::new(dir)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(value) = load_json_file(path) {
            documents.push((path.to_path_buf(), value));
        }
    }
    documents
}
