//! Structured file loading into untyped trees.

use std::fs;
use std::path::Path;

use crate::decode::node::{decode, Node};

/// Error type for loading a structured file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Text formats recognised by file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Toml,
    Yaml,
}

impl Format {
    /// Pick the format from the file suffix.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(Format::Toml),
            Some("yml") | Some("yaml") => Ok(Format::Yaml),
            _ => Err(LoadError::UnsupportedExtension(path.display().to_string())),
        }
    }

    /// Parse `content` into an untyped value.
    pub fn parse(self, content: &str) -> Result<serde_json::Value, LoadError> {
        let value = match self {
            Format::Toml => toml::from_str(content)?,
            Format::Yaml => serde_yaml::from_str(content)?,
        };
        Ok(value)
    }
}

/// Read `path` and decode it into a tree, keeping only the root sections in `filters`.
pub fn decode_file(path: &Path, filters: &[&str]) -> Result<Node, LoadError> {
    let format = Format::from_path(path)?;
    let content = fs::read_to_string(path)?;
    let raw = format.parse(&content)?;
    Ok(decode(&raw, filters))
}
