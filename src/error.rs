//! Error taxonomy for the profile switcher

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading, parsing or persisting the profile document
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No document exists yet; triggers bootstrap at startup
    #[error("configuration not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    Parse(String),

    #[error("failed to read configuration from {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write configuration to {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// OS-domain pointer settings failures, carried verbatim
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("failed to read pointer settings: {0}")]
    Read(String),

    #[error("failed to apply pointer settings: {0}")]
    Apply(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IconError {
    #[error("cannot compose icon glyph: {0}")]
    InvalidGlyph(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Tray registration failure (system resource)
#[derive(Debug, Error)]
#[error("failed to register tray icon: {0}")]
pub struct TrayError(pub String);
