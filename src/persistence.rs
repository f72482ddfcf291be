//! Where the profile document lives
//!
//! The engine only sees [`ConfigSource`]; [`ConfigFile`] backs it with a JSON
//! file under the user's config directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::Configuration;
use crate::constants::config;
use crate::error::ConfigError;

/// Persisted profile document
pub trait ConfigSource {
    /// Raw document bytes; a missing document is `ConfigError::NotFound`
    fn read(&self) -> Result<Vec<u8>, ConfigError>;

    fn write(&self, configuration: &Configuration) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$XDG_CONFIG_HOME/pointer-profiles/profiles.json`, or the working
    /// directory when no config dir can be determined
    pub fn default_location() -> Self {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(config::APP_DIR);
        path.push(config::FILENAME);
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for ConfigFile {
    fn read(&self) -> Result<Vec<u8>, ConfigError> {
        fs::read(&self.path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound(self.path.clone()),
            _ => ConfigError::Read {
                path: self.path.clone(),
                source,
            },
        })
    }

    fn write(&self, configuration: &Configuration) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(&self.path, configuration.to_document()?).map_err(write_err)?;

        info!(path = %self.path.display(), "Saved configuration");
        Ok(())
    }
}
