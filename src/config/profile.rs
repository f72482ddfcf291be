//! Profile-based configuration
//!
//! The on-disk document is deserialized into raw `*Document` types first and
//! then validated into the immutable [`Configuration`] the engine owns. Each
//! loaded `Configuration` is one generation: profile indices are only
//! meaningful within it.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::color::HexColor;
use crate::constants::{bootstrap, config, vk};
use crate::error::ConfigError;
use crate::types::{Hotkey, Modifiers, Settings};

/// A named bundle of pointer settings with an optional activation hotkey
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub name: String,
    pub color: HexColor,
    pub hotkey: Option<Hotkey>,
    pub settings: Settings,
}

/// Immutable snapshot of the profile list (at most nine entries)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Configuration {
    pub profiles: Vec<Profile>,
    pub cycle_hotkey: Option<Hotkey>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    profiles: Vec<ProfileDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cycle_hotkey: Option<Hotkey>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProfileDocument {
    name: String,
    #[serde(default = "default_color")]
    color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hotkey: Option<Hotkey>,
    settings: Settings,
}

fn default_color() -> String {
    config::DEFAULT_COLOR.to_string()
}

impl ProfileDocument {
    fn validate(self, index: usize) -> Result<Profile, ConfigError> {
        let color = HexColor::parse(&self.color).ok_or_else(|| {
            ConfigError::Parse(format!(
                "profile {} ('{}'): color '{}' is not a RRGGBB or RRGGBBAA hex value",
                index + 1,
                self.name,
                self.color
            ))
        })?;

        Ok(Profile {
            name: self.name,
            color,
            hotkey: self.hotkey,
            settings: self.settings,
        })
    }
}

impl From<&Profile> for ProfileDocument {
    fn from(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            color: profile.color.to_string(),
            hotkey: profile.hotkey,
            settings: profile.settings,
        }
    }
}

impl Configuration {
    /// Two copies of the live pointer settings and a Win+F1 cycle hotkey
    pub fn bootstrap(live: Settings) -> Self {
        let profile = |name: &str, color: &str| Profile {
            name: name.to_string(),
            color: HexColor::parse(color).unwrap_or(HexColor::WHITE),
            hotkey: None,
            settings: live,
        };

        Self {
            profiles: vec![
                profile(bootstrap::FIRST_PROFILE_NAME, bootstrap::FIRST_PROFILE_COLOR),
                profile(bootstrap::SECOND_PROFILE_NAME, bootstrap::SECOND_PROFILE_COLOR),
            ],
            cycle_hotkey: Some(Hotkey::new(
                Modifiers {
                    win: true,
                    ..Default::default()
                },
                vk::F1,
            )),
        }
    }

    /// Pretty-printed document with a trailing newline
    pub fn to_document(&self) -> Result<String, ConfigError> {
        let document = ConfigDocument {
            profiles: self.profiles.iter().map(ProfileDocument::from).collect(),
            cycle_hotkey: self.cycle_hotkey,
        };
        let mut json = serde_json::to_string_pretty(&document)?;
        json.push('\n');
        Ok(json)
    }
}

/// Parses and validates persisted profile documents
pub struct ConfigStore;

impl ConfigStore {
    /// Unknown keys are ignored and profiles past the ninth are dropped
    /// from the tail.
    pub fn load(bytes: &[u8]) -> Result<Configuration, ConfigError> {
        let mut document: ConfigDocument = serde_json::from_slice(bytes)?;

        let total = document.profiles.len();
        if total > config::MAX_PROFILES {
            document.profiles.truncate(config::MAX_PROFILES);
            warn!(
                total,
                kept = config::MAX_PROFILES,
                "Configuration has more profiles than hotkey slots, discarding the rest"
            );
        }

        let profiles = document
            .profiles
            .into_iter()
            .enumerate()
            .map(|(index, profile)| profile.validate(index))
            .collect::<Result<Vec<_>, _>>()?;

        info!("Loaded config with {} profile(s)", profiles.len());
        Ok(Configuration {
            profiles,
            cycle_hotkey: document.cycle_hotkey,
        })
    }
}
