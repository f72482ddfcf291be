//! Profile engine: owns the loaded configuration and the current selection
//!
//! Every operation runs to completion on the dispatcher before the next
//! command is taken, so the state needs no locking. The selection is always
//! empty or a valid index into the current generation's profiles.

use tracing::{error, info, warn};

use crate::color::Rgb;
use crate::config::{ConfigStore, Configuration};
use crate::error::{ConfigError, EngineError, SettingsError};
use crate::hotkeys::{HotkeyAction, HotkeyBinder, HotkeyId, HotkeyRouter};
use crate::persistence::ConfigSource;
use crate::pointer::SettingsSink;

/// Icon the tray should show after the last state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconRefresh {
    /// 1-based slot numeral in the profile tint
    Profile { numeral: u8, tint: Rgb },
    /// Nothing selected
    Base,
}

#[derive(Debug)]
pub enum ReloadOutcome {
    /// No document on disk; the current generation stays
    Unchanged,
    Reloaded {
        profiles: usize,
        /// Re-activation of the previously selected slot, when it still exists
        restored: Option<Result<usize, SettingsError>>,
    },
}

/// Configuration the process starts with. A missing document is replaced by
/// the two-profile bootstrap built from the live settings, which is also
/// written back through `source`.
pub fn initial_configuration(
    sink: &impl SettingsSink,
    source: &impl ConfigSource,
) -> Result<Configuration, EngineError> {
    match source.read() {
        Ok(bytes) => Ok(ConfigStore::load(&bytes)?),
        Err(ConfigError::NotFound(path)) => {
            info!(path = %path.display(), "Config file not found, creating default from current pointer settings");
            let configuration = Configuration::bootstrap(sink.get()?);
            if let Err(e) = source.write(&configuration) {
                warn!(error = %e, "Failed to persist bootstrap configuration");
            }
            Ok(configuration)
        }
        Err(e) => Err(e.into()),
    }
}

pub struct ProfileEngine<S, B> {
    sink: S,
    binder: B,
    configuration: Configuration,
    selected: Option<usize>,
    router: HotkeyRouter,
    icon_refresh: Option<IconRefresh>,
}

impl<S: SettingsSink, B: HotkeyBinder> ProfileEngine<S, B> {
    /// Takes ownership of the first generation and binds its hotkeys;
    /// nothing is selected until the first activation.
    pub fn new(sink: S, mut binder: B, configuration: Configuration) -> Self {
        let mut router = HotkeyRouter::new(configuration.profiles.len());
        router.register_all(&configuration, &mut binder);

        Self {
            sink,
            binder,
            configuration,
            selected: None,
            router,
            icon_refresh: Some(IconRefresh::Base),
        }
    }

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn route(&self, id: HotkeyId) -> HotkeyAction {
        self.router.route(id)
    }

    /// Pending icon change since the last call
    pub fn take_icon_refresh(&mut self) -> Option<IconRefresh> {
        self.icon_refresh.take()
    }

    /// Applies profile `index`. The selection only moves once the OS has
    /// accepted the settings.
    ///
    /// # Panics
    /// When `index` is not a profile of the current generation.
    pub fn activate_profile(&mut self, index: usize) -> Result<(), SettingsError> {
        assert!(
            index < self.configuration.profiles.len(),
            "profile index {index} out of range for {} profile(s)",
            self.configuration.profiles.len()
        );

        let profile = &self.configuration.profiles[index];
        if let Err(e) = self.sink.set(profile.settings) {
            error!(profile = %profile.name, index, error = %e, "Failed to apply profile");
            return Err(e);
        }

        info!(profile = %profile.name, index, settings = ?profile.settings, "Activated profile");
        self.selected = Some(index);
        self.icon_refresh = Some(IconRefresh::Profile {
            numeral: index as u8 + 1,
            tint: profile.color.rgb(),
        });
        Ok(())
    }

    /// Activates the profile after the selected one, wrapping; from an empty
    /// selection that is the first profile. `Ok(None)` when there are no
    /// profiles.
    pub fn cycle(&mut self) -> Result<Option<usize>, SettingsError> {
        let count = self.configuration.profiles.len();
        if count == 0 {
            return Ok(None);
        }

        let next = self.selected.map_or(0, |current| (current + 1) % count);
        self.activate_profile(next)?;
        Ok(Some(next))
    }

    /// Replaces the configuration from `source`.
    ///
    /// Hotkeys are released before the document is read. When the document
    /// fails to parse the old generation stays authoritative but its hotkeys
    /// remain unbound until the next successful reload.
    pub fn reload(&mut self, source: &impl ConfigSource) -> Result<ReloadOutcome, EngineError> {
        self.router.unregister_all(&mut self.binder);

        let bytes = match source.read() {
            Ok(bytes) => bytes,
            Err(ConfigError::NotFound(path)) => {
                warn!(path = %path.display(), "Config file not found, keeping current profiles");
                self.router.register_all(&self.configuration, &mut self.binder);
                return Ok(ReloadOutcome::Unchanged);
            }
            Err(e) => {
                error!(error = %e, "Reload aborted, hotkeys stay unbound until the next successful reload");
                return Err(e.into());
            }
        };

        let configuration = match ConfigStore::load(&bytes) {
            Ok(configuration) => configuration,
            Err(e) => {
                error!(error = %e, "Reload aborted, hotkeys stay unbound until the next successful reload");
                return Err(e.into());
            }
        };

        let previous = self.selected.take();
        self.configuration = configuration;
        self.router = HotkeyRouter::new(self.configuration.profiles.len());
        self.icon_refresh = Some(IconRefresh::Base);

        let restored = previous
            .filter(|index| *index < self.configuration.profiles.len())
            .map(|index| self.activate_profile(index).map(|()| index));
        if previous.is_some() && self.selected.is_none() {
            info!(previous = ?previous, "Previously selected profile not restored");
        }

        self.router.register_all(&self.configuration, &mut self.binder);

        let profiles = self.configuration.profiles.len();
        info!(profiles, selected = ?self.selected, hotkeys = self.router.registered().len(), "Reloaded configuration");
        Ok(ReloadOutcome::Reloaded { profiles, restored })
    }

    /// Releases every hotkey slot
    pub fn shutdown(&mut self) {
        self.router.unregister_all(&mut self.binder);
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    #[cfg(test)]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    #[cfg(test)]
    pub fn binder(&self) -> &B {
        &self.binder
    }
}
