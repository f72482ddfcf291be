//! Pointer settings sink backed by X11 core pointer control
//!
//! X11 exposes acceleration as a `numerator / denominator` factor applied
//! past a single `threshold`. Profiles carry four values, so the mapping is:
//! `speed == 0` disables acceleration (1/1), otherwise the factor is
//! `sensitivity * speed / 10`, and the threshold is `threshold_1`.
//! `threshold_2` has no X11 counterpart; it survives only through the cached
//! last-applied value.

use anyhow::{Context, Result};
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::ConnectionExt as _;
use x11rb::rust_connection::RustConnection;

use crate::constants::pointer;
use crate::error::SettingsError;
use crate::types::Settings;

/// Reads and applies the live OS pointer settings
pub trait SettingsSink {
    fn get(&self) -> Result<Settings, SettingsError>;
    fn set(&mut self, settings: Settings) -> Result<(), SettingsError>;
}

/// Values as sent to / reported by `ChangePointerControl`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PointerControl {
    numerator: i16,
    denominator: i16,
    threshold: i16,
}

impl PointerControl {
    fn encode(settings: Settings) -> Result<Self, SettingsError> {
        let out_of_range = |field: &str, value: i32| {
            SettingsError::Apply(format!("{field} {value} is outside the X11 pointer control range"))
        };

        let threshold = i16::try_from(settings.threshold_1)
            .map_err(|_| out_of_range("threshold_1", settings.threshold_1))?;

        if settings.speed == 0 {
            return Ok(Self {
                numerator: 1,
                denominator: 1,
                threshold,
            });
        }

        let factor = settings.sensitivity.saturating_mul(settings.speed);
        let numerator = i16::try_from(factor)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| out_of_range("sensitivity * speed", factor))?;

        Ok(Self {
            numerator,
            denominator: pointer::ACCEL_DENOMINATOR,
            threshold,
        })
    }

    /// Best-effort inverse of `encode` for state we did not apply ourselves
    fn decode(self) -> Settings {
        if self.numerator == self.denominator || self.denominator <= 0 {
            return Settings::new(0, 0, 0, pointer::NEUTRAL_SENSITIVITY);
        }

        let scaled = i32::from(self.numerator) * i32::from(pointer::ACCEL_DENOMINATOR);
        let sensitivity = (scaled + i32::from(self.denominator) / 2) / i32::from(self.denominator);
        Settings::new(i32::from(self.threshold), 0, 1, sensitivity.clamp(1, 20))
    }
}

pub struct X11PointerSink {
    conn: RustConnection,
    last_applied: Option<(Settings, PointerControl)>,
}

impl X11PointerSink {
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X11 display")?;
        info!(screen = screen_num, "Connected to X11 for pointer control");
        Ok(Self {
            conn,
            last_applied: None,
        })
    }

    fn query(&self) -> Result<PointerControl, SettingsError> {
        let reply = self
            .conn
            .get_pointer_control()
            .map_err(|e| SettingsError::Read(e.to_string()))?
            .reply()
            .map_err(|e| SettingsError::Read(e.to_string()))?;

        Ok(PointerControl {
            numerator: reply.acceleration_numerator as i16,
            denominator: reply.acceleration_denominator as i16,
            threshold: reply.threshold as i16,
        })
    }
}

impl SettingsSink for X11PointerSink {
    fn get(&self) -> Result<Settings, SettingsError> {
        let current = self.query()?;
        match self.last_applied {
            Some((settings, applied)) if applied == current => Ok(settings),
            _ => Ok(current.decode()),
        }
    }

    fn set(&mut self, settings: Settings) -> Result<(), SettingsError> {
        let control = PointerControl::encode(settings)?;
        debug!(?settings, ?control, "Applying pointer control");

        self.conn
            .change_pointer_control(control.numerator, control.denominator, control.threshold, true, true)
            .map_err(|e| SettingsError::Apply(e.to_string()))?
            .check()
            .map_err(|e| SettingsError::Apply(e.to_string()))?;
        self.conn
            .flush()
            .map_err(|e| SettingsError::Apply(e.to_string()))?;

        self.last_applied = Some((settings, control));
        Ok(())
    }
}
