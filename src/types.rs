//! Plain value types shared across modules

use serde::{Deserialize, Serialize};
use std::fmt;

/// The four pointer parameters applied as one unit.
///
/// `sensitivity` lives in the 1-20 domain, which the OS enforces; nothing
/// here validates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Settings {
    pub threshold_1: i32,
    pub threshold_2: i32,
    pub speed: i32,
    pub sensitivity: i32,
}

impl Settings {
    pub const fn new(threshold_1: i32, threshold_2: i32, speed: i32, sensitivity: i32) -> Self {
        Self {
            threshold_1,
            threshold_2,
            speed,
            sensitivity,
        }
    }
}

/// Modifier keys that must be held for a hotkey to fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub win: bool,
}

/// Modifier set plus a virtual-key code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hotkey {
    #[serde(flatten)]
    pub modifiers: Modifiers,
    pub key_code: u8,
}

impl Hotkey {
    pub const fn new(modifiers: Modifiers, key_code: u8) -> Self {
        Self { modifiers, key_code }
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.modifiers;
        for (held, label) in [(m.ctrl, "Ctrl"), (m.alt, "Alt"), (m.shift, "Shift"), (m.win, "Win")] {
            if held {
                write!(f, "{label}+")?;
            }
        }
        write!(f, "0x{:02X}", self.key_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hotkey_modifiers_default_to_released() {
        let hotkey: Hotkey = serde_json::from_str(r#"{"win": true, "key_code": 112}"#).unwrap();
        assert_eq!(
            hotkey,
            Hotkey::new(Modifiers { win: true, ..Default::default() }, 0x70)
        );
    }

    #[test]
    fn test_hotkey_display() {
        let hotkey = Hotkey::new(Modifiers { ctrl: true, shift: true, ..Default::default() }, 0x41);
        assert_eq!(hotkey.to_string(), "Ctrl+Shift+0x41");
    }
}
