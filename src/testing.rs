//! In-memory collaborators shared by unit tests

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::color::HexColor;
use crate::config::{Configuration, Profile};
use crate::error::{ConfigError, IconError, SettingsError};
use crate::hotkeys::{HotkeyBinder, HotkeyId};
use crate::icon::{GlyphRasterizer, TextLayer};
use crate::persistence::ConfigSource;
use crate::pointer::SettingsSink;
use crate::types::{Hotkey, Modifiers, Settings};

pub const BLOCK_EDGE_ALPHA: u8 = 128;

/// Solid block at x 6..10, y 4..12 with a half-covered column at x 10
pub struct BlockRasterizer;

impl GlyphRasterizer for BlockRasterizer {
    fn rasterize_digit(&self, digit: char) -> Result<TextLayer, IconError> {
        if !digit.is_ascii_digit() {
            return Err(IconError::InvalidGlyph(format!("not a digit: {digit}")));
        }
        let mut layer = TextLayer::blank();
        for y in 4..12 {
            for x in 6..10 {
                layer.set(x, y, 255);
            }
            layer.set(10, y, BLOCK_EDGE_ALPHA);
        }
        Ok(layer)
    }
}

/// Records every applied value; `fail_next` makes the following `set` fail
#[derive(Debug, Default)]
pub struct FakeSink {
    pub live: Settings,
    pub applied: Vec<Settings>,
    pub fail_next: bool,
    pub fail_get: bool,
}

impl SettingsSink for FakeSink {
    fn get(&self) -> Result<Settings, SettingsError> {
        if self.fail_get {
            return Err(SettingsError::Read("display unavailable".to_string()));
        }
        Ok(self.live)
    }

    fn set(&mut self, settings: Settings) -> Result<(), SettingsError> {
        if std::mem::take(&mut self.fail_next) {
            return Err(SettingsError::Apply("access denied".to_string()));
        }
        self.live = settings;
        self.applied.push(settings);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct RecordingBinder {
    pub active: HashMap<HotkeyId, Hotkey>,
    pub unregister_calls: Vec<HotkeyId>,
    pub refuse: bool,
}

impl HotkeyBinder for RecordingBinder {
    fn register(&mut self, id: HotkeyId, modifiers: Modifiers, key_code: u8) -> bool {
        if self.refuse {
            return false;
        }
        self.active.insert(id, Hotkey::new(modifiers, key_code));
        true
    }

    fn unregister(&mut self, id: HotkeyId) -> bool {
        self.unregister_calls.push(id);
        self.active.remove(&id).is_some()
    }
}

/// Document held in memory; `None` reads as not found
#[derive(Debug, Default)]
pub struct MemorySource {
    pub document: RefCell<Option<Vec<u8>>>,
    pub writes: Cell<usize>,
}

impl MemorySource {
    pub fn with(document: &str) -> Self {
        let source = Self::default();
        source.replace(document);
        source
    }

    pub fn replace(&self, document: &str) {
        *self.document.borrow_mut() = Some(document.as_bytes().to_vec());
    }

    pub fn remove(&self) {
        *self.document.borrow_mut() = None;
    }
}

impl ConfigSource for MemorySource {
    fn read(&self) -> Result<Vec<u8>, ConfigError> {
        self.document
            .borrow()
            .clone()
            .ok_or_else(|| ConfigError::NotFound(PathBuf::from("memory")))
    }

    fn write(&self, configuration: &Configuration) -> Result<(), ConfigError> {
        self.writes.set(self.writes.get() + 1);
        *self.document.borrow_mut() = Some(configuration.to_document()?.into_bytes());
        Ok(())
    }
}

/// Profile whose settings are all `n`
pub fn profile(name: &str, n: i32) -> Profile {
    Profile {
        name: name.to_string(),
        color: HexColor::WHITE,
        hotkey: None,
        settings: Settings::new(n, n, n, n),
    }
}

/// Document with one profile per name; settings of profile `i` are `i + 1`
pub fn document(names: &[&str]) -> String {
    let profiles: Vec<String> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let n = i + 1;
            format!(
                r#"{{"name": "{name}", "color": "00ff00", "hotkey": {{"ctrl": true, "key_code": {}}}, "settings": {{"threshold_1": {n}, "threshold_2": {n}, "speed": {n}, "sensitivity": {n}}}}}"#,
                0x30 + n
            )
        })
        .collect();
    format!(
        r#"{{"profiles": [{}], "cycle_hotkey": {{"win": true, "key_code": 112}}}}"#,
        profiles.join(",")
    )
}
