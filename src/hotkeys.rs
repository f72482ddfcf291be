//! Hotkey id routing and the evdev-backed global hotkey binder

use anyhow::{Context, Result};
use evdev::{Device, EventSummary, KeyCode};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use crate::config::Configuration;
use crate::constants::{config, hotkey_ids, input, paths, permissions};
use crate::event_handler::Command;
use crate::types::{Hotkey, Modifiers};

pub type HotkeyId = u32;

/// Registers global key combinations under caller-chosen ids. Best-effort:
/// a failed registration only means that hotkey never fires.
pub trait HotkeyBinder {
    fn register(&mut self, id: HotkeyId, modifiers: Modifiers, key_code: u8) -> bool;
    fn unregister(&mut self, id: HotkeyId) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    Cycle,
    ActivateProfile(usize),
    Unknown,
}

/// Lookup table from hotkey ids to actions for one configuration generation
#[derive(Debug, Default)]
pub struct HotkeyRouter {
    profile_count: usize,
    registered: Vec<HotkeyId>,
}

impl HotkeyRouter {
    pub fn new(profile_count: usize) -> Self {
        Self {
            profile_count: profile_count.min(config::MAX_PROFILES),
            registered: Vec::new(),
        }
    }

    pub const fn profile_id(index: usize) -> HotkeyId {
        hotkey_ids::PROFILE_START + index as HotkeyId
    }

    pub fn route(&self, id: HotkeyId) -> HotkeyAction {
        if id == hotkey_ids::CYCLE {
            return HotkeyAction::Cycle;
        }
        match id.checked_sub(hotkey_ids::PROFILE_START) {
            Some(slot) if (slot as usize) < self.profile_count => {
                HotkeyAction::ActivateProfile(slot as usize)
            }
            _ => HotkeyAction::Unknown,
        }
    }

    pub fn registered(&self) -> &[HotkeyId] {
        &self.registered
    }

    /// Binds the cycle hotkey and every profile hotkey of `configuration`
    pub fn register_all(&mut self, configuration: &Configuration, binder: &mut impl HotkeyBinder) {
        if let Some(hotkey) = configuration.cycle_hotkey {
            self.register_one(hotkey_ids::CYCLE, hotkey, "cycle", binder);
        }

        for (index, profile) in configuration.profiles.iter().enumerate().take(config::MAX_PROFILES) {
            if let Some(hotkey) = profile.hotkey {
                self.register_one(Self::profile_id(index), hotkey, &profile.name, binder);
            }
        }
    }

    fn register_one(&mut self, id: HotkeyId, hotkey: Hotkey, label: &str, binder: &mut impl HotkeyBinder) {
        if binder.register(id, hotkey.modifiers, hotkey.key_code) {
            debug!(id, %hotkey, target = %label, "Registered hotkey");
            self.registered.push(id);
        } else {
            warn!(id, %hotkey, target = %label, "Failed to register hotkey");
        }
    }

    /// Releases the cycle id and all nine profile ids, whatever the current
    /// profile count, so bindings left by a larger generation go too.
    pub fn unregister_all(&mut self, binder: &mut impl HotkeyBinder) {
        binder.unregister(hotkey_ids::CYCLE);
        for index in 0..config::MAX_PROFILES {
            binder.unregister(Self::profile_id(index));
        }
        self.registered.clear();
    }
}

/// Translates a virtual-key code to the evdev key it names on a US layout
pub fn keycode_for_vk(vk: u8) -> Option<KeyCode> {
    const LETTERS: [KeyCode; 26] = [
        KeyCode::KEY_A, KeyCode::KEY_B, KeyCode::KEY_C, KeyCode::KEY_D, KeyCode::KEY_E,
        KeyCode::KEY_F, KeyCode::KEY_G, KeyCode::KEY_H, KeyCode::KEY_I, KeyCode::KEY_J,
        KeyCode::KEY_K, KeyCode::KEY_L, KeyCode::KEY_M, KeyCode::KEY_N, KeyCode::KEY_O,
        KeyCode::KEY_P, KeyCode::KEY_Q, KeyCode::KEY_R, KeyCode::KEY_S, KeyCode::KEY_T,
        KeyCode::KEY_U, KeyCode::KEY_V, KeyCode::KEY_W, KeyCode::KEY_X, KeyCode::KEY_Y,
        KeyCode::KEY_Z,
    ];
    const DIGITS: [KeyCode; 10] = [
        KeyCode::KEY_0, KeyCode::KEY_1, KeyCode::KEY_2, KeyCode::KEY_3, KeyCode::KEY_4,
        KeyCode::KEY_5, KeyCode::KEY_6, KeyCode::KEY_7, KeyCode::KEY_8, KeyCode::KEY_9,
    ];
    const NUMPAD: [KeyCode; 10] = [
        KeyCode::KEY_KP0, KeyCode::KEY_KP1, KeyCode::KEY_KP2, KeyCode::KEY_KP3, KeyCode::KEY_KP4,
        KeyCode::KEY_KP5, KeyCode::KEY_KP6, KeyCode::KEY_KP7, KeyCode::KEY_KP8, KeyCode::KEY_KP9,
    ];
    const FUNCTION: [KeyCode; 24] = [
        KeyCode::KEY_F1, KeyCode::KEY_F2, KeyCode::KEY_F3, KeyCode::KEY_F4, KeyCode::KEY_F5,
        KeyCode::KEY_F6, KeyCode::KEY_F7, KeyCode::KEY_F8, KeyCode::KEY_F9, KeyCode::KEY_F10,
        KeyCode::KEY_F11, KeyCode::KEY_F12, KeyCode::KEY_F13, KeyCode::KEY_F14, KeyCode::KEY_F15,
        KeyCode::KEY_F16, KeyCode::KEY_F17, KeyCode::KEY_F18, KeyCode::KEY_F19, KeyCode::KEY_F20,
        KeyCode::KEY_F21, KeyCode::KEY_F22, KeyCode::KEY_F23, KeyCode::KEY_F24,
    ];

    let key = match vk {
        0x41..=0x5A => LETTERS[usize::from(vk - 0x41)],
        0x30..=0x39 => DIGITS[usize::from(vk - 0x30)],
        0x60..=0x69 => NUMPAD[usize::from(vk - 0x60)],
        0x70..=0x87 => FUNCTION[usize::from(vk - 0x70)],
        0x08 => KeyCode::KEY_BACKSPACE,
        0x09 => KeyCode::KEY_TAB,
        0x0D => KeyCode::KEY_ENTER,
        0x13 => KeyCode::KEY_PAUSE,
        0x1B => KeyCode::KEY_ESC,
        0x20 => KeyCode::KEY_SPACE,
        0x21 => KeyCode::KEY_PAGEUP,
        0x22 => KeyCode::KEY_PAGEDOWN,
        0x23 => KeyCode::KEY_END,
        0x24 => KeyCode::KEY_HOME,
        0x25 => KeyCode::KEY_LEFT,
        0x26 => KeyCode::KEY_UP,
        0x27 => KeyCode::KEY_RIGHT,
        0x28 => KeyCode::KEY_DOWN,
        0x2C => KeyCode::KEY_SYSRQ,
        0x2D => KeyCode::KEY_INSERT,
        0x2E => KeyCode::KEY_DELETE,
        0x6A => KeyCode::KEY_KPASTERISK,
        0x6B => KeyCode::KEY_KPPLUS,
        0x6D => KeyCode::KEY_KPMINUS,
        0x6E => KeyCode::KEY_KPDOT,
        0x6F => KeyCode::KEY_KPSLASH,
        0x91 => KeyCode::KEY_SCROLLLOCK,
        0xBA => KeyCode::KEY_SEMICOLON,
        0xBB => KeyCode::KEY_EQUAL,
        0xBC => KeyCode::KEY_COMMA,
        0xBD => KeyCode::KEY_MINUS,
        0xBE => KeyCode::KEY_DOT,
        0xBF => KeyCode::KEY_SLASH,
        0xC0 => KeyCode::KEY_GRAVE,
        0xDB => KeyCode::KEY_LEFTBRACE,
        0xDC => KeyCode::KEY_BACKSLASH,
        0xDD => KeyCode::KEY_RIGHTBRACE,
        0xDE => KeyCode::KEY_APOSTROPHE,
        _ => return None,
    };
    Some(key)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Binding {
    modifiers: Modifiers,
    key: KeyCode,
}

type BindingTable = Arc<Mutex<HashMap<HotkeyId, Binding>>>;

/// Global hotkeys read straight from keyboard devices.
///
/// Registrations live in a table shared with one listener thread per
/// keyboard; a press whose held modifiers match a binding exactly is sent to
/// the dispatcher as `Command::Hotkey(id)`.
pub struct EvdevBinder {
    bindings: BindingTable,
}

impl EvdevBinder {
    /// Starts the listeners; without device access the binder still accepts
    /// registrations but nothing fires.
    pub fn spawn(sender: UnboundedSender<Command>) -> Self {
        let bindings = BindingTable::default();

        if check_permissions() {
            match spawn_listeners(bindings.clone(), sender) {
                Ok(handles) => info!(devices = handles.len(), "Hotkey support enabled"),
                Err(e) => {
                    error!("Failed to start hotkey listener: {}", e);
                    print_permission_error();
                }
            }
        } else {
            print_permission_error();
        }

        Self { bindings }
    }
}

impl HotkeyBinder for EvdevBinder {
    fn register(&mut self, id: HotkeyId, modifiers: Modifiers, key_code: u8) -> bool {
        let Some(key) = keycode_for_vk(key_code) else {
            warn!(id, key_code, "No evdev key for virtual-key code");
            return false;
        };
        let binding = Binding { modifiers, key };

        let Ok(mut bindings) = self.bindings.lock() else {
            return false;
        };
        if bindings.iter().any(|(other, b)| *other != id && *b == binding) {
            warn!(id, key = ?key, "Key combination already bound to another hotkey");
            return false;
        }
        bindings.insert(id, binding);
        true
    }

    fn unregister(&mut self, id: HotkeyId) -> bool {
        self.bindings
            .lock()
            .map(|mut bindings| bindings.remove(&id).is_some())
            .unwrap_or(false)
    }
}

/// Find all keyboard devices (anything reporting a Tab key)
fn find_all_keyboard_devices() -> Result<Vec<Device>> {
    info!(path = %paths::DEV_INPUT, "Scanning for keyboard devices...");

    let mut devices = Vec::new();

    for entry in std::fs::read_dir(paths::DEV_INPUT)
        .context(format!("Failed to read {} - are you in the '{}' group?", paths::DEV_INPUT, permissions::INPUT_GROUP))?
    {
        let path = entry?.path();

        if let Ok(device) = Device::open(&path) {
            if device
                .supported_keys()
                .is_some_and(|keys| keys.contains(KeyCode::KEY_TAB))
            {
                info!(device_path = %path.display(), name = ?device.name(), "Found keyboard device");
                devices.push(device);
            }
        }
    }

    if devices.is_empty() {
        anyhow::bail!(
            "No keyboard device found. Ensure you're in '{}' group:\n\
             {}\n\
             Then log out and back in.",
            permissions::INPUT_GROUP,
            permissions::ADD_TO_INPUT_GROUP
        )
    }

    Ok(devices)
}

fn spawn_listeners(bindings: BindingTable, sender: UnboundedSender<Command>) -> Result<Vec<thread::JoinHandle<()>>> {
    let devices = find_all_keyboard_devices()?;
    let mut handles = Vec::new();

    for device in devices {
        let bindings = bindings.clone();
        let sender = sender.clone();
        let handle = thread::spawn(move || {
            info!(device = ?device.name(), "Hotkey listener started");
            if let Err(e) = listen_for_hotkeys(device, &bindings, &sender) {
                error!(error = %e, "Hotkey listener error");
            }
        });
        handles.push(handle);
    }

    Ok(handles)
}

fn held_modifiers(device: &Device) -> Result<Modifiers> {
    let keys = device.get_key_state().context("Failed to get keyboard state")?;
    let either = |left, right| keys.contains(left) || keys.contains(right);

    Ok(Modifiers {
        alt: either(KeyCode::KEY_LEFTALT, KeyCode::KEY_RIGHTALT),
        ctrl: either(KeyCode::KEY_LEFTCTRL, KeyCode::KEY_RIGHTCTRL),
        shift: either(KeyCode::KEY_LEFTSHIFT, KeyCode::KEY_RIGHTSHIFT),
        win: either(KeyCode::KEY_LEFTMETA, KeyCode::KEY_RIGHTMETA),
    })
}

fn matching_ids(bindings: &BindingTable, pressed: Binding) -> Vec<HotkeyId> {
    bindings
        .lock()
        .map(|table| {
            table
                .iter()
                .filter(|(_, binding)| **binding == pressed)
                .map(|(id, _)| *id)
                .collect()
        })
        .unwrap_or_default()
}

fn listen_for_hotkeys(mut device: Device, bindings: &BindingTable, sender: &UnboundedSender<Command>) -> Result<()> {
    loop {
        // Finish with the events iterator before querying key state
        let presses: Vec<KeyCode> = device
            .fetch_events()
            .context("Failed to fetch events")?
            .filter_map(|event| match event.destructure() {
                EventSummary::Key(_, key, input::KEY_PRESS) => Some(key),
                _ => None,
            })
            .collect();

        for key in presses {
            let modifiers = held_modifiers(&device)?;
            for id in matching_ids(bindings, Binding { modifiers, key }) {
                debug!(id, key = ?key, "Hotkey pressed");
                if sender.send(Command::Hotkey(id)).is_err() {
                    info!("Dispatcher closed, stopping hotkey listener");
                    return Ok(());
                }
            }
        }
    }
}

/// Check if hotkeys are available (user has input group permissions)
pub fn check_permissions() -> bool {
    std::fs::read_dir(paths::DEV_INPUT).is_ok()
}

/// Print helpful error message if permissions missing
pub fn print_permission_error() {
    error!(path = %paths::DEV_INPUT, "Cannot access input devices");
    error!(group = %permissions::INPUT_GROUP, "Hotkeys require group membership");
    error!(command = %permissions::ADD_TO_INPUT_GROUP, "Add user to input group");
    warn!(continuing = true, "Continuing without hotkey support...");
}
