//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// Configuration document location and limits
pub mod config {
    /// Directory under the user's config dir
    pub const APP_DIR: &str = "pointer-profiles";

    /// Profile document file name
    pub const FILENAME: &str = "profiles.json";

    /// Maximum number of profiles kept from a document (one per numeral 1-9)
    pub const MAX_PROFILES: usize = 9;

    /// Default profile color (opaque white)
    pub const DEFAULT_COLOR: &str = "ffffffff";
}

/// Bootstrap configuration written when no document exists
pub mod bootstrap {
    pub const FIRST_PROFILE_NAME: &str = "Initial Settings";
    pub const SECOND_PROFILE_NAME: &str = "Initial Settings (Copy)";
    pub const FIRST_PROFILE_COLOR: &str = "00ff00";
    pub const SECOND_PROFILE_COLOR: &str = "00ffff";
}

/// Reserved hotkey id space
pub mod hotkey_ids {
    /// Id bound to the "cycle to next profile" hotkey
    pub const CYCLE: u32 = 1;

    /// First profile slot id; slot N uses PROFILE_START + N
    pub const PROFILE_START: u32 = 2;
}

/// Virtual-key codes used by the bootstrap configuration
pub mod vk {
    pub const F1: u8 = 0x70;
}

/// Input event constants (from evdev)
pub mod input {
    /// Key press event value
    pub const KEY_PRESS: i32 = 1;
}

/// Status icon geometry and font
pub mod icon {
    /// Width and height of the tray icon in pixels
    pub const SIZE: usize = 16;

    /// Pixel count of one icon layer
    pub const PIXELS: usize = SIZE * SIZE;

    /// Pixel size the numeral is rasterized at
    pub const FONT_SIZE: f32 = 13.0;
}

/// StatusNotifier item identity
pub mod tray {
    /// Stable item id; one logical icon slot reused across updates
    pub const ID: &str = "pointer-profiles";

    pub const TITLE: &str = "Pointer Profiles";
}

/// X11 pointer control mapping
pub mod pointer {
    /// Denominator of the acceleration fraction; sensitivity 10 == 1.0x
    pub const ACCEL_DENOMINATOR: i16 = 10;

    /// Sensitivity reported when acceleration is disabled
    pub const NEUTRAL_SENSITIVITY: i32 = 10;
}

/// Input device discovery
pub mod paths {
    /// Directory containing evdev input device nodes
    pub const DEV_INPUT: &str = "/dev/input";
}

/// Permission hints shown when input devices cannot be read
pub mod permissions {
    /// Group that grants access to /dev/input/event*
    pub const INPUT_GROUP: &str = "input";

    /// Command that adds the current user to the input group
    pub const ADD_TO_INPUT_GROUP: &str = "sudo usermod -aG input $USER";
}
