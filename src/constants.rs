//! Application-wide constants
//!
//! Default values and protocol numbers used throughout the application,
//! kept in one place so config defaults and tests agree.

/// X11 protocol constants
pub mod x11 {
    /// Override redirect flag for unmanaged windows
    pub const OVERRIDE_REDIRECT: u32 = 1;

    /// WM_CLASS value for the overlay window (instance\0class\0)
    pub const WM_CLASS: &[u8] = b"peekcat\0peekcat\0";
}

/// Mouse button constants
pub mod mouse {
    /// Left mouse button number
    pub const BUTTON_LEFT: u8 = 1;

    /// Right mouse button number
    pub const BUTTON_RIGHT: u8 = 3;
}

/// X11 keysyms the overlay reacts to
pub mod keys {
    pub const ESCAPE: u32 = 0xff1b;
    pub const SPACE: u32 = 0x0020;
    pub const LOWER_Q: u32 = 0x0071;
}

/// Overlay geometry defaults
pub mod geometry {
    /// Edge length of the overlay window
    pub const FOOTPRINT: i32 = 200;

    /// How far past the visible position the hidden position sits (top/bottom)
    pub const HIDDEN_OFFSET: i32 = 170;

    /// Max gap between displays that still counts as adjacent
    pub const ADJACENT_TOLERANCE: i32 = 10;
}

/// Animation and cycle timing defaults (milliseconds)
pub mod timing {
    pub const APPEAR_MS: u64 = 1000;
    pub const HIDE_MS: u64 = 1000;
    pub const STAY_MS: u64 = 60_000;
    pub const SETTLE_MS: u64 = 300;
    pub const CYCLE_DELAY_MS: u64 = 2000;
    pub const START_DELAY_MS: u64 = 1000;

    /// Frame rate used when the display refresh rate cannot be queried
    pub const FALLBACK_FRAME_RATE: u32 = 60;
}

/// Autopilot defaults
pub mod autopilot {
    pub const EDGE_CHANGE_PROBABILITY: f64 = 0.3;
    pub const OFFSET_MIN: f64 = 0.3;
    pub const OFFSET_MAX: f64 = 0.7;
}

/// Drag gesture defaults
pub mod drag {
    /// Pointer travel (px) before a press becomes a drag
    pub const THRESHOLD: f64 = 5.0;
}

/// Character timeline defaults, used when no asset is configured
pub mod character {
    pub const FRAME_RATE: f64 = 30.0;
    pub const FRAME_COUNT: u32 = 30;
    pub const COLOR: &str = "#F4A261";
}

/// Configuration file constants
pub mod config {
    /// Application directory name (under XDG config / runtime dirs)
    pub const APP_DIR: &str = "peekcat";

    /// Configuration filename
    pub const FILENAME: &str = "config.toml";
}

/// Control socket constants
pub mod ipc {
    pub const SOCKET_NAME: &str = "control.sock";

    /// Maximum message size (1 MiB)
    pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;
}

/// Validation limits for config values
pub mod validation {
    pub const MIN_FOOTPRINT: i32 = 16;
    pub const MAX_FOOTPRINT: i32 = 1024;
    pub const MAX_ADJACENT_TOLERANCE: i32 = 200;
    pub const MAX_DURATION_MS: u64 = 60 * 60 * 1000;
    pub const MAX_FRAME_RATE: u32 = 360;
    pub const MAX_DRAG_THRESHOLD: f64 = 200.0;
}
