//! MindGym - short brain-training mini-games
//!
//! Core modules:
//! - `sim`: Round engine, difficulty curves, layout generation, hit testing
//! - `tuning`: Per-game configuration (miss policy, XP awards, hit shapes)
//! - `profile`: Level, XP, streak and best scores
//! - `settings`: Theme, haptics, sound, frame-rate cap
//! - `persistence`: Load/save of profile and settings with default fallback
//! - `platform`: Fixed-step scheduler and key-value storage
//! - `feedback`: Game events realised as tones and vibration
//! - `app`: The shell the UI talks to

pub mod app;
#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod feedback;
pub mod persistence;
pub mod platform;
pub mod profile;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use app::MindGym;
pub use profile::{Profile, xp_needed};
pub use settings::{FpsCap, Settings, Theme};
pub use tuning::GameId;

/// Game configuration constants
pub mod consts {
    /// Side length of the square play board, in layout units
    pub const BOARD_SIZE: f32 = 360.0;

    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta fed to the stepper (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// XP needed to leave level 1
    pub const XP_BASE: u32 = 100;
    /// Extra XP needed for each level after the first
    pub const XP_INCREMENT: u32 = 50;
}
