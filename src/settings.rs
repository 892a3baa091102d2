//! Player settings and preferences
//!
//! Persisted separately from the profile in LocalStorage, and saved
//! immediately on every change.

use serde::{Deserialize, Serialize};

/// Color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Follow the platform light/dark preference
    #[default]
    System,
    Light,
    Dark,
    Neon,
    Pastel,
    Quittr,
}

impl Theme {
    pub const ALL: [Theme; 6] = [
        Theme::System,
        Theme::Light,
        Theme::Dark,
        Theme::Neon,
        Theme::Pastel,
        Theme::Quittr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::System => "system",
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Neon => "neon",
            Theme::Pastel => "pastel",
            Theme::Quittr => "quittr",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "system" | "auto" => Some(Theme::System),
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "neon" => Some(Theme::Neon),
            "pastel" => Some(Theme::Pastel),
            "quittr" => Some(Theme::Quittr),
            _ => None,
        }
    }

    /// Concrete theme to apply, resolving `System` from the platform preference
    pub fn resolve(&self, prefers_light: bool) -> Theme {
        match self {
            Theme::System if prefers_light => Theme::Light,
            Theme::System => Theme::Dark,
            other => *other,
        }
    }
}

/// Frame-rate cap; drives the fixed tick duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "u32", into = "u32")]
pub enum FpsCap {
    Thirty,
    #[default]
    Sixty,
}

impl FpsCap {
    pub fn fps(&self) -> u32 {
        match self {
            FpsCap::Thirty => 30,
            FpsCap::Sixty => 60,
        }
    }

    /// Seconds per fixed tick
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.fps() as f32
    }
}

impl From<u32> for FpsCap {
    /// Snap any stored value to the nearest supported cap
    fn from(fps: u32) -> Self {
        if fps <= 45 {
            FpsCap::Thirty
        } else {
            FpsCap::Sixty
        }
    }
}

impl From<FpsCap> for u32 {
    fn from(cap: FpsCap) -> Self {
        cap.fps()
    }
}

/// Player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub theme: Theme,
    /// Vibration on taps and level-ups
    pub haptics: bool,
    /// Short tones on taps and level-ups
    pub sound: bool,
    pub fps_cap: FpsCap,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            haptics: true,
            sound: true,
            fps_cap: FpsCap::Sixty,
        }
    }
}

impl Settings {
    /// LocalStorage key
    pub const STORAGE_KEY: &'static str = "mindgym_settings";
}
