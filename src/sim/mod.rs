//! Deterministic game module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only advances through `update(dt)`
//! - Injected random source only
//! - No rendering, storage or platform dependencies

pub mod difficulty;
pub mod engine;
pub mod hit;
pub mod layout;
pub mod rng;
pub mod state;

pub use difficulty::{Curve, baseline_level, curve};
pub use engine::RoundEngine;
pub use hit::{HitShape, hit_test, hit_test_slots, sd_circle, sd_square};
pub use layout::{GridGeometry, Layout, LayoutRequest, PUZZLES, Puzzle};
pub use rng::{RandomSource, ScriptedRandom, session_rng};
pub use state::{GameEvent, Session, SessionState};
