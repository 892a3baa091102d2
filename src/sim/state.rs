//! Session state and events
//!
//! A session is owned by exactly one round engine and dies with it.

use serde::{Deserialize, Serialize};

use super::layout::Layout;
use crate::tuning::GameId;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// Nothing running (fresh, or explicitly stopped)
    #[default]
    Idle,
    /// Between rounds: a tap was just resolved and the next round is pending
    Running,
    /// A layout is showing and its timer (if any) is armed
    RoundActive,
    /// Session finished by a terminal fail or by running out of time
    Ended,
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Running | SessionState::RoundActive)
    }
}

/// Things that happened during an engine call, yielded as data for the
/// feedback dispatcher and the UI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    RoundStarted { round: u32 },
    CorrectTap { score: u32 },
    WrongTap { score: u32 },
    RoundTimeout { score: u32 },
    LevelUp { level: u32 },
    NewBest { game: GameId, score: u32 },
    ReflectionPrompt { index: usize },
    SessionEnded { score: u32 },
}

/// Ephemeral per-game session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub state: SessionState,
    pub score: u32,
    /// Layouts presented after the first one
    pub round_index: u32,
    pub layout: Option<Layout>,
    /// Seconds left on the armed timer (`None` = nothing armed)
    pub time_remaining: Option<f32>,
    /// Game-specific difficulty level (see `sim::difficulty`)
    pub difficulty_level: u32,
    /// Bumped by every start/stop; stale timer callbacks carry an old value
    pub generation: u64,
    /// Correct answers this session (never decreases)
    pub correct: u32,
    /// Correct n-back claims since N was last reset
    pub correct_run: u32,
    /// Sequence taps entered so far this round
    pub input: Vec<usize>,
    /// Seconds since the current sequence started playing back
    pub playback: f32,
    /// Recent n-back letters, oldest first
    pub history: Vec<char>,
    /// Position in the puzzle rotation
    pub puzzle_index: usize,
    /// Seconds since the session started (reflection prompts)
    pub elapsed: f32,
    /// Reflection prompts shown so far
    pub prompts_shown: usize,
    /// Whether a NewBest event already fired this session
    pub best_announced: bool,
}
