//! Per-game configuration
//!
//! One record per game, selected through the closed [`GameId`] enumeration.
//! Difficulty curves live in `sim::difficulty`; everything here is the
//! static policy the round engine consults.

use serde::{Deserialize, Serialize};

use crate::sim::hit::HitShape;

/// The closed set of mini-games
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameId {
    ReactionTap,
    OddOneOut,
    SequenceRecall,
    NBackMatch,
    PatternPuzzle,
    TimedReflection,
}

impl GameId {
    pub const ALL: [GameId; 6] = [
        GameId::ReactionTap,
        GameId::OddOneOut,
        GameId::SequenceRecall,
        GameId::NBackMatch,
        GameId::PatternPuzzle,
        GameId::TimedReflection,
    ];

    /// Stable key used in persisted best-score maps
    pub fn key(&self) -> &'static str {
        match self {
            GameId::ReactionTap => "reaction_tap",
            GameId::OddOneOut => "odd_one_out",
            GameId::SequenceRecall => "sequence_recall",
            GameId::NBackMatch => "n_back_match",
            GameId::PatternPuzzle => "pattern_puzzle",
            GameId::TimedReflection => "timed_reflection",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        GameId::ALL.into_iter().find(|g| g.key() == key)
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameId::ReactionTap => "Focus Tap",
            GameId::OddOneOut => "Circle Hunt",
            GameId::SequenceRecall => "Visual Span",
            GameId::NBackMatch => "N-Back",
            GameId::PatternPuzzle => "Matrix Mini",
            GameId::TimedReflection => "Noticing",
        }
    }

    /// How-to-play blurb shown by the tutorial card
    pub fn how_to_play(&self) -> &'static str {
        match self {
            GameId::ReactionTap => {
                "Tap the highlighted circle before time runs out. It speeds up as you score."
            }
            GameId::OddOneOut => {
                "Find the one circle that is slightly bigger. It gets trickier each round."
            }
            GameId::SequenceRecall => {
                "Watch the cells flash in sequence, then tap them in the same order."
            }
            GameId::NBackMatch => {
                "Watch the letters. Tap Match when the current letter is the same as the one N steps earlier."
            }
            GameId::PatternPuzzle => {
                "Infer the missing piece using simple rules: rotation, progression, shading."
            }
            GameId::TimedReflection => {
                "For two minutes, notice concrete details around you. Tap Log each time."
            }
        }
    }

    pub fn tuning(&self) -> &'static GameTuning {
        match self {
            GameId::ReactionTap => &REACTION_TAP,
            GameId::OddOneOut => &ODD_ONE_OUT,
            GameId::SequenceRecall => &SEQUENCE_RECALL,
            GameId::NBackMatch => &N_BACK_MATCH,
            GameId::PatternPuzzle => &PATTERN_PUZZLE,
            GameId::TimedReflection => &TIMED_REFLECTION,
        }
    }
}

/// What a wrong tap costs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrongTapPolicy {
    /// Score -1 (floor 0), then a fresh round
    DeductAndNewRound,
    /// Score -1 (floor 0), the current layout stays up
    DeductAndStay,
    /// Score back to 0 and difficulty back to its minimum, then a fresh round
    ResetToMinimum,
    /// Score -1 (floor 0) and N back to 1; the stream carries on
    DeductAndResetN,
    /// Score -1 (floor 0), then the next puzzle in rotation
    DeductAndAdvance,
    /// No pass/fail
    Ignore,
}

/// What happens when the armed timer runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPolicy {
    /// Game has no timer
    Untimed,
    /// End the session if nothing is scored yet, otherwise -1 and a fresh round
    EndWhenScoreless,
    /// Present the next stimulus; taps do not affect the stream
    NextStimulus,
    /// The session is over; award the completion bonus
    Complete,
}

/// Static per-game policy record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameTuning {
    pub xp_per_correct: u32,
    /// Flat XP for finishing a timed session
    pub completion_bonus_xp: u32,
    pub wrong_tap: WrongTapPolicy,
    pub timeout: TimeoutPolicy,
    pub hit_shape: HitShape,
    /// Whether a tap that hits no target counts as a wrong tap
    pub empty_tap_is_wrong: bool,
}

/// Hit-circle radius as a fraction of cell pitch
pub const REACTION_HIT_FRACTION: f32 = 0.35;
pub const ODD_HIT_FRACTION: f32 = 0.36;
pub const SEQUENCE_HIT_FRACTION: f32 = 0.38;
/// Button half-extent as a fraction of cell pitch
pub const BUTTON_HIT_FRACTION: f32 = 0.46;

/// Stimulus interval of the n-back stream (seconds)
pub const N_BACK_INTERVAL: f32 = 1.2;
/// Letters the n-back stream draws from
pub const N_BACK_LETTERS: &str = "BCDFGHJKLMNPQRSTVWXYZ";
/// Stimuli kept for match checking
pub const N_BACK_HISTORY: usize = 10;

/// Length of a reflection session (seconds)
pub const REFLECTION_DURATION: f32 = 120.0;
/// Seconds between reflection prompts
pub const REFLECTION_PROMPT_INTERVAL: f32 = 30.0;
pub const REFLECTION_PROMPTS: [&str; 3] = [
    "What am I focusing on right now?",
    "Is this helpful for my goal?",
    "What will I do next?",
];

/// Sequence playback: one item every `SEQUENCE_FLASH_STEP`, lit for `SEQUENCE_FLASH_ON`
pub const SEQUENCE_FLASH_STEP: f32 = 0.42;
pub const SEQUENCE_FLASH_ON: f32 = 0.35;

pub const REACTION_TAP: GameTuning = GameTuning {
    xp_per_correct: 3,
    completion_bonus_xp: 0,
    wrong_tap: WrongTapPolicy::DeductAndNewRound,
    timeout: TimeoutPolicy::EndWhenScoreless,
    hit_shape: HitShape::Circle {
        radius_fraction: REACTION_HIT_FRACTION,
    },
    empty_tap_is_wrong: true,
};

pub const ODD_ONE_OUT: GameTuning = GameTuning {
    xp_per_correct: 4,
    completion_bonus_xp: 0,
    wrong_tap: WrongTapPolicy::DeductAndStay,
    timeout: TimeoutPolicy::Untimed,
    hit_shape: HitShape::Circle {
        radius_fraction: ODD_HIT_FRACTION,
    },
    empty_tap_is_wrong: true,
};

pub const SEQUENCE_RECALL: GameTuning = GameTuning {
    xp_per_correct: 5,
    completion_bonus_xp: 0,
    wrong_tap: WrongTapPolicy::ResetToMinimum,
    timeout: TimeoutPolicy::Untimed,
    hit_shape: HitShape::Circle {
        radius_fraction: SEQUENCE_HIT_FRACTION,
    },
    empty_tap_is_wrong: false,
};

pub const N_BACK_MATCH: GameTuning = GameTuning {
    xp_per_correct: 6,
    completion_bonus_xp: 0,
    wrong_tap: WrongTapPolicy::DeductAndResetN,
    timeout: TimeoutPolicy::NextStimulus,
    hit_shape: HitShape::Rect {
        half_extent_fraction: BUTTON_HIT_FRACTION,
    },
    empty_tap_is_wrong: false,
};

pub const PATTERN_PUZZLE: GameTuning = GameTuning {
    xp_per_correct: 8,
    completion_bonus_xp: 0,
    wrong_tap: WrongTapPolicy::DeductAndAdvance,
    timeout: TimeoutPolicy::Untimed,
    hit_shape: HitShape::Rect {
        half_extent_fraction: BUTTON_HIT_FRACTION,
    },
    empty_tap_is_wrong: false,
};

pub const TIMED_REFLECTION: GameTuning = GameTuning {
    xp_per_correct: 2,
    completion_bonus_xp: 10,
    wrong_tap: WrongTapPolicy::Ignore,
    timeout: TimeoutPolicy::Complete,
    hit_shape: HitShape::Rect {
        half_extent_fraction: BUTTON_HIT_FRACTION,
    },
    empty_tap_is_wrong: false,
};
