//! Difficulty curves
//!
//! Pure functions from a game's difficulty level to layout size, timing
//! window and tolerance. What "level" means depends on the game:
//! - ReactionTap / OddOneOut: correct taps this session
//! - SequenceRecall: sequence length
//! - NBackMatch: N
//! - PatternPuzzle / TimedReflection: unused

use crate::tuning::{GameId, N_BACK_INTERVAL, REFLECTION_DURATION};

/// ReactionTap round window at level 0 (seconds)
pub const REACTION_WINDOW_START: f32 = 1.2;
/// Window shrink per correct tap (seconds)
pub const REACTION_WINDOW_STEP: f32 = 0.025;
/// Window never drops below this (seconds)
pub const REACTION_WINDOW_FLOOR: f32 = 0.5;
pub const REACTION_SIDE_START: usize = 4;
/// Grid grows one column/row every this many correct taps
pub const REACTION_GROW_EVERY: u32 = 5;
pub const REACTION_SIDE_MAX: usize = 6;

pub const ODD_COUNT_START: usize = 12;
pub const ODD_COUNT_MAX: usize = 36;
/// Size difference of the odd circle, as a fraction of the base size
pub const ODD_DELTA_START: f32 = 0.30;
pub const ODD_DELTA_STEP: f32 = 0.01;
pub const ODD_DELTA_FLOOR: f32 = 0.04;

pub const SEQUENCE_MIN_LEN: usize = 3;
pub const SEQUENCE_MAX_LEN: usize = 12;
pub const SEQUENCE_GRID: usize = 9;

pub const N_BACK_MIN: usize = 1;
pub const N_BACK_MAX: usize = 3;
/// N goes up after this many correct claims in a row
pub const N_BACK_RAISE_EVERY: u32 = 5;

/// Concrete parameters for one round
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Curve {
    /// Number of target slots in the layout
    pub slots: usize,
    /// Round timer in seconds (`None` = untimed)
    pub round_window: Option<f32>,
    /// Odd-one-out size difference (fraction of base size)
    pub size_delta: f32,
    /// Sequence length, or N for n-back
    pub span: usize,
}

/// Starting difficulty level for a fresh session
pub fn baseline_level(game: GameId) -> u32 {
    match game {
        GameId::SequenceRecall => SEQUENCE_MIN_LEN as u32,
        GameId::NBackMatch => N_BACK_MIN as u32,
        _ => 0,
    }
}

pub fn curve(game: GameId, level: u32) -> Curve {
    match game {
        GameId::ReactionTap => {
            let side = reaction_side(level);
            Curve {
                slots: side * side,
                round_window: Some(reaction_window(level)),
                size_delta: 0.0,
                span: 1,
            }
        }
        GameId::OddOneOut => Curve {
            slots: odd_count(level),
            round_window: None,
            size_delta: odd_delta(level),
            span: 1,
        },
        GameId::SequenceRecall => Curve {
            slots: SEQUENCE_GRID,
            round_window: None,
            size_delta: 0.0,
            span: sequence_len(level),
        },
        GameId::NBackMatch => Curve {
            slots: 1,
            round_window: Some(N_BACK_INTERVAL),
            size_delta: 0.0,
            span: (level as usize).clamp(N_BACK_MIN, N_BACK_MAX),
        },
        GameId::PatternPuzzle => Curve {
            slots: 4,
            round_window: None,
            size_delta: 0.0,
            span: 1,
        },
        GameId::TimedReflection => Curve {
            slots: 1,
            round_window: Some(REFLECTION_DURATION),
            size_delta: 0.0,
            span: 1,
        },
    }
}

pub fn reaction_window(correct: u32) -> f32 {
    (REACTION_WINDOW_START - REACTION_WINDOW_STEP * correct as f32).max(REACTION_WINDOW_FLOOR)
}

pub fn reaction_side(correct: u32) -> usize {
    (REACTION_SIDE_START + (correct / REACTION_GROW_EVERY) as usize).min(REACTION_SIDE_MAX)
}

pub fn odd_count(correct: u32) -> usize {
    (ODD_COUNT_START + correct as usize).min(ODD_COUNT_MAX)
}

pub fn odd_delta(correct: u32) -> f32 {
    (ODD_DELTA_START - ODD_DELTA_STEP * correct as f32).max(ODD_DELTA_FLOOR)
}

pub fn sequence_len(level: u32) -> usize {
    (level as usize).clamp(SEQUENCE_MIN_LEN, SEQUENCE_MAX_LEN)
}

/// N after another correct claim, given the run of correct claims so far
pub fn next_n_back(n: usize, correct_run: u32) -> usize {
    if correct_run > 0 && correct_run.is_multiple_of(N_BACK_RAISE_EVERY) {
        (n + 1).min(N_BACK_MAX)
    } else {
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_window_monotone_and_floored() {
        let mut prev = reaction_window(0);
        assert_eq!(prev, REACTION_WINDOW_START);
        for k in 1..200 {
            let w = reaction_window(k);
            assert!(w <= prev);
            assert!(w >= REACTION_WINDOW_FLOOR);
            prev = w;
        }
        assert_eq!(reaction_window(1000), REACTION_WINDOW_FLOOR);
    }

    #[test]
    fn test_reaction_grid_grows_to_ceiling() {
        assert_eq!(curve(GameId::ReactionTap, 0).slots, 16);
        assert_eq!(curve(GameId::ReactionTap, 4).slots, 16);
        assert_eq!(curve(GameId::ReactionTap, 5).slots, 25);
        assert_eq!(curve(GameId::ReactionTap, 500).slots, 36);
    }

    #[test]
    fn test_odd_delta_shrinks_and_count_grows() {
        let mut prev = curve(GameId::OddOneOut, 0);
        for k in 1..100 {
            let c = curve(GameId::OddOneOut, k);
            assert!(c.size_delta <= prev.size_delta);
            assert!(c.size_delta >= ODD_DELTA_FLOOR);
            assert!(c.slots >= prev.slots);
            assert!(c.slots <= ODD_COUNT_MAX);
            prev = c;
        }
    }

    #[test]
    fn test_sequence_len_clamped() {
        assert_eq!(sequence_len(0), SEQUENCE_MIN_LEN);
        assert_eq!(sequence_len(5), 5);
        assert_eq!(sequence_len(99), SEQUENCE_MAX_LEN);
    }

    #[test]
    fn test_n_back_raises_every_fifth_claim() {
        assert_eq!(next_n_back(1, 4), 1);
        assert_eq!(next_n_back(1, 5), 2);
        assert_eq!(next_n_back(3, 10), N_BACK_MAX);
    }
}
