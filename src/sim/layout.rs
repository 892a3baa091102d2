//! Per-round layout generation
//!
//! Every layout is a set of slots on a grid plus the game-specific answer.
//! Generation is pure given the game, the difficulty curve and the random
//! source, so a seeded source reproduces a session exactly.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::difficulty::Curve;
use super::hit::HitShape;
use super::rng::RandomSource;
use crate::consts::BOARD_SIZE;
use crate::tuning::{GameId, N_BACK_LETTERS};

/// Chance that a new n-back stimulus repeats the letter N steps back
pub const N_BACK_MATCH_CHANCE: f32 = 0.3;

/// Odd-one-out base circle diameter range (layout units)
pub const ODD_BASE_MIN: f32 = 40.0;
pub const ODD_BASE_MAX: f32 = 220.0;
/// Smallest odd-one-out circle scale, as a share of the full hit radius
pub const ODD_MIN_SCALE: f32 = 0.5;

/// Slot arrangement shared by rendering and hit testing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Top-left corner of slot 0
    pub origin: Vec2,
    /// Distance between neighbouring slot centers
    pub pitch: f32,
    pub columns: usize,
    pub count: usize,
}

impl GridGeometry {
    /// Roughly square grid filling the board (`ceil(sqrt(count))` columns)
    pub fn square(count: usize) -> Self {
        let columns = (count.max(1) as f32).sqrt().ceil() as usize;
        Self {
            origin: Vec2::ZERO,
            pitch: BOARD_SIZE / columns as f32,
            columns,
            count,
        }
    }

    /// A single row of buttons along the bottom of the board
    pub fn button_row(count: usize) -> Self {
        let pitch = BOARD_SIZE / 4.0;
        let width = pitch * count as f32;
        Self {
            origin: Vec2::new((BOARD_SIZE - width) / 2.0, BOARD_SIZE - pitch),
            pitch,
            columns: count.max(1),
            count,
        }
    }

    pub fn rows(&self) -> usize {
        self.count.div_ceil(self.columns.max(1))
    }

    pub fn cell_center(&self, index: usize) -> Vec2 {
        let col = index % self.columns;
        let row = index / self.columns;
        self.origin + Vec2::new(col as f32 + 0.5, row as f32 + 0.5) * self.pitch
    }
}

/// A pattern puzzle: prompt, four options, and the answer text
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Puzzle {
    pub prompt: &'static str,
    pub options: [&'static str; 4],
    pub answer: &'static str,
}

/// Fixed puzzle rotation
pub const PUZZLES: [Puzzle; 5] = [
    Puzzle {
        prompt: "Complete the 2x2: the pattern increases by one dot each cell.",
        options: ["1", "2", "3", "4"],
        answer: "3",
    },
    Puzzle {
        prompt: "The arrow rotates 90 degrees each step. Pick the missing orientation.",
        options: ["↑", "→", "↓", "←"],
        answer: "↓",
    },
    Puzzle {
        prompt: "Shade alternates like a checker. Choose the right shade.",
        options: ["▢", "■", "▢", "■"],
        answer: "▢",
    },
    Puzzle {
        prompt: "Each row doubles. 2, 4, 8, ?",
        options: ["10", "12", "16", "14"],
        answer: "16",
    },
    Puzzle {
        prompt: "Shapes gain one side each step: triangle, square, ?",
        options: ["●", "⬟", "▲", "■"],
        answer: "⬟",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Layout {
    /// One highlighted cell to hit
    Target { geometry: GridGeometry, target: usize },
    /// One circle is larger than the rest by `size_delta * base_size`
    OddOneOut {
        geometry: GridGeometry,
        odd_index: usize,
        base_size: f32,
        size_delta: f32,
    },
    /// Cells flashed in order, to be tapped back in order
    Sequence {
        geometry: GridGeometry,
        sequence: Vec<usize>,
    },
    /// The current letter of the n-back stream; slot 0 is the Match button
    Stimulus {
        geometry: GridGeometry,
        letter: char,
        n: usize,
        is_match: bool,
    },
    /// Puzzle from [`PUZZLES`]; slots are the option buttons
    Puzzle { geometry: GridGeometry, index: usize },
    /// Slot 0 is the Log button
    Reflection { geometry: GridGeometry },
}

impl Layout {
    pub fn geometry(&self) -> &GridGeometry {
        match self {
            Layout::Target { geometry, .. }
            | Layout::OddOneOut { geometry, .. }
            | Layout::Sequence { geometry, .. }
            | Layout::Stimulus { geometry, .. }
            | Layout::Puzzle { geometry, .. }
            | Layout::Reflection { geometry } => geometry,
        }
    }

    /// Taps needed before a sequence attempt is judged (1 elsewhere)
    pub fn expected_input_length(&self) -> usize {
        match self {
            Layout::Sequence { sequence, .. } => sequence.len(),
            _ => 1,
        }
    }

    /// Whether a single tap on `index` is the answer.
    ///
    /// Sequences are judged on the whole input; see [`Layout::accepts_sequence`].
    pub fn accepts(&self, index: usize) -> bool {
        match self {
            Layout::Target { target, .. } => index == *target,
            Layout::OddOneOut { odd_index, .. } => index == *odd_index,
            Layout::Sequence { .. } => false,
            Layout::Stimulus { is_match, .. } => index == 0 && *is_match,
            Layout::Puzzle { index: p, .. } => {
                let puzzle = &PUZZLES[*p % PUZZLES.len()];
                puzzle
                    .options
                    .get(index)
                    .is_some_and(|o| *o == puzzle.answer)
            }
            Layout::Reflection { .. } => index == 0,
        }
    }

    /// Hit region of slot `index`, which is also the shape drawn for it.
    ///
    /// Odd-one-out circles shrink with a small base size and the odd one is
    /// `size_delta` larger; every other layout uses `base` unchanged.
    pub fn slot_shape(&self, index: usize, base: HitShape) -> HitShape {
        match (self, base) {
            (
                Layout::OddOneOut {
                    odd_index,
                    base_size,
                    size_delta,
                    ..
                },
                HitShape::Circle { radius_fraction },
            ) => {
                let mut scale = (base_size / ODD_BASE_MAX).clamp(ODD_MIN_SCALE, 1.0);
                if index == *odd_index {
                    scale *= 1.0 + size_delta;
                }
                HitShape::Circle {
                    radius_fraction: radius_fraction * scale,
                }
            }
            _ => base,
        }
    }

    pub fn accepts_sequence(&self, input: &[usize]) -> bool {
        match self {
            Layout::Sequence { sequence, .. } => sequence.as_slice() == input,
            _ => false,
        }
    }
}

/// Everything a generator may look at besides the random source
#[derive(Debug, Clone, Copy)]
pub struct LayoutRequest<'a> {
    pub game: GameId,
    pub curve: Curve,
    /// Recent n-back letters, oldest first
    pub history: &'a [char],
    /// Position in the puzzle rotation
    pub puzzle_index: usize,
}

pub fn generate(request: &LayoutRequest<'_>, rng: &mut impl RandomSource) -> Layout {
    let curve = request.curve;
    match request.game {
        GameId::ReactionTap => target_grid(curve.slots, rng),
        GameId::OddOneOut => odd_one_out(curve.slots, curve.size_delta, rng),
        GameId::SequenceRecall => sequence(curve.slots, curve.span, rng),
        GameId::NBackMatch => stimulus(curve.span, request.history, rng),
        GameId::PatternPuzzle => Layout::Puzzle {
            geometry: GridGeometry::button_row(4),
            index: request.puzzle_index % PUZZLES.len(),
        },
        GameId::TimedReflection => Layout::Reflection {
            geometry: GridGeometry::button_row(1),
        },
    }
}

pub fn target_grid(count: usize, rng: &mut impl RandomSource) -> Layout {
    Layout::Target {
        geometry: GridGeometry::square(count),
        target: rng.index(count),
    }
}

pub fn odd_one_out(count: usize, size_delta: f32, rng: &mut impl RandomSource) -> Layout {
    let odd_index = rng.index(count);
    let base_size = ODD_BASE_MIN + rng.unit() * (ODD_BASE_MAX - ODD_BASE_MIN);
    Layout::OddOneOut {
        geometry: GridGeometry::square(count),
        odd_index,
        base_size,
        size_delta,
    }
}

/// Sequence of `len` cells over a `cells`-slot grid.
///
/// Immediate repeats are rejected and redrawn: a cell flashing twice in a
/// row reads as one long flash.
pub fn sequence(cells: usize, len: usize, rng: &mut impl RandomSource) -> Layout {
    let mut sequence: Vec<usize> = Vec::with_capacity(len);
    while sequence.len() < len {
        let next = rng.index(cells);
        if cells > 1 && sequence.last() == Some(&next) {
            continue;
        }
        sequence.push(next);
    }
    Layout::Sequence {
        geometry: GridGeometry::square(cells),
        sequence,
    }
}

/// Next n-back letter. With probability [`N_BACK_MATCH_CHANCE`] it repeats
/// the letter `n` back (when the history is long enough).
pub fn stimulus(n: usize, history: &[char], rng: &mut impl RandomSource) -> Layout {
    let letters: Vec<char> = N_BACK_LETTERS.chars().collect();
    let n_back = history
        .len()
        .checked_sub(n)
        .and_then(|i| history.get(i).copied());

    let letter = match n_back {
        Some(c) if rng.unit() < N_BACK_MATCH_CHANCE => c,
        _ => letters[rng.index(letters.len())],
    };

    Layout::Stimulus {
        geometry: GridGeometry::button_row(1),
        letter,
        n,
        is_match: n_back == Some(letter),
    }
}
