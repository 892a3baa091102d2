//! Injected random source
//!
//! Layout generation only ever asks for a uniform index or a unit float, so
//! the engine depends on this narrow trait instead of a concrete RNG. Any
//! `rand` generator qualifies; [`ScriptedRandom`] replays fixed values.

use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg32;

pub trait RandomSource {
    /// Uniform index in `0..bound` (`bound` of 0 or 1 yields 0)
    fn index(&mut self, bound: usize) -> usize;
    /// Uniform float in `[0, 1)`
    fn unit(&mut self) -> f32;
}

impl<R: RngCore> RandomSource for R {
    fn index(&mut self, bound: usize) -> usize {
        if bound <= 1 {
            return 0;
        }
        self.random_range(0..bound)
    }

    fn unit(&mut self) -> f32 {
        self.random::<f32>()
    }
}

/// Seeded generator for one session
pub fn session_rng(seed: u64) -> Pcg32 {
    Pcg32::seed_from_u64(seed)
}

/// Replays a fixed script of indices and floats, cycling when exhausted.
///
/// Indices are reduced modulo the requested bound.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    indices: Vec<usize>,
    units: Vec<f32>,
    next_index: usize,
    next_unit: usize,
}

impl ScriptedRandom {
    pub fn new(indices: Vec<usize>) -> Self {
        Self {
            indices,
            ..Default::default()
        }
    }

    pub fn with_units(mut self, units: Vec<f32>) -> Self {
        self.units = units;
        self
    }
}

impl RandomSource for ScriptedRandom {
    fn index(&mut self, bound: usize) -> usize {
        if bound <= 1 || self.indices.is_empty() {
            return 0;
        }
        let value = self.indices[self.next_index % self.indices.len()];
        self.next_index += 1;
        value % bound
    }

    fn unit(&mut self) -> f32 {
        if self.units.is_empty() {
            return 0.5;
        }
        let value = self.units[self.next_unit % self.units.len()];
        self.next_unit += 1;
        value.clamp(0.0, 0.999_999)
    }
}
